//! In-process node store.
//!
//! Used for demos and tests. Supports outage and failure injection so the
//! router's health and failover paths can be exercised without real databases.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;

use crate::backend::{AppointmentRecord, BackendError, NodeBackend, RegionFilter};

#[derive(Debug)]
pub struct MemoryBackend {
    name: String,
    records: DashMap<String, AppointmentRecord>,
    online: AtomicBool,
    /// Number of upcoming data operations that fail (pings are unaffected).
    failures_pending: AtomicUsize,
    /// Data operations served, for assertions on routing.
    served: AtomicU64,
}

impl MemoryBackend {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            records: DashMap::new(),
            online: AtomicBool::new(true),
            failures_pending: AtomicUsize::new(0),
            served: AtomicU64::new(0),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Simulate the node going down (or coming back).
    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    pub fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }

    /// Make the next `n` data operations fail while pings keep succeeding.
    pub fn fail_next(&self, n: usize) {
        self.failures_pending.store(n, Ordering::SeqCst);
    }

    /// Number of data operations that reached this node successfully.
    pub fn served(&self) -> u64 {
        self.served.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn contains(&self, apptid: &str) -> bool {
        self.records.contains_key(apptid)
    }

    /// Seed a record directly, bypassing the router.
    pub fn seed(&self, record: AppointmentRecord) {
        self.records.insert(record.apptid.clone(), record);
    }

    fn check_online(&self) -> Result<(), BackendError> {
        if self.is_online() {
            Ok(())
        } else {
            Err(BackendError::Unavailable(format!("{} is offline", self.name)))
        }
    }

    fn begin_op(&self) -> Result<(), BackendError> {
        self.check_online()?;
        let injected = self
            .failures_pending
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if injected {
            return Err(BackendError::Query(format!("{}: injected failure", self.name)));
        }
        self.served.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn sorted(&self, filter: &RegionFilter) -> Vec<AppointmentRecord> {
        let mut rows: Vec<AppointmentRecord> = self
            .records
            .iter()
            .filter(|r| filter.matches(&r.value().region_name))
            .map(|r| r.value().clone())
            .collect();
        rows.sort_by(|a, b| a.apptid.cmp(&b.apptid));
        rows
    }
}

#[async_trait]
impl NodeBackend for MemoryBackend {
    async fn ping(&self) -> Result<(), BackendError> {
        self.check_online()
    }

    async fn list(
        &self,
        filter: &RegionFilter,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<AppointmentRecord>, BackendError> {
        self.begin_op()?;
        Ok(self.sorted(filter).into_iter().skip(offset).take(limit).collect())
    }

    async fn count(&self, filter: &RegionFilter) -> Result<u64, BackendError> {
        self.begin_op()?;
        Ok(self
            .records
            .iter()
            .filter(|r| filter.matches(&r.value().region_name))
            .count() as u64)
    }

    async fn find(
        &self,
        filter: &RegionFilter,
        apptid: &str,
    ) -> Result<Option<AppointmentRecord>, BackendError> {
        self.begin_op()?;
        Ok(self
            .records
            .get(apptid)
            .map(|r| r.value().clone())
            .filter(|r| filter.matches(&r.region_name)))
    }

    async fn insert(&self, record: &AppointmentRecord) -> Result<(), BackendError> {
        self.begin_op()?;
        match self.records.entry(record.apptid.clone()) {
            dashmap::mapref::entry::Entry::Occupied(_) => {
                Err(BackendError::Conflict(record.apptid.clone()))
            }
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(record.clone());
                Ok(())
            }
        }
    }

    async fn update(&self, record: &AppointmentRecord) -> Result<bool, BackendError> {
        self.begin_op()?;
        match self.records.get_mut(&record.apptid) {
            Some(mut existing) => {
                *existing = record.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, filter: &RegionFilter, apptid: &str) -> Result<bool, BackendError> {
        self.begin_op()?;
        Ok(self
            .records
            .remove_if(apptid, |_, r| filter.matches(&r.region_name))
            .is_some())
    }
}
