//! Appointment operations over the sharded node set.
//!
//! # Responsibilities
//! - Route each operation to the shard(s) that own the data
//! - Pick the first node through the selector, fail over through the executor
//! - Move records whose region changes shard
//!
//! # Design Decisions
//! - Lookups by identifier consult Luzon first, then Vismin
//! - A failed shard is an error, not a miss
//! - Cross-shard moves are delete-then-insert with a compensating restore

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::backend::record::{generate_apptid, is_valid_apptid};
use crate::backend::{
    AppointmentDraft, AppointmentPatch, AppointmentRecord, BackendError, NodeBackend,
};
use crate::config::{FailoverConfig, ReadConfig};
use crate::error::{Result, RouterError};
use crate::health::state::HealthState;
use crate::load_balancer::node::NodeId;
use crate::load_balancer::pool::NodeSet;
use crate::load_balancer::NodeSelector;
use crate::resilience::FailoverExecutor;
use crate::routing::merge::{merge_pages, PageWindow};
use crate::routing::shard::{Shard, ShardMap};

/// Entry point for every appointment operation.
#[derive(Debug, Clone)]
pub struct AppointmentRouter {
    selector: NodeSelector,
    executor: FailoverExecutor,
    shards: ShardMap,
    reads: ReadConfig,
}

impl AppointmentRouter {
    pub fn new(
        nodes: Arc<NodeSet>,
        health: Arc<HealthState>,
        shards: ShardMap,
        failover: &FailoverConfig,
        reads: ReadConfig,
    ) -> Self {
        Self {
            selector: NodeSelector::new(nodes.clone(), health.clone()),
            executor: FailoverExecutor::new(
                nodes,
                health,
                Duration::from_millis(failover.operation_timeout_ms),
            ),
            shards,
            reads,
        }
    }

    pub fn shards(&self) -> &ShardMap {
        &self.shards
    }

    /// Select a node for `shard` and run `op` with failover.
    async fn on_shard<T, F, Fut>(&self, preference: Option<NodeId>, shard: Shard, op: F) -> Result<T>
    where
        F: Fn(Arc<dyn NodeBackend>) -> Fut,
        Fut: Future<Output = std::result::Result<T, BackendError>>,
    {
        let selected = self
            .selector
            .select(preference, Some(shard))
            .ok_or(RouterError::NoAvailableNode)?;
        tracing::debug!(node = %selected, shard = %shard, "Node selected");
        self.executor.execute(selected, Some(shard), op).await
    }

    /// Total number of records across shards.
    pub async fn size(&self, preference: Option<NodeId>) -> Result<u64> {
        let mut total = 0;
        for shard in Shard::ALL {
            let filter = self.shards.filter(shard);
            let filter = &filter;
            total += self
                .on_shard(preference, shard, |node| async move { node.count(filter).await })
                .await?;
        }
        Ok(total)
    }

    /// One page of the combined dataset, ordered by identifier.
    pub async fn list_page(
        &self,
        page_size: usize,
        page_index: usize,
        preference: Option<NodeId>,
    ) -> Result<Vec<AppointmentRecord>> {
        let window = PageWindow::new(self.reads.merge_mode, page_size, page_index);
        let mut pages = Vec::with_capacity(Shard::ALL.len());
        for shard in Shard::ALL {
            let filter = self.shards.filter(shard);
            let filter = &filter;
            let page = self
                .on_shard(preference, shard, |node| async move {
                    node.list(filter, window.offset, window.limit).await
                })
                .await?;
            pages.push(page);
        }
        Ok(merge_pages(pages, &window))
    }

    /// Find a record and the shard holding it.
    async fn locate(
        &self,
        apptid: &str,
        preference: Option<NodeId>,
    ) -> Result<Option<(Shard, AppointmentRecord)>> {
        for shard in Shard::ALL {
            let filter = self.shards.filter(shard);
            let filter = &filter;
            let found = self
                .on_shard(preference, shard, |node| async move { node.find(filter, apptid).await })
                .await?;
            if let Some(record) = found {
                return Ok(Some((shard, record)));
            }
        }
        Ok(None)
    }

    pub async fn get(&self, apptid: &str, preference: Option<NodeId>) -> Result<AppointmentRecord> {
        self.locate(apptid, preference)
            .await?
            .map(|(_, record)| record)
            .ok_or_else(|| RouterError::NotFound(apptid.to_string()))
    }

    /// Insert a new record into the shard owning its region. Returns the
    /// identifier, generated when the draft carries none.
    pub async fn create(&self, draft: AppointmentDraft, preference: Option<NodeId>) -> Result<String> {
        if draft.region_name.trim().is_empty() {
            return Err(RouterError::InvalidInput("RegionName is required".to_string()));
        }
        let apptid = match draft.apptid.clone() {
            Some(id) if is_valid_apptid(&id) => id,
            Some(id) => {
                return Err(RouterError::InvalidInput(format!(
                    "apptid must be 32 characters from [A-Z0-9], got '{id}'"
                )))
            }
            None => generate_apptid(),
        };

        let record = draft.into_record(apptid.clone());
        let shard = self.shards.resolve(&record.region_name);
        let record = &record;
        self.on_shard(preference, shard, |node| async move { node.insert(record).await })
            .await?;

        tracing::info!(apptid = %apptid, shard = %shard, "Appointment created");
        Ok(apptid)
    }

    /// Apply `patch` to a stored record, moving it when its region now
    /// belongs to the other shard.
    pub async fn update(
        &self,
        apptid: &str,
        patch: AppointmentPatch,
        preference: Option<NodeId>,
    ) -> Result<AppointmentRecord> {
        let (from, current) = self
            .locate(apptid, preference)
            .await?
            .ok_or_else(|| RouterError::NotFound(apptid.to_string()))?;

        let updated = patch.apply(&current);
        if updated.region_name.trim().is_empty() {
            return Err(RouterError::InvalidInput("RegionName cannot be empty".to_string()));
        }
        let to = self.shards.resolve(&updated.region_name);

        if from == to {
            let record = &updated;
            let found = self
                .on_shard(preference, to, |node| async move { node.update(record).await })
                .await?;
            if !found {
                return Err(RouterError::NotFound(apptid.to_string()));
            }
            tracing::debug!(apptid = %apptid, shard = %to, "Appointment updated in place");
        } else {
            self.move_record(&current, &updated, from, to, preference).await?;
        }
        Ok(updated)
    }

    async fn move_record(
        &self,
        original: &AppointmentRecord,
        updated: &AppointmentRecord,
        from: Shard,
        to: Shard,
        preference: Option<NodeId>,
    ) -> Result<()> {
        let apptid = original.apptid.as_str();
        let old_filter = self.shards.filter(from);
        let old_filter = &old_filter;

        let removed = self
            .on_shard(preference, from, |node| async move { node.delete(old_filter, apptid).await })
            .await?;
        if !removed {
            return Err(RouterError::NotFound(apptid.to_string()));
        }

        let inserted = self
            .on_shard(preference, to, |node| async move { node.insert(updated).await })
            .await;
        let cause = match inserted {
            Ok(()) => {
                tracing::info!(apptid = %apptid, from = %from, to = %to, "Appointment moved");
                return Ok(());
            }
            Err(e) => e,
        };

        tracing::warn!(apptid = %apptid, from = %from, to = %to, error = %cause, "Move failed, restoring original");
        let restored = self
            .on_shard(preference, from, |node| async move { node.insert(original).await })
            .await;
        match restored {
            Ok(()) => Err(cause),
            Err(restore_err) => {
                tracing::error!(
                    apptid = %apptid,
                    from = %from,
                    to = %to,
                    error = %cause,
                    restore_error = %restore_err,
                    "Appointment lost during move"
                );
                Err(RouterError::PartialMove {
                    apptid: apptid.to_string(),
                    from: from.to_string(),
                    to: to.to_string(),
                    cause: format!("{cause}; restore failed: {restore_err}"),
                })
            }
        }
    }

    /// Delete a record from whichever shard holds it.
    pub async fn delete(&self, apptid: &str, preference: Option<NodeId>) -> Result<()> {
        for shard in Shard::ALL {
            let filter = self.shards.filter(shard);
            let filter = &filter;
            let removed = self
                .on_shard(preference, shard, |node| async move { node.delete(filter, apptid).await })
                .await?;
            if removed {
                tracing::info!(apptid = %apptid, shard = %shard, "Appointment deleted");
                return Ok(());
            }
        }
        Err(RouterError::NotFound(apptid.to_string()))
    }
}
