//! Node storage adapters.
//!
//! # Data Flow
//! ```text
//! NodeConfig.target (URL)
//!     → connect() picks an adapter by scheme:
//!         - memory.rs (memory://name, in-process store)
//!         - sqlite.rs (sqlite://path, relational node)
//!     → Arc<dyn NodeBackend> owned by the node set
//! ```
//!
//! # Design Decisions
//! - Every query takes a RegionFilter so a node holding several shards
//!   only answers for the shard the caller is scoped to
//! - Listings are ordered by identifier; the cross-shard merge relies on it
//! - Errors distinguish node failures from logical ones (duplicate id)

pub mod memory;
pub mod record;
pub mod sqlite;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use url::Url;

pub use memory::MemoryBackend;
pub use record::{AppointmentDraft, AppointmentPatch, AppointmentRecord};
pub use sqlite::SqliteBackend;

/// Errors raised by a node adapter.
#[derive(Error, Debug, Clone)]
pub enum BackendError {
    /// The node could not be reached.
    #[error("node unavailable: {0}")]
    Unavailable(String),

    /// The node answered with a query error.
    #[error("query failed: {0}")]
    Query(String),

    /// The operation did not finish in time.
    #[error("operation timed out after {0:?}")]
    Timeout(Duration),

    /// A record with the same identifier already exists.
    #[error("duplicate identifier: {0}")]
    Conflict(String),

    /// The connection target is malformed or uses an unknown scheme.
    #[error("invalid target: {0}")]
    InvalidTarget(String),
}

impl BackendError {
    /// True when the error says something about the node rather than the data.
    pub fn is_node_failure(&self) -> bool {
        !matches!(self, BackendError::Conflict(_))
    }
}

impl From<rusqlite::Error> for BackendError {
    fn from(e: rusqlite::Error) -> Self {
        match e {
            rusqlite::Error::SqliteFailure(ref code, _)
                if code.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                BackendError::Conflict(e.to_string())
            }
            rusqlite::Error::SqliteFailure(ref code, _)
                if matches!(
                    code.code,
                    rusqlite::ErrorCode::CannotOpen
                        | rusqlite::ErrorCode::DatabaseBusy
                        | rusqlite::ErrorCode::DatabaseLocked
                ) =>
            {
                BackendError::Unavailable(e.to_string())
            }
            other => BackendError::Query(other.to_string()),
        }
    }
}

/// Storage predicate selecting the records of one shard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegionFilter {
    /// Every record.
    All,
    /// Records whose region is in the list (case-insensitive).
    In(Vec<String>),
    /// Records whose region is not in the list (case-insensitive).
    NotIn(Vec<String>),
}

impl RegionFilter {
    /// Evaluate the filter against a region name.
    pub fn matches(&self, region: &str) -> bool {
        let region = normalize_region(region);
        match self {
            RegionFilter::All => true,
            RegionFilter::In(list) => list.iter().any(|r| *r == region),
            RegionFilter::NotIn(list) => !list.iter().any(|r| *r == region),
        }
    }
}

/// Canonical form used for region comparisons.
pub fn normalize_region(region: &str) -> String {
    region.trim().to_lowercase()
}

/// One backend node, as seen by the router.
///
/// Implementations never retry internally; failover is the caller's job.
#[async_trait]
pub trait NodeBackend: Send + Sync + std::fmt::Debug {
    /// Side-effect-free liveness check.
    async fn ping(&self) -> Result<(), BackendError>;

    /// Records matching `filter`, ordered by identifier.
    async fn list(
        &self,
        filter: &RegionFilter,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<AppointmentRecord>, BackendError>;

    async fn count(&self, filter: &RegionFilter) -> Result<u64, BackendError>;

    async fn find(
        &self,
        filter: &RegionFilter,
        apptid: &str,
    ) -> Result<Option<AppointmentRecord>, BackendError>;

    /// Insert a new record. Fails with `Conflict` if the identifier exists.
    async fn insert(&self, record: &AppointmentRecord) -> Result<(), BackendError>;

    /// Replace a stored record. Returns false when it does not exist.
    async fn update(&self, record: &AppointmentRecord) -> Result<bool, BackendError>;

    /// Delete a record within `filter`. Returns false when nothing matched.
    async fn delete(&self, filter: &RegionFilter, apptid: &str) -> Result<bool, BackendError>;
}

/// Open the adapter named by a connection target.
pub fn connect(target: &str) -> Result<Arc<dyn NodeBackend>, BackendError> {
    if target == "sqlite::memory:" {
        return Ok(Arc::new(SqliteBackend::in_memory()?));
    }

    let url = Url::parse(target).map_err(|e| BackendError::InvalidTarget(format!("{target}: {e}")))?;
    match url.scheme() {
        "memory" => {
            let name = url.host_str().unwrap_or("default");
            Ok(Arc::new(MemoryBackend::new(name)))
        }
        "sqlite" => {
            let path = sqlite_path(&url);
            if path.is_empty() {
                return Err(BackendError::InvalidTarget(format!("{target}: missing path")));
            }
            Ok(Arc::new(SqliteBackend::open(&path)?))
        }
        other => Err(BackendError::InvalidTarget(format!(
            "{target}: unsupported scheme '{other}'"
        ))),
    }
}

/// Schemes `connect` understands.
pub fn is_supported_target(target: &str) -> bool {
    if target == "sqlite::memory:" {
        return true;
    }
    Url::parse(target)
        .map(|u| matches!(u.scheme(), "memory" | "sqlite"))
        .unwrap_or(false)
}

// `sqlite:///abs/path.db` has an empty host; `sqlite://data/node1.db` puts
// the first segment in the host.
fn sqlite_path(url: &Url) -> String {
    match url.host_str() {
        Some(host) if !host.is_empty() => format!("{}{}", host, url.path()),
        _ => url.path().to_string(),
    }
}
