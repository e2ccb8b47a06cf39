//! Router error types.

use thiserror::Error;

use crate::backend::BackendError;

/// Errors surfaced by the routing core.
#[derive(Error, Debug)]
pub enum RouterError {
    /// No available node can serve the request.
    #[error("no available node")]
    NoAvailableNode,

    /// Every candidate node failed the operation.
    #[error("all nodes are unavailable ({attempts} attempts, last error: {last})")]
    AllNodesFailed { attempts: usize, last: BackendError },

    /// The record does not exist on any shard consulted.
    #[error("appointment not found: {0}")]
    NotFound(String),

    /// The request is malformed.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A record with the same identifier already exists.
    #[error("duplicate appointment: {0}")]
    Conflict(String),

    /// A cross-shard move removed the record from its old shard but could
    /// neither insert it into the new shard nor restore it.
    #[error("appointment {apptid} lost while moving from {from} to {to}: {cause}")]
    PartialMove {
        apptid: String,
        from: String,
        to: String,
        cause: String,
    },
}

impl RouterError {
    /// Map a non-node backend error (one the failover executor returns
    /// without trying other nodes).
    pub fn from_backend(err: BackendError) -> Self {
        match err {
            BackendError::Conflict(id) => RouterError::Conflict(id),
            other => RouterError::AllNodesFailed {
                attempts: 1,
                last: other,
            },
        }
    }
}

/// Result alias for routing operations.
pub type Result<T> = std::result::Result<T, RouterError>;
