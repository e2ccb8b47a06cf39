//! Timeout enforcement.
//!
//! # Responsibilities
//! - Bound every node operation and probe with a deadline
//! - Report expiry as a node failure
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities
//! - A timed-out operation is dropped, never left running

use std::future::Future;
use std::time::Duration;

use crate::backend::BackendError;

/// Run `fut` with a deadline of `limit`.
pub async fn with_timeout<T, F>(limit: Duration, fut: F) -> Result<T, BackendError>
where
    F: Future<Output = Result<T, BackendError>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(BackendError::Timeout(limit)),
    }
}
