//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Operation on a node:
//!     → timeouts.rs (bound every node call by a deadline)
//!     → On node failure: failover.rs (soft-mark, try the next candidate)
//!     → All candidates failed: AllNodesFailed to the caller
//! ```
//!
//! # Design Decisions
//! - Every node call has a deadline; a stalled node counts as failed
//! - Each node is tried at most once per logical operation
//! - Duplicate identifiers are data errors, not node failures

pub mod failover;
pub mod timeouts;

pub use failover::FailoverExecutor;
