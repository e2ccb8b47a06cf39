//! Health checking subsystem.
//!
//! # Data Flow
//! ```text
//! Active health checks (active.rs):
//!     Blocking first probe at startup
//!     → Periodic timer
//!     → Probe each node (concurrently, bounded by timeout)
//!     → Replace state.rs snapshot (hard marks)
//!
//! Passive failure detection (resilience::failover):
//!     Operation failure observed
//!     → Soft-mark node in state.rs
//!     → Cleared by the next probe cycle
//! ```
//!
//! # Design Decisions
//! - The monitor is the only writer of hard marks
//! - Probe failures are logged, never surfaced to callers
//! - Cycles never overlap

pub mod active;
pub mod state;

pub use active::HealthMonitor;
pub use state::{AvailabilityTable, HealthState, NodeStatus};
