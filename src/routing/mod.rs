//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Appointment operation (id, region, optional node preference)
//!     → shard.rs (region → Luzon | Vismin, storage filter)
//!     → router.rs (per-shard dispatch through selector + failover)
//!     → merge.rs (cross-shard pages, listings only)
//!     → Return: record(s), count, or RouterError
//! ```
//!
//! # Design Decisions
//! - Shard assignment compiled at startup, immutable at runtime
//! - Deterministic: the same region always resolves to the same shard
//! - Each shard fetch is independent; one failing shard fails the request

pub mod merge;
pub mod router;
pub mod shard;

pub use router::AppointmentRouter;
pub use shard::{Shard, ShardMap};
