//! Node selection subsystem.
//!
//! # Data Flow
//! ```text
//! Request (optional node preference, optional shard scope)
//!     → selector.rs (read the availability snapshot)
//!         - preferred node, if available and serving the scope
//!         - else the default node, if it serves the scope
//!         - else a strategy pick among available nodes serving the scope
//!     → NodeId handed to the failover executor, or none (503)
//!
//! Default node:
//!     health::state recomputes it with a SelectionStrategy:
//!         - random.rs (uniform among available nodes)
//!         - round_robin.rs (rotate through available nodes)
//! ```
//!
//! # Design Decisions
//! - Selection is side-effect free; it only reads shared state
//! - Strategies see plain id lists, so they can be swapped without touching callers
//! - Node descriptors are static; roles decide which shards a node can serve

pub mod node;
pub mod pool;
pub mod random;
pub mod round_robin;
pub mod selector;

use std::sync::Arc;

use crate::config::StrategyKind;
use node::NodeId;

/// Chooses one node among candidates.
pub trait SelectionStrategy: Send + Sync + std::fmt::Debug {
    /// Returns `None` only when `candidates` is empty.
    fn pick(&self, candidates: &[NodeId]) -> Option<NodeId>;
}

/// Build the configured strategy.
pub fn strategy_for(kind: StrategyKind) -> Arc<dyn SelectionStrategy> {
    match kind {
        StrategyKind::Random => Arc::new(random::RandomChoice::new()),
        StrategyKind::RoundRobin => Arc::new(round_robin::RoundRobin::new()),
    }
}

pub use node::{Node, NodeDescriptor, Role};
pub use pool::NodeSet;
pub use selector::NodeSelector;
