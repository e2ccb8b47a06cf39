//! Round-robin selection strategy.

use std::sync::atomic::{AtomicU32, Ordering};

use crate::load_balancer::{node::NodeId, SelectionStrategy};

/// Rotates through node ids in ascending order.
///
/// Remembers the last id handed out rather than a position, so the rotation
/// stays fair when the candidate list shrinks or grows between picks.
#[derive(Debug, Default)]
pub struct RoundRobin {
    last: AtomicU32,
}

impl RoundRobin {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SelectionStrategy for RoundRobin {
    fn pick(&self, candidates: &[NodeId]) -> Option<NodeId> {
        let first = *candidates.iter().min()?;
        let last = self.last.load(Ordering::Relaxed);
        let next = candidates
            .iter()
            .copied()
            .filter(|id| id.0 > last)
            .min()
            .unwrap_or(first);
        self.last.store(next.0, Ordering::Relaxed);
        Some(next)
    }
}
