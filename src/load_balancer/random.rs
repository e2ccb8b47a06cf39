//! Uniform random selection strategy.

use rand::seq::SliceRandom;

use crate::load_balancer::{node::NodeId, SelectionStrategy};

/// Picks uniformly among candidates. Spreads reads across healthy nodes
/// without tracking load.
#[derive(Debug, Default)]
pub struct RandomChoice;

impl RandomChoice {
    pub fn new() -> Self {
        Self
    }
}

impl SelectionStrategy for RandomChoice {
    fn pick(&self, candidates: &[NodeId]) -> Option<NodeId> {
        candidates.choose(&mut rand::thread_rng()).copied()
    }
}
