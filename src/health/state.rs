//! Node availability state.
//!
//! # States
//! - Up: node receives traffic
//! - Down: last probe failed (hard mark, written by the monitor)
//! - Suspect: an operation failed since the last probe (soft mark, written
//!   by the failover executor)
//!
//! # State Transitions
//! ```text
//! probe cycle:        every node → Up | Down   (soft marks cleared)
//! failed operation:   Up → Suspect
//! ```
//!
//! # Design Decisions
//! - The table and the default node form one immutable snapshot
//! - Writers replace the snapshot atomically; readers never see a torn table
//! - The default node is recomputed inside every replacement, so it is
//!   always available in the snapshot that carries it

use std::collections::BTreeMap;
use std::sync::Arc;

use arc_swap::ArcSwap;
use serde::Serialize;

use crate::load_balancer::{node::NodeId, SelectionStrategy};

/// Status of one node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeStatus {
    Up,
    Down,
    Suspect,
}

impl NodeStatus {
    pub fn is_available(self) -> bool {
        self == NodeStatus::Up
    }
}

/// Immutable snapshot of node availability.
#[derive(Debug, Clone, Default)]
pub struct AvailabilityTable {
    entries: BTreeMap<NodeId, NodeStatus>,
    default_node: Option<NodeId>,
    cycles: u64,
}

impl AvailabilityTable {
    pub fn status(&self, id: NodeId) -> Option<NodeStatus> {
        self.entries.get(&id).copied()
    }

    pub fn is_available(&self, id: NodeId) -> bool {
        self.status(id).is_some_and(NodeStatus::is_available)
    }

    /// Available nodes in id order.
    pub fn available(&self) -> Vec<NodeId> {
        self.entries
            .iter()
            .filter(|(_, s)| s.is_available())
            .map(|(id, _)| *id)
            .collect()
    }

    pub fn any_available(&self) -> bool {
        self.entries.values().any(|s| s.is_available())
    }

    pub fn default_node(&self) -> Option<NodeId> {
        self.default_node
    }

    pub fn entries(&self) -> impl Iterator<Item = (NodeId, NodeStatus)> + '_ {
        self.entries.iter().map(|(id, s)| (*id, *s))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Probe cycles applied so far.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    fn with_default(mut self, strategy: &dyn SelectionStrategy) -> Self {
        self.default_node = strategy.pick(&self.available());
        self
    }
}

/// Shared handle over the current availability snapshot.
pub struct HealthState {
    table: ArcSwap<AvailabilityTable>,
    strategy: Arc<dyn SelectionStrategy>,
}

impl std::fmt::Debug for HealthState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HealthState")
            .field("table", &self.table.load_full())
            .field("strategy", &self.strategy)
            .finish()
    }
}

impl HealthState {
    /// Every node starts Down until the first probe completes.
    pub fn new(ids: impl IntoIterator<Item = NodeId>, strategy: Arc<dyn SelectionStrategy>) -> Self {
        let table = AvailabilityTable {
            entries: ids.into_iter().map(|id| (id, NodeStatus::Down)).collect(),
            default_node: None,
            cycles: 0,
        };
        Self {
            table: ArcSwap::from_pointee(table),
            strategy,
        }
    }

    pub fn snapshot(&self) -> Arc<AvailabilityTable> {
        self.table.load_full()
    }

    pub fn strategy(&self) -> &dyn SelectionStrategy {
        self.strategy.as_ref()
    }

    /// Replace the table with the results of a probe cycle. Nodes missing from
    /// `results` are marked Down. Returns the new snapshot.
    pub fn apply_probe(
        &self,
        results: impl IntoIterator<Item = (NodeId, bool)>,
    ) -> Arc<AvailabilityTable> {
        let results: BTreeMap<NodeId, bool> = results.into_iter().collect();
        let previous = self.table.load();
        let entries = previous
            .entries
            .keys()
            .map(|id| {
                let up = results.get(id).copied().unwrap_or(false);
                (*id, if up { NodeStatus::Up } else { NodeStatus::Down })
            })
            .collect();
        let next = Arc::new(
            AvailabilityTable {
                entries,
                default_node: None,
                cycles: previous.cycles + 1,
            }
            .with_default(self.strategy()),
        );
        self.table.store(next.clone());
        next
    }

    /// Soft-mark a node after a failed operation. Returns true when the node
    /// was available before the call.
    pub fn mark_suspect(&self, id: NodeId) -> bool {
        let previous = self.table.rcu(|current| {
            let mut next = AvailabilityTable::clone(current);
            if let Some(status) = next.entries.get_mut(&id) {
                if *status == NodeStatus::Up {
                    *status = NodeStatus::Suspect;
                }
            }
            next.with_default(self.strategy())
        });
        previous.is_available(id)
    }

    /// Pick a fresh default node among the currently available ones.
    pub fn reselect_default(&self) {
        self.table
            .rcu(|current| AvailabilityTable::clone(current).with_default(self.strategy()));
    }
}
