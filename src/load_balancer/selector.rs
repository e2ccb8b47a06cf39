//! Node selection for a single operation.

use std::sync::Arc;

use crate::health::state::HealthState;
use crate::load_balancer::node::NodeId;
use crate::load_balancer::pool::NodeSet;
use crate::routing::shard::Shard;

/// Picks the first node to try for an operation.
#[derive(Debug, Clone)]
pub struct NodeSelector {
    nodes: Arc<NodeSet>,
    health: Arc<HealthState>,
}

impl NodeSelector {
    pub fn new(nodes: Arc<NodeSet>, health: Arc<HealthState>) -> Self {
        Self { nodes, health }
    }

    /// Choose a node for `scope` (any shard when `None`), honoring
    /// `preference` when that node is available. Returns `None` when no
    /// available node can serve the scope.
    pub fn select(&self, preference: Option<NodeId>, scope: Option<Shard>) -> Option<NodeId> {
        let table = self.health.snapshot();
        let eligible = |id: NodeId| {
            table.is_available(id)
                && self
                    .nodes
                    .get(id)
                    .is_some_and(|node| node.serves_scope(scope))
        };

        if let Some(preferred) = preference {
            if eligible(preferred) {
                return Some(preferred);
            }
            tracing::debug!(node = %preferred, "Preferred node unavailable, using default");
        }

        if let Some(default) = table.default_node().filter(|id| eligible(*id)) {
            return Some(default);
        }

        let candidates: Vec<NodeId> = self
            .nodes
            .serving(scope)
            .map(|n| n.id())
            .filter(|id| table.is_available(*id))
            .collect();
        self.health.strategy().pick(&candidates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;
    use crate::load_balancer::node::{Node, NodeDescriptor, Role};
    use crate::load_balancer::round_robin::RoundRobin;

    fn setup() -> (NodeSelector, Arc<HealthState>) {
        let nodes = Arc::new(NodeSet::new(vec![
            node(1, Role::Master),
            node(2, Role::Replica(Shard::Luzon)),
            node(3, Role::Replica(Shard::Vismin)),
        ]));
        let health = Arc::new(HealthState::new(nodes.ids(), Arc::new(RoundRobin::new())));
        (NodeSelector::new(nodes, health.clone()), health)
    }

    fn node(id: u32, role: Role) -> Node {
        Node::new(
            NodeDescriptor {
                id: NodeId(id),
                role,
                target: format!("memory://node{id}"),
            },
            Arc::new(MemoryBackend::new(format!("node{id}"))),
        )
    }

    #[test]
    fn test_none_when_nothing_available() {
        let (selector, _) = setup();
        assert_eq!(selector.select(None, None), None);
        assert_eq!(selector.select(Some(NodeId(1)), None), None);
    }

    #[test]
    fn test_available_preference_wins() {
        let (selector, health) = setup();
        health.apply_probe([(NodeId(1), true), (NodeId(2), true), (NodeId(3), true)]);
        for _ in 0..5 {
            assert_eq!(selector.select(Some(NodeId(3)), None), Some(NodeId(3)));
        }
    }

    #[test]
    fn test_unavailable_preference_falls_back_to_default() {
        let (selector, health) = setup();
        let table = health.apply_probe([(NodeId(1), true), (NodeId(2), true), (NodeId(3), false)]);
        let picked = selector.select(Some(NodeId(3)), None);
        assert_eq!(picked, table.default_node());
        assert!(picked.is_some());
    }

    #[test]
    fn test_scope_excludes_other_region_replica() {
        let (selector, health) = setup();
        health.apply_probe([(NodeId(1), false), (NodeId(2), true), (NodeId(3), true)]);

        for _ in 0..10 {
            assert_eq!(selector.select(None, Some(Shard::Luzon)), Some(NodeId(2)));
            assert_eq!(selector.select(Some(NodeId(2)), Some(Shard::Vismin)), Some(NodeId(3)));
        }
    }

    #[test]
    fn test_scope_without_serving_node() {
        let (selector, health) = setup();
        health.apply_probe([(NodeId(1), false), (NodeId(2), true), (NodeId(3), false)]);
        assert_eq!(selector.select(None, Some(Shard::Vismin)), None);
    }
}
