//! Node set management.
//!
//! # Responsibilities
//! - Hold every configured node in configuration order
//! - Look nodes up by id
//! - Provide the stable order used for failover candidates

use std::sync::Arc;

use crate::backend::BackendError;
use crate::config::NodeConfig;
use crate::load_balancer::node::{Node, NodeId};
use crate::routing::shard::Shard;

/// The static set of backend nodes.
#[derive(Debug, Clone, Default)]
pub struct NodeSet {
    nodes: Vec<Arc<Node>>,
}

impl NodeSet {
    pub fn new(nodes: Vec<Node>) -> Self {
        Self {
            nodes: nodes.into_iter().map(Arc::new).collect(),
        }
    }

    /// Open every configured node. Fails on the first unusable target.
    pub fn connect(configs: &[NodeConfig]) -> Result<Self, BackendError> {
        let mut nodes = Vec::with_capacity(configs.len());
        for config in configs {
            let node = Node::connect(config)?;
            tracing::info!(
                node = %node.id(),
                role = ?node.descriptor.role,
                target = %node.descriptor.target,
                "Node configured"
            );
            nodes.push(node);
        }
        Ok(Self::new(nodes))
    }

    pub fn get(&self, id: NodeId) -> Option<&Arc<Node>> {
        self.nodes.iter().find(|n| n.id() == id)
    }

    pub fn ids(&self) -> Vec<NodeId> {
        self.nodes.iter().map(|n| n.id()).collect()
    }

    /// All nodes, in configuration order.
    pub fn all(&self) -> &[Arc<Node>] {
        &self.nodes
    }

    /// Nodes able to serve `scope`, in configuration order.
    pub fn serving(&self, scope: Option<Shard>) -> impl Iterator<Item = &Arc<Node>> {
        self.nodes.iter().filter(move |n| n.serves_scope(scope))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
