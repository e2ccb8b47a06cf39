//! Node abstraction.
//!
//! # Responsibilities
//! - Describe a single backend node (id, role, target)
//! - Own the storage adapter used to reach it
//! - Answer which shards a node can serve

use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::backend::{self, BackendError, NodeBackend};
use crate::config::{NodeConfig, NodeRole};
use crate::routing::shard::Shard;

/// Node identifier as configured (`1`, `2`, ...). Displays as `node<id>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct NodeId(pub u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node{}", self.0)
    }
}

/// Static role of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Writable central node holding every shard.
    Master,
    /// Regional node holding one shard.
    Replica(Shard),
    /// Unsharded node holding everything.
    Peer,
}

impl Role {
    /// True when this role holds the records of `shard`.
    pub fn serves(&self, shard: Shard) -> bool {
        match self {
            Role::Master | Role::Peer => true,
            Role::Replica(own) => *own == shard,
        }
    }

    /// Like `serves`, treating `None` as "any shard".
    pub fn serves_scope(&self, scope: Option<Shard>) -> bool {
        scope.map_or(true, |shard| self.serves(shard))
    }
}

/// Immutable description of a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeDescriptor {
    pub id: NodeId,
    pub role: Role,
    pub target: String,
}

impl NodeDescriptor {
    pub fn from_config(config: &NodeConfig) -> Self {
        let role = match (config.role, config.shard) {
            (NodeRole::Master, _) => Role::Master,
            (NodeRole::Peer, _) => Role::Peer,
            (NodeRole::Replica, Some(shard)) => Role::Replica(shard),
            // Validation rejects shardless replicas; treat a stray one as a peer.
            (NodeRole::Replica, None) => Role::Peer,
        };
        Self {
            id: NodeId(config.id),
            role,
            target: config.target.clone(),
        }
    }
}

/// A configured node together with its storage adapter.
#[derive(Debug, Clone)]
pub struct Node {
    pub descriptor: NodeDescriptor,
    pub backend: Arc<dyn NodeBackend>,
}

impl Node {
    pub fn new(descriptor: NodeDescriptor, backend: Arc<dyn NodeBackend>) -> Self {
        Self {
            descriptor,
            backend,
        }
    }

    /// Build the node and open its adapter from the target URL.
    pub fn connect(config: &NodeConfig) -> Result<Self, BackendError> {
        let descriptor = NodeDescriptor::from_config(config);
        let backend = backend::connect(&descriptor.target)?;
        Ok(Self::new(descriptor, backend))
    }

    pub fn id(&self) -> NodeId {
        self.descriptor.id
    }

    pub fn serves_scope(&self, scope: Option<Shard>) -> bool {
        self.descriptor.role.serves_scope(scope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_coverage() {
        assert!(Role::Master.serves(Shard::Luzon));
        assert!(Role::Peer.serves(Shard::Vismin));
        assert!(Role::Replica(Shard::Luzon).serves(Shard::Luzon));
        assert!(!Role::Replica(Shard::Luzon).serves(Shard::Vismin));
        assert!(Role::Replica(Shard::Vismin).serves_scope(None));
    }

    #[test]
    fn test_descriptor_from_config() {
        let config = NodeConfig {
            id: 3,
            role: NodeRole::Replica,
            shard: Some(Shard::Vismin),
            target: "memory://node3".into(),
        };
        let node = Node::connect(&config).unwrap();
        assert_eq!(node.id(), NodeId(3));
        assert_eq!(node.descriptor.role, Role::Replica(Shard::Vismin));
        assert_eq!(node.id().to_string(), "node3");
    }
}
