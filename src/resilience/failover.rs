//! Failover execution.
//!
//! # Responsibilities
//! - Run one logical operation against the selected node
//! - On node failure, retry on every other available node in a stable order
//! - Soft-mark failed nodes so later requests avoid them before the next probe
//!
//! # Design Decisions
//! - Candidate order: selected node, then configuration order
//! - No retry on the same node within one call
//! - Logical errors (duplicate id) are returned without trying other nodes
//! - The default node is reselected after every call

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::backend::{BackendError, NodeBackend};
use crate::error::{Result, RouterError};
use crate::health::state::HealthState;
use crate::load_balancer::node::{Node, NodeId};
use crate::load_balancer::pool::NodeSet;
use crate::observability::metrics;
use crate::resilience::timeouts::with_timeout;
use crate::routing::shard::Shard;

/// Runs operations with transparent failover across nodes.
#[derive(Debug, Clone)]
pub struct FailoverExecutor {
    nodes: Arc<NodeSet>,
    health: Arc<HealthState>,
    operation_timeout: Duration,
}

impl FailoverExecutor {
    pub fn new(nodes: Arc<NodeSet>, health: Arc<HealthState>, operation_timeout: Duration) -> Self {
        Self {
            nodes,
            health,
            operation_timeout,
        }
    }

    /// Candidate order for an operation: `selected` first, then every other
    /// available node able to serve `scope`, in configuration order.
    pub fn candidates(&self, selected: NodeId, scope: Option<Shard>) -> Vec<Arc<Node>> {
        let table = self.health.snapshot();
        let mut candidates: Vec<Arc<Node>> = self.nodes.get(selected).cloned().into_iter().collect();
        candidates.extend(
            self.nodes
                .serving(scope)
                .filter(|n| n.id() != selected && table.is_available(n.id()))
                .cloned(),
        );
        candidates
    }

    /// Run `op` starting with `selected`. Returns the first success, or
    /// `AllNodesFailed` once every candidate has failed.
    pub async fn execute<T, F, Fut>(&self, selected: NodeId, scope: Option<Shard>, op: F) -> Result<T>
    where
        F: Fn(Arc<dyn NodeBackend>) -> Fut,
        Fut: Future<Output = std::result::Result<T, BackendError>>,
    {
        let candidates = self.candidates(selected, scope);
        if candidates.is_empty() {
            return Err(RouterError::NoAvailableNode);
        }

        let mut failures = 0usize;
        let mut last_error = None;

        for node in &candidates {
            let id = node.id();
            match with_timeout(self.operation_timeout, op(node.backend.clone())).await {
                Ok(value) => {
                    if failures > 0 {
                        tracing::info!(node = %id, failures, "Operation recovered on alternate node");
                    }
                    self.health.reselect_default();
                    return Ok(value);
                }
                Err(e) if !e.is_node_failure() => {
                    self.health.reselect_default();
                    return Err(RouterError::from_backend(e));
                }
                Err(e) => {
                    failures += 1;
                    tracing::warn!(node = %id, error = %e, attempt = failures, "Operation failed, marking node unavailable");
                    metrics::record_failover(&id.to_string());
                    self.health.mark_suspect(id);
                    last_error = Some(e);
                }
            }
        }

        self.health.reselect_default();
        tracing::error!(attempts = failures, "All candidate nodes failed");
        Err(RouterError::AllNodesFailed {
            attempts: failures,
            last: last_error
                .unwrap_or_else(|| BackendError::Unavailable("no candidates".to_string())),
        })
    }
}
