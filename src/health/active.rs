//! Active health checking.
//!
//! # Responsibilities
//! - Periodically probe every node
//! - Replace the availability table with the results

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::future::join_all;
use tokio::sync::broadcast;
use tokio::time::{self, MissedTickBehavior};

use crate::config::HealthCheckConfig;
use crate::health::state::{AvailabilityTable, HealthState};
use crate::load_balancer::node::NodeId;
use crate::load_balancer::pool::NodeSet;
use crate::observability::metrics;
use crate::resilience::timeouts::with_timeout;

pub struct HealthMonitor {
    nodes: Arc<NodeSet>,
    health: Arc<HealthState>,
    config: HealthCheckConfig,
    in_flight: AtomicBool,
}

impl HealthMonitor {
    pub fn new(nodes: Arc<NodeSet>, health: Arc<HealthState>, config: HealthCheckConfig) -> Self {
        Self {
            nodes,
            health,
            config,
            in_flight: AtomicBool::new(false),
        }
    }

    /// Probe every node once and publish the results. Returns false without
    /// probing when another cycle is still running.
    pub async fn probe_all(&self) -> bool {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::debug!("Probe cycle already running, skipping");
            return false;
        }
        let _cycle = CycleGuard(&self.in_flight);

        let started = Instant::now();
        let timeout = Duration::from_millis(self.config.timeout_ms);

        let probes = self.nodes.all().iter().map(|node| async move {
            let result = with_timeout(timeout, node.backend.ping()).await;
            if let Err(e) = &result {
                tracing::debug!(node = %node.id(), error = %e, "Probe failed");
            }
            (node.id(), result.is_ok())
        });
        let results: Vec<(NodeId, bool)> = join_all(probes).await;

        let previous = self.health.snapshot();
        let next = self.health.apply_probe(results);
        log_transitions(&previous, &next);

        for (id, status) in next.entries() {
            metrics::record_node_health(&id.to_string(), status.is_available());
        }
        metrics::record_probe_cycle(started);
        true
    }

    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        if !self.config.enabled {
            tracing::info!("Periodic health checks disabled");
            return;
        }

        tracing::info!(
            interval = self.config.interval_secs,
            timeout_ms = self.config.timeout_ms,
            "Health monitor starting"
        );

        let interval = Duration::from_secs(self.config.interval_secs);
        // The startup probe already ran, so the first tick waits a full interval.
        let mut ticker = time::interval_at(time::Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.probe_all().await;
                }
                _ = shutdown.recv() => {
                    tracing::info!("Health monitor received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }
}

/// Clears the in-flight flag even if the cycle is dropped midway.
struct CycleGuard<'a>(&'a AtomicBool);

impl Drop for CycleGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

fn log_transitions(previous: &AvailabilityTable, next: &AvailabilityTable) {
    for (id, status) in next.entries() {
        let was_up = previous.is_available(id);
        let is_up = status.is_available();
        if was_up && !is_up {
            tracing::warn!(node = %id, "Node down");
        } else if !was_up && is_up {
            tracing::info!(node = %id, "Node available");
        }
    }
    if next.default_node().is_none() {
        tracing::error!("No nodes available");
    }
}
