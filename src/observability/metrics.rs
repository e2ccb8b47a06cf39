//! Metrics collection and exposition.
//!
//! # Metrics
//! - `router_requests_total` (counter): requests by method, route, status
//! - `router_request_duration_seconds` (histogram): latency by route
//! - `router_node_available` (gauge): 1=available, 0=unavailable
//! - `router_failovers_total` (counter): failed attempts by node
//! - `router_probe_cycle_seconds` (histogram): duration of a probe cycle

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(method: &str, status: u16, route: &str, start: Instant) {
    metrics::counter!(
        "router_requests_total",
        "method" => method.to_string(),
        "route" => route.to_string(),
        "status" => status.to_string(),
    )
    .increment(1);

    metrics::histogram!(
        "router_request_duration_seconds",
        "route" => route.to_string(),
    )
    .record(start.elapsed().as_secs_f64());
}

pub fn record_node_health(node: &str, available: bool) {
    metrics::gauge!("router_node_available", "node" => node.to_string())
        .set(if available { 1.0 } else { 0.0 });
}

pub fn record_failover(node: &str) {
    metrics::counter!("router_failovers_total", "node" => node.to_string()).increment(1);
}

pub fn record_probe_cycle(start: Instant) {
    metrics::histogram!("router_probe_cycle_seconds").record(start.elapsed().as_secs_f64());
}
