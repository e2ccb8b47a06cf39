//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use appointment_router::backend::{AppointmentRecord, MemoryBackend};
use appointment_router::config::RouterConfig;
use appointment_router::health::HealthState;
use appointment_router::http::HttpServer;
use appointment_router::lifecycle::Shutdown;
use appointment_router::load_balancer::node::{Node, NodeDescriptor, NodeId, Role};
use appointment_router::load_balancer::NodeSet;
use appointment_router::routing::Shard;

pub const LUZON: &str = "National Capital Region (NCR)";
pub const VISMIN: &str = "Central Visayas (VII)";

/// A router serving on an ephemeral port over in-memory nodes.
pub struct TestRouter {
    pub addr: SocketAddr,
    pub health: Arc<HealthState>,
    pub backends: Vec<Arc<MemoryBackend>>,
    pub client: reqwest::Client,
    shutdown: Shutdown,
    handle: JoinHandle<()>,
}

impl TestRouter {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub async fn stop(self) {
        self.shutdown.trigger();
        let _ = tokio::time::timeout(Duration::from_secs(5), self.handle).await;
    }
}

/// Build memory nodes with ids 1..=n in the given roles.
pub fn memory_nodes(roles: &[Role]) -> (NodeSet, Vec<Arc<MemoryBackend>>) {
    let backends: Vec<Arc<MemoryBackend>> = (1..=roles.len())
        .map(|i| Arc::new(MemoryBackend::new(format!("node{i}"))))
        .collect();
    let nodes = roles
        .iter()
        .zip(&backends)
        .enumerate()
        .map(|(i, (role, backend))| {
            Node::new(
                NodeDescriptor {
                    id: NodeId(i as u32 + 1),
                    role: *role,
                    target: format!("memory://node{}", i + 1),
                },
                backend.clone(),
            )
        })
        .collect();
    (NodeSet::new(nodes), backends)
}

/// Luzon replica as node 1, Vismin replica as node 2.
pub fn replica_roles() -> Vec<Role> {
    vec![Role::Replica(Shard::Luzon), Role::Replica(Shard::Vismin)]
}

/// Master as node 1, Luzon replica as node 2, Vismin replica as node 3.
pub fn default_roles() -> Vec<Role> {
    vec![
        Role::Master,
        Role::Replica(Shard::Luzon),
        Role::Replica(Shard::Vismin),
    ]
}

pub fn test_config() -> RouterConfig {
    let mut config = RouterConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.health.interval_secs = 1;
    config.health.timeout_ms = 200;
    config.failover.operation_timeout_ms = 500;
    config
}

/// Start a router over `roles`. `prepare` runs on the backends before the
/// first probe, so outages set there are visible immediately.
pub async fn start_router<F>(config: RouterConfig, roles: &[Role], prepare: F) -> TestRouter
where
    F: FnOnce(&[Arc<MemoryBackend>]),
{
    let (nodes, backends) = memory_nodes(roles);
    prepare(&backends);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = HttpServer::new(config, nodes);
    let health = server.health();
    let shutdown = Shutdown::new();

    let run_shutdown = shutdown.clone();
    let handle = tokio::spawn(async move {
        server.run(listener, run_shutdown).await.unwrap();
    });

    let router = TestRouter {
        addr,
        health,
        backends,
        client: reqwest::Client::new(),
        shutdown,
        handle,
    };
    wait_until_serving(&router).await;
    router
}

async fn wait_until_serving(router: &TestRouter) {
    for _ in 0..50 {
        if router.client.get(router.url("/status")).send().await.is_ok() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("router did not start");
}

pub fn record(apptid: &str, region: &str) -> AppointmentRecord {
    AppointmentRecord {
        apptid: apptid.to_string(),
        status: "Queued".into(),
        time_queued: "2024-03-01T08:00:00Z".parse().unwrap(),
        queue_date: None,
        start_time: None,
        end_time: None,
        is_virtual: false,
        region_name: region.to_string(),
    }
}

/// A valid 32-character identifier made of one repeated character.
pub fn id_of(c: char) -> String {
    c.to_string().repeat(32)
}
