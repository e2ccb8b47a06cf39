//! Failure injection tests: node outages, failover and probe timing.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use reqwest::StatusCode;
use serde_json::Value;

use appointment_router::health::HealthState;
use appointment_router::load_balancer::node::NodeId;
use appointment_router::load_balancer::strategy_for;
use appointment_router::config::StrategyKind;

mod common;

use common::{default_roles, id_of, record, start_router, test_config, LUZON, VISMIN};

async fn status(router: &common::TestRouter) -> Value {
    router
        .client
        .get(router.url("/status"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap()
}

#[tokio::test]
async fn test_failed_node_is_bypassed() {
    let router = start_router(test_config(), &default_roles(), |b| {
        // Master and the Luzon replica both hold the record.
        b[0].seed(record(&id_of('A'), LUZON));
        b[1].seed(record(&id_of('A'), LUZON));
    })
    .await;
    router.backends[1].fail_next(1);

    let res = router
        .client
        .get(router.url(&format!("/appointments/{}?node=2", id_of('A'))))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(router.backends[0].served(), 1, "master served the retry");

    // Soft mark shows until the next probe clears it.
    assert_eq!(status(&router).await["node2"], false);
    tokio::time::sleep(Duration::from_millis(1500)).await;
    assert_eq!(status(&router).await["node2"], true);

    router.stop().await;
}

#[tokio::test]
async fn test_all_nodes_failing_is_an_error() {
    let router = start_router(test_config(), &default_roles(), |_| {}).await;
    for backend in &router.backends {
        backend.fail_next(10);
    }

    let res = router
        .client
        .get(router.url("/appointments/size"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = res.text().await.unwrap();
    assert!(body.contains("all nodes are unavailable"), "{body}");

    router.stop().await;
}

#[tokio::test]
async fn test_outage_visible_only_after_next_probe() {
    let router = start_router(test_config(), &default_roles(), |_| {}).await;
    assert_eq!(status(&router).await["node3"], true);

    router.backends[2].set_online(false);
    assert_eq!(status(&router).await["node3"], true);

    tokio::time::sleep(Duration::from_millis(1500)).await;
    let table = status(&router).await;
    assert_eq!(table["node3"], false);
    assert_eq!(table["node1"], true);

    router.stop().await;
}

#[tokio::test]
async fn test_shard_survives_replica_outage() {
    let router = start_router(test_config(), &default_roles(), |b| {
        b[0].seed(record(&id_of('V'), VISMIN));
        b[2].set_online(false);
    })
    .await;

    let res = router
        .client
        .get(router.url(&format!("/appointments/{}?node=3", id_of('V'))))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    router.stop().await;
}

#[test]
fn test_concurrent_readers_never_see_torn_table() {
    let ids: Vec<NodeId> = (1..=5).map(NodeId).collect();
    let health = Arc::new(HealthState::new(
        ids.clone(),
        strategy_for(StrategyKind::RoundRobin),
    ));
    let done = Arc::new(AtomicBool::new(false));

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let health = health.clone();
            let done = done.clone();
            std::thread::spawn(move || {
                let mut checked = 0u64;
                while !done.load(Ordering::Relaxed) {
                    let table = health.snapshot();
                    assert_eq!(table.len(), 5);
                    match table.default_node() {
                        Some(id) => assert!(table.is_available(id)),
                        None => assert!(!table.any_available()),
                    }
                    checked += 1;
                }
                checked
            })
        })
        .collect();

    for cycle in 0..2_000u32 {
        let results = ids.iter().map(|id| (*id, (id.0 + cycle) % 3 != 0));
        health.apply_probe(results);
        health.mark_suspect(NodeId(cycle % 5 + 1));
    }
    done.store(true, Ordering::Relaxed);

    for reader in readers {
        assert!(reader.join().unwrap() > 0);
    }
}
