//! HTTP surface tests against a router over in-memory nodes.

use reqwest::StatusCode;
use serde_json::{json, Value};

mod common;

use common::{id_of, record, replica_roles, start_router, test_config, LUZON, VISMIN};

fn new_appointment(region: &str) -> Value {
    json!({
        "status": "Queued",
        "TimeQueued": "2024-03-01T08:00:00Z",
        "QueueDate": "2024-03-02T00:00:00Z",
        "isVirtual": false,
        "RegionName": region,
    })
}

#[tokio::test]
async fn test_status_lists_every_node() {
    let router = start_router(test_config(), &replica_roles(), |b| b[1].set_online(false)).await;

    let status: Value = router
        .client
        .get(router.url("/status"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(status, json!({ "node1": true, "node2": false }));

    router.stop().await;
}

#[tokio::test]
async fn test_appointment_lifecycle() {
    let router = start_router(test_config(), &replica_roles(), |_| {}).await;
    let client = &router.client;

    let res = client
        .put(router.url("/appointments"))
        .json(&json!({ "data": new_appointment(LUZON) }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let created: Value = res.json().await.unwrap();
    let apptid = created["apptid"].as_str().unwrap().to_string();
    assert_eq!(apptid.len(), 32);
    assert!(router.backends[0].contains(&apptid));

    let fetched: Value = client
        .get(router.url(&format!("/appointments/{apptid}")))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(fetched["RegionName"], LUZON);
    assert_eq!(fetched["isVirtual"], false);

    let res = client
        .patch(router.url(&format!("/appointments/{apptid}")))
        .json(&json!({ "data": { "status": "Serving" }, "node": 1 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.text().await.unwrap(), "Appointment updated");

    let size: Value = client
        .get(router.url("/appointments/size"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(size, json!({ "size": 1 }));

    let res = client
        .delete(router.url(&format!("/appointments/{apptid}")))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.text().await.unwrap(), "Appointment deleted");

    let res = client
        .get(router.url(&format!("/appointments/{apptid}")))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(res.text().await.unwrap(), "Appointment not found");

    router.stop().await;
}

#[tokio::test]
async fn test_region_change_moves_record() {
    let router = start_router(test_config(), &replica_roles(), |b| {
        b[0].seed(record(&id_of('A'), LUZON));
    })
    .await;

    let res = router
        .client
        .patch(router.url(&format!("/appointments/{}", id_of('A'))))
        .json(&json!({ "data": { "RegionName": VISMIN } }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert!(!router.backends[0].contains(&id_of('A')));
    assert!(router.backends[1].contains(&id_of('A')));

    router.stop().await;
}

#[tokio::test]
async fn test_list_merges_shards_in_order() {
    let router = start_router(test_config(), &replica_roles(), |b| {
        for c in ['B', 'D', 'F'] {
            b[0].seed(record(&id_of(c), LUZON));
        }
        for c in ['A', 'E'] {
            b[1].seed(record(&id_of(c), VISMIN));
        }
    })
    .await;

    let page: Vec<Value> = router
        .client
        .get(router.url("/appointments?itemsPerPage=4&page=0"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let ids: Vec<&str> = page.iter().map(|r| r["apptid"].as_str().unwrap()).collect();
    assert_eq!(ids.len(), 4);
    assert!(ids.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(ids[0], id_of('A'));

    router.stop().await;
}

#[tokio::test]
async fn test_invalid_input_and_conflicts() {
    let router = start_router(test_config(), &replica_roles(), |b| {
        b[1].seed(record(&id_of('C'), VISMIN));
    })
    .await;
    let client = &router.client;

    let mut bad_id = new_appointment(LUZON);
    bad_id["apptid"] = json!("not-an-id");
    let res = client
        .put(router.url("/appointments"))
        .json(&json!({ "data": bad_id }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = client
        .put(router.url("/appointments"))
        .header("content-type", "application/json")
        .body("{ not json")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let mut duplicate = new_appointment(VISMIN);
    duplicate["apptid"] = json!(id_of('C'));
    let res = client
        .put(router.url("/appointments"))
        .json(&json!({ "data": duplicate }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);

    let res = client
        .patch(router.url(&format!("/appointments/{}", id_of('Z'))))
        .json(&json!({ "data": { "status": "Done" } }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    router.stop().await;
}

#[tokio::test]
async fn test_delete_accepts_node_in_body() {
    let router = start_router(test_config(), &replica_roles(), |b| {
        b[1].seed(record(&id_of('D'), VISMIN));
    })
    .await;

    let res = router
        .client
        .delete(router.url(&format!("/appointments/{}", id_of('D'))))
        .json(&json!({ "node": 2 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert!(router.backends[1].is_empty());

    router.stop().await;
}

#[tokio::test]
async fn test_loose_node_preferences_are_accepted() {
    let router = start_router(test_config(), &replica_roles(), |_| {}).await;
    let client = &router.client;

    let res = client
        .put(router.url("/appointments"))
        .json(&json!({ "data": new_appointment(LUZON), "node": "1" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let apptid = res.json::<Value>().await.unwrap()["apptid"]
        .as_str()
        .unwrap()
        .to_string();
    assert!(router.backends[0].contains(&apptid));

    let res = client
        .put(router.url("/appointments"))
        .json(&json!({ "data": new_appointment(VISMIN), "node": "" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);

    let res = client
        .get(router.url("/appointments/size?node="))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.json::<Value>().await.unwrap()["size"], 2);

    let res = client
        .get(router.url(&format!("/appointments/{apptid}?node=abc")))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = client
        .get(router.url("/appointments?itemsPerPage=10&node="))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.json::<Vec<Value>>().await.unwrap().len(), 2);

    router.stop().await;
}

#[tokio::test]
async fn test_total_outage_is_service_unavailable() {
    let router = start_router(test_config(), &replica_roles(), |b| {
        for backend in b {
            backend.set_online(false);
        }
    })
    .await;
    let client = &router.client;

    let res = client.get(router.url("/appointments")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(res.text().await.unwrap(), "Data is currently unavailable");

    let res = client
        .put(router.url("/appointments"))
        .json(&json!({ "data": new_appointment(LUZON) }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(
        res.text().await.unwrap(),
        "Data updates are currently unavailable"
    );

    router.stop().await;
}

#[tokio::test]
async fn test_request_id_is_generated_or_propagated() {
    let router = start_router(test_config(), &replica_roles(), |_| {}).await;

    let res = router.client.get(router.url("/status")).send().await.unwrap();
    let generated = res.headers()["x-request-id"].to_str().unwrap();
    assert!(uuid::Uuid::parse_str(generated).is_ok());

    let sent = uuid::Uuid::new_v4().to_string();
    let res = router
        .client
        .get(router.url("/appointments/size"))
        .header("x-request-id", &sent)
        .send()
        .await
        .unwrap();
    assert_eq!(res.headers()["x-request-id"].to_str().unwrap(), sent);

    router.stop().await;
}
