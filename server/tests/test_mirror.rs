use rocket::futures::future::join_all;
use rocket::http::Status;
use rocket::local::asynchronous::Client;
use rocket::serde::json::{json, Value};
use simple_data_server::mirror::{MemoryMirror, MirrorRow};
use std::sync::Arc;
use std::time::Duration;

mod utils;

async fn launch(mirror: Arc<MemoryMirror>) -> Client {
    let node = utils::server_node_with_memory_mirror(mirror);
    Client::tracked(node.build()).await.expect("valid rocket instance")
}

async fn wait_for_rows(mirror: &MemoryMirror, count: usize) -> Vec<MirrorRow> {
    for _ in 0..200 {
        let rows = mirror.rows().await;
        if rows.len() >= count {
            return rows;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    mirror.rows().await
}

#[rocket::async_test]
async fn test_writes_are_mirrored() {
    let mirror = Arc::new(MemoryMirror::new());
    let client = launch(mirror.clone()).await;

    client
        .post("/data")
        .json(&json!({"name": "x", "value": 1, "description": "d"}))
        .dispatch()
        .await;
    client
        .put("/data/1")
        .json(&json!({"name": "y", "value": 2}))
        .dispatch()
        .await;
    client
        .post("/data/bulk")
        .json(&json!([{"name": "a"}, {"name": "b"}]))
        .dispatch()
        .await;
    client.get("/test1/hello").dispatch().await;
    // deletes are not mirrored
    client.delete("/data/2").dispatch().await;

    let mut rows = wait_for_rows(&mirror, 5).await;
    rows.sort_by_key(|r| (r.id, r.name.clone()));
    let seen = rows
        .iter()
        .map(|r| (r.id, r.name.as_str()))
        .collect::<Vec<_>>();
    assert_eq!(
        seen,
        vec![(1, "x"), (1, "y"), (2, "a"), (3, "b"), (4, "URL Data #4")]
    );
    assert_eq!(rows[0].description.as_deref(), Some("d"));
    assert_eq!(rows[4].value, json!("hello"));
}

#[rocket::async_test]
async fn test_mirror_failure_does_not_fail_write() {
    let mirror = Arc::new(MemoryMirror::new());
    mirror.set_failing(true);
    let client = launch(mirror.clone()).await;

    let response = client
        .post("/data")
        .json(&json!({"name": "x", "value": 1}))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);
    assert_eq!(
        response.into_json::<Value>().await.unwrap()["data"],
        json!({"id": 1, "name": "x", "value": 1})
    );
    tokio::time::sleep(Duration::from_millis(50)).await;

    let response = client.get("/health/mirror").dispatch().await;
    assert_eq!(response.status(), Status::Ok);
    let health = response.into_json::<Value>().await.unwrap();
    assert_eq!(health["total_items"], json!(1));
    assert_eq!(health["mirror"]["configured"], json!(true));
    assert_eq!(health["mirror"]["reachable"], json!(false));
    assert!(health["mirror"]["error"].is_string());

    let response = client.get("/mirror/data").dispatch().await;
    assert_eq!(response.status(), Status::ServiceUnavailable);

    mirror.set_failing(false);
    assert!(mirror.rows().await.is_empty());
}

#[rocket::async_test]
async fn test_slow_mirror_does_not_delay_response() {
    let mirror = Arc::new(MemoryMirror::with_delay(Duration::from_millis(300)));
    let client = launch(mirror.clone()).await;

    let response = client
        .post("/data")
        .json(&json!({"name": "x"}))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);
    // the response is back while the mirror write is still sleeping
    assert!(mirror.rows().await.is_empty());

    let rows = wait_for_rows(&mirror, 1).await;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].id, 1);
}

#[rocket::async_test]
async fn test_mirror_health_and_pages() {
    let mirror = Arc::new(MemoryMirror::new());
    let client = launch(mirror.clone()).await;

    client
        .post("/data")
        .json(&json!({"name": "<i>x</i>", "value": {"k": 1}}))
        .dispatch()
        .await;
    wait_for_rows(&mirror, 1).await;

    let response = client.get("/health/mirror").dispatch().await;
    assert_eq!(
        response.into_json::<Value>().await,
        Some(json!({
            "status": "healthy",
            "total_items": 1,
            "mirror": {"configured": true, "reachable": true, "rows": 1, "error": null}
        }))
    );

    let response = client.get("/mirror/data").dispatch().await;
    assert_eq!(response.status(), Status::Ok);
    let rows = response.into_json::<Vec<MirrorRow>>().await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].name, "<i>x</i>");

    let response = client.get("/mirror/view").dispatch().await;
    let page = response.into_string().await.unwrap();
    assert!(page.contains("<strong>Mirrored rows:</strong> 1"));
    assert!(page.contains("&lt;i&gt;x&lt;/i&gt;"));
}

#[rocket::async_test]
async fn test_concurrent_creates_get_distinct_ids() {
    const WRITERS: i64 = 32;
    let mirror = Arc::new(MemoryMirror::new());
    let client = launch(mirror.clone()).await;

    let bodies = (0..WRITERS)
        .map(|i| json!({"name": format!("w{}", i), "value": i}))
        .collect::<Vec<_>>();
    let responses = join_all(
        bodies
            .iter()
            .map(|body| client.post("/data").json(body).dispatch()),
    )
    .await;
    for response in responses {
        assert_eq!(response.status(), Status::Ok);
    }

    let response = client.get("/data").dispatch().await;
    let records = response.into_json::<Vec<Value>>().await.unwrap();
    let mut ids = records
        .iter()
        .map(|r| r["id"].as_i64().unwrap())
        .collect::<Vec<_>>();
    ids.sort_unstable();
    assert_eq!(ids, (1..=WRITERS).collect::<Vec<_>>());

    let response = client.get("/health").dispatch().await;
    assert_eq!(
        response.into_json::<Value>().await.unwrap()["total_items"],
        json!(WRITERS)
    );

    let mut mirrored = wait_for_rows(&mirror, WRITERS as usize)
        .await
        .iter()
        .map(|r| r.id)
        .collect::<Vec<_>>();
    mirrored.sort_unstable();
    assert_eq!(mirrored, (1..=WRITERS).collect::<Vec<_>>());
}
