use std::sync::Arc;

use serde_json::{json, Value};
use viewer_engine::{
    build_router, RemoteSyncService, RestMirrorStore, StoreSettings, MAX_UPDATE_BODY_BYTES,
};
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const RECORDS_PATH: &str = "/api/docs/doc1/tables/Times/records";

/// Spin up the sync server on an OS-assigned port against `upstream`, returning its base URL.
async fn spawn_sync_server(upstream: &MockServer) -> String {
    let store = RestMirrorStore::new(StoreSettings::new(upstream.uri(), "doc1")).unwrap();
    let app = build_router(Arc::new(RemoteSyncService::new(Arc::new(store))));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://127.0.0.1:{}", port)
}

async fn post_update(base: &str, body: String) -> (u16, Value) {
    let resp = reqwest::Client::new()
        .post(format!("{}/update-times", base))
        .header("content-type", "application/json")
        .body(body)
        .send()
        .await
        .unwrap();
    let status = resp.status().as_u16();
    (status, resp.json().await.unwrap())
}

#[tokio::test]
async fn update_patches_lowest_record() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(RECORDS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "records": [
                { "id": 7, "fields": { "HtmlContent": "b" } },
                { "id": 3, "fields": { "HtmlContent": "a" } }
            ]
        })))
        .mount(&upstream)
        .await;
    Mock::given(method("PATCH"))
        .and(path(RECORDS_PATH))
        .and(body_json(json!({
            "records": [{ "id": 3, "fields": { "HtmlContent": "<p>new</p>" } }]
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&upstream)
        .await;

    let base = spawn_sync_server(&upstream).await;
    let (status, body) = post_update(&base, json!({"htmlContent": "<p>new</p>"}).to_string()).await;

    assert_eq!(status, 200);
    assert_eq!(body, json!({"success": true}));
}

#[tokio::test]
async fn missing_content_is_bad_request_without_upstream_calls() {
    let upstream = MockServer::start().await;
    let base = spawn_sync_server(&upstream).await;

    let (status, body) = post_update(&base, json!({"htmlContent": ""}).to_string()).await;
    assert_eq!(status, 400);
    assert_eq!(body, json!({"error": "Missing htmlContent"}));

    let (status, _) = post_update(&base, json!({}).to_string()).await;
    assert_eq!(status, 400);

    let (status, _) = post_update(&base, "not json".to_string()).await;
    assert_eq!(status, 400);

    let received = upstream.received_requests().await.unwrap();
    assert!(received.is_empty());
}

#[tokio::test]
async fn empty_table_is_not_found() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(RECORDS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"records": []})))
        .mount(&upstream)
        .await;

    let base = spawn_sync_server(&upstream).await;
    let (status, body) = post_update(&base, json!({"htmlContent": "X"}).to_string()).await;

    assert_eq!(status, 404);
    assert_eq!(body, json!({"error": "No records in Times table"}));
}

#[tokio::test]
async fn upstream_failure_is_server_error() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(RECORDS_PATH))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&upstream)
        .await;

    let base = spawn_sync_server(&upstream).await;
    let (status, body) = post_update(&base, json!({"htmlContent": "X"}).to_string()).await;

    assert_eq!(status, 500);
    let message = body["error"].as_str().unwrap();
    assert!(message.contains("failed to fetch mirror records"), "{message}");
}

#[tokio::test]
async fn wrong_method_is_rejected() {
    let upstream = MockServer::start().await;
    let base = spawn_sync_server(&upstream).await;
    let resp = reqwest::get(format!("{}/update-times", base)).await.unwrap();
    assert_eq!(resp.status(), 405);
}

#[tokio::test]
async fn content_above_default_axum_limit_is_reconciled() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(RECORDS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "records": [{ "id": 1, "fields": { "HtmlContent": "old" } }]
        })))
        .mount(&upstream)
        .await;
    Mock::given(method("PATCH"))
        .and(path(RECORDS_PATH))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&upstream)
        .await;

    let base = spawn_sync_server(&upstream).await;
    let content = "x".repeat(3 * 1024 * 1024);
    let (status, body) = post_update(&base, json!({ "htmlContent": content }).to_string()).await;

    assert_eq!(status, 200);
    assert_eq!(body, json!({"success": true}));
}

#[tokio::test]
async fn oversized_body_gets_json_error() {
    let upstream = MockServer::start().await;
    let base = spawn_sync_server(&upstream).await;
    let content = "x".repeat(MAX_UPDATE_BODY_BYTES + 1024);

    let (status, body) = post_update(&base, json!({ "htmlContent": content }).to_string()).await;

    assert_eq!(status, 400);
    let message = body["error"].as_str().expect("json error body");
    assert!(message.starts_with("Unreadable request body"), "{message}");
    assert!(upstream.received_requests().await.unwrap().is_empty());
}
