//! Integration Tests for API Endpoints
//!
//! Tests full request/response cycle for each endpoint.

use std::time::Duration;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tiered_cache::{api::create_router, cache::MemoryStore, AppState};
use tower::ServiceExt;

// == Helper Functions ==

fn create_test_state() -> AppState {
    AppState::in_memory(MemoryStore::new(64 * 1024, Duration::from_secs(300)))
}

fn create_test_app() -> Router {
    create_router(create_test_state())
}

async fn body_to_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    (status, body_to_json(response.into_body()).await)
}

fn put_json(body: Value) -> Request<Body> {
    Request::builder()
        .method("PUT")
        .uri("/set")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

// == SET Endpoint Tests ==

#[tokio::test]
async fn test_set_endpoint_success() {
    let app = create_test_app();

    let (status, json) = send(&app, put_json(json!({"key": "test_key", "value": "test_value"}))).await;

    assert_eq!(status, StatusCode::OK);
    assert!(json["message"].as_str().unwrap().contains("test_key"));
    assert_eq!(json["key"], "test_key");
}

#[tokio::test]
async fn test_set_endpoint_empty_key() {
    let app = create_test_app();

    let (status, json) = send(&app, put_json(json!({"key": "", "value": "v"}))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("empty"));
}

#[tokio::test]
async fn test_set_endpoint_value_over_budget() {
    let app = create_router(AppState::in_memory(MemoryStore::new(
        32,
        Duration::from_secs(300),
    )));

    let (status, json) = send(&app, put_json(json!({"key": "big", "value": "x".repeat(64)}))).await;

    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert!(json["error"].as_str().unwrap().contains("budget"));
}

// == GET Endpoint Tests ==

#[tokio::test]
async fn test_get_returns_structured_value() {
    let app = create_test_app();
    let value = json!({"title": "Platform engineer", "tags": ["rust", "redis"], "salary": 150000});

    send(&app, put_json(json!({"key": "job:42", "value": value.clone()}))).await;
    let (status, json) = send(&app, get("/get/job:42")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["key"], "job:42");
    assert_eq!(json["value"], value);
}

#[tokio::test]
async fn test_get_endpoint_not_found() {
    let app = create_test_app();

    let (status, json) = send(&app, get("/get/nonexistent")).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(json["error"].as_str().unwrap().contains("nonexistent"));
}

#[tokio::test]
async fn test_get_after_ttl_expiry() {
    let app = create_test_app();

    send(&app, put_json(json!({"key": "short", "value": 1, "ttl_ms": 50}))).await;
    let (status, _) = send(&app, get("/get/short")).await;
    assert_eq!(status, StatusCode::OK);

    tokio::time::sleep(Duration::from_millis(120)).await;

    let (status, _) = send(&app, get("/get/short")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// == DELETE Endpoint Tests ==

#[tokio::test]
async fn test_delete_endpoint() {
    let app = create_test_app();
    send(&app, put_json(json!({"key": "to_delete", "value": true}))).await;

    let delete = || {
        Request::builder()
            .method("DELETE")
            .uri("/del/to_delete")
            .body(Body::empty())
            .unwrap()
    };

    let (status, json) = send(&app, delete()).await;
    assert_eq!(status, StatusCode::OK);
    assert!(json["message"].as_str().unwrap().contains("to_delete"));

    let (status, _) = send(&app, get("/get/to_delete")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, delete()).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// == CLEAR / KEYS Endpoint Tests ==

#[tokio::test]
async fn test_clear_and_keys_endpoints() {
    let app = create_test_app();
    for key in ["b", "a", "c"] {
        send(&app, put_json(json!({"key": key, "value": key}))).await;
    }

    let (status, json) = send(&app, get("/keys")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["count"], 3);
    assert_eq!(json["keys"], json!(["a", "b", "c"]));

    let clear = Request::builder()
        .method("POST")
        .uri("/clear")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, clear).await;
    assert_eq!(status, StatusCode::OK);

    let (_, json) = send(&app, get("/keys")).await;
    assert_eq!(json["count"], 0);

    let (_, stats) = send(&app, get("/stats")).await;
    assert_eq!(stats["memory_usage"], 0);
}

// == STATS Endpoint Tests ==

#[tokio::test]
async fn test_stats_track_hits_and_misses() {
    let app = create_test_app();
    send(&app, put_json(json!({"key": "k", "value": "v"}))).await;

    send(&app, get("/get/k")).await;
    send(&app, get("/get/k")).await;
    send(&app, get("/get/missing")).await;

    let (status, stats) = send(&app, get("/stats")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["hits"], 2);
    assert_eq!(stats["misses"], 1);
    assert_eq!(stats["count"], 1);
    assert_eq!(stats["remote_enabled"], false);
    assert!(stats["memory_usage"].as_u64().unwrap() > 0);
    assert!((stats["hit_rate"].as_f64().unwrap() - 2.0 / 3.0).abs() < 0.001);
}

// == METRICS Endpoint Tests ==

#[tokio::test]
async fn test_metrics_endpoint_reports_timings() {
    let app = create_test_app();
    send(&app, put_json(json!({"key": "k", "value": "v"}))).await;
    send(&app, get("/get/k")).await;
    send(&app, get("/get/nope")).await;

    let (status, json) = send(&app, get("/metrics")).await;
    assert_eq!(status, StatusCode::OK);

    let metrics = &json["metrics"];
    assert_eq!(metrics["cache.get"]["count"], 2);
    assert_eq!(metrics["cache.get"]["errors"], 1);
    assert_eq!(metrics["cache.set"]["count"], 1);
    // The /metrics request itself is recorded after its response is built
    assert_eq!(metrics["http_request"]["count"], 3);
}

// == HEALTH Endpoint Tests ==

#[tokio::test]
async fn test_health_endpoint() {
    let app = create_test_app();

    let (status, json) = send(&app, get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "healthy");
    assert!(json["timestamp"].is_string());
}

// == Error Format Tests ==

#[tokio::test]
async fn test_malformed_body_is_rejected() {
    let app = create_test_app();

    let request = Request::builder()
        .method("PUT")
        .uri("/set")
        .header("content-type", "application/json")
        .body(Body::from(r#"{"key": "k""#))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert!(response.status().is_client_error());
}
