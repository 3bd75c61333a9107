//! API Routes
//!
//! Configures the Axum router with all cache server endpoints.

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    clear_handler, delete_handler, get_handler, health_handler, keys_handler, metrics_handler,
    set_handler, stats_handler, AppState,
};
use super::middleware::track_requests;

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `PUT /set` - Store a JSON value
/// - `GET /get/:key` - Retrieve a value by key
/// - `DELETE /del/:key` - Delete a key from both tiers
/// - `POST /clear` - Empty both tiers
/// - `GET /keys` - List live keys
/// - `GET /stats` - Get cache statistics
/// - `GET /metrics` - Get timing summaries
/// - `GET /health` - Health check endpoint
///
/// # Middleware
/// - Request timing: every request is recorded on the state's monitor
/// - CORS: Allows any origin (configurable for production)
/// - Tracing: Logs all requests for debugging
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/set", put(set_handler))
        .route("/get/:key", get(get_handler))
        .route("/del/:key", delete(delete_handler))
        .route("/clear", post(clear_handler))
        .route("/keys", get(keys_handler))
        .route("/stats", get(stats_handler))
        .route("/metrics", get(metrics_handler))
        .route("/health", get(health_handler))
        .layer(middleware::from_fn_with_state(
            state.monitor.clone(),
            track_requests,
        ))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::HTTP_REQUEST_METRIC;
    use crate::cache::MemoryStore;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use std::time::Duration;
    use tower::util::ServiceExt;

    fn create_test_state() -> AppState {
        AppState::in_memory(MemoryStore::new(64 * 1024, Duration::from_secs(300)))
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let app = create_router(create_test_state());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_set_endpoint() {
        let app = create_router(create_test_state());

        let response = app
            .oneshot(
                Request::builder()
                    .method("PUT")
                    .uri("/set")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"key":"test","value":{"n":1}}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_get_not_found() {
        let app = create_router(create_test_state());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/get/nonexistent")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_requests_are_timed_by_route() {
        let state = create_test_state();
        let monitor = state.monitor.clone();
        let app = create_router(state);

        for key in ["a", "b"] {
            let response = app
                .clone()
                .oneshot(
                    Request::builder()
                        .uri(format!("/get/{}", key))
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::NOT_FOUND);
        }

        let samples = monitor.samples(HTTP_REQUEST_METRIC);
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].metadata["path"], "/get/:key");
        assert_eq!(samples[0].metadata["method"], "GET");
        assert_eq!(samples[0].metadata["status"], 404);
        assert!(samples.iter().all(|sample| sample.is_error()));
    }
}
