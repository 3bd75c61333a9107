//! Request timing middleware
//!
//! Records one `http_request` sample per request, tagged with the method,
//! the matched route and the response status.

use axum::{
    extract::{MatchedPath, Request, State},
    middleware::Next,
    response::Response,
};

use crate::monitoring::PerformanceMonitor;

/// Metric name for request timings.
pub const HTTP_REQUEST_METRIC: &str = "http_request";

/// Times the wrapped request and records it on `monitor`.
///
/// Mount with `axum::middleware::from_fn_with_state`.
pub async fn track_requests(
    State(monitor): State<PerformanceMonitor>,
    request: Request,
    next: Next,
) -> Response {
    let method = request.method().to_string();
    // Route template, so `/get/a` and `/get/b` share one label
    let path = request
        .extensions()
        .get::<MatchedPath>()
        .map(|matched| matched.as_str().to_owned())
        .unwrap_or_else(|| request.uri().path().to_owned());

    let timer = monitor
        .start_timer(HTTP_REQUEST_METRIC)
        .with_metadata("method", method)
        .with_metadata("path", path);

    let response = next.run(request).await;

    let status = response.status();
    timer
        .with_metadata("status", status.as_u16())
        .with_metadata("error", status.is_client_error() || status.is_server_error())
        .stop();

    response
}
