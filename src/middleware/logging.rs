//! Request logging middleware.
//!
//! One line per API or dashboard request: method, path, query (carries the
//! history `limit`), status and latency.

use axum::{body::Body, http::Request, middleware::Next, response::Response};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Logs 5xx at WARN, other API responses at INFO and static assets at DEBUG.
/// Health checks are not logged.
pub async fn request_logging(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let query = request.uri().query().unwrap_or_default().to_string();

    if path == "/health" {
        return next.run(request).await;
    }

    let start = Instant::now();
    let response = next.run(request).await;
    let latency_ms = start.elapsed().as_millis() as u64;
    let status = response.status().as_u16();

    if status >= 500 {
        warn!(method = %method, path = %path, query = %query, status, latency_ms, "Monitor request failed");
    } else if path.starts_with("/api/") {
        info!(method = %method, path = %path, query = %query, status, latency_ms, "Monitor request served");
    } else {
        debug!(method = %method, path = %path, status, latency_ms, "Dashboard asset served");
    }

    response
}
