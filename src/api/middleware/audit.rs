//! Access logging middleware.
//!
//! Logs every API request with a request id, method, path, response status
//! and latency. Patient identifiers in query strings are never logged.

use std::time::Instant;

use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;
use uuid::Uuid;

pub async fn log_access(req: Request<axum::body::Body>, next: Next) -> Response {
    let request_id = Uuid::new_v4();
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let started = Instant::now();

    let response = next.run(req).await;

    let status = response.status().as_u16();
    let latency_ms = started.elapsed().as_millis() as u64;
    if response.status().is_server_error() {
        tracing::warn!(%request_id, %method, path, status, latency_ms, "API request failed");
    } else {
        tracing::info!(%request_id, %method, path, status, latency_ms, "API request");
    }

    response
}
