//! Logging middleware
//!
//! Logs every request with its outcome.

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;
use log::{info, warn};
use std::time::Instant;

/// Log method, path, status and latency of a request
pub async fn log_request(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let started = Instant::now();

    let response = next.run(request).await;

    let status = response.status();
    let elapsed = started.elapsed().as_millis();
    if status.is_server_error() {
        warn!("{} {} -> {} ({} ms)", method, path, status.as_u16(), elapsed);
    } else {
        info!("{} {} -> {} ({} ms)", method, path, status.as_u16(), elapsed);
    }
    response
}
