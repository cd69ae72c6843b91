use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;

/// Middleware that logs each route access with its result.
/// Client errors log at warn and server errors at error, so a failing worker stands out.
pub async fn log_route_access(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    let response = next.run(request).await;

    let status = response.status().as_u16();
    let duration_ms = start.elapsed().as_millis() as u64;

    match status {
        500..=599 => tracing::error!(%method, %path, status, duration_ms, "request failed"),
        400..=499 => tracing::warn!(%method, %path, status, duration_ms, "request rejected"),
        _ => tracing::info!(%method, %path, status, duration_ms, "request served"),
    }

    response
}
