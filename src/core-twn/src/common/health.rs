use axum::http::StatusCode;

/// Liveness probe for the ingestion API.
pub async fn health_check() -> (StatusCode, &'static str) {
    (StatusCode::OK, "healthy")
}
