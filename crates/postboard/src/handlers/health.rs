//! Health check endpoint.

use axum::http::StatusCode;

/// GET /livez - Basic liveness check.
///
/// Returns 200 immediately without touching the store.
pub async fn livez() -> StatusCode {
    StatusCode::OK
}
