//! Health check handlers

use super::types::HealthResponse;
use crate::auth::AuthContext;
use axum::response::Json;

/// Health check endpoint
///
/// Not exempt from the gate, but never requires a token.
#[utoipa::path(
    get,
    path = "/api/health",
    tag = "Health",
    summary = "Health check",
    description = "Check the server health status",
    responses(
        (status = 200, description = "Server is healthy", body = HealthResponse)
    )
)]
pub async fn health_check(context: AuthContext) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: chrono::Utc::now(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        authenticated: context.is_authenticated(),
    })
}
