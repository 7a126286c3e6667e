//! Route definitions for the SAI web server

use crate::{auth, handlers, AppState};
use axum::{
    routing::{get, post},
    Router,
};

/// Versioned API routes, nested under `/api/v1`
pub fn api_v1_routes() -> Router<AppState> {
    Router::new()
        // Authentication
        .route("/auth/login", post(auth::handlers::login))
        .route("/auth/register", post(auth::handlers::register))
        .route("/auth/me", get(auth::handlers::me))
        // Appointments
        .route(
            "/appointments",
            get(handlers::list_appointments).post(handlers::create_appointment),
        )
        .route(
            "/appointments/{id}/status",
            post(handlers::update_appointment_status),
        )
}

/// Create all routes combined
pub fn all_routes() -> Router<AppState> {
    Router::new()
        .route("/api/health", get(handlers::health_check))
        .nest("/api/v1", api_v1_routes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use sai_core::SaiConfig;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_health_check_route() {
        let mut config = SaiConfig::default();
        config.auth.jwt_secret = Some("routes-test-secret".to_string());
        let state = AppState::new(config).await.unwrap();
        let app = all_routes().with_state(state);

        let response = app
            .oneshot(
                axum::http::Request::builder()
                    .uri("/api/health")
                    .body(axum::body::Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }
}
