//! SAI Web Server
//!
//! Appointment scheduling REST service. Every request goes through a
//! non-rejecting bearer-token gate that attaches the caller's identity when
//! the token checks out; handlers then demand the capabilities they need.

pub mod appointments;
pub mod auth;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod server;
pub mod state;

// Re-export main types
pub use server::SaiServer;
pub use state::AppState;

use axum::{
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    Router,
};
use tower_http::{catch_panic::CatchPanicLayer, cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Create the main application router
pub fn create_app(state: AppState) -> Router {
    // Configure CORS for the local front-end
    let cors = CorsLayer::new()
        .allow_origin([
            HeaderValue::from_static("http://localhost:3000"),
            HeaderValue::from_static("http://127.0.0.1:3000"),
        ])
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_credentials(true)
        .allow_headers([AUTHORIZATION, ACCEPT, CONTENT_TYPE]);

    Router::new()
        .merge(routes::all_routes())
        // API documentation
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi::ApiDoc::openapi()))
        // Add middleware
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth_gate,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(CatchPanicLayer::custom(error::handle_panic))
        .with_state(state)
}

/// Error types for the web server
#[derive(thiserror::Error, Debug)]
pub enum WebError {
    #[error("Server error: {0}")]
    Server(#[from] std::io::Error),

    #[error("Authentication setup error: {0}")]
    Auth(#[from] auth::jwt::AuthError),

    #[error(transparent)]
    Core(#[from] sai_core::SaiError),
}

/// Result type for web operations
pub type WebResult<T> = Result<T, WebError>;
