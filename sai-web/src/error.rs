//! Central translation of failures into HTTP responses
//!
//! Every error body has the same shape. Uncategorized faults are logged here
//! and answered with a fixed message, so nothing internal reaches the caller.

use crate::auth::jwt::AuthError;
use crate::auth::PermissionDenied;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::any::Any;
use tracing::error;
use utoipa::ToSchema;

/// Message returned for every uncategorized server-side failure
pub const INTERNAL_ERROR_MESSAGE: &str =
    "An internal server error occurred. Please contact support.";

/// A single rejected input field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct FieldError {
    #[schema(example = "cpf")]
    pub field: String,
    #[schema(example = "invalid CPF")]
    pub message: String,
}

impl FieldError {
    pub fn new(field: &str, message: &str) -> Self {
        Self {
            field: field.to_string(),
            message: message.to_string(),
        }
    }
}

/// Error body shared by all endpoints
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    #[schema(example = "invalid_credentials")]
    pub error: String,
    pub message: String,
    #[schema(example = 401)]
    pub status: u16,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub validation_errors: Vec<FieldError>,
}

impl ErrorResponse {
    pub fn new(status: StatusCode, error: &str, message: impl Into<String>) -> Self {
        Self {
            error: error.to_string(),
            message: message.into(),
            status: status.as_u16(),
            timestamp: Utc::now(),
            validation_errors: Vec::new(),
        }
    }

    pub fn with_validation_errors(mut self, errors: Vec<FieldError>) -> Self {
        self.validation_errors = errors;
        self
    }
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}

/// Generic 500 response; the cause is logged, never returned
pub fn internal_error_response(cause: &dyn std::fmt::Display) -> Response {
    error!(error = %cause, "Unhandled internal error");
    ErrorResponse::new(
        StatusCode::INTERNAL_SERVER_ERROR,
        "internal_error",
        INTERNAL_ERROR_MESSAGE,
    )
    .into_response()
}

/// Panic handler for `CatchPanicLayer`
pub fn handle_panic(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic payload".to_string()
    };
    internal_error_response(&format!("handler panicked: {}", detail))
}

/// Errors returned by API handlers
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Validation failed")]
    Validation(Vec<FieldError>),

    #[error("{0} not found")]
    NotFound(String),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Forbidden(#[from] PermissionDenied),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Validation(errors) => {
                ErrorResponse::new(StatusCode::BAD_REQUEST, "validation_failed", "Invalid data")
                    .with_validation_errors(errors)
                    .into_response()
            }
            ApiError::NotFound(resource) => ErrorResponse::new(
                StatusCode::NOT_FOUND,
                "not_found",
                format!("{} not found", resource),
            )
            .into_response(),
            ApiError::Auth(err) => err.into_response(),
            ApiError::Forbidden(denied) => denied.into_response(),
            ApiError::Internal(err) => internal_error_response(&format!("{:#}", err)),
        }
    }
}
