//! Authentication handlers: login, registration and the current identity

use super::{
    jwt::AuthError,
    users::{LoginRequest, LoginResponse, RegisterRequest, Role, UserInfo},
    Capability, CurrentUser,
};
use crate::{error::ApiError, extractors::extract_json, AppState};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::Json,
};
use serde::Serialize;
use tracing::{info, warn};
use utoipa::ToSchema;

/// Identity attached to the current request
#[derive(Debug, Serialize, ToSchema)]
pub struct CurrentUserResponse {
    #[schema(example = "alice")]
    pub login: String,
    pub role: Role,
    pub capabilities: Vec<Capability>,
}

/// User login endpoint
///
/// Exchanges a login/password pair for a bearer token.
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    tag = "Authentication",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Token issued", body = LoginResponse),
        (status = 400, description = "Login or password missing", body = crate::error::ErrorResponse),
        (status = 401, description = "Invalid login or password", body = crate::error::ErrorResponse)
    )
)]
pub async fn login(
    State(state): State<AppState>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, ApiError> {
    let request = extract_json(body)?;
    if request.login.trim().is_empty() || request.password.is_empty() {
        return Err(AuthError::MissingCredentials.into());
    }

    let identity = state
        .identity_resolver
        .authenticate(&request.login, &request.password)
        .await?;
    let token = state.token_codec.issue(&identity.login)?;

    info!("User logged in: {}", identity.login);
    Ok(Json(LoginResponse {
        token,
        token_type: "Bearer".to_string(),
        expires_in: state.token_codec.ttl().num_seconds(),
    }))
}

/// User registration endpoint
#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    tag = "Authentication",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User created", body = UserInfo),
        (status = 400, description = "Invalid data or login already taken", body = crate::error::ErrorResponse)
    )
)]
pub async fn register(
    State(state): State<AppState>,
    body: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<UserInfo>), ApiError> {
    let request = extract_json(body)?;
    let errors = request.validate();
    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }

    let role = request.role.unwrap_or(Role::User);
    if role == Role::Admin {
        warn!("Unauthenticated registration of ADMIN account '{}'", request.login);
    }

    let identity = state
        .identity_resolver
        .register(&request.login, &request.password, role)
        .await?;

    Ok((StatusCode::CREATED, Json(identity.to_user_info())))
}

/// Get current user information
#[utoipa::path(
    get,
    path = "/api/v1/auth/me",
    tag = "Authentication",
    responses(
        (status = 200, description = "Authenticated identity", body = CurrentUserResponse),
        (status = 401, description = "No valid bearer token", body = crate::error::ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn me(CurrentUser(user): CurrentUser) -> Json<CurrentUserResponse> {
    let mut capabilities: Vec<Capability> = user.capabilities.into_iter().collect();
    capabilities.sort_by_key(|c| c.to_string());

    Json(CurrentUserResponse {
        login: user.login,
        role: user.role,
        capabilities,
    })
}
