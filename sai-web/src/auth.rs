//! Authentication and authorization
//!
//! The request gate (see [`crate::middleware`]) attaches an [`AuthContext`] to
//! every request. Handlers read it back through the extractors defined here;
//! nothing in this module touches tokens or the credential store directly.

#[cfg(feature = "sqlite")]
pub mod database;
pub mod exemptions;
pub mod handlers;
pub mod jwt;
pub mod users;


use crate::error::ErrorResponse;
use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
};
use jwt::AuthError;
use serde::Serialize;
use std::collections::HashSet;
use tracing::warn;
use users::{Identity, Role};
use utoipa::ToSchema;

/// Operations an identity may be allowed to perform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    ViewAppointments,
    CreateAppointments,
    UpdateAppointmentStatus,
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Capability::ViewAppointments => "view_appointments",
            Capability::CreateAppointments => "create_appointments",
            Capability::UpdateAppointmentStatus => "update_appointment_status",
        };
        f.write_str(name)
    }
}

/// Identity attached to a request after a successful token check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub login: String,
    pub role: Role,
    pub capabilities: HashSet<Capability>,
}

impl AuthenticatedUser {
    pub fn from_identity(identity: &Identity) -> Self {
        Self {
            login: identity.login.clone(),
            role: identity.role,
            capabilities: identity.role.capabilities(),
        }
    }

    pub fn has_capability(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }
}

/// Per-request authentication context.
///
/// Inserted exactly once by the gate. A request the gate never saw (or one it
/// passed through) is anonymous.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthContext {
    user: Option<AuthenticatedUser>,
}

impl AuthContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn authenticated(user: AuthenticatedUser) -> Self {
        Self { user: Some(user) }
    }

    pub fn user(&self) -> Option<&AuthenticatedUser> {
        self.user.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    fn from_parts(parts: &Parts) -> Self {
        parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .unwrap_or_default()
    }
}

impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(AuthContext::from_parts(parts))
    }
}

/// Extractor for handlers that need an identity but no particular capability
#[derive(Debug, Clone)]
pub struct CurrentUser(pub AuthenticatedUser);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        AuthContext::from_parts(parts)
            .user
            .map(CurrentUser)
            .ok_or(AuthError::Unauthenticated)
    }
}

/// Permission denied error
#[derive(Debug, thiserror::Error)]
#[error("user '{login}' lacks capability {required}")]
pub struct PermissionDenied {
    pub required: Capability,
    pub login: String,
}

impl IntoResponse for PermissionDenied {
    fn into_response(self) -> Response {
        ErrorResponse::new(
            StatusCode::FORBIDDEN,
            "permission_denied",
            format!("Missing required permission: {}", self.required),
        )
        .into_response()
    }
}

/// Rejection for capability extractors: no identity (401) or not allowed (403)
#[derive(Debug)]
pub enum CapabilityRejection {
    Unauthenticated,
    Denied(PermissionDenied),
}

impl IntoResponse for CapabilityRejection {
    fn into_response(self) -> Response {
        match self {
            CapabilityRejection::Unauthenticated => AuthError::Unauthenticated.into_response(),
            CapabilityRejection::Denied(denied) => denied.into_response(),
        }
    }
}

fn require(
    context: AuthContext,
    capability: Capability,
) -> Result<AuthenticatedUser, CapabilityRejection> {
    let user = context.user.ok_or(CapabilityRejection::Unauthenticated)?;
    if user.has_capability(capability) {
        Ok(user)
    } else {
        warn!("User '{}' denied: requires {}", user.login, capability);
        Err(CapabilityRejection::Denied(PermissionDenied {
            required: capability,
            login: user.login,
        }))
    }
}

macro_rules! capability_extractor {
    ($(#[$meta:meta])* $name:ident, $capability:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone)]
        pub struct $name(pub AuthenticatedUser);

        impl<S> FromRequestParts<S> for $name
        where
            S: Send + Sync,
        {
            type Rejection = CapabilityRejection;

            async fn from_request_parts(
                parts: &mut Parts,
                _state: &S,
            ) -> Result<Self, Self::Rejection> {
                require(AuthContext::from_parts(parts), $capability).map($name)
            }
        }
    };
}

capability_extractor!(
    /// Requires [`Capability::ViewAppointments`]
    RequireViewAppointments,
    Capability::ViewAppointments
);
capability_extractor!(
    /// Requires [`Capability::CreateAppointments`]
    RequireCreateAppointments,
    Capability::CreateAppointments
);
capability_extractor!(
    /// Requires [`Capability::UpdateAppointmentStatus`]
    RequireUpdateAppointmentStatus,
    Capability::UpdateAppointmentStatus
);
