//! Request gate
//!
//! Runs once per request before routing. It never rejects: a request either
//! leaves with an identity attached or passes through anonymously, and the
//! decision to refuse is left to the extractors in [`crate::auth`].

use crate::{
    auth::{
        exemptions::RouteExemptions,
        jwt::TokenCodec,
        users::{IdentityResolver, StoreError},
        AuthContext, AuthenticatedUser,
    },
    error::ApiError,
    AppState,
};
use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::debug;

const BEARER_PREFIX: &str = "Bearer ";

/// Why a request went through without an identity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassReason {
    /// Path matched the exemption policy; no header was read
    Exempt,
    /// No `Authorization: Bearer` header
    NoCredential,
    /// Token malformed, tampered, foreign or expired
    InvalidToken,
    /// Token valid but its subject no longer resolves
    UnknownSubject,
}

/// Terminal state of one gate evaluation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateOutcome {
    PassedThrough(PassReason),
    IdentityAttached(AuthenticatedUser),
}

impl GateOutcome {
    pub fn into_context(self) -> AuthContext {
        match self {
            GateOutcome::PassedThrough(_) => AuthContext::anonymous(),
            GateOutcome::IdentityAttached(user) => AuthContext::authenticated(user),
        }
    }
}

/// Stateless per-request evaluator; all shared parts are read-only
#[derive(Clone)]
pub struct RequestGate {
    codec: Arc<TokenCodec>,
    resolver: IdentityResolver,
    exemptions: Arc<RouteExemptions>,
}

impl RequestGate {
    pub fn new(
        codec: Arc<TokenCodec>,
        resolver: IdentityResolver,
        exemptions: RouteExemptions,
    ) -> Self {
        Self {
            codec,
            resolver,
            exemptions: Arc::new(exemptions),
        }
    }

    /// Evaluate one request.
    ///
    /// Only a credential store fault is an error; every other path ends in a
    /// [`GateOutcome`].
    pub async fn evaluate(
        &self,
        path: &str,
        headers: &HeaderMap,
    ) -> Result<GateOutcome, StoreError> {
        if self.exemptions.is_exempt(path) {
            return Ok(GateOutcome::PassedThrough(PassReason::Exempt));
        }

        let Some(token) = bearer_token(headers) else {
            return Ok(GateOutcome::PassedThrough(PassReason::NoCredential));
        };

        let Some(login) = self.codec.verify(token) else {
            return Ok(GateOutcome::PassedThrough(PassReason::InvalidToken));
        };

        Ok(match self.resolver.resolve(&login).await? {
            Some(identity) => {
                GateOutcome::IdentityAttached(AuthenticatedUser::from_identity(&identity))
            }
            None => GateOutcome::PassedThrough(PassReason::UnknownSubject),
        })
    }
}

/// Token from an `Authorization: Bearer <token>` header.
///
/// The scheme is matched case-sensitively; anything else counts as no
/// credential.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix(BEARER_PREFIX))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Middleware attaching an [`AuthContext`] to every request
pub async fn auth_gate(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let outcome = state
        .gate
        .evaluate(request.uri().path(), request.headers())
        .await
        .map_err(|e| ApiError::Internal(e.into()))?;

    match &outcome {
        GateOutcome::IdentityAttached(user) => {
            debug!(login = %user.login, path = %request.uri().path(), "Identity attached");
        }
        GateOutcome::PassedThrough(reason) => {
            debug!(?reason, path = %request.uri().path(), "Request passed through");
        }
    }

    request.extensions_mut().insert(outcome.into_context());
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::users::Role;
    use axum::http::HeaderValue;
    use chrono::{Duration, Utc};

    async fn gate() -> (RequestGate, Arc<TokenCodec>) {
        let codec = Arc::new(
            TokenCodec::new("gate-test-secret", "sai-test", Duration::hours(2)).unwrap(),
        );
        let resolver = IdentityResolver::memory();
        resolver.register("alice", "s3cret", Role::User).await.unwrap();
        let gate = RequestGate::new(codec.clone(), resolver, RouteExemptions::default());
        (gate, codec)
    }

    fn auth_header(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_bearer_token_extraction() {
        assert_eq!(bearer_token(&auth_header("Bearer abc.def")), Some("abc.def"));
        assert_eq!(bearer_token(&auth_header("Bearer   abc  ")), Some("abc"));
        assert_eq!(bearer_token(&auth_header("bearer abc")), None);
        assert_eq!(bearer_token(&auth_header("Basic YWxpY2U6czNjcmV0")), None);
        assert_eq!(bearer_token(&auth_header("Bearer ")), None);
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }

    #[tokio::test]
    async fn test_valid_token_attaches_identity() {
        let (gate, codec) = gate().await;
        let token = codec.issue("alice").unwrap();

        let outcome = gate
            .evaluate("/api/v1/appointments", &auth_header(&format!("Bearer {}", token)))
            .await
            .unwrap();

        match outcome {
            GateOutcome::IdentityAttached(user) => {
                assert_eq!(user.login, "alice");
                assert_eq!(user.role, Role::User);
            }
            other => panic!("expected identity, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_exempt_path_ignores_header() {
        let (gate, codec) = gate().await;
        let token = codec.issue("alice").unwrap();

        let outcome = gate
            .evaluate("/api/v1/auth/login", &auth_header(&format!("Bearer {}", token)))
            .await
            .unwrap();
        assert_eq!(outcome, GateOutcome::PassedThrough(PassReason::Exempt));
    }

    #[tokio::test]
    async fn test_expired_token_equals_no_token() {
        let (gate, codec) = gate().await;
        let token = codec
            .issue_at("alice", Utc::now() - Duration::hours(3))
            .unwrap();

        let expired = gate
            .evaluate("/api/v1/appointments", &auth_header(&format!("Bearer {}", token)))
            .await
            .unwrap()
            .into_context();
        let absent = gate
            .evaluate("/api/v1/appointments", &HeaderMap::new())
            .await
            .unwrap()
            .into_context();

        assert_eq!(expired, absent);
        assert!(!expired.is_authenticated());
    }

    #[tokio::test]
    async fn test_unknown_subject_passes_through() {
        let (gate, codec) = gate().await;
        let token = codec.issue("mallory").unwrap();

        let outcome = gate
            .evaluate("/api/v1/appointments", &auth_header(&format!("Bearer {}", token)))
            .await
            .unwrap();
        assert_eq!(
            outcome,
            GateOutcome::PassedThrough(PassReason::UnknownSubject)
        );
    }

    #[tokio::test]
    async fn test_garbage_token_is_invalid() {
        let (gate, _) = gate().await;
        let outcome = gate
            .evaluate("/api/v1/appointments", &auth_header("Bearer not.a.token"))
            .await
            .unwrap();
        assert_eq!(outcome, GateOutcome::PassedThrough(PassReason::InvalidToken));
    }
}
