//! Token codec: HS256 JSON Web Tokens carrying the login as subject

use super::users::StoreError;
use crate::error::{internal_error_response, ErrorResponse};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::{distributions::Alphanumeric, Rng};
use sai_core::AuthConfig;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Claims carried by every token
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Issuer
    pub iss: String,
    /// Subject (login)
    pub sub: String,
    /// Issued at (timestamp)
    pub iat: i64,
    /// Expiration time (timestamp)
    pub exp: i64,
}

/// Authentication errors
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Missing credentials")]
    MissingCredentials,
    #[error("Login already taken")]
    LoginTaken,
    #[error("Authentication required")]
    Unauthenticated,
    #[error("Signing key unavailable")]
    SigningKeyUnavailable,
    #[error("Token creation failed")]
    TokenCreation,
    #[error("Password hashing failed")]
    PasswordHashing,
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            AuthError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "invalid_credentials",
                "Invalid login or password",
            ),
            AuthError::MissingCredentials => (
                StatusCode::BAD_REQUEST,
                "missing_credentials",
                "Login and password are required",
            ),
            AuthError::LoginTaken => (
                StatusCode::BAD_REQUEST,
                "login_taken",
                "Login is already in use",
            ),
            AuthError::Unauthenticated => (
                StatusCode::UNAUTHORIZED,
                "unauthenticated",
                "A valid bearer token is required",
            ),
            AuthError::SigningKeyUnavailable
            | AuthError::TokenCreation
            | AuthError::PasswordHashing
            | AuthError::Store(_) => return internal_error_response(&self),
        };

        ErrorResponse::new(status, error_code, message).into_response()
    }
}

/// Issues and verifies signed, time-bounded tokens.
///
/// Keys are derived once from the configured secret and never change
/// afterwards, so a single instance is shared by every request.
pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    issuer: String,
    ttl: Duration,
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("issuer", &self.issuer)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl TokenCodec {
    /// Create a codec from a shared secret
    pub fn new(secret: &str, issuer: &str, ttl: Duration) -> Result<Self, AuthError> {
        if secret.trim().is_empty() {
            return Err(AuthError::SigningKeyUnavailable);
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[issuer]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);
        // exp is compared against the caller-supplied clock in verify_at
        validation.validate_exp = false;

        Ok(Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            issuer: issuer.to_string(),
            ttl,
        })
    }

    /// Create a codec from configuration.
    ///
    /// Without a configured secret, development mode generates a throwaway
    /// one; anywhere else startup fails.
    pub fn from_config(config: &AuthConfig, dev_mode: bool) -> Result<Self, AuthError> {
        let ttl = Duration::minutes(config.token_ttl_minutes);

        match config.jwt_secret.as_deref() {
            Some(secret) if !secret.trim().is_empty() => Self::new(secret, &config.issuer, ttl),
            _ if dev_mode => {
                warn!("No JWT secret configured; generated a temporary one for development");
                Self::new(&generate_secret(), &config.issuer, ttl)
            }
            _ => Err(AuthError::SigningKeyUnavailable),
        }
    }

    /// Token validity window
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// Issue a token for `login`, valid from now
    pub fn issue(&self, login: &str) -> Result<String, AuthError> {
        self.issue_at(login, Utc::now())
    }

    /// Issue a token as if the current time were `now`
    pub fn issue_at(&self, login: &str, now: DateTime<Utc>) -> Result<String, AuthError> {
        let claims = Claims {
            iss: self.issuer.clone(),
            sub: login.to_string(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding).map_err(|e| {
            warn!("Failed to encode JWT token: {}", e);
            AuthError::TokenCreation
        })
    }

    /// Verify a raw token (scheme prefix already removed).
    ///
    /// Returns the subject login, or `None` for malformed, tampered,
    /// foreign-issuer or expired tokens.
    pub fn verify(&self, token: &str) -> Option<String> {
        self.verify_at(token, Utc::now())
    }

    /// Verify a token as if the current time were `now`
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Option<String> {
        if token.trim().is_empty() {
            return None;
        }

        let claims = match decode::<Claims>(token, &self.decoding, &self.validation) {
            Ok(data) => data.claims,
            Err(e) => {
                debug!("Token verification failed: {}", e);
                return None;
            }
        };

        if now.timestamp() >= claims.exp {
            debug!("Token expired at {}", claims.exp);
            return None;
        }

        if claims.sub.is_empty() {
            return None;
        }

        Some(claims.sub)
    }
}

fn generate_secret() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(48)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec() -> TokenCodec {
        TokenCodec::new("unit-test-secret", "sai-test", Duration::hours(2)).unwrap()
    }

    fn tamper_signature(token: &str) -> String {
        let (head, signature) = token.rsplit_once('.').unwrap();
        let mut chars: Vec<char> = signature.chars().collect();
        chars[0] = if chars[0] == 'A' { 'B' } else { 'A' };
        format!("{}.{}", head, chars.into_iter().collect::<String>())
    }

    #[test]
    fn test_issue_then_verify() {
        let codec = codec();
        let token = codec.issue("alice").unwrap();
        assert_eq!(codec.verify(&token), Some("alice".to_string()));
    }

    #[test]
    fn test_expired_token_is_invalid() {
        let codec = codec();
        let issued = Utc::now();
        let token = codec.issue_at("alice", issued).unwrap();

        let just_before = issued + Duration::hours(2) - Duration::seconds(1);
        assert_eq!(
            codec.verify_at(&token, just_before),
            Some("alice".to_string())
        );
        assert_eq!(codec.verify_at(&token, issued + Duration::hours(2)), None);
        assert_eq!(codec.verify_at(&token, issued + Duration::days(1)), None);
    }

    #[test]
    fn test_tampered_signature_is_invalid() {
        let codec = codec();
        let token = codec.issue("alice").unwrap();
        assert_eq!(codec.verify(&tamper_signature(&token)), None);
    }

    #[test]
    fn test_foreign_key_is_invalid() {
        let other = TokenCodec::new("another-secret", "sai-test", Duration::hours(2)).unwrap();
        let token = other.issue("alice").unwrap();
        assert_eq!(codec().verify(&token), None);
    }

    #[test]
    fn test_foreign_issuer_is_invalid() {
        let other = TokenCodec::new("unit-test-secret", "someone-else", Duration::hours(2)).unwrap();
        let token = other.issue("alice").unwrap();
        assert_eq!(codec().verify(&token), None);
    }

    #[test]
    fn test_malformed_and_blank_tokens() {
        let codec = codec();
        assert_eq!(codec.verify(""), None);
        assert_eq!(codec.verify("   "), None);
        assert_eq!(codec.verify("not-a-token"), None);
        assert_eq!(codec.verify("a.b.c"), None);
    }

    #[test]
    fn test_prefixed_token_is_not_trimmed() {
        let codec = codec();
        let token = codec.issue("alice").unwrap();
        assert_eq!(codec.verify(&format!("Bearer {}", token)), None);
    }

    #[test]
    fn test_claims_content() {
        let codec = codec();
        let now = Utc::now();
        let token = codec.issue_at("bob", now).unwrap();

        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.set_issuer(&["sai-test"]);
        let data = decode::<Claims>(
            &token,
            &DecodingKey::from_secret(b"unit-test-secret"),
            &validation,
        )
        .unwrap();

        assert_eq!(data.claims.sub, "bob");
        assert_eq!(data.claims.iss, "sai-test");
        assert_eq!(data.claims.iat, now.timestamp());
        assert_eq!(data.claims.exp - data.claims.iat, 2 * 60 * 60);
    }

    #[test]
    fn test_empty_secret_is_rejected() {
        assert!(matches!(
            TokenCodec::new("  ", "sai", Duration::hours(2)),
            Err(AuthError::SigningKeyUnavailable)
        ));
    }

    #[test]
    fn test_from_config_requires_secret_outside_dev_mode() {
        let config = AuthConfig::default();
        assert!(matches!(
            TokenCodec::from_config(&config, false),
            Err(AuthError::SigningKeyUnavailable)
        ));

        let codec = TokenCodec::from_config(&config, true).unwrap();
        let token = codec.issue("admin").unwrap();
        assert_eq!(codec.verify(&token), Some("admin".to_string()));
        assert_eq!(codec.ttl(), Duration::minutes(120));
    }
}
