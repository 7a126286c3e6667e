//! Identities, credential storage and the identity resolver

use super::{jwt::AuthError, Capability};
use crate::error::FieldError;
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, LazyLock};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use utoipa::ToSchema;

const MIN_PASSWORD_LENGTH: usize = 6;
const MAX_LOGIN_LENGTH: usize = 64;

/// Hash verified when a login does not exist, so unknown logins cost the
/// same as wrong passwords.
static DUMMY_HASH: LazyLock<String> =
    LazyLock::new(|| hash_password("sai-unknown-login").unwrap_or_default());

/// Role assigned at registration; never changes afterwards
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Admin,
    User,
}

impl Role {
    /// Capabilities granted by this role
    pub fn capabilities(&self) -> HashSet<Capability> {
        match self {
            Role::Admin => [
                Capability::ViewAppointments,
                Capability::CreateAppointments,
                Capability::UpdateAppointmentStatus,
            ]
            .into_iter()
            .collect(),
            Role::User => [Capability::ViewAppointments, Capability::CreateAppointments]
                .into_iter()
                .collect(),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Admin => write!(f, "ADMIN"),
            Role::User => write!(f, "USER"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "ADMIN" => Ok(Role::Admin),
            "USER" => Ok(Role::User),
            _ => Err(format!("Unknown role: {}", s)),
        }
    }
}

/// Stored identity with its password hash
#[derive(Clone)]
pub struct Identity {
    pub login: String,
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl std::fmt::Debug for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Identity")
            .field("login", &self.login)
            .field("role", &self.role)
            .field("created_at", &self.created_at)
            .finish_non_exhaustive()
    }
}

impl Identity {
    /// Create a new identity, hashing the plaintext password
    pub fn new(login: &str, password: &str, role: Role) -> Result<Self, AuthError> {
        Ok(Self {
            login: login.to_string(),
            password_hash: hash_password(password)?,
            role,
            created_at: Utc::now(),
        })
    }

    /// Verify password
    pub fn verify_password(&self, password: &str) -> bool {
        verify_password(password, &self.password_hash)
    }

    /// Convert to public user info
    pub fn to_user_info(&self) -> UserInfo {
        UserInfo {
            login: self.login.clone(),
            role: self.role,
            created_at: self.created_at,
        }
    }
}

/// Public view of an identity
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserInfo {
    #[schema(example = "alice")]
    pub login: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

/// Login request
#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    #[schema(example = "admin")]
    pub login: String,
    #[schema(example = "123456")]
    pub password: String,
}

/// Registration request
#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterRequest {
    #[schema(example = "alice")]
    pub login: String,
    #[schema(example = "s3cret")]
    pub password: String,
    /// Defaults to USER
    pub role: Option<Role>,
}

impl RegisterRequest {
    /// Field-level validation of the request
    pub fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();

        if self.login.trim().is_empty() {
            errors.push(FieldError::new("login", "login is required"));
        } else if self.login.chars().any(char::is_whitespace) {
            errors.push(FieldError::new("login", "login must not contain whitespace"));
        } else if self.login.chars().count() > MAX_LOGIN_LENGTH {
            errors.push(FieldError::new("login", "login is too long"));
        }

        if self.password.chars().count() < MIN_PASSWORD_LENGTH {
            errors.push(FieldError::new(
                "password",
                "password must have at least 6 characters",
            ));
        }

        errors
    }
}

/// Successful login response
#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
    #[schema(example = "Bearer")]
    pub token_type: String,
    /// Seconds until the token expires
    #[schema(example = 7200)]
    pub expires_in: i64,
}

/// Credential store failures
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("login '{0}' already exists")]
    Conflict(String),
    #[error("credential store failure: {0}")]
    Backend(String),
}

/// Persistence for identities, looked up by login
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Exact-match lookup; absence is `Ok(None)`
    async fn find_by_login(&self, login: &str) -> Result<Option<Identity>, StoreError>;

    /// Insert a new identity; fails with `Conflict` if the login exists
    async fn save(&self, identity: Identity) -> Result<Identity, StoreError>;
}

/// In-memory credential store (for development and testing)
#[derive(Debug, Clone, Default)]
pub struct MemoryCredentialStore {
    users: Arc<RwLock<HashMap<String, Identity>>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn find_by_login(&self, login: &str) -> Result<Option<Identity>, StoreError> {
        Ok(self.users.read().await.get(login).cloned())
    }

    async fn save(&self, identity: Identity) -> Result<Identity, StoreError> {
        let mut users = self.users.write().await;
        if users.contains_key(&identity.login) {
            return Err(StoreError::Conflict(identity.login));
        }
        users.insert(identity.login.clone(), identity.clone());
        Ok(identity)
    }
}

/// Loads identities and checks credentials against the store
#[derive(Clone)]
pub struct IdentityResolver {
    store: Arc<dyn CredentialStore>,
}

impl IdentityResolver {
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        Self { store }
    }

    /// Resolver over a fresh in-memory store
    pub fn memory() -> Self {
        Self::new(Arc::new(MemoryCredentialStore::new()))
    }

    /// Look up an identity by exact login
    pub async fn resolve(&self, login: &str) -> Result<Option<Identity>, StoreError> {
        self.store.find_by_login(login).await
    }

    /// Check a login/password pair.
    ///
    /// Unknown login and wrong password are indistinguishable to the caller.
    pub async fn authenticate(&self, login: &str, password: &str) -> Result<Identity, AuthError> {
        let found = self.resolve(login).await?;
        let password = password.to_string();

        let (found, valid) = run_blocking(move || {
            let valid = match &found {
                Some(identity) => identity.verify_password(&password),
                None => {
                    verify_password(&password, &DUMMY_HASH);
                    false
                }
            };
            (found, valid)
        })
        .await?;

        match found {
            Some(identity) if valid => {
                debug!("User authenticated: {}", login);
                Ok(identity)
            }
            Some(_) => {
                warn!("Invalid password for user: {}", login);
                Err(AuthError::InvalidCredentials)
            }
            None => {
                warn!("Login attempt for unknown user: {}", login);
                Err(AuthError::InvalidCredentials)
            }
        }
    }

    /// Register a new identity
    pub async fn register(
        &self,
        login: &str,
        password: &str,
        role: Role,
    ) -> Result<Identity, AuthError> {
        if login.trim().is_empty() || password.is_empty() {
            return Err(AuthError::MissingCredentials);
        }

        let (login, password) = (login.to_string(), password.to_string());
        let identity = run_blocking(move || Identity::new(&login, &password, role)).await??;
        match self.store.save(identity).await {
            Ok(saved) => {
                info!("Registered new user: {} ({})", saved.login, saved.role);
                Ok(saved)
            }
            Err(StoreError::Conflict(login)) => {
                debug!("Registration failed: login '{}' already exists", login);
                Err(AuthError::LoginTaken)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Create the administrator account unless it already exists.
    ///
    /// Returns whether an account was created.
    pub async fn ensure_default_admin(
        &self,
        login: &str,
        password: &str,
    ) -> Result<bool, AuthError> {
        if self.resolve(login).await?.is_some() {
            debug!("Admin user already exists");
            return Ok(false);
        }

        match self.register(login, password, Role::Admin).await {
            Ok(_) => {
                info!("Created default admin user: {}", login);
                Ok(true)
            }
            // Another instance seeded it first.
            Err(AuthError::LoginTaken) => Ok(false),
            Err(e) => Err(e),
        }
    }
}

/// Run Argon2 work on the blocking pool instead of an async worker
async fn run_blocking<T, F>(work: F) -> Result<T, AuthError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work).await.map_err(|e| {
        warn!("Password hashing task failed: {}", e);
        AuthError::PasswordHashing
    })
}

/// Hash password using Argon2
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHashing)
}

/// Verify password against a PHC hash string
fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}
