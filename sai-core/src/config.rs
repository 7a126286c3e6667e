//! Configuration management

use crate::config_error;
use crate::error::{ErrorContext, SaiError, SaiResult};
use crate::logging::LoggingConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One year
const MAX_TOKEN_TTL_MINUTES: i64 = 525_600;

/// Top-level service configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SaiConfig {
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
}

/// HTTP listener settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Development mode relaxes startup checks (e.g. generates a signing secret)
    pub dev_mode: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            dev_mode: false,
        }
    }
}

/// Token signing and credential seeding settings
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// HMAC secret used to sign and verify tokens
    pub jwt_secret: Option<String>,
    /// Issuer claim written into and required from every token
    pub issuer: String,
    /// Token validity window
    pub token_ttl_minutes: i64,
    pub default_admin_login: String,
    pub default_admin_password: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: None,
            issuer: "sai-api".to_string(),
            token_ttl_minutes: 120,
            default_admin_login: "admin".to_string(),
            default_admin_password: "123456".to_string(),
        }
    }
}

// Secrets stay out of debug output.
impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &self.jwt_secret.as_ref().map(|_| "<redacted>"))
            .field("issuer", &self.issuer)
            .field("token_ttl_minutes", &self.token_ttl_minutes)
            .field("default_admin_login", &self.default_admin_login)
            .field("default_admin_password", &"<redacted>")
            .finish()
    }
}

/// Credential storage backend
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Database URL; the in-memory store is used when absent
    pub database_url: Option<String>,
}

impl SaiConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> SaiResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| SaiError::Config {
            message: format!("Failed to read config file: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config")
                .with_operation("read_file")
                .with_suggestion("Check if the config file exists and is readable"),
        })?;

        toml::from_str(&content).map_err(|e| SaiError::Config {
            message: format!("Failed to parse config: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config")
                .with_operation("parse_toml")
                .with_suggestion("Check TOML syntax in config file"),
        })
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> SaiResult<()> {
        let content = toml::to_string_pretty(self).map_err(|e| SaiError::Config {
            message: format!("Failed to serialize config: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config").with_operation("serialize_toml"),
        })?;

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Overlay values from environment variables
    pub fn apply_env(&mut self) -> SaiResult<()> {
        self.apply_vars(|key| std::env::var(key).ok())
    }

    /// Overlay values from an arbitrary variable source
    pub fn apply_vars<F>(&mut self, lookup: F) -> SaiResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("SAI_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("SAI_PORT") {
            self.server.port = parse_var("SAI_PORT", &port)?;
        }
        if let Some(dev_mode) = lookup("SAI_DEV_MODE") {
            self.server.dev_mode = parse_var("SAI_DEV_MODE", &dev_mode)?;
        }
        if let Some(secret) = lookup("JWT_SECRET") {
            self.auth.jwt_secret = Some(secret);
        }
        if let Some(issuer) = lookup("SAI_TOKEN_ISSUER") {
            self.auth.issuer = issuer;
        }
        if let Some(ttl) = lookup("SAI_TOKEN_TTL_MINUTES") {
            self.auth.token_ttl_minutes = parse_var("SAI_TOKEN_TTL_MINUTES", &ttl)?;
        }
        if let Some(url) = lookup("DATABASE_URL") {
            self.storage.database_url = Some(url);
        }
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> SaiResult<()> {
        if self.server.port == 0 {
            return Err(config_error!("server.port must be greater than 0", "config"));
        }

        if self.auth.issuer.trim().is_empty() {
            return Err(config_error!("auth.issuer must not be empty", "config"));
        }

        if !(1..=MAX_TOKEN_TTL_MINUTES).contains(&self.auth.token_ttl_minutes) {
            return Err(config_error!(
                "auth.token_ttl_minutes must be between 1 and 525600",
                "config"
            ));
        }

        if self.auth.default_admin_login.trim().is_empty() {
            return Err(config_error!(
                "auth.default_admin_login must not be empty",
                "config"
            ));
        }

        Ok(())
    }

    /// Listener address in `host:port` form
    pub fn address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn parse_var<T>(key: &str, value: &str) -> SaiResult<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| SaiError::Config {
        message: format!("Invalid value for {}: {}", key, e),
        source: None,
        context: ErrorContext::new("config")
            .with_operation("apply_env")
            .with_suggestion("Check the environment variable value"),
    })
}
