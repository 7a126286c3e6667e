//! Application state shared by every request

use crate::{
    appointments::AppointmentStore,
    auth::{
        exemptions::RouteExemptions,
        jwt::TokenCodec,
        users::{CredentialStore, IdentityResolver, MemoryCredentialStore},
    },
    middleware::RequestGate,
    WebResult,
};
use sai_core::SaiConfig;
use std::sync::Arc;
use tracing::info;

/// Application state
#[derive(Clone)]
pub struct AppState {
    /// Configuration, read-only after startup
    pub config: Arc<SaiConfig>,
    pub token_codec: Arc<TokenCodec>,
    pub identity_resolver: IdentityResolver,
    pub gate: RequestGate,
    pub appointments: AppointmentStore,
}

impl AppState {
    /// Create the state, choosing the credential store from configuration
    pub async fn new(config: SaiConfig) -> WebResult<Self> {
        let store = credential_store(&config).await?;
        Self::with_store(config, store).await
    }

    /// Create the state over an explicit credential store
    pub async fn with_store(
        config: SaiConfig,
        store: Arc<dyn CredentialStore>,
    ) -> WebResult<Self> {
        config.validate()?;

        let token_codec = Arc::new(TokenCodec::from_config(
            &config.auth,
            config.server.dev_mode,
        )?);
        let identity_resolver = IdentityResolver::new(store);

        identity_resolver
            .ensure_default_admin(
                &config.auth.default_admin_login,
                &config.auth.default_admin_password,
            )
            .await?;

        let gate = RequestGate::new(
            token_codec.clone(),
            identity_resolver.clone(),
            RouteExemptions::default(),
        );

        info!("Application state initialized successfully");
        Ok(Self {
            config: Arc::new(config),
            token_codec,
            identity_resolver,
            gate,
            appointments: AppointmentStore::new(),
        })
    }
}

#[cfg(feature = "sqlite")]
async fn credential_store(config: &SaiConfig) -> WebResult<Arc<dyn CredentialStore>> {
    use crate::auth::database::SqliteCredentialStore;
    use sai_core::{ErrorContext, SaiError};

    match config.storage.database_url.as_deref() {
        Some(url) => {
            let store = SqliteCredentialStore::connect(url)
                .await
                .map_err(|e| SaiError::Storage {
                    message: "cannot open credential database".to_string(),
                    source: Some(Box::new(e)),
                    context: ErrorContext::new("credential_store")
                        .with_operation("connect")
                        .with_suggestion("Check DATABASE_URL and that its directory exists"),
                })?;
            info!("Using SQLite credential store");
            Ok(Arc::new(store))
        }
        None => {
            info!("No database configured; using in-memory credential store");
            Ok(Arc::new(MemoryCredentialStore::new()))
        }
    }
}

#[cfg(not(feature = "sqlite"))]
async fn credential_store(config: &SaiConfig) -> WebResult<Arc<dyn CredentialStore>> {
    if config.storage.database_url.is_some() {
        tracing::warn!("DATABASE_URL ignored: built without the sqlite feature");
    }
    Ok(Arc::new(MemoryCredentialStore::new()))
}
