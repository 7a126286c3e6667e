//! SAI Web Server
//!
//! Main web server implementation using Axum.

use crate::{create_app, AppState, WebError, WebResult};
use axum::serve;
use sai_core::SaiConfig;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

/// Main SAI web server
pub struct SaiServer {
    state: AppState,
}

impl SaiServer {
    /// Create a new server
    pub async fn new(config: SaiConfig) -> WebResult<Self> {
        let state = AppState::new(config).await?;
        Ok(Self { state })
    }

    /// Bind and serve until Ctrl-C
    pub async fn start(self) -> WebResult<()> {
        let address = self.state.config.address();

        info!("Starting SAI Web Server");
        info!("Development mode: {}", self.state.config.server.dev_mode);

        let app = create_app(self.state.clone());

        let listener = TcpListener::bind(&address)
            .await
            .map_err(WebError::Server)?;

        info!("Server listening on http://{}", address);
        info!("API documentation at http://{}/swagger-ui", address);

        if let Err(e) = serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
        {
            error!("Server error: {}", e);
            return Err(WebError::Server(e));
        }

        info!("Server shut down gracefully");
        Ok(())
    }

    /// Get server configuration
    pub fn config(&self) -> &SaiConfig {
        &self.state.config
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

/// Builder for SaiServer
pub struct SaiServerBuilder {
    config: SaiConfig,
}

impl SaiServerBuilder {
    /// Create a new server builder
    pub fn new() -> Self {
        Self {
            config: SaiConfig::default(),
        }
    }

    /// Start from an existing configuration
    pub fn with_config(config: SaiConfig) -> Self {
        Self { config }
    }

    /// Set the server host
    pub fn host<S: Into<String>>(mut self, host: S) -> Self {
        self.config.server.host = host.into();
        self
    }

    /// Set the server port
    pub fn port(mut self, port: u16) -> Self {
        self.config.server.port = port;
        self
    }

    /// Enable development mode
    pub fn dev_mode(mut self, dev_mode: bool) -> Self {
        self.config.server.dev_mode = dev_mode;
        self
    }

    /// Set the token signing secret
    pub fn jwt_secret<S: Into<String>>(mut self, secret: S) -> Self {
        self.config.auth.jwt_secret = Some(secret.into());
        self
    }

    /// Set database URL
    pub fn database_url<S: Into<String>>(mut self, database_url: S) -> Self {
        self.config.storage.database_url = Some(database_url.into());
        self
    }

    /// Build the server
    pub async fn build(self) -> WebResult<SaiServer> {
        SaiServer::new(self.config).await
    }
}

impl Default for SaiServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
