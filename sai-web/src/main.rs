//! SAI Web Server
//!
//! Appointment scheduling REST service.

use anyhow::Context;
use clap::Parser;
use sai_core::{init_logging, SaiConfig};
use sai_web::{server::SaiServerBuilder, WebError};
use std::path::PathBuf;
use tracing::info;

/// SAI Web Server - appointment scheduling with bearer-token authentication
#[derive(Parser)]
#[command(name = "sai-web")]
#[command(about = "Appointment scheduling REST service")]
#[command(version)]
struct Args {
    /// Configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Server host to bind to
    #[arg(long)]
    host: Option<String>,

    /// Server port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Enable development mode
    #[arg(long)]
    dev: bool,

    /// Database URL for credential storage
    #[arg(long)]
    database_url: Option<String>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long)]
    log_level: Option<String>,
}

impl Args {
    /// File, then environment, then command line
    fn load_config(&self) -> anyhow::Result<SaiConfig> {
        let mut config = match &self.config {
            Some(path) => SaiConfig::from_file(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => SaiConfig::default(),
        };

        config.apply_env()?;

        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if self.dev {
            config.server.dev_mode = true;
        }
        if let Some(url) = &self.database_url {
            config.storage.database_url = Some(url.clone());
        }
        if let Some(level) = &self.log_level {
            config.logging.level = level.clone();
        }

        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Load environment variables
    dotenvy::dotenv().ok();

    let config = args.load_config()?;
    init_logging(&config.logging)?;

    info!("Server: http://{}", config.address());
    if config.storage.database_url.is_some() {
        info!("Credential store: database");
    }

    let server = SaiServerBuilder::with_config(config)
        .build()
        .await
        .inspect_err(|e| {
            if let WebError::Core(core) = e {
                core.log();
            }
        })
        .context("failed to build server")?;

    server.start().await?;
    Ok(())
}
