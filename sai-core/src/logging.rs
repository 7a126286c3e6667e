//! Unified logging system
//!
//! Structured logging with configurable output format and destination.

use crate::error::{ErrorContext, SaiError, SaiResult};
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use tracing_subscriber::{
    fmt::{self, writer::BoxMakeWriter},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Output format (json, pretty, compact)
    pub format: LogFormat,
    /// Whether to include file and line information
    pub include_location: bool,
    /// Whether to include thread information
    pub include_thread: bool,
    /// Log file path; stdout when absent
    pub log_file_path: Option<String>,
    /// Custom filter directives
    pub filter_directives: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Pretty,
    Compact,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Compact,
            include_location: false,
            include_thread: false,
            log_file_path: None,
            filter_directives: vec![
                "sai_core=debug".to_string(),
                "sai_web=debug".to_string(),
                "tower_http=debug".to_string(),
            ],
        }
    }
}

impl LoggingConfig {
    /// Build the env filter: `RUST_LOG` wins over the configured level,
    /// configured directives are appended either way.
    pub fn env_filter(&self) -> SaiResult<EnvFilter> {
        let mut filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.level));

        for directive in &self.filter_directives {
            let parsed = directive.parse().map_err(|e| SaiError::Logging {
                message: format!("Invalid filter directive '{}': {}", directive, e),
                context: ErrorContext::new("logging").with_operation("parse_directive"),
            })?;
            filter = filter.add_directive(parsed);
        }

        Ok(filter)
    }

    fn writer(&self) -> SaiResult<BoxMakeWriter> {
        match &self.log_file_path {
            Some(path) => {
                let file = std::fs::OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)?;
                Ok(BoxMakeWriter::new(Mutex::new(file)))
            }
            None => Ok(BoxMakeWriter::new(std::io::stdout)),
        }
    }
}

/// Initialize the global tracing subscriber
pub fn init_logging(config: &LoggingConfig) -> SaiResult<()> {
    let registry = tracing_subscriber::registry().with(config.env_filter()?);
    let writer = config.writer()?;

    let result = match config.format {
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .with_file(config.include_location)
                    .with_line_number(config.include_location)
                    .with_thread_ids(config.include_thread)
                    .with_writer(writer),
            )
            .try_init(),
        LogFormat::Pretty => registry
            .with(
                fmt::layer()
                    .pretty()
                    .with_file(config.include_location)
                    .with_line_number(config.include_location)
                    .with_thread_ids(config.include_thread)
                    .with_writer(writer),
            )
            .try_init(),
        LogFormat::Compact => registry
            .with(
                fmt::layer()
                    .compact()
                    .with_file(config.include_location)
                    .with_line_number(config.include_location)
                    .with_thread_ids(config.include_thread)
                    .with_writer(writer),
            )
            .try_init(),
    };

    result.map_err(|e| SaiError::Logging {
        message: format!("Failed to install subscriber: {}", e),
        context: ErrorContext::new("logging").with_operation("init"),
    })
}
