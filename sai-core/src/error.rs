//! Unified error handling system
//!
//! Structured error types carrying a context (component, operation, recovery
//! suggestions) so failures at startup can be reported precisely.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::error;

pub type SaiResult<T> = Result<T, SaiError>;

/// Error context providing additional information for debugging and recovery
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorContext {
    /// Unique error ID for tracking
    pub error_id: String,
    /// Timestamp when error occurred
    pub timestamp: DateTime<Utc>,
    /// Component where error originated
    pub component: String,
    /// Operation being performed when error occurred
    pub operation: Option<String>,
    /// Recovery suggestions
    pub recovery_suggestions: Vec<String>,
}

impl ErrorContext {
    pub fn new(component: &str) -> Self {
        Self {
            error_id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            component: component.to_string(),
            operation: None,
            recovery_suggestions: Vec::new(),
        }
    }

    pub fn with_operation(mut self, operation: &str) -> Self {
        self.operation = Some(operation.to_string());
        self
    }

    pub fn with_suggestion(mut self, suggestion: &str) -> Self {
        self.recovery_suggestions.push(suggestion.to_string());
        self
    }
}

/// Main error type for the infrastructure layer
#[derive(Error, Debug)]
pub enum SaiError {
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        context: ErrorContext,
    },

    #[error("Logging error: {message}")]
    Logging {
        message: String,
        context: ErrorContext,
    },

    #[error("Storage error: {message}")]
    Storage {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        context: ErrorContext,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SaiError {
    /// Get the error context
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            SaiError::Config { context, .. } => Some(context),
            SaiError::Logging { context, .. } => Some(context),
            SaiError::Storage { context, .. } => Some(context),
            _ => None,
        }
    }

    /// Log the error together with its tracking id
    pub fn log(&self) {
        error!(
            error_id = ?self.context().map(|c| &c.error_id),
            error = %self,
            "Error occurred"
        );
    }
}

#[macro_export]
macro_rules! config_error {
    ($msg:expr, $component:expr) => {
        $crate::SaiError::Config {
            message: $msg.to_string(),
            source: None,
            context: $crate::ErrorContext::new($component)
                .with_suggestion("Check your configuration file"),
        }
    };
}
