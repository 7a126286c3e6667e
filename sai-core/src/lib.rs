//! SAI Core - shared infrastructure for the scheduling service
//!
//! Error types, configuration loading and logging setup used by every
//! binary in the workspace.

pub mod config;
pub mod error;
pub mod logging;

pub use config::*;
pub use error::*;
pub use logging::*;

// Re-export commonly used external types
pub use tracing;
