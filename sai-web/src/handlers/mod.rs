//! HTTP request handlers for the SAI web server

pub mod appointments;
pub mod health;
pub mod types;

pub use appointments::*;
pub use health::*;
pub use types::*;
