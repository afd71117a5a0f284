//! services/api/src/error.rs
//!
//! Defines the primary error type for the entire API service.

use crate::config::ConfigError;
use medprep_core::ports::PortError;

/// The primary error type for the `api` service. Everything that can stop
/// the binary from starting, or escape a handler, funnels into this.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Configuration could not be loaded or was invalid.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// An error that propagated up from one of the core service ports.
    #[error("Service Port Error: {0}")]
    Port(#[from] PortError),

    /// An error from the underlying database library, including failed
    /// migrations at startup.
    #[error("Database Error: {0}")]
    Database(#[from] sqlx::Error),

    /// A standard Input/Output error (e.g., binding to a network socket).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A catch-all for any other unexpected errors.
    #[error("An unexpected internal error occurred: {0}")]
    Internal(String),
}
