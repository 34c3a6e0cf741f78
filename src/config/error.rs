//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid port number")]
    InvalidPort,

    #[error("Invalid request timeout")]
    InvalidTimeout,

    #[error("Invalid backend timeout")]
    InvalidBackendTimeout,

    #[error("Request timeout must exceed three backend call budgets ({0}s)")]
    TimeoutBudgetExceeded(u64),

    #[error("Invalid backend URL: {0}")]
    InvalidBackendUrl(String),

    #[error("Backend override for unknown resource family: {0}")]
    UnknownResourceFamily(String),

    #[error("Invalid refresh path: {0}")]
    InvalidRefreshPath(String),

    #[error("Invalid bind address: {0}")]
    InvalidBindAddress(String),
}
