//! Application configuration module
//!
//! Type-safe configuration loaded from environment variables using the
//! `config` and `dotenvy` crates. Variables carry the `SESSION_GATEWAY`
//! prefix and nested values are separated by double underscores.
//!
//! # Example
//!
//! ```no_run
//! use session_gateway::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Gateway listening on {:?}", config.server.socket_addr());
//! ```

mod backend;
mod error;
mod server;

pub use backend::BackendConfig;
pub use error::{ConfigError, ValidationError};
pub use server::{Environment, LogFormat, ServerConfig};

use serde::Deserialize;

/// One inbound request may cost an initial call, a refresh and a retry.
const BACKEND_CALLS_PER_REQUEST: u64 = 3;

/// Root application configuration
///
/// Load using [`AppConfig::load()`] which reads from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Listener, logging and inbound limits
    #[serde(default)]
    pub server: ServerConfig,

    /// Backend origins and outbound timeouts
    pub backend: BackendConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `SESSION_GATEWAY` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `SESSION_GATEWAY__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `SESSION_GATEWAY__BACKEND__BASE_URL=...` -> `backend.base_url = ...`
    /// - `SESSION_GATEWAY__BACKEND__OVERRIDES__CHAT=...` -> chat family origin
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or values
    /// cannot be parsed into the expected types.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("SESSION_GATEWAY")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// Besides each section's own checks, the inbound request timeout must
    /// cover the worst case of three sequential backend calls.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.backend.validate()?;

        let worst_case = self.backend.timeout_secs * BACKEND_CALLS_PER_REQUEST;
        if self.server.request_timeout_secs < worst_case {
            return Err(ValidationError::TimeoutBudgetExceeded(worst_case));
        }
        Ok(())
    }
}
