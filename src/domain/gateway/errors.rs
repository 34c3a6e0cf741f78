//! Gateway error taxonomy.
//!
//! Every variant knows the status code and the caller-safe message it turns
//! into at the browser boundary. The `Display` text may carry transport
//! detail and is for server-side diagnostics only.

use std::time::Duration;

use thiserror::Error;

use super::family::ResourceFamily;

/// Telemetry category of a gateway failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Misconfigured route table; a programming error.
    Configuration,
    /// Something the caller did wrong.
    Client,
    /// Backend or network trouble.
    Infrastructure,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Configuration => "configuration",
            ErrorKind::Client => "client",
            ErrorKind::Infrastructure => "infrastructure",
        }
    }
}

/// Failures detected by the gateway itself.
#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    #[error("Unknown resource family: {0}")]
    UnknownResourceFamily(String),

    #[error("Method {method} not allowed for {family}")]
    MethodNotAllowed {
        family: ResourceFamily,
        method: String,
    },

    #[error("Credential required for {0}")]
    CredentialMissing(ResourceFamily),

    #[error("Backend {service} unreachable: {detail}")]
    BackendUnreachable { service: String, detail: String },

    #[error("Malformed response from {service}: {detail}")]
    MalformedBackendResponse { service: String, detail: String },

    #[error("Credential refresh exhausted: {0}")]
    RefreshExhausted(String),

    #[error("Invalid request body: {0}")]
    InvalidRequestBody(String),

    #[error("Invalid request path: {0}")]
    InvalidPath(String),

    #[error("Request exceeded its {0:?} budget")]
    RequestTimedOut(Duration),
}

impl GatewayError {
    pub fn unreachable(service: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::BackendUnreachable {
            service: service.into(),
            detail: detail.into(),
        }
    }

    pub fn malformed(service: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::MalformedBackendResponse {
            service: service.into(),
            detail: detail.into(),
        }
    }

    /// HTTP status returned to the browser.
    pub fn status(&self) -> u16 {
        match self {
            GatewayError::MethodNotAllowed { .. } => 405,
            GatewayError::CredentialMissing(_) => 401,
            GatewayError::RefreshExhausted(_) => 401,
            GatewayError::InvalidRequestBody(_) | GatewayError::InvalidPath(_) => 400,
            GatewayError::UnknownResourceFamily(_)
            | GatewayError::BackendUnreachable { .. }
            | GatewayError::MalformedBackendResponse { .. } => 500,
            GatewayError::RequestTimedOut(_) => 504,
        }
    }

    /// Message safe to show the browser. Never contains transport detail.
    pub fn client_message(&self) -> String {
        match self {
            GatewayError::UnknownResourceFamily(_) => "Internal server error".to_string(),
            GatewayError::MethodNotAllowed { .. } => "Method not allowed".to_string(),
            GatewayError::CredentialMissing(_) => "Authentication token required".to_string(),
            GatewayError::BackendUnreachable { service, .. } => {
                format!("Cannot connect to {} service", service)
            }
            GatewayError::MalformedBackendResponse { service, .. } => {
                format!("Invalid response from {} service", service)
            }
            GatewayError::RefreshExhausted(_) => "Session expired".to_string(),
            GatewayError::InvalidRequestBody(_) => "Invalid JSON body".to_string(),
            GatewayError::InvalidPath(_) => "Invalid request path".to_string(),
            GatewayError::RequestTimedOut(_) => "Request timed out".to_string(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            GatewayError::UnknownResourceFamily(_) => ErrorKind::Configuration,
            GatewayError::MethodNotAllowed { .. }
            | GatewayError::CredentialMissing(_)
            | GatewayError::RefreshExhausted(_)
            | GatewayError::InvalidRequestBody(_)
            | GatewayError::InvalidPath(_) => ErrorKind::Client,
            GatewayError::BackendUnreachable { .. }
            | GatewayError::MalformedBackendResponse { .. }
            | GatewayError::RequestTimedOut(_) => ErrorKind::Infrastructure,
        }
    }

    pub fn is_configuration_error(&self) -> bool {
        self.kind() == ErrorKind::Configuration
    }
}
