//! Backend configuration

use std::collections::HashMap;
use std::time::Duration;

use reqwest::Url;
use serde::Deserialize;

use super::error::ValidationError;
use crate::domain::gateway::ResourceFamily;

/// Where the domain backend lives and how long the gateway waits for it.
#[derive(Debug, Clone, Deserialize)]
pub struct BackendConfig {
    /// Default backend origin for every family
    pub base_url: String,

    /// Budget for one outbound call, body included
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Budget for establishing a connection
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Path of the refresh operation on the auth backend
    #[serde(default = "default_refresh_path")]
    pub refresh_path: String,

    /// Per-family origin overrides, keyed by family name
    #[serde(default)]
    pub overrides: HashMap<String, String>,
}

impl BackendConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Origin for a family: its override if any, else the default.
    pub fn base_url_for(&self, family: ResourceFamily) -> String {
        self.overrides
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(family.as_str()))
            .map(|(_, url)| url.clone())
            .unwrap_or_else(|| self.base_url.clone())
    }

    /// Full URL of the refresh operation.
    pub fn refresh_url(&self) -> String {
        format!(
            "{}{}",
            self.base_url_for(ResourceFamily::Auth).trim_end_matches('/'),
            self.refresh_path
        )
    }

    /// Validate backend configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.base_url.is_empty() {
            return Err(ValidationError::MissingRequired("BACKEND__BASE_URL"));
        }
        validate_url(&self.base_url)?;

        for (name, url) in &self.overrides {
            name.parse::<ResourceFamily>()
                .map_err(|_| ValidationError::UnknownResourceFamily(name.clone()))?;
            validate_url(url)?;
        }

        if self.timeout_secs == 0 || self.timeout_secs > 60 {
            return Err(ValidationError::InvalidBackendTimeout);
        }
        if self.connect_timeout_secs == 0 || self.connect_timeout_secs > self.timeout_secs {
            return Err(ValidationError::InvalidBackendTimeout);
        }
        if !self.refresh_path.starts_with('/') {
            return Err(ValidationError::InvalidRefreshPath(self.refresh_path.clone()));
        }
        Ok(())
    }
}

fn validate_url(raw: &str) -> Result<(), ValidationError> {
    let url = Url::parse(raw).map_err(|_| ValidationError::InvalidBackendUrl(raw.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(ValidationError::InvalidBackendUrl(raw.to_string()));
    }
    Ok(())
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            timeout_secs: default_timeout(),
            connect_timeout_secs: default_connect_timeout(),
            refresh_path: default_refresh_path(),
            overrides: HashMap::new(),
        }
    }
}

fn default_timeout() -> u64 {
    5
}

fn default_connect_timeout() -> u64 {
    2
}

fn default_refresh_path() -> String {
    "/api/auth/refresh".to_string()
}
