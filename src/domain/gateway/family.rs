//! Resource families - logical groupings of backend endpoints.
//!
//! A family decides routing and credential policy. It is bound to an inbound
//! route when the router is built and is never inferred from payload content.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::errors::GatewayError;

/// Logical grouping of backend endpoints sharing routing and credential policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceFamily {
    Auth,
    Chat,
    Feed,
    Subscription,
    Admin,
    Explore,
    Matching,
}

impl ResourceFamily {
    /// Every family the gateway knows about.
    pub const ALL: [ResourceFamily; 7] = [
        ResourceFamily::Auth,
        ResourceFamily::Chat,
        ResourceFamily::Feed,
        ResourceFamily::Subscription,
        ResourceFamily::Admin,
        ResourceFamily::Explore,
        ResourceFamily::Matching,
    ];

    /// Lowercase name used in inbound paths, config keys and log fields.
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceFamily::Auth => "auth",
            ResourceFamily::Chat => "chat",
            ResourceFamily::Feed => "feed",
            ResourceFamily::Subscription => "subscription",
            ResourceFamily::Admin => "admin",
            ResourceFamily::Explore => "explore",
            ResourceFamily::Matching => "matching",
        }
    }
}

impl fmt::Display for ResourceFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceFamily {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_lowercase();
        ResourceFamily::ALL
            .into_iter()
            .find(|family| family.as_str() == name)
            .ok_or(GatewayError::UnknownResourceFamily(name))
    }
}
