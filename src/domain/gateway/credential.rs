//! Session credentials and the extractor that finds them in inbound headers.
//!
//! A credential is an opaque token bound to a browser session. The token is
//! held in a [`Secret`] so it never appears in `Debug` output or logs; only
//! its presence and provenance are observable.
//!
//! # Example
//!
//! ```
//! use session_gateway::domain::gateway::{CredentialExtractor, CredentialSource};
//!
//! let credential = CredentialExtractor::extract(
//!     Some("theme=dark; access_token_cookie=abc123"),
//!     None,
//! )
//! .unwrap();
//!
//! assert_eq!(credential.source(), CredentialSource::Cookie);
//! assert_eq!(credential.token(), "abc123");
//! ```

use secrecy::{ExposeSecret, Secret};

/// Cookie carrying the access credential.
pub const ACCESS_TOKEN_COOKIE: &str = "access_token_cookie";

/// Cookie carrying the refresh credential.
pub const REFRESH_TOKEN_COOKIE: &str = "refresh_token_cookie";

/// Where a credential was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    Cookie,
    AuthorizationHeader,
    /// Issued by a refresh call during this request.
    Refresh,
}

/// Opaque session token plus its provenance.
#[derive(Debug, Clone)]
pub struct Credential {
    token: Secret<String>,
    source: CredentialSource,
}

impl Credential {
    pub fn new(token: impl Into<String>, source: CredentialSource) -> Self {
        Self {
            token: Secret::new(token.into()),
            source,
        }
    }

    pub fn source(&self) -> CredentialSource {
        self.source
    }

    /// Exposes the raw token for building outbound headers.
    pub fn token(&self) -> &str {
        self.token.expose_secret()
    }

    /// `Authorization` header value for bearer-mode routes.
    pub fn bearer_value(&self) -> String {
        format!("Bearer {}", self.token())
    }
}

/// Pulls credentials out of raw header strings. Pure; no side effects.
pub struct CredentialExtractor;

impl CredentialExtractor {
    /// Finds the access credential.
    ///
    /// The `access_token_cookie` cookie wins over a bearer `Authorization`
    /// header. Returns `None` when neither holds a usable token; absence is
    /// not an error here.
    pub fn extract(cookie_header: Option<&str>, authorization: Option<&str>) -> Option<Credential> {
        cookie_header
            .and_then(|header| cookie_value(header, ACCESS_TOKEN_COOKIE))
            .map(|token| Credential::new(token, CredentialSource::Cookie))
            .or_else(|| {
                authorization
                    .and_then(bearer_token)
                    .map(|token| Credential::new(token, CredentialSource::AuthorizationHeader))
            })
    }

    /// Finds the refresh credential, which only ever travels as a cookie.
    pub fn extract_refresh(cookie_header: Option<&str>) -> Option<Credential> {
        cookie_header
            .and_then(|header| cookie_value(header, REFRESH_TOKEN_COOKIE))
            .map(|token| Credential::new(token, CredentialSource::Cookie))
    }
}

/// Returns the first well-formed, non-empty value for `name`.
///
/// Tolerates stray whitespace, empty segments, pairs without `=`, quoted
/// values and duplicate names.
pub fn cookie_value(header: &str, name: &str) -> Option<String> {
    cookie_pairs(header)
        .find(|(key, value)| *key == name && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

fn cookie_pairs(header: &str) -> impl Iterator<Item = (&str, &str)> {
    header.split(';').filter_map(|segment| {
        let (key, value) = segment.split_once('=')?;
        let key = key.trim();
        if key.is_empty() {
            return None;
        }
        let value = value.trim();
        let value = value
            .strip_prefix('"')
            .and_then(|v| v.strip_suffix('"'))
            .unwrap_or(value);
        Some((key, value))
    })
}

fn bearer_token(authorization: &str) -> Option<String> {
    let (scheme, token) = authorization.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then(|| token.to_string())
}

/// Sets `name=value` in a cookie header, replacing every existing pair of
/// that name or appending one. Malformed segments are dropped.
pub fn upsert_cookie(header: Option<&str>, name: &str, value: &str) -> String {
    let mut replaced = false;
    let mut pairs: Vec<String> = Vec::new();

    for (key, existing) in header.map(cookie_pairs_vec).unwrap_or_default() {
        if key == name {
            if !replaced {
                pairs.push(format!("{}={}", name, value));
                replaced = true;
            }
        } else {
            pairs.push(format!("{}={}", key, existing));
        }
    }
    if !replaced {
        pairs.push(format!("{}={}", name, value));
    }

    pairs.join("; ")
}

fn cookie_pairs_vec(header: &str) -> Vec<(String, String)> {
    cookie_pairs(header)
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Name and value of a `Set-Cookie` directive, ignoring its attributes.
pub fn set_cookie_pair(directive: &str) -> Option<(&str, &str)> {
    let first = directive.split(';').next()?;
    let (name, value) = first.split_once('=')?;
    let name = name.trim();
    (!name.is_empty()).then_some((name, value.trim()))
}
