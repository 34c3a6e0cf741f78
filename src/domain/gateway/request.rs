//! Inbound request as seen by the gateway engine.

use http::Method;
use serde_json::Value;

use super::credential::{set_cookie_pair, upsert_cookie, Credential, CredentialExtractor};
use super::errors::GatewayError;
use super::family::ResourceFamily;

/// One inbound browser call. Created per request, never persisted.
#[derive(Debug, Clone)]
pub struct ProxyRequest {
    pub method: Method,
    pub family: ResourceFamily,
    /// Path below the family prefix, without a leading slash.
    pub path: String,
    /// Raw query string, forwarded verbatim.
    pub query: Option<String>,
    pub body: Option<Value>,
    pub cookie_header: Option<String>,
    pub authorization: Option<String>,
    pub request_id: Option<String>,
}

impl ProxyRequest {
    pub fn new(method: Method, family: ResourceFamily, path: impl Into<String>) -> Self {
        Self {
            method,
            family,
            path: path.into(),
            query: None,
            body: None,
            cookie_header: None,
            authorization: None,
            request_id: None,
        }
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_cookie_header(mut self, header: impl Into<String>) -> Self {
        self.cookie_header = Some(header.into());
        self
    }

    pub fn with_authorization(mut self, value: impl Into<String>) -> Self {
        self.authorization = Some(value.into());
        self
    }

    pub fn with_request_id(mut self, id: impl Into<String>) -> Self {
        self.request_id = Some(id.into());
        self
    }

    pub fn credential(&self) -> Option<Credential> {
        CredentialExtractor::extract(self.cookie_header.as_deref(), self.authorization.as_deref())
    }

    pub fn refresh_credential(&self) -> Option<Credential> {
        CredentialExtractor::extract_refresh(self.cookie_header.as_deref())
    }

    /// Checks that the path stays below the family's backend base path.
    ///
    /// URL parsers resolve `.` and `..` segments, percent-encoded or not, so
    /// a request under one family could otherwise land on another family's
    /// backend path. Rejected: dot segments in any encoding, segments that
    /// decode to a separator or to invalid UTF-8, and empty segments other
    /// than a trailing slash.
    pub fn ensure_contained_path(&self) -> Result<(), GatewayError> {
        if self.path.is_empty() {
            return Ok(());
        }
        let segments: Vec<&str> = self.path.split(['/', '\\']).collect();
        let last = segments.len() - 1;

        for (index, segment) in segments.iter().enumerate() {
            if segment.is_empty() {
                if index == last {
                    continue;
                }
                return Err(GatewayError::InvalidPath(self.path.clone()));
            }
            let decoded = urlencoding::decode(segment)
                .map_err(|_| GatewayError::InvalidPath(self.path.clone()))?;
            let escapes = decoded.is_empty()
                || decoded == "."
                || decoded == ".."
                || decoded.contains(['/', '\\']);
            if escapes {
                return Err(GatewayError::InvalidPath(self.path.clone()));
            }
        }
        Ok(())
    }

    /// Whether a body may be sent upstream for this method.
    pub fn carries_body(&self) -> bool {
        self.method != Method::GET && self.method != Method::HEAD
    }

    /// Copy of this request with renewed session cookies applied to the
    /// forwarded cookie header.
    pub fn with_renewed_cookies(&self, set_cookies: &[String]) -> Self {
        let cookie_header = set_cookies
            .iter()
            .filter_map(|directive| set_cookie_pair(directive))
            .fold(self.cookie_header.clone(), |header, (name, value)| {
                Some(upsert_cookie(header.as_deref(), name, value))
            });

        Self {
            cookie_header,
            ..self.clone()
        }
    }
}
