//! Backend route table - static mapping from resource family to backend target.
//!
//! The table is built once at process start and shared read-only afterwards.
//! Each entry declares how the session credential travels to the backend,
//! which methods are allowed, and whether a missing credential is fatal.

use std::collections::BTreeMap;

use http::Method;

use super::errors::GatewayError;
use super::family::ResourceFamily;

/// How the credential is presented to the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialMode {
    /// Pass through as the `access_token_cookie` cookie (legacy cookie sessions).
    Cookie,
    /// Rewrite into an `Authorization: Bearer` header (chat, realtime gateway).
    Bearer,
    /// Send both; used while a family migrates between conventions.
    Both,
}

impl CredentialMode {
    pub fn sends_cookie(&self) -> bool {
        matches!(self, CredentialMode::Cookie | CredentialMode::Both)
    }

    pub fn sends_bearer(&self) -> bool {
        matches!(self, CredentialMode::Bearer | CredentialMode::Both)
    }
}

/// Routing and credential policy for one resource family.
#[derive(Debug, Clone)]
pub struct RouteEntry {
    pub family: ResourceFamily,
    /// Backend origin, e.g. `https://api.example.com`.
    pub base_url: String,
    /// Path prefix on the backend, e.g. `/api/chat`.
    pub base_path: String,
    pub credential_mode: CredentialMode,
    pub allowed_methods: Vec<Method>,
    pub requires_credential: bool,
    /// Answer `OPTIONS` locally without touching the backend.
    pub preflight: bool,
    /// Attempt a credential refresh when the backend reports expiry.
    pub refresh_on_expiry: bool,
}

impl RouteEntry {
    /// Name used in caller-safe messages ("Cannot connect to chat service").
    pub fn service_name(&self) -> &'static str {
        self.family.as_str()
    }

    pub fn allows(&self, method: &Method) -> bool {
        self.allowed_methods.iter().any(|m| m == method)
    }

    /// Value for an `Allow` header.
    pub fn allow_header(&self) -> String {
        let mut methods: Vec<&str> = self.allowed_methods.iter().map(Method::as_str).collect();
        if self.preflight {
            methods.push(Method::OPTIONS.as_str());
        }
        methods.join(", ")
    }

    /// Full backend URL for a path below the family prefix.
    pub fn target_url(&self, path: &str, query: Option<&str>) -> String {
        let mut url = format!(
            "{}{}",
            self.base_url.trim_end_matches('/'),
            self.base_path.trim_end_matches('/')
        );
        let path = path.trim_start_matches('/');
        if !path.is_empty() {
            url.push('/');
            url.push_str(path);
        }
        if let Some(query) = query.filter(|q| !q.is_empty()) {
            url.push('?');
            url.push_str(query);
        }
        url
    }
}

/// Static policy for a family, before a base URL is attached.
struct RoutePolicy {
    family: ResourceFamily,
    base_path: &'static str,
    credential_mode: CredentialMode,
    allowed_methods: Vec<Method>,
    requires_credential: bool,
    preflight: bool,
    refresh_on_expiry: bool,
}

fn standard_policies() -> Vec<RoutePolicy> {
    use CredentialMode::*;
    use ResourceFamily::*;

    let policy = |family, base_path, credential_mode, allowed_methods, requires_credential, preflight, refresh_on_expiry| {
        RoutePolicy {
            family,
            base_path,
            credential_mode,
            allowed_methods,
            requires_credential,
            preflight,
            refresh_on_expiry,
        }
    };

    vec![
        // Login, signup and refresh live here; a 401 is an answer, not an expiry.
        policy(Auth, "/api/auth", Cookie,
            vec![Method::GET, Method::POST, Method::PUT, Method::DELETE], false, true, false),
        policy(Chat, "/api/chat", Bearer,
            vec![Method::GET, Method::POST, Method::DELETE], true, true, true),
        policy(Feed, "/api/feed", Cookie,
            vec![Method::GET, Method::POST, Method::PUT, Method::DELETE], false, true, true),
        policy(Subscription, "/api/subscription", Both,
            vec![Method::GET, Method::POST], true, true, true),
        policy(Admin, "/api/admin", Both,
            vec![Method::GET, Method::POST, Method::PUT, Method::PATCH, Method::DELETE], true, false, true),
        policy(Explore, "/api/explore", Cookie,
            vec![Method::GET], false, true, true),
        policy(Matching, "/api/matching", Bearer,
            vec![Method::GET, Method::POST], true, true, true),
    ]
}

/// Read-only mapping from resource family to [`RouteEntry`].
#[derive(Debug, Clone, Default)]
pub struct BackendRouteTable {
    entries: BTreeMap<ResourceFamily, RouteEntry>,
}

impl BackendRouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// The standard table; `base_url_for` supplies each family's origin.
    pub fn standard(base_url_for: impl Fn(ResourceFamily) -> String) -> Self {
        standard_policies()
            .into_iter()
            .fold(Self::new(), |table, policy| {
                table.with_entry(RouteEntry {
                    family: policy.family,
                    base_url: base_url_for(policy.family),
                    base_path: policy.base_path.to_string(),
                    credential_mode: policy.credential_mode,
                    allowed_methods: policy.allowed_methods,
                    requires_credential: policy.requires_credential,
                    preflight: policy.preflight,
                    refresh_on_expiry: policy.refresh_on_expiry,
                })
            })
    }

    /// Registers an entry, replacing any previous one for the same family.
    pub fn with_entry(mut self, entry: RouteEntry) -> Self {
        self.entries.insert(entry.family, entry);
        self
    }

    pub fn resolve(&self, family: ResourceFamily) -> Result<&RouteEntry, GatewayError> {
        self.entries
            .get(&family)
            .ok_or_else(|| GatewayError::UnknownResourceFamily(family.as_str().to_string()))
    }

    /// Startup check that every known family has an entry.
    pub fn ensure_complete(&self) -> Result<(), GatewayError> {
        ResourceFamily::ALL
            .iter()
            .try_for_each(|family| self.resolve(*family).map(|_| ()))
    }

    pub fn entries(&self) -> impl Iterator<Item = &RouteEntry> {
        self.entries.values()
    }
}
