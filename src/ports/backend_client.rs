//! Backend client port - the gateway's only way to reach the domain backend.
//!
//! The backend is an opaque collaborator reachable over HTTP. Implementations
//! exist for the real network (`HttpBackendClient`) and for tests
//! (`MockBackendClient`).
//!
//! # Contract
//!
//! Implementations must:
//! - Return `Ok(ProxyResult)` for every HTTP answer, whatever its status
//! - Return `GatewayError::BackendUnreachable` for connect failures and timeouts
//! - Return `GatewayError::MalformedBackendResponse` for bodies that claim
//!   JSON but do not parse
//! - Bound every call with a timeout
//! - Never log the credential value

use async_trait::async_trait;

use crate::domain::gateway::{Credential, GatewayError, ProxyRequest, ProxyResult, RouteEntry};

/// Performs outbound calls to the backend.
#[async_trait]
pub trait BackendClient: Send + Sync {
    /// Forwards `request` to the backend target described by `route`.
    ///
    /// # Arguments
    ///
    /// * `route` - Target and credential mode
    /// * `request` - The inbound request (method, path, query, body, cookies)
    /// * `credential` - Effective access credential, possibly renewed by a refresh
    async fn call(
        &self,
        route: &RouteEntry,
        request: &ProxyRequest,
        credential: Option<&Credential>,
    ) -> Result<ProxyResult, GatewayError>;

    /// Invokes the backend refresh operation with the refresh credential.
    ///
    /// Non-2xx answers are returned as results; the caller decides what a
    /// failed refresh means.
    async fn refresh(&self, refresh_credential: &Credential) -> Result<ProxyResult, GatewayError>;
}
