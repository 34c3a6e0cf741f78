//! Mock backend client for testing.
//!
//! Replays scripted outcomes in order and records every call, so tests can
//! assert exactly how many outbound requests the gateway made and with which
//! credential.
//!
//! # Example
//!
//! ```ignore
//! let backend = MockBackendClient::new()
//!     .with_call_result(ProxyResult::json(401, json!({"success": false})))
//!     .with_refresh_result(ProxyResult::json(200, json!({}))
//!         .with_set_cookie("access_token_cookie=new; HttpOnly"))
//!     .with_call_result(ProxyResult::json(200, json!({"success": true})));
//! ```

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::json;

use crate::domain::gateway::{
    Credential, GatewayError, ProxyRequest, ProxyResult, ResourceFamily, RouteEntry,
};
use crate::ports::BackendClient;

/// One recorded outbound call.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub family: ResourceFamily,
    pub url: String,
    /// Token the gateway presented, if any.
    pub credential: Option<String>,
    pub cookie_header: Option<String>,
}

/// Scripted backend. Calls past the end of the script answer `200 {"success":true}`.
#[derive(Debug, Default)]
pub struct MockBackendClient {
    call_results: Mutex<VecDeque<Result<ProxyResult, GatewayError>>>,
    refresh_results: Mutex<VecDeque<Result<ProxyResult, GatewayError>>>,
    calls: Mutex<Vec<RecordedCall>>,
    refreshes: Mutex<Vec<String>>,
}

impl MockBackendClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues the next answer to `call`.
    pub fn with_call_result(self, result: ProxyResult) -> Self {
        self.call_results.lock().unwrap().push_back(Ok(result));
        self
    }

    /// Queues a failure for the next `call`.
    pub fn with_call_error(self, error: GatewayError) -> Self {
        self.call_results.lock().unwrap().push_back(Err(error));
        self
    }

    /// Queues the next answer to `refresh`.
    pub fn with_refresh_result(self, result: ProxyResult) -> Self {
        self.refresh_results.lock().unwrap().push_back(Ok(result));
        self
    }

    /// Queues a failure for the next `refresh`.
    pub fn with_refresh_error(self, error: GatewayError) -> Self {
        self.refresh_results.lock().unwrap().push_back(Err(error));
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn refresh_count(&self) -> usize {
        self.refreshes.lock().unwrap().len()
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Refresh tokens presented, in order.
    pub fn refresh_tokens(&self) -> Vec<String> {
        self.refreshes.lock().unwrap().clone()
    }

    fn default_result() -> Result<ProxyResult, GatewayError> {
        Ok(ProxyResult::json(200, json!({"success": true})))
    }
}

#[async_trait]
impl BackendClient for MockBackendClient {
    async fn call(
        &self,
        route: &RouteEntry,
        request: &ProxyRequest,
        credential: Option<&Credential>,
    ) -> Result<ProxyResult, GatewayError> {
        self.calls.lock().unwrap().push(RecordedCall {
            family: route.family,
            url: route.target_url(&request.path, request.query.as_deref()),
            credential: credential.map(|c| c.token().to_string()),
            cookie_header: request.cookie_header.clone(),
        });

        self.call_results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(Self::default_result)
    }

    async fn refresh(&self, refresh_credential: &Credential) -> Result<ProxyResult, GatewayError> {
        self.refreshes
            .lock()
            .unwrap()
            .push(refresh_credential.token().to_string());

        self.refresh_results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(ProxyResult::json(401, json!({"success": false}))))
    }
}
