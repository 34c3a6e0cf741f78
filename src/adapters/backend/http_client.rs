//! HTTP backend client - reqwest implementation of the `BackendClient` port.
//!
//! Builds outbound requests from a `RouteEntry` and `ProxyRequest`:
//!
//! 1. JSON `Content-Type`/`Accept`, plus `x-request-id` when known
//! 2. Credential forwarded per the route's `CredentialMode`
//! 3. JSON body for methods other than GET/HEAD
//! 4. Whole-call timeout so a hung backend cannot hang the gateway
//!
//! # Example
//!
//! ```ignore
//! let client = HttpBackendClient::new(
//!     HttpBackendConfig::new("https://api.example.com/api/auth/refresh")
//!         .with_timeout(Duration::from_secs(5)),
//! )?;
//! let result = client.call(route, &request, credential.as_ref()).await?;
//! ```

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{Client, Response};

use crate::domain::gateway::{
    upsert_cookie, Credential, GatewayError, ProxyRequest, ProxyResult, ResourceFamily,
    ResponseBody, RouteEntry, ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE,
};
use crate::ports::BackendClient;

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Configuration for the HTTP backend client.
#[derive(Debug, Clone)]
pub struct HttpBackendConfig {
    /// Full URL of the backend refresh operation.
    pub refresh_url: String,
    /// Budget for a whole outbound call, body included.
    pub timeout: Duration,
    pub connect_timeout: Duration,
}

impl HttpBackendConfig {
    pub fn new(refresh_url: impl Into<String>) -> Self {
        Self {
            refresh_url: refresh_url.into(),
            timeout: Duration::from_secs(5),
            connect_timeout: Duration::from_secs(2),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self
    }
}

/// Production `BackendClient` over HTTP.
pub struct HttpBackendClient {
    config: HttpBackendConfig,
    client: Client,
}

impl HttpBackendClient {
    pub fn new(config: HttpBackendConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .pool_idle_timeout(Duration::from_secs(90))
            .build()?;

        Ok(Self { config, client })
    }

    fn base_headers(request_id: Option<&str>) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        if let Some(value) = request_id.and_then(|id| HeaderValue::from_str(id).ok()) {
            headers.insert(REQUEST_ID_HEADER, value);
        }
        headers
    }

    /// Outbound headers for a proxied call.
    fn call_headers(
        route: &RouteEntry,
        request: &ProxyRequest,
        credential: Option<&Credential>,
    ) -> HeaderMap {
        let mut headers = Self::base_headers(request.request_id.as_deref());
        let Some(credential) = credential else {
            return headers;
        };

        if route.credential_mode.sends_cookie() {
            let cookie = upsert_cookie(
                request.cookie_header.as_deref(),
                ACCESS_TOKEN_COOKIE,
                credential.token(),
            );
            insert_sensitive(&mut headers, header::COOKIE, &cookie, route.family);
        }
        if route.credential_mode.sends_bearer() {
            insert_sensitive(
                &mut headers,
                header::AUTHORIZATION,
                &credential.bearer_value(),
                route.family,
            );
        }
        headers
    }

    /// Maps a send/read failure. Timeouts and connect failures both mean the
    /// service is unreachable; the detail stays server-side.
    fn transport_error(service: &str, error: reqwest::Error) -> GatewayError {
        if error.is_timeout() {
            tracing::warn!(service, error = %error, "Backend call timed out");
            GatewayError::unreachable(service, format!("timeout: {}", error))
        } else if error.is_connect() {
            tracing::warn!(service, error = %error, "Backend connection failed");
            GatewayError::unreachable(service, format!("connect: {}", error))
        } else {
            tracing::warn!(service, error = %error, "Backend transport error");
            GatewayError::unreachable(service, error.to_string())
        }
    }

    /// Reads status, `Set-Cookie` directives and body into a `ProxyResult`.
    async fn read_result(service: &str, response: Response) -> Result<ProxyResult, GatewayError> {
        let status = response.status().as_u16();
        let set_cookies: Vec<String> = response
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .map(str::to_string)
            .collect();
        let is_json = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|content_type| content_type.to_ascii_lowercase().contains("json"));

        let bytes = response
            .bytes()
            .await
            .map_err(|e| Self::transport_error(service, e))?;

        let body = if bytes.iter().all(u8::is_ascii_whitespace) {
            ResponseBody::Empty
        } else if is_json {
            let value = serde_json::from_slice(&bytes).map_err(|e| {
                tracing::error!(
                    service,
                    status,
                    error = %e,
                    body_len = bytes.len(),
                    "Backend sent unparsable JSON"
                );
                GatewayError::malformed(service, e.to_string())
            })?;
            ResponseBody::Json(value)
        } else {
            ResponseBody::Text(String::from_utf8_lossy(&bytes).into_owned())
        };

        Ok(ProxyResult {
            status,
            body,
            set_cookies,
        })
    }
}

fn insert_sensitive(
    headers: &mut HeaderMap,
    name: header::HeaderName,
    value: &str,
    family: ResourceFamily,
) {
    match HeaderValue::from_str(value) {
        Ok(mut value) => {
            value.set_sensitive(true);
            headers.insert(name, value);
        }
        Err(_) => {
            tracing::warn!(family = %family, header = %name, "Credential not representable as a header; sending without it");
        }
    }
}

#[async_trait]
impl BackendClient for HttpBackendClient {
    async fn call(
        &self,
        route: &RouteEntry,
        request: &ProxyRequest,
        credential: Option<&Credential>,
    ) -> Result<ProxyResult, GatewayError> {
        let service = route.service_name();
        let url = route.target_url(&request.path, request.query.as_deref());
        let method = reqwest::Method::from_bytes(request.method.as_str().as_bytes())
            .map_err(|e| GatewayError::MethodNotAllowed {
                family: route.family,
                method: format!("{} ({})", request.method, e),
            })?;

        tracing::debug!(
            family = %route.family,
            method = %request.method,
            url = %url,
            credential = credential.is_some(),
            "Forwarding request to backend"
        );

        let mut outbound = self
            .client
            .request(method, &url)
            .headers(Self::call_headers(route, request, credential));
        if let Some(body) = request.body.as_ref().filter(|_| request.carries_body()) {
            outbound = outbound.json(body);
        }

        let response = outbound
            .send()
            .await
            .map_err(|e| Self::transport_error(service, e))?;

        Self::read_result(service, response).await
    }

    async fn refresh(&self, refresh_credential: &Credential) -> Result<ProxyResult, GatewayError> {
        let service = ResourceFamily::Auth.as_str();
        let mut headers = Self::base_headers(None);
        let cookie = format!("{}={}", REFRESH_TOKEN_COOKIE, refresh_credential.token());
        insert_sensitive(&mut headers, header::COOKIE, &cookie, ResourceFamily::Auth);

        tracing::debug!(url = %self.config.refresh_url, "Refreshing session credential");

        let response = self
            .client
            .post(&self.config.refresh_url)
            .headers(headers)
            .send()
            .await
            .map_err(|e| Self::transport_error(service, e))?;

        Self::read_result(service, response).await
    }
}
