//! HTTP handlers for the gateway surface.
//!
//! Translates inbound axum requests into `ProxyRequest`s and the engine's
//! `GatewayResponse` back into an HTTP response. No routing policy lives
//! here; that belongs to `GatewayRouter`.

use std::sync::Arc;
use std::time::Duration;

use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::{header, HeaderMap, HeaderValue, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};

use crate::application::handlers::GatewayRouter;
use crate::domain::gateway::{GatewayBody, GatewayError, GatewayResponse, ProxyRequest, ResourceFamily};

pub(crate) const REQUEST_ID_HEADER: &str = "x-request-id";

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Default budget for one inbound request, refresh and retry included.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Shared state for the gateway routes.
#[derive(Clone)]
pub struct GatewayAppState {
    pub router: Arc<GatewayRouter>,
    pub request_timeout: Duration,
}

impl GatewayAppState {
    pub fn new(router: Arc<GatewayRouter>) -> Self {
        Self {
            router,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Handlers
// ════════════════════════════════════════════════════════════════════════════════

/// Liveness check. Never touches the backend.
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Proxies one inbound request for `family`.
///
/// The family is bound when the route is registered, so the remaining path
/// is whatever follows `/{family}` in the inbound URI.
pub async fn proxy(
    family: ResourceFamily,
    State(state): State<GatewayAppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let mut request = ProxyRequest::new(method, family, remainder(family, uri.path()));

    if let Some(query) = uri.query() {
        request = request.with_query(query);
    }
    if let Some(cookies) = joined_cookies(&headers) {
        request = request.with_cookie_header(cookies);
    }
    if let Some(authorization) = header_str(&headers, header::AUTHORIZATION.as_str()) {
        request = request.with_authorization(authorization);
    }
    if let Some(request_id) = header_str(&headers, REQUEST_ID_HEADER) {
        request = request.with_request_id(request_id);
    }

    if request.carries_body() {
        match parse_body(&body) {
            Ok(Some(value)) => request = request.with_body(value),
            Ok(None) => {}
            Err(error) => {
                tracing::debug!(family = %family, error = %error, "Rejecting unparsable request body");
                return into_http_response(state.router.reject(&error));
            }
        }
    }

    match tokio::time::timeout(state.request_timeout, state.router.dispatch(request)).await {
        Ok(response) => into_http_response(response),
        Err(_) => {
            let error = GatewayError::RequestTimedOut(state.request_timeout);
            tracing::warn!(
                family = %family,
                error = %error,
                error.kind = error.kind().as_str(),
                "Abandoning request that outlived its budget"
            );
            into_http_response(state.router.reject(&error))
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Request / response translation
// ════════════════════════════════════════════════════════════════════════════════

fn remainder(family: ResourceFamily, path: &str) -> &str {
    path.strip_prefix('/')
        .and_then(|p| p.strip_prefix(family.as_str()))
        .unwrap_or("")
        .trim_start_matches('/')
}

/// Browsers may split cookies over several headers; the backend sees one.
fn joined_cookies(headers: &HeaderMap) -> Option<String> {
    let parts: Vec<&str> = headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .collect();
    (!parts.is_empty()).then(|| parts.join("; "))
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

fn parse_body(body: &Bytes) -> Result<Option<Value>, GatewayError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    serde_json::from_slice(body)
        .map(Some)
        .map_err(|e| GatewayError::InvalidRequestBody(e.to_string()))
}

/// Converts the engine's response into an axum response.
pub fn into_http_response(response: GatewayResponse) -> Response {
    let status = StatusCode::from_u16(response.status).unwrap_or(StatusCode::BAD_GATEWAY);

    let mut http_response = match response.body {
        GatewayBody::Json(value) => (status, Json(value)).into_response(),
        GatewayBody::Empty => (status, Body::empty()).into_response(),
    };

    let headers = http_response.headers_mut();
    for cookie in &response.set_cookies {
        match HeaderValue::from_str(cookie) {
            Ok(value) => {
                headers.append(header::SET_COOKIE, value);
            }
            Err(_) => tracing::warn!("Dropping Set-Cookie directive that is not a valid header value"),
        }
    }
    if let Some(allow) = response.allow.and_then(|a| HeaderValue::from_str(&a).ok()) {
        headers.insert(header::ALLOW, allow);
    }

    http_response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remainder_strips_family_prefix() {
        assert_eq!(remainder(ResourceFamily::Feed, "/feed/posts/7"), "posts/7");
        assert_eq!(remainder(ResourceFamily::Feed, "/feed"), "");
        assert_eq!(remainder(ResourceFamily::Chat, "/chat/"), "");
    }

    #[test]
    fn cookies_from_several_headers_are_joined() {
        let mut headers = HeaderMap::new();
        headers.append(header::COOKIE, HeaderValue::from_static("a=1"));
        headers.append(header::COOKIE, HeaderValue::from_static("access_token_cookie=t"));
        assert_eq!(joined_cookies(&headers).as_deref(), Some("a=1; access_token_cookie=t"));
        assert_eq!(joined_cookies(&HeaderMap::new()), None);
    }

    #[test]
    fn blank_body_is_no_body() {
        assert_eq!(parse_body(&Bytes::from_static(b"  \n")).unwrap(), None);
        assert_eq!(
            parse_body(&Bytes::from_static(br#"{"a":1}"#)).unwrap(),
            Some(json!({"a": 1}))
        );
        assert!(matches!(
            parse_body(&Bytes::from_static(b"a=1&b=2")),
            Err(GatewayError::InvalidRequestBody(_))
        ));
    }

    #[test]
    fn response_carries_every_set_cookie_and_allow() {
        let mut response = GatewayResponse::json(200, json!({"success": true}))
            .with_allow("GET, OPTIONS".to_string());
        response.set_cookies = vec!["a=1; Path=/".to_string(), "b=2; HttpOnly".to_string()];

        let http_response = into_http_response(response);

        let cookies: Vec<_> = http_response.headers().get_all(header::SET_COOKIE).iter().collect();
        assert_eq!(cookies, vec!["a=1; Path=/", "b=2; HttpOnly"]);
        assert_eq!(http_response.headers()[header::ALLOW], "GET, OPTIONS");
        assert_eq!(http_response.headers()[header::CONTENT_TYPE], "application/json");
    }

    #[test]
    fn empty_body_has_no_content_type() {
        let http_response = into_http_response(GatewayResponse::preflight("GET, OPTIONS".to_string()));
        assert_eq!(http_response.status(), StatusCode::OK);
        assert!(http_response.headers().get(header::CONTENT_TYPE).is_none());
    }
}
