//! Integration tests for the gateway against a real HTTP backend.
//!
//! A fake backend is served by axum on an ephemeral port and the gateway is
//! wired with the production `HttpBackendClient`, so these tests exercise:
//! 1. Credential forwarding over the wire
//! 2. Refresh-and-retry against a real refresh endpoint
//! 3. Timeout and non-JSON handling
//! 4. Verbatim `Set-Cookie` forwarding
//! 5. Paths that try to leave their family

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::extract::State;
use axum::http::{header, HeaderMap, HeaderValue, Method, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tower::ServiceExt;

use session_gateway::adapters::backend::{HttpBackendClient, HttpBackendConfig};
use session_gateway::adapters::http::{gateway_app, GatewayAppState, GatewayHttpOptions};
use session_gateway::application::handlers::GatewayRouter;
use session_gateway::domain::gateway::BackendRouteTable;

// =============================================================================
// Fake backend
// =============================================================================

#[derive(Default)]
struct BackendCounters {
    subscription_calls: AtomicUsize,
    plan_changes: AtomicUsize,
    admin_calls: AtomicUsize,
    refreshes: AtomicUsize,
    chat_calls: AtomicUsize,
}

type Counters = Arc<BackendCounters>;

fn cookie_header(headers: &HeaderMap) -> String {
    headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

fn bearer(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

fn with_cookies(mut response: Response, cookies: &[&'static str]) -> Response {
    for cookie in cookies {
        response
            .headers_mut()
            .append(header::SET_COOKIE, HeaderValue::from_static(cookie));
    }
    response
}

fn expired() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({"success": false, "message": "Token expired"})),
    )
        .into_response()
}

async fn feed_posts(headers: HeaderMap) -> Json<Value> {
    Json(json!({"success": true, "posts": [], "cookie": cookie_header(&headers)}))
}

async fn feed_slow() -> Json<Value> {
    tokio::time::sleep(Duration::from_secs(10)).await;
    Json(json!({"success": true}))
}

async fn feed_gone() -> StatusCode {
    StatusCode::NO_CONTENT
}

async fn explore_html() -> Response {
    (
        StatusCode::BAD_GATEWAY,
        [(header::CONTENT_TYPE, "text/html")],
        "<html><body>Bad Gateway</body></html>",
    )
        .into_response()
}

async fn feed_broken() -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/json")],
        "{not json",
    )
        .into_response()
}

async fn subscription_plans(State(counters): State<Counters>) -> Json<Value> {
    counters.plan_changes.fetch_add(1, Ordering::SeqCst);
    Json(json!({"success": true}))
}

async fn subscription_current(State(counters): State<Counters>, headers: HeaderMap) -> Response {
    counters.subscription_calls.fetch_add(1, Ordering::SeqCst);
    if bearer(&headers).as_deref() == Some("Bearer fresh") {
        Json(json!({"success": true, "plan": "pro"})).into_response()
    } else {
        expired()
    }
}

async fn admin_users(State(counters): State<Counters>) -> Response {
    counters.admin_calls.fetch_add(1, Ordering::SeqCst);
    expired()
}

async fn chat_send(State(counters): State<Counters>, headers: HeaderMap) -> Json<Value> {
    counters.chat_calls.fetch_add(1, Ordering::SeqCst);
    Json(json!({"success": true, "authorization": bearer(&headers)}))
}

async fn auth_login() -> Response {
    with_cookies(
        Json(json!({"success": true})).into_response(),
        &[
            "access_token_cookie=a1; Path=/; HttpOnly; SameSite=Lax",
            "refresh_token_cookie=r1; Path=/api/auth; HttpOnly; Max-Age=604800",
        ],
    )
}

async fn auth_refresh(State(counters): State<Counters>, headers: HeaderMap) -> Response {
    counters.refreshes.fetch_add(1, Ordering::SeqCst);
    let cookie = cookie_header(&headers);
    if cookie == "refresh_token_cookie=good" {
        with_cookies(
            Json(json!({"success": true})).into_response(),
            &["access_token_cookie=fresh; Path=/; HttpOnly"],
        )
    } else if cookie == "refresh_token_cookie=rotating" {
        with_cookies(
            Json(json!({"success": true})).into_response(),
            &["refresh_token_cookie=rotated; Path=/api/auth; HttpOnly"],
        )
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({"success": false, "message": "Invalid refresh token"})),
        )
            .into_response()
    }
}

async fn spawn_backend(counters: Counters) -> String {
    let app = Router::new()
        .route("/api/feed/posts", get(feed_posts))
        .route("/api/feed/slow", get(feed_slow))
        .route("/api/feed/gone", axum::routing::delete(feed_gone))
        .route("/api/feed/broken", get(feed_broken))
        .route("/api/explore/html", get(explore_html))
        .route("/api/subscription/current", get(subscription_current))
        .route("/api/subscription/plans", axum::routing::put(subscription_plans))
        .route("/api/admin/users", get(admin_users))
        .route("/api/chat/send", post(chat_send))
        .route("/api/auth/login", post(auth_login))
        .route("/api/auth/refresh", post(auth_refresh))
        .with_state(counters);

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind fake backend");
    let address = format!("http://{}", listener.local_addr().unwrap());
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    address
}

// =============================================================================
// Gateway wiring
// =============================================================================

struct TestGateway {
    app: Router,
    counters: Counters,
}

async fn spawn_gateway() -> TestGateway {
    let counters = Counters::default();
    let base_url = spawn_backend(counters.clone()).await;

    let routes = BackendRouteTable::standard(|_| base_url.clone());
    let backend = HttpBackendClient::new(
        HttpBackendConfig::new(format!("{}/api/auth/refresh", base_url))
            .with_timeout(Duration::from_secs(1))
            .with_connect_timeout(Duration::from_secs(1)),
    )
    .unwrap();
    let router = GatewayRouter::new(Arc::new(routes), Arc::new(backend));
    let app = gateway_app(
        GatewayAppState::new(Arc::new(router)),
        &GatewayHttpOptions::default(),
    );

    TestGateway { app, counters }
}

fn request(method: Method, uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

async fn json_body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn set_cookies(response: &Response) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect()
}

// =============================================================================
// Tests
// =============================================================================

#[tokio::test]
async fn feed_passthrough_forwards_session_cookie() {
    let gateway = spawn_gateway().await;

    let response = gateway
        .app
        .oneshot(request(
            Method::GET,
            "/feed/posts",
            Some("theme=dark; access_token_cookie=valid"),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["cookie"], json!("theme=dark; access_token_cookie=valid"));
}

#[tokio::test]
async fn hung_backend_becomes_cannot_connect_within_bound() {
    let gateway = spawn_gateway().await;

    let response = tokio::time::timeout(
        Duration::from_secs(5),
        gateway.app.oneshot(request(Method::GET, "/feed/slow", None)),
    )
    .await
    .expect("gateway did not answer within its timeout budget")
    .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        json_body(response).await,
        json!({"success": false, "message": "Cannot connect to feed service"})
    );
}

#[tokio::test]
async fn html_error_page_becomes_envelope() {
    let gateway = spawn_gateway().await;

    let response = gateway
        .app
        .oneshot(request(Method::GET, "/explore/html", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/json"
    );
    assert_eq!(
        json_body(response).await,
        json!({"success": false, "message": "unexpected response from service"})
    );
}

#[tokio::test]
async fn unparsable_json_becomes_invalid_response_without_parser_detail() {
    let gateway = spawn_gateway().await;

    let response = gateway
        .app
        .oneshot(request(Method::GET, "/feed/broken", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(!text.contains("line 1"), "{text}");
    assert!(!text.contains("key must be a string"), "{text}");
    assert_eq!(
        serde_json::from_str::<Value>(&text).unwrap(),
        json!({"success": false, "message": "Invalid response from feed service"})
    );
}

#[tokio::test]
async fn expired_credential_is_refreshed_and_retried_once() {
    let gateway = spawn_gateway().await;

    let response = gateway
        .app
        .oneshot(request(
            Method::GET,
            "/subscription/current",
            Some("access_token_cookie=stale; refresh_token_cookie=good"),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        set_cookies(&response),
        vec!["access_token_cookie=fresh; Path=/; HttpOnly".to_string()]
    );
    assert_eq!(
        json_body(response).await,
        json!({"success": true, "plan": "pro"})
    );
    assert_eq!(gateway.counters.subscription_calls.load(Ordering::SeqCst), 2);
    assert_eq!(gateway.counters.refreshes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn second_unauthorized_is_returned_without_another_refresh() {
    let gateway = spawn_gateway().await;

    let response = gateway
        .app
        .oneshot(request(
            Method::GET,
            "/admin/users",
            Some("access_token_cookie=stale; refresh_token_cookie=good"),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(gateway.counters.admin_calls.load(Ordering::SeqCst), 2);
    assert_eq!(gateway.counters.refreshes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn rejected_refresh_returns_original_unauthorized() {
    let gateway = spawn_gateway().await;

    let response = gateway
        .app
        .oneshot(request(
            Method::GET,
            "/subscription/current",
            Some("access_token_cookie=stale; refresh_token_cookie=revoked"),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(set_cookies(&response).is_empty());
    assert_eq!(
        json_body(response).await,
        json!({"success": false, "message": "Token expired"})
    );
    assert_eq!(gateway.counters.subscription_calls.load(Ordering::SeqCst), 1);
    assert_eq!(gateway.counters.refreshes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn login_cookies_are_forwarded_verbatim() {
    let gateway = spawn_gateway().await;

    let response = gateway
        .app
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/auth/login")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"email":"a@example.com","password":"pw"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        set_cookies(&response),
        vec![
            "access_token_cookie=a1; Path=/; HttpOnly; SameSite=Lax".to_string(),
            "refresh_token_cookie=r1; Path=/api/auth; HttpOnly; Max-Age=604800".to_string(),
        ]
    );
}

#[tokio::test]
async fn chat_uses_bearer_and_requires_credential() {
    let gateway = spawn_gateway().await;

    let rejected = gateway
        .app
        .clone()
        .oneshot(request(Method::POST, "/chat/send", None))
        .await
        .unwrap();
    assert_eq!(rejected.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(gateway.counters.chat_calls.load(Ordering::SeqCst), 0);

    let accepted = gateway
        .app
        .oneshot(request(
            Method::POST,
            "/chat/send",
            Some("access_token_cookie=tok"),
        ))
        .await
        .unwrap();
    assert_eq!(accepted.status(), StatusCode::OK);
    assert_eq!(json_body(accepted).await["authorization"], json!("Bearer tok"));
    assert_eq!(gateway.counters.chat_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn no_content_passes_through_without_body() {
    let gateway = spawn_gateway().await;

    let response = gateway
        .app
        .oneshot(request(
            Method::DELETE,
            "/feed/gone",
            Some("access_token_cookie=valid"),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert!(bytes.is_empty());
}

#[tokio::test]
async fn disallowed_method_never_reaches_backend() {
    let gateway = spawn_gateway().await;

    let response = gateway
        .app
        .oneshot(request(
            Method::PATCH,
            "/chat/send",
            Some("access_token_cookie=tok"),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(
        json_body(response).await,
        json!({"success": false, "message": "Method not allowed"})
    );
    assert_eq!(gateway.counters.chat_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn unreachable_backend_is_cannot_connect() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let address = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let routes = BackendRouteTable::standard(|_| address.clone());
    let backend = HttpBackendClient::new(
        HttpBackendConfig::new(format!("{}/api/auth/refresh", address))
            .with_timeout(Duration::from_secs(1)),
    )
    .unwrap();
    let router = GatewayRouter::new(Arc::new(routes), Arc::new(backend));
    let app = gateway_app(
        GatewayAppState::new(Arc::new(router)),
        &GatewayHttpOptions::default(),
    );

    let response = app
        .oneshot(request(Method::GET, "/explore/trending", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        json_body(response).await,
        json!({"success": false, "message": "Cannot connect to explore service"})
    );
}

#[tokio::test]
async fn tokenless_refresh_forwards_rotated_cookie_with_original_401() {
    let gateway = spawn_gateway().await;

    let response = gateway
        .app
        .oneshot(request(
            Method::GET,
            "/subscription/current",
            Some("access_token_cookie=stale; refresh_token_cookie=rotating"),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        set_cookies(&response),
        vec!["refresh_token_cookie=rotated; Path=/api/auth; HttpOnly".to_string()]
    );
    assert_eq!(
        json_body(response).await,
        json!({"success": false, "message": "Token expired"})
    );
    assert_eq!(gateway.counters.subscription_calls.load(Ordering::SeqCst), 1);
    assert_eq!(gateway.counters.refreshes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn dot_segments_cannot_reach_another_family_backend() {
    let gateway = spawn_gateway().await;

    for uri in [
        "/feed/../subscription/plans",
        "/feed/%2e%2e/subscription/plans",
        "/feed/%2E%2e/subscription/plans",
    ] {
        let response = gateway
            .app
            .clone()
            .oneshot(
                Request::builder()
                    .method(Method::PUT)
                    .uri(uri)
                    .header(header::COOKIE, "access_token_cookie=valid")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"plan":"pro"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(
            json_body(response).await,
            json!({"success": false, "message": "Invalid request path"})
        );
    }
    assert_eq!(gateway.counters.plan_changes.load(Ordering::SeqCst), 0);
}
