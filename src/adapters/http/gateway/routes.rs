//! Axum router configuration for the gateway.
//!
//! # Routes
//!
//! - `GET /health` - liveness check
//! - `ANY /{family}` and `ANY /{family}/*path` - proxied to the family's backend
//!
//! Method policy is enforced by `GatewayRouter`, not by axum, so every
//! method reaches the handler and disallowed ones get the standard envelope.

use std::time::Duration;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderMap, HeaderName, HeaderValue, Method, Uri};
use axum::routing::{any, get};
use axum::Router;
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::domain::gateway::BackendRouteTable;

use super::handlers::{health, proxy, GatewayAppState, DEFAULT_REQUEST_TIMEOUT, REQUEST_ID_HEADER};

/// Options for the middleware stack around the gateway routes.
#[derive(Debug, Clone)]
pub struct GatewayHttpOptions {
    /// Backstop for one inbound request, refresh and retry included.
    pub request_timeout: Duration,
    /// Origins allowed to call the gateway with credentials. Empty disables CORS.
    pub cors_origins: Vec<String>,
}

impl Default for GatewayHttpOptions {
    fn default() -> Self {
        Self {
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            cors_origins: Vec::new(),
        }
    }
}

/// Routes for every family in `table`, plus `/health`.
pub fn gateway_routes(table: &BackendRouteTable) -> Router<GatewayAppState> {
    table.entries().fold(
        Router::new().route("/health", get(health)),
        |router, entry| {
            let family = entry.family;
            let handler = move |state: State<GatewayAppState>,
                                method: Method,
                                uri: Uri,
                                headers: HeaderMap,
                                body: Bytes| {
                proxy(family, state, method, uri, headers, body)
            };
            router
                .route(&format!("/{}", family), any(handler))
                .route(&format!("/{}/*path", family), any(handler))
        },
    )
}

/// Complete application: routes, state and middleware.
///
/// Layer order, outermost first: request id, tracing, id propagation, CORS.
/// The request budget is enforced inside `proxy` so an overrun still
/// answers with the JSON envelope.
pub fn gateway_app(state: GatewayAppState, options: &GatewayHttpOptions) -> Router {
    let state = state.with_request_timeout(options.request_timeout);
    let table = state.router.routes();
    let mut router = gateway_routes(table);

    if let Some(cors) = cors_layer(&options.cors_origins) {
        router = router.layer(cors);
    }

    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);
    router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(request_id.clone(), MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::new(request_id)),
        )
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> Option<CorsLayer> {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    if origins.is_empty() {
        return None;
    }

    Some(
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_credentials(true)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::PATCH,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([
                header::CONTENT_TYPE,
                header::AUTHORIZATION,
                header::ACCEPT,
                HeaderName::from_static(REQUEST_ID_HEADER),
            ]),
    )
}
