//! GatewayRouter - top-level dispatcher for proxied requests.
//!
//! Order of checks, all before any network activity:
//!
//! 1. Resolve the family's `RouteEntry` (misses are configuration errors)
//! 2. Reject paths that would leave the family's backend base path with 400
//! 3. Answer pre-flight `OPTIONS` locally when the family supports it
//! 4. Reject methods outside the entry's allowed set with 405
//! 5. Reject missing credentials with 401 where the family requires one
//!
//! Then the `RefreshCoordinator` performs the outbound side and the
//! `ResponseNormalizer` shapes the browser response.

use std::sync::Arc;

use http::Method;

use crate::domain::gateway::{
    BackendRouteTable, GatewayError, GatewayResponse, ProxyRequest, ResponseNormalizer,
};
use crate::ports::BackendClient;

use super::refresh_coordinator::RefreshCoordinator;

/// Stateless engine shared by every inbound request.
pub struct GatewayRouter {
    routes: Arc<BackendRouteTable>,
    coordinator: RefreshCoordinator,
    normalizer: ResponseNormalizer,
}

impl GatewayRouter {
    pub fn new(routes: Arc<BackendRouteTable>, backend: Arc<dyn BackendClient>) -> Self {
        Self {
            routes,
            coordinator: RefreshCoordinator::new(backend),
            normalizer: ResponseNormalizer::new(),
        }
    }

    pub fn routes(&self) -> &BackendRouteTable {
        &self.routes
    }

    /// Normalized response for a failure detected outside the engine, such
    /// as an unparsable inbound body.
    pub fn reject(&self, error: &GatewayError) -> GatewayResponse {
        self.normalizer.reject(error)
    }

    pub async fn dispatch(&self, request: ProxyRequest) -> GatewayResponse {
        let route = match self.routes.resolve(request.family) {
            Ok(route) => route,
            Err(error) => {
                tracing::error!(
                    family = %request.family,
                    error.kind = error.kind().as_str(),
                    error = %error,
                    "No route registered for resource family"
                );
                return self.normalizer.reject(&error);
            }
        };

        if let Err(error) = request.ensure_contained_path() {
            tracing::warn!(
                family = %route.family,
                method = %request.method,
                error.kind = error.kind().as_str(),
                "Rejecting path that escapes the family base path"
            );
            return self.normalizer.reject(&error);
        }

        if request.method == Method::OPTIONS && route.preflight {
            return GatewayResponse::preflight(route.allow_header());
        }

        if !route.allows(&request.method) {
            let error = GatewayError::MethodNotAllowed {
                family: route.family,
                method: request.method.to_string(),
            };
            tracing::debug!(family = %route.family, method = %request.method, "Method not allowed");
            return self
                .normalizer
                .reject(&error)
                .with_allow(route.allow_header());
        }

        let credential = request.credential();
        if credential.is_none() && route.requires_credential {
            tracing::debug!(family = %route.family, "Credential required but absent");
            return self
                .normalizer
                .reject(&GatewayError::CredentialMissing(route.family));
        }

        let exchange = self.coordinator.execute(route, &request, credential).await;

        if let Err(error) = &exchange.outcome {
            tracing::error!(
                family = %route.family,
                method = %request.method,
                error.kind = error.kind().as_str(),
                error = %error,
                "Backend exchange failed"
            );
        }

        let response = self.normalizer.normalize(exchange);
        tracing::info!(
            family = %route.family,
            method = %request.method,
            status = response.status,
            renewed_cookies = response.set_cookies.len(),
            "Proxied request"
        );
        response
    }
}
