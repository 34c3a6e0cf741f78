//! Gateway HTTP adapter - the browser-facing surface.

mod handlers;
mod routes;

pub use handlers::{health, into_http_response, proxy, GatewayAppState};
pub use routes::{gateway_app, gateway_routes, GatewayHttpOptions};
