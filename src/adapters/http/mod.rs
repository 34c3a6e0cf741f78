//! HTTP adapters - the inbound axum surface.

pub mod gateway;

pub use gateway::{gateway_app, gateway_routes, GatewayAppState, GatewayHttpOptions};
