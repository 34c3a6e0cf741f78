//! Adapters - Implementations of port interfaces.
//!
//! - `backend` - outbound `BackendClient` implementations (reqwest, mock)
//! - `http` - inbound axum routes and middleware

pub mod backend;
pub mod http;

pub use backend::{HttpBackendClient, HttpBackendConfig, MockBackendClient};
pub use http::{gateway_app, GatewayAppState, GatewayHttpOptions};
