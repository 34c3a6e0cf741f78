//! Application layer - orchestration of the gateway engine.
//!
//! This layer drives the pure domain types through the `BackendClient` port.
//! It holds no per-request state beyond the request being handled.

pub mod handlers;

pub use handlers::{GatewayRouter, RefreshCoordinator, RefreshPhase};
