//! Application handlers.
//!
//! - `GatewayRouter` - validates and dispatches one proxied request
//! - `RefreshCoordinator` - outbound call with a single refresh-and-retry

mod gateway_router;
mod refresh_coordinator;

pub use gateway_router::GatewayRouter;
pub use refresh_coordinator::{RefreshCoordinator, RefreshPhase};
