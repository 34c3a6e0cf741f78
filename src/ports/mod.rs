//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! - `BackendClient` - Outbound calls to the domain backend, including the
//!   credential refresh operation

mod backend_client;

pub use backend_client::BackendClient;
