//! Backend adapters.
//!
//! Implementations of the `BackendClient` port:
//!
//! - `http_client` - Production reqwest client
//! - `mock` - Scripted client that records calls, for tests

mod http_client;
mod mock;

pub use http_client::{HttpBackendClient, HttpBackendConfig};
pub use mock::{MockBackendClient, RecordedCall};
