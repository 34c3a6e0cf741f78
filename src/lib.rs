//! Session Gateway - authentication-aware proxy between the browser and the
//! domain backend.
//!
//! Browser requests arrive under a resource family prefix (`/feed`, `/chat`,
//! ...), are forwarded to the family's backend with the session credential
//! in the form that backend expects, retried once after a credential
//! refresh when the backend reports expiry, and answered with a stable
//! JSON contract.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
