//! Domain layer containing gateway policy and value types.
//!
//! # Module Organization
//!
//! - `gateway` - resource families, route table, credentials, refresh
//!   policy inputs and response normalization

pub mod gateway;
