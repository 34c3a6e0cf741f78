//! Gateway domain - credentials, routing policy, results and normalization.
//!
//! Everything here is pure: no network, no clock, no shared state. The
//! application layer drives these types through the `BackendClient` port.

mod credential;
mod errors;
mod family;
mod normalizer;
mod request;
mod result;
mod route_table;

pub use credential::{
    cookie_value, set_cookie_pair, upsert_cookie, Credential, CredentialExtractor,
    CredentialSource, ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE,
};
pub use errors::{ErrorKind, GatewayError};
pub use family::ResourceFamily;
pub use normalizer::{
    Envelope, Exchange, GatewayBody, GatewayResponse, ResponseNormalizer,
    UNEXPECTED_RESPONSE_MESSAGE,
};
pub use request::ProxyRequest;
pub use result::{ProxyResult, ResponseBody};
pub use route_table::{BackendRouteTable, CredentialMode, RouteEntry};
