//! Response normalizer - one stable contract for the browser.
//!
//! Backend JSON passes through with its status untouched. Anything the
//! browser cannot use (HTML error pages, empty bodies, transport failures)
//! is replaced by a `{ success: false, message }` envelope. Session cookies
//! are forwarded on every path, so a refreshed session survives a failure
//! further downstream.

use serde::Serialize;
use serde_json::Value;

use super::errors::GatewayError;
use super::result::{ProxyResult, ResponseBody};

/// Message used when the backend answers with something other than JSON.
pub const UNEXPECTED_RESPONSE_MESSAGE: &str = "unexpected response from service";

/// Statuses that must not carry a body.
const BODYLESS_STATUSES: [u16; 3] = [204, 205, 304];

/// Error envelope sent to the browser.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Envelope {
    pub success: bool,
    pub message: String,
}

impl Envelope {
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }

    fn into_value(self) -> Value {
        serde_json::json!({ "success": self.success, "message": self.message })
    }
}

/// Body of the final browser response.
#[derive(Debug, Clone, PartialEq)]
pub enum GatewayBody {
    Json(Value),
    Empty,
}

/// Final response handed to the HTTP layer.
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayResponse {
    pub status: u16,
    pub body: GatewayBody,
    pub set_cookies: Vec<String>,
    /// `Allow` header for pre-flight and 405 answers.
    pub allow: Option<String>,
}

impl GatewayResponse {
    pub fn json(status: u16, body: Value) -> Self {
        Self {
            status,
            body: GatewayBody::Json(body),
            set_cookies: Vec::new(),
            allow: None,
        }
    }

    pub fn envelope(status: u16, envelope: Envelope) -> Self {
        Self::json(status, envelope.into_value())
    }

    /// 200 answer to a pre-flight request.
    pub fn preflight(allow: String) -> Self {
        Self {
            status: 200,
            body: GatewayBody::Empty,
            set_cookies: Vec::new(),
            allow: Some(allow),
        }
    }

    pub fn with_allow(mut self, allow: String) -> Self {
        self.allow = Some(allow);
        self
    }

    fn with_cookies(mut self, cookies: Vec<String>) -> Self {
        self.set_cookies = cookies;
        self
    }

    /// Convenience for tests and logging.
    pub fn json_body(&self) -> Option<&Value> {
        match &self.body {
            GatewayBody::Json(value) => Some(value),
            GatewayBody::Empty => None,
        }
    }
}

/// Outcome of the outbound side of one inbound request.
#[derive(Debug, Clone)]
pub struct Exchange {
    /// Final backend result, or the gateway failure that replaced it.
    pub outcome: Result<ProxyResult, GatewayError>,
    /// Cookies issued by a refresh call during this request.
    pub renewed_cookies: Vec<String>,
}

impl Exchange {
    pub fn completed(result: ProxyResult) -> Self {
        Self {
            outcome: Ok(result),
            renewed_cookies: Vec::new(),
        }
    }

    pub fn failed(error: GatewayError) -> Self {
        Self {
            outcome: Err(error),
            renewed_cookies: Vec::new(),
        }
    }
}

/// Shapes exchanges and gateway failures into browser responses.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseNormalizer;

impl ResponseNormalizer {
    pub fn new() -> Self {
        Self
    }

    pub fn normalize(&self, exchange: Exchange) -> GatewayResponse {
        let Exchange {
            outcome,
            renewed_cookies,
        } = exchange;

        match outcome {
            Ok(result) => {
                let mut cookies = renewed_cookies;
                cookies.extend(result.set_cookies);
                Self::shape(result.status, result.body).with_cookies(cookies)
            }
            Err(error) => self.reject(&error).with_cookies(renewed_cookies),
        }
    }

    /// Envelope for a failure detected before or instead of a backend answer.
    pub fn reject(&self, error: &GatewayError) -> GatewayResponse {
        GatewayResponse::envelope(error.status(), Envelope::failure(error.client_message()))
    }

    fn shape(status: u16, body: ResponseBody) -> GatewayResponse {
        if BODYLESS_STATUSES.contains(&status) {
            return GatewayResponse {
                status,
                body: GatewayBody::Empty,
                set_cookies: Vec::new(),
                allow: None,
            };
        }
        match body {
            ResponseBody::Json(value) => GatewayResponse::json(status, value),
            ResponseBody::Text(_) | ResponseBody::Empty => {
                GatewayResponse::envelope(status, Envelope::failure(UNEXPECTED_RESPONSE_MESSAGE))
            }
        }
    }
}
