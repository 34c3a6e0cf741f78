//! Backend call results.

use serde_json::Value;

use super::credential::{set_cookie_pair, ACCESS_TOKEN_COOKIE};

/// Backend payload after content-type sniffing.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    Json(Value),
    /// Non-JSON content such as an HTML error page.
    Text(String),
    Empty,
}

/// What the backend answered. Any status, including 4xx/5xx, is a result,
/// not an error.
#[derive(Debug, Clone, PartialEq)]
pub struct ProxyResult {
    pub status: u16,
    pub body: ResponseBody,
    /// `Set-Cookie` directives, verbatim.
    pub set_cookies: Vec<String>,
}

/// Body fields a refresh endpoint may use for the renewed token.
const TOKEN_FIELDS: [&str; 3] = ["access_token", "accessToken", "token"];

impl ProxyResult {
    pub fn new(status: u16, body: ResponseBody) -> Self {
        Self {
            status,
            body,
            set_cookies: Vec::new(),
        }
    }

    pub fn json(status: u16, body: Value) -> Self {
        Self::new(status, ResponseBody::Json(body))
    }

    pub fn with_set_cookie(mut self, directive: impl Into<String>) -> Self {
        self.set_cookies.push(directive.into());
        self
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// True for a 401, or a JSON body that says the token expired.
    pub fn signals_expired_credential(&self) -> bool {
        if self.status == 401 {
            return true;
        }
        let ResponseBody::Json(body) = &self.body else {
            return false;
        };
        let code_says_expired = ["code", "error"].iter().any(|field| {
            body.get(field)
                .and_then(Value::as_str)
                .is_some_and(|code| code.eq_ignore_ascii_case("token_expired"))
        });
        let message_says_expired = body
            .get("message")
            .and_then(Value::as_str)
            .is_some_and(|message| message.trim().eq_ignore_ascii_case("token expired"));
        code_says_expired || message_says_expired
    }

    /// Access token issued by a refresh call: the `access_token_cookie`
    /// directive first, then a token field in the JSON body.
    pub fn renewed_access_token(&self) -> Option<String> {
        let from_cookie = self
            .set_cookies
            .iter()
            .filter_map(|directive| set_cookie_pair(directive))
            .find(|(name, value)| *name == ACCESS_TOKEN_COOKIE && !value.is_empty())
            .map(|(_, value)| value.to_string());

        from_cookie.or_else(|| match &self.body {
            ResponseBody::Json(body) => TOKEN_FIELDS
                .iter()
                .filter_map(|field| body.get(field).and_then(Value::as_str))
                .find(|token| !token.is_empty())
                .map(str::to_string),
            _ => None,
        })
    }
}
