//! RefreshCoordinator - single retry after a credential refresh.
//!
//! Two states, `Initial` and `Retried`. An expired-credential answer in
//! `Initial` triggers one refresh call and, if it yields a new credential,
//! one retried backend call. In `Retried` every answer is terminal, so one
//! inbound request causes at most two backend calls and one refresh call.

use std::borrow::Cow;
use std::sync::Arc;

use crate::domain::gateway::{
    Credential, CredentialSource, Exchange, GatewayError, ProxyRequest, RouteEntry,
};
use crate::ports::BackendClient;

/// Position in the refresh state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshPhase {
    Initial,
    Retried,
}

impl RefreshPhase {
    /// Only the initial attempt may trigger a refresh.
    pub fn may_refresh(&self) -> bool {
        matches!(self, RefreshPhase::Initial)
    }
}

/// Credential and cookies issued by a successful refresh.
struct Renewal {
    credential: Credential,
    set_cookies: Vec<String>,
}

/// A refresh that yielded no usable credential. Any cookies it set still
/// reach the browser, e.g. a rotated or cleared refresh token.
struct FailedRenewal {
    error: GatewayError,
    set_cookies: Vec<String>,
}

impl FailedRenewal {
    fn bare(error: GatewayError) -> Self {
        Self {
            error,
            set_cookies: Vec::new(),
        }
    }
}

/// Runs the outbound side of a request with the refresh-once policy.
pub struct RefreshCoordinator {
    backend: Arc<dyn BackendClient>,
}

impl RefreshCoordinator {
    pub fn new(backend: Arc<dyn BackendClient>) -> Self {
        Self { backend }
    }

    pub async fn execute(
        &self,
        route: &RouteEntry,
        request: &ProxyRequest,
        credential: Option<Credential>,
    ) -> Exchange {
        let mut phase = RefreshPhase::Initial;
        let mut current = Cow::Borrowed(request);
        let mut credential = credential;
        let mut renewed_cookies = Vec::new();

        loop {
            let outcome = self.backend.call(route, &current, credential.as_ref()).await;

            let expired = matches!(&outcome, Ok(result) if result.signals_expired_credential());
            if !expired || !route.refresh_on_expiry {
                return Exchange {
                    outcome,
                    renewed_cookies,
                };
            }
            if !phase.may_refresh() {
                tracing::info!(
                    family = %route.family,
                    "Backend rejected refreshed credential; returning terminal response"
                );
                return Exchange {
                    outcome,
                    renewed_cookies,
                };
            }

            match self.renew(&current).await {
                Ok(renewal) => {
                    tracing::debug!(family = %route.family, "Credential refreshed; retrying once");
                    current = Cow::Owned(current.with_renewed_cookies(&renewal.set_cookies));
                    credential = Some(renewal.credential);
                    renewed_cookies = renewal.set_cookies;
                    phase = RefreshPhase::Retried;
                }
                Err(failed) => {
                    tracing::info!(
                        family = %route.family,
                        error = %failed.error,
                        forwarded_cookies = failed.set_cookies.len(),
                        "Credential refresh failed; returning original response"
                    );
                    return Exchange {
                        outcome,
                        renewed_cookies: failed.set_cookies,
                    };
                }
            }
        }
    }

    /// Calls the refresh operation. Any failure is `RefreshExhausted`,
    /// carrying whatever cookies the refresh answer set.
    async fn renew(&self, request: &ProxyRequest) -> Result<Renewal, FailedRenewal> {
        let refresh_credential = request.refresh_credential().ok_or_else(|| {
            FailedRenewal::bare(GatewayError::RefreshExhausted(
                "no refresh credential".to_string(),
            ))
        })?;

        let result = self
            .backend
            .refresh(&refresh_credential)
            .await
            .map_err(|e| FailedRenewal::bare(GatewayError::RefreshExhausted(e.to_string())))?;

        if !result.is_success() {
            return Err(FailedRenewal {
                error: GatewayError::RefreshExhausted(format!(
                    "refresh answered {}",
                    result.status
                )),
                set_cookies: result.set_cookies,
            });
        }

        let Some(token) = result.renewed_access_token() else {
            return Err(FailedRenewal {
                error: GatewayError::RefreshExhausted(
                    "refresh issued no access token".to_string(),
                ),
                set_cookies: result.set_cookies,
            });
        };

        Ok(Renewal {
            credential: Credential::new(token, CredentialSource::Refresh),
            set_cookies: result.set_cookies,
        })
    }
}
