//! Per-request authentication state.
//!
//! Hosts call [`AuthenticationSession::authenticate`] while resolving the
//! current principal and [`AuthenticationSession::resolve_error`] when
//! collecting authentication errors. A rejected signature is held here
//! between the two calls; the session lives only as long as the request.

use super::AuthError;
use super::authenticator::{AuthOutcome, Authenticator};
use super::credential::PrincipalId;
use super::request::RestRequest;

pub struct AuthenticationSession<'a> {
    authenticator: &'a Authenticator,
    request: &'a RestRequest,
    authentication_error: Option<AuthError>,
}

impl<'a> AuthenticationSession<'a> {
    pub(crate) fn new(authenticator: &'a Authenticator, request: &'a RestRequest) -> Self {
        Self {
            authenticator,
            request,
            authentication_error: None,
        }
    }

    /// Stage one: resolve the principal, given the one found by earlier
    /// mechanisms. Never fails; a rejection is recorded for stage two.
    pub async fn authenticate(&mut self, current: Option<PrincipalId>) -> Option<PrincipalId> {
        let outcome = self.authenticator.authenticate(self.request, current).await;
        self.record(outcome)
    }

    /// Stage one evaluated at the unix time `now`.
    pub async fn authenticate_at(
        &mut self,
        current: Option<PrincipalId>,
        now: i64,
    ) -> Option<PrincipalId> {
        let outcome = self
            .authenticator
            .authenticate_at(self.request, current, now)
            .await;
        self.record(outcome)
    }

    fn record(&mut self, outcome: AuthOutcome) -> Option<PrincipalId> {
        match outcome {
            AuthOutcome::AuthenticatedAs(principal) => Some(principal),
            AuthOutcome::Unauthenticated => None,
            AuthOutcome::Rejected(error) => {
                self.authentication_error = Some(error);
                None
            }
        }
    }

    /// Stage two: an error from an earlier stage wins, otherwise the one
    /// recorded by [`authenticate`](Self::authenticate).
    pub fn resolve_error(&self, existing: Option<AuthError>) -> Option<AuthError> {
        existing.or_else(|| self.authentication_error.clone())
    }
}
