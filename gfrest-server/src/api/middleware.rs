//! Signed-request authentication layer.
//!
//! Runs the two authentication stages on every request:
//!
//! 1. resolve the principal, keeping one an outer layer already set as an
//!    [`AuthenticatedPrincipal`] extension;
//! 2. collect the authentication error, keeping one an outer layer already
//!    set as an [`AuthError`] extension.
//!
//! An error ends the request with its status and JSON body. Otherwise the
//! principal, if any, is handed to handlers as an [`AuthenticatedPrincipal`]
//! extension.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use gfrest_core::auth::{AuthError, PrincipalId, RestRequest};

use super::RestError;
use crate::state::AppState;

/// The principal the current request acts as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedPrincipal(pub PrincipalId);

pub async fn authenticate_request(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let rest_request = RestRequest::new(
        request.method().as_str(),
        request.uri().path(),
        request.uri().query(),
    );
    let current = request
        .extensions()
        .get::<AuthenticatedPrincipal>()
        .map(|principal| principal.0);
    let existing_error = request.extensions().get::<AuthError>().cloned();

    let mut session = state.authenticator.session(&rest_request);
    let principal = session.authenticate(current).await;

    if let Some(error) = session.resolve_error(existing_error) {
        tracing::debug!(
            code = %error.code,
            status = error.status,
            path = rest_request.path(),
            "Rejecting request with authentication error"
        );
        return RestError(error).into_response();
    }

    if let Some(principal) = principal {
        request
            .extensions_mut()
            .insert(AuthenticatedPrincipal(principal));
    }
    next.run(request).await
}
