//! REST error body returned by the API.

use serde::{Deserialize, Serialize};

/// Error code shared by every failure of the signature authentication.
pub const AUTHENTICATION_ERROR_CODE: &str = "gravityforms_rest_authentication_error";

pub const INVALID_API_KEY_MESSAGE: &str = "API Key is invalid.";

pub const INVALID_SIGNATURE_MESSAGE: &str =
    "Invalid Signature - provided signature does not match.";

pub const NO_ROUTE_CODE: &str = "rest_no_route";

pub const NO_ROUTE_MESSAGE: &str = "No route was found matching the URL and request method.";

/// JSON error body: `{ "code": ..., "message": ..., "status": ... }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{code}: {message} (status {status})")]
pub struct RestErrorBody {
    pub code: String,
    pub message: String,
    pub status: u16,
}

impl RestErrorBody {
    pub fn new(code: impl Into<String>, message: impl Into<String>, status: u16) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            status,
        }
    }

    /// 401 `API Key is invalid.`
    pub fn invalid_api_key() -> Self {
        Self::new(AUTHENTICATION_ERROR_CODE, INVALID_API_KEY_MESSAGE, 401)
    }

    /// 401 `Invalid Signature - provided signature does not match.`
    pub fn invalid_signature() -> Self {
        Self::new(AUTHENTICATION_ERROR_CODE, INVALID_SIGNATURE_MESSAGE, 401)
    }

    pub fn no_route() -> Self {
        Self::new(NO_ROUTE_CODE, NO_ROUTE_MESSAGE, 404)
    }
}
