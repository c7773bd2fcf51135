//! Shared API objects.

mod error;

pub use error::{
    AUTHENTICATION_ERROR_CODE, INVALID_API_KEY_MESSAGE, INVALID_SIGNATURE_MESSAGE,
    NO_ROUTE_CODE, NO_ROUTE_MESSAGE, RestErrorBody,
};
