//! HTTP surface of the REST API.
//!
//! Routes themselves live with their controllers; this module provides the
//! authentication layer every request passes through and the REST error
//! response.

pub mod middleware;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use gfrest_sdk::objects::RestErrorBody;

/// A REST error answered as `status` + JSON body.
#[derive(Debug, Clone)]
pub struct RestError(pub RestErrorBody);

impl IntoResponse for RestError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.status).unwrap_or(StatusCode::UNAUTHORIZED);
        (status, Json(self.0)).into_response()
    }
}

/// Fallback for paths no controller handles.
pub async fn rest_no_route() -> RestError {
    RestError(RestErrorBody::no_route())
}
