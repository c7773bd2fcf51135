//! Axum server setup and router configuration.

use crate::api::{middleware::authenticate_request, rest_no_route};
use crate::shutdown::shutdown_signal;
use crate::state::AppState;
use axum::{Json, Router, middleware::from_fn_with_state, response::IntoResponse, routing::get};
use serde::Serialize;
use std::net::SocketAddr;
use tokio::net::TcpListener;

/// Build the main application router.
pub fn build_router(state: AppState) -> Router {
    let routes = Router::new()
        // Health check endpoint
        .route("/health", get(health_check))
        .fallback(rest_no_route);
    with_authentication(routes, state)
}

/// Wrap `routes` in the signed-request authentication layer and attach state.
pub fn with_authentication(routes: Router<AppState>, state: AppState) -> Router {
    routes
        .layer(from_fn_with_state(state.clone(), authenticate_request))
        .with_state(state)
}

/// Health check response.
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

/// Simple health check - returns OK if the server is running.
async fn health_check() -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Run the server with graceful shutdown support.
pub async fn run_server(router: Router, addr: SocketAddr) -> Result<(), std::io::Error> {
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
}
