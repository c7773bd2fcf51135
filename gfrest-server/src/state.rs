//! Application state shared across all request handlers.

use gfrest_core::auth::{Authenticator, UserDirectory};
use gfrest_core::config::{ConfigStore, RestConfig, WebApiSettings};
use std::sync::Arc;

/// Application state that is shared across all request handlers.
///
/// This is cloneable and cheap to pass around (everything is behind Arc).
#[derive(Clone)]
pub struct AppState {
    /// Signed-request authenticator.
    pub authenticator: Authenticator,
    /// Web API settings (can be reloaded via SIGHUP).
    pub web_api: ConfigStore<WebApiSettings>,
}

impl AppState {
    /// Create a new AppState reading per-user keys from `directory`.
    pub fn new(rest: RestConfig, web_api: WebApiSettings, directory: Arc<dyn UserDirectory>) -> Self {
        let web_api = ConfigStore::new(web_api);
        Self {
            authenticator: Authenticator::new(rest, web_api.clone(), directory),
            web_api,
        }
    }
}
