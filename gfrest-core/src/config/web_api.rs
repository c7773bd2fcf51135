//! Web API settings.

/// Options record of the web API add-on.
///
/// `public_key` / `private_key` form the system-level credential; requests
/// signed with it act as `impersonate_account`.
#[derive(Clone, Default)]
pub struct WebApiSettings {
    /// Global kill switch. When off every signed request is rejected.
    pub enabled: bool,
    pub public_key: String,
    pub private_key: String,
    /// User id requests signed with the system key authenticate as.
    pub impersonate_account: Option<i64>,
}

impl std::fmt::Debug for WebApiSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebApiSettings")
            .field("enabled", &self.enabled)
            .field("public_key", &self.public_key)
            .field("impersonate_account", &self.impersonate_account)
            .finish_non_exhaustive()
    }
}
