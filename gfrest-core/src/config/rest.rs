//! REST URL layout.

use gfrest_sdk::NAMESPACE;

/// Where the REST API lives on the site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestConfig {
    /// REST URL prefix without surrounding slashes (`wp-json`).
    pub url_prefix: String,
    /// Site path relative to the host, with leading and trailing slash (`/`, `/blog/`).
    pub home_path: String,
}

impl RestConfig {
    /// Normalises slashes: the prefix is trimmed, the home path gets exactly
    /// one leading and one trailing slash.
    pub fn new(url_prefix: &str, home_path: &str) -> Self {
        let home = home_path.trim_matches('/');
        let home_path = if home.is_empty() {
            "/".to_string()
        } else {
            format!("/{home}/")
        };
        Self {
            url_prefix: url_prefix.trim_matches('/').to_string(),
            home_path,
        }
    }

    /// Marker that identifies a request to this add-on (`wp-json/gf/`).
    pub fn api_marker(&self) -> String {
        format!("{}/gf/", self.url_prefix)
    }

    /// Prefix removed from the path to obtain the signed route (`wp-json/gf/v2/`).
    pub fn namespace_prefix(&self) -> String {
        format!("{}/{NAMESPACE}/", self.url_prefix)
    }
}

impl Default for RestConfig {
    fn default() -> Self {
        Self::new("wp-json", "/")
    }
}
