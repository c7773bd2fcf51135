//! TOML file configuration structures.
//!
//! These structs directly map to the `gfrest-config.toml` file format.

use serde::Deserialize;
use std::net::SocketAddr;

/// Root configuration structure as read from the TOML file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub rest: RestConfig,
    #[serde(default)]
    pub web_api: WebApiConfig,
}

/// Server configuration section.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// The address and port to listen on (e.g., "0.0.0.0:8080").
    #[serde(default = "default_listen_addr")]
    pub listen: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen_addr(),
        }
    }
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8080))
}

/// REST URL layout of the site.
#[derive(Debug, Clone, Deserialize)]
pub struct RestConfig {
    /// REST URL prefix (`wp-json`).
    #[serde(default = "default_url_prefix")]
    pub url_prefix: String,
    /// Path of the site below the host (`/` or `/blog/`).
    #[serde(default = "default_home_path")]
    pub home_path: String,
}

impl Default for RestConfig {
    fn default() -> Self {
        Self {
            url_prefix: default_url_prefix(),
            home_path: default_home_path(),
        }
    }
}

fn default_url_prefix() -> String {
    "wp-json".to_string()
}

fn default_home_path() -> String {
    "/".to_string()
}

/// Web API settings: kill switch and the system-level key pair.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebApiConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub public_key: String,
    #[serde(default)]
    pub private_key: String,
    /// User id that requests signed with the system key act as.
    #[serde(default)]
    pub impersonate_account: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_config_parsing() {
        let toml_str = r#"
[server]
listen = "127.0.0.1:3000"

[rest]
url_prefix = "api"
home_path = "/blog/"

[web_api]
enabled = true
public_key = "pk"
private_key = "sk"
impersonate_account = 1
"#;
        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.listen.port(), 3000);
        assert_eq!(config.rest.url_prefix, "api");
        assert_eq!(config.rest.home_path, "/blog/");
        assert!(config.web_api.enabled);
        assert_eq!(config.web_api.impersonate_account, Some(1));
    }

    #[test]
    fn test_defaults() {
        let config: FileConfig = toml::from_str("").unwrap();
        assert_eq!(config.server.listen, default_listen_addr());
        assert_eq!(config.rest.url_prefix, "wp-json");
        assert_eq!(config.rest.home_path, "/");
        assert!(!config.web_api.enabled);
        assert_eq!(config.web_api.impersonate_account, None);
    }
}
