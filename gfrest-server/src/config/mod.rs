//! Configuration module for gfrest-server.
//!
//! Handles loading configuration from TOML files, CLI arguments,
//! and environment variables.

pub mod file;

use crate::config::file::{FileConfig, WebApiConfig};
use gfrest_core::config::{RestConfig, ServerConfig, WebApiSettings};
use std::net::SocketAddr;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("validation error: {0}")]
    ValidationError(String),

    #[error("DATABASE_URL environment variable not set")]
    MissingDatabaseUrl,
}

/// Loaded configuration result containing all parts.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub server: ServerConfig,
    pub rest: RestConfig,
    pub web_api: WebApiSettings,
}

/// Configuration loader that handles the complete loading process.
pub struct ConfigLoader {
    config_path: std::path::PathBuf,
    listen_override: Option<SocketAddr>,
}

impl ConfigLoader {
    /// Create a new config loader.
    pub fn new(config_path: impl AsRef<Path>, listen_override: Option<SocketAddr>) -> Self {
        Self {
            config_path: config_path.as_ref().to_path_buf(),
            listen_override,
        }
    }

    /// Load and process the configuration.
    ///
    /// This will:
    /// 1. Read the TOML file
    /// 2. Apply CLI overrides
    /// 3. Validate the configuration
    /// 4. Build the loaded configuration
    pub fn load(&self) -> Result<LoadedConfig, ConfigError> {
        let config_content = std::fs::read_to_string(&self.config_path)?;
        self.load_str(&config_content)
    }

    fn load_str(&self, content: &str) -> Result<LoadedConfig, ConfigError> {
        let mut file_config: FileConfig = toml::from_str(content)?;

        if let Some(listen) = self.listen_override {
            file_config.server.listen = listen;
        }

        validate(&file_config)?;
        warn_incomplete_system_key(&file_config.web_api);

        Ok(build_loaded_config(file_config))
    }

    /// Reload the configuration (used during SIGHUP).
    pub fn reload(&self) -> Result<LoadedConfig, ConfigError> {
        self.load()
    }
}

fn validate(config: &FileConfig) -> Result<(), ConfigError> {
    if config.rest.url_prefix.trim_matches('/').is_empty() {
        return Err(ConfigError::ValidationError(
            "rest.url_prefix must not be empty".to_string(),
        ));
    }
    if let Some(account) = config.web_api.impersonate_account {
        if account <= 0 {
            return Err(ConfigError::ValidationError(format!(
                "web_api.impersonate_account must be a user id, got {account}"
            )));
        }
    }
    Ok(())
}

/// A system key without its secret or account never authenticates; say so
/// at startup instead of leaving it to a 401.
fn warn_incomplete_system_key(web_api: &WebApiConfig) {
    if !web_api.enabled || web_api.public_key.is_empty() {
        return;
    }
    if web_api.private_key.is_empty() {
        tracing::warn!("web_api.public_key is set without web_api.private_key; the system key is unusable");
    }
    if web_api.impersonate_account.is_none() {
        tracing::warn!("web_api.public_key is set without web_api.impersonate_account; the system key is unusable");
    }
}

fn build_loaded_config(file_config: FileConfig) -> LoadedConfig {
    LoadedConfig {
        server: ServerConfig {
            listen: file_config.server.listen,
        },
        rest: RestConfig::new(&file_config.rest.url_prefix, &file_config.rest.home_path),
        web_api: convert_web_api(file_config.web_api),
    }
}

fn convert_web_api(w: WebApiConfig) -> WebApiSettings {
    WebApiSettings {
        enabled: w.enabled,
        public_key: w.public_key,
        private_key: w.private_key,
        impersonate_account: w.impersonate_account,
    }
}

/// Get the database URL from the environment.
pub fn get_database_url() -> Result<String, ConfigError> {
    std::env::var("DATABASE_URL").map_err(|_| ConfigError::MissingDatabaseUrl)
}
