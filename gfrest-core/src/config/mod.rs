//! Configuration types for the REST API service.
//!
//! These types represent the validated runtime configuration. Loading and
//! parsing the TOML file is handled by the server crate.

mod config_store;
mod rest;
mod server;
mod web_api;

pub use config_store::ConfigStore;
pub use rest::RestConfig;
pub use server::ServerConfig;
pub use web_api::WebApiSettings;
