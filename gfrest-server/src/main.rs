//! Gravity Forms REST API server
//!
//! Authenticates signed requests to the `gf/v2` REST namespace.

mod api;
mod config;
mod server;
mod shutdown;
mod state;

use clap::Parser;
use config::{ConfigLoader, get_database_url};
use gfrest_core::auth::PgUserDirectory;
use server::{build_router, run_server};
use shutdown::spawn_config_reload_handler;
use sqlx::postgres::PgPoolOptions;
use state::AppState;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Gravity Forms REST API - signed request authentication server
#[derive(Parser, Debug)]
#[command(name = "gfrest-server")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, default_value = "./gfrest-config.toml")]
    config: PathBuf,

    /// Override the listen address (e.g., 0.0.0.0:3000)
    #[arg(short, long)]
    listen: Option<SocketAddr>,

    /// Run database migrations on startup
    #[arg(long, default_value = "false")]
    migrate: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let args = Args::parse();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "gfrest-server starting");

    let config_loader = Arc::new(ConfigLoader::new(&args.config, args.listen));
    let loaded_config = config_loader.load().map_err(|e| {
        tracing::error!(error = %e, path = ?args.config, "invalid configuration");
        e
    })?;

    let listen_addr = loaded_config.server.listen;
    tracing::info!(
        web_api_enabled = loaded_config.web_api.enabled,
        url_prefix = %loaded_config.rest.url_prefix,
        home_path = %loaded_config.rest.home_path,
        "configuration loaded"
    );

    let database_url = get_database_url()?;

    let db_pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&database_url)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "cannot reach the user_meta database");
            e
        })?;

    if args.migrate {
        sqlx::migrate!("../migrations")
            .run(&db_pool)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "migration failed");
                e
            })?;
        tracing::info!("user_meta migrations applied");
    }

    let state = AppState::new(
        loaded_config.rest.clone(),
        loaded_config.web_api.clone(),
        Arc::new(PgUserDirectory::new(db_pool.clone())),
    );

    // Reloads [web_api] on SIGHUP until notified.
    let reload_stop = spawn_config_reload_handler(state.clone(), config_loader, loaded_config);

    tracing::info!(%listen_addr, "serving gf/v2 authentication");
    let result = run_server(build_router(state), listen_addr).await;
    reload_stop.notify_one();

    db_pool.close().await;
    tracing::info!("gfrest-server stopped");

    result.map_err(Into::into)
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
