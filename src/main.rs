//! Payroll Engine HTTP server.
//!
//! Loads the configuration directory named by `PAYROLL_CONFIG_DIR`
//! (default `./config/default`) and serves the payroll API.

use payroll_engine::api::{AppState, create_router};
use payroll_engine::config::ConfigLoader;
use payroll_engine::logging;
use tracing::{error, info};

const DEFAULT_CONFIG_DIR: &str = "./config/default";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_dir =
        std::env::var("PAYROLL_CONFIG_DIR").unwrap_or_else(|_| DEFAULT_CONFIG_DIR.to_string());
    let loader = ConfigLoader::load(&config_dir)?;
    logging::init(&loader.settings().logging);

    let state = match AppState::from_loader(&loader) {
        Ok(state) => state,
        Err(err) => {
            error!(config_dir = %config_dir, error = %err, "Invalid configuration");
            return Err(err.into());
        }
    };

    let server = &loader.settings().server;
    let addr = format!("{}:{}", server.host, server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(address = %addr, config_dir = %config_dir, "Payroll engine listening");

    axum::serve(listener, create_router(state)).await?;
    Ok(())
}
