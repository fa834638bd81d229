//! MCP Server Entry Point
//!
//! Initializes logging, loads configuration from environment variables (see
//! `core::config`), builds the tool registry and starts the configured
//! transport(s).

mod core;
mod tools;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::core::config::{ServerConfig, TransportMode};
use crate::core::server::{self, AppState};

/// Logs go to stderr; stdout carries JSON-RPC in STDIO mode.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let config = ServerConfig::from_env().inspect_err(|e| error!(error = %e, "invalid configuration"))?;
    let registry = server::initialize_tools(config.rng_seed)?;
    let state = AppState::from(&config);

    info!(transport = ?config.transport, seeded = config.rng_seed.is_some(), "configuration loaded");

    match config.transport {
        TransportMode::Stdio => server::run_server_stdio(state, registry).await?,
        TransportMode::Http => server::run_server_http(&config, state, registry).await?,
        TransportMode::Both => {
            // STDIO runs in the background, HTTP in the foreground
            let stdio_state = state.clone();
            let stdio_registry = registry.clone();
            let stdio_handle = tokio::spawn(async move {
                if let Err(e) = server::run_server_stdio(stdio_state, stdio_registry).await {
                    error!(error = %e, "STDIO server error");
                }
            });

            let http_result = server::run_server_http(&config, state, registry).await;

            // If HTTP server exits, abort STDIO task
            stdio_handle.abort();
            http_result?
        }
    }

    Ok(())
}
