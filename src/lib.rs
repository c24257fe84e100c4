pub mod cli;
pub mod client;
pub mod config;
pub mod domain;
pub mod server;

pub use cli::Cli;

use client::{MonitorClient, SocketIoTransport, TransportOptions};
use config::AppConfig;
use server::McpServer;
use std::error::Error;
use tracing::{debug, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

/// Logs go to stderr only; stdout carries protocol frames.
pub fn init_tracing() {
    static INIT: std::sync::Once = std::sync::Once::new();
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_level(true)
            .with_writer(std::io::stderr)
            .init();
    });
}

pub async fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    info!("Starting vigil-mcp");
    config::ensure_env_loaded(cli.env_file.as_deref());

    let mut config = AppConfig::from_env();
    apply_cli_overrides(&cli, &mut config);
    config.validate()?;

    let client = match &config.url {
        Some(url) => {
            info!(url = %url, "initializing remote service client");
            let transport = SocketIoTransport::new(url, TransportOptions::default());
            Some(MonitorClient::new(transport, config.credentials()))
        }
        None => {
            warn!("no base URL configured; every tool call will fail until one is set");
            None
        }
    };

    McpServer::new(client).run().await?;
    info!("Server execution finished");
    Ok(())
}

fn apply_cli_overrides(cli: &Cli, config: &mut AppConfig) {
    if cli.url.is_some() {
        debug!("overriding base URL from CLI flag");
        config.url = cli.url.clone();
    }
    if cli.username.is_some() {
        config.username = cli.username.clone();
    }
    if cli.password.is_some() {
        config.password = cli.password.clone();
    }
    if cli.token.is_some() {
        config.token = cli.token.clone();
    }
}
