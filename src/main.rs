#![forbid(unsafe_code)]

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use futures::future::try_join_all;
use tracing::{error, info};

use device_state_gateway::DeviceStore;
use device_state_gateway::cli::Cli;
use device_state_gateway::config::Config;
use device_state_gateway::metrics::Metrics;
use device_state_gateway::store;
use device_state_gateway::utils;
use device_state_gateway::web::WebServer;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load_from_file(&cli.config)
        .with_context(|| format!("failed to load config from {}", cli.config.display()))?;

    utils::logging::init_tracing(&config.logging);
    Metrics::mark_started();
    info!("device state gateway starting up");

    let conn = store::connect(&config.database).await?;
    let devices = Arc::new(DeviceStore::from_config(conn, &config.correlation));

    let listener_handle = devices
        .spawn_listener()
        .context("store notice channel was already taken")?;
    let sweeper_handle = devices.spawn_sweeper(config.correlation.sweep_interval());

    try_join_all(
        config
            .devices
            .iter()
            .map(|device| devices.init_device(&device.id, &device.properties)),
    )
    .await
    .context("failed to initialise configured devices")?;
    info!("initialised {} configured devices", config.devices.len());

    if cli.init_only {
        listener_handle.abort();
        sweeper_handle.abort();
        return Ok(());
    }

    let web_server = WebServer::new(config.gateway.clone(), devices.clone());
    let web_handle = tokio::spawn(async move {
        if let Err(e) = web_server.start().await {
            error!("web server error: {}", e);
        }
    });

    tokio::select! {
        _ = web_handle => {},
        _ = tokio::signal::ctrl_c() => {
            info!("shutdown signal received");
        }
    }

    listener_handle.abort();
    sweeper_handle.abort();
    info!("device state gateway shutting down");
    Ok(())
}
