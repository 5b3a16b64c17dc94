use std::path::PathBuf;

use anyhow::{Context, Result};
use neolight_api::AppState;
use neolight_core::Config;
use neolight_services::{DocumentClient, SqliteDocumentStore, UpdateLoop};
use neolight_weather::WeatherProvider;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize core
    neolight_core::init()?;

    // Optional explicit config file, otherwise the per-user one
    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let (config, _validation) = Config::load_validated(config_path.as_deref())?;

    let tz = config.updater.tz()?;
    let store = SqliteDocumentStore::open(&config.database.path)
        .with_context(|| format!("Failed to open {}", config.database.path.display()))?;
    let documents = DocumentClient::new(store, &config.database.collection);
    let provider = WeatherProvider::new(&config.weather, tz)?;

    tracing::info!(
        "Neolight started: '{}' for {} every {}s",
        config.updater.record_name,
        provider.location(),
        config.updater.interval_secs
    );

    let shutdown = CancellationToken::new();
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for Ctrl-C: {}", e);
                return;
            }
            tracing::info!("Shutdown requested");
            shutdown.cancel();
        }
    });

    let server = if config.server.enabled {
        let addr = config.server.socket_addr()?;
        let state = AppState::new(documents.clone());
        let shutdown = shutdown.clone();
        Some(tokio::spawn(async move {
            let result = neolight_api::run_server(addr, state, shutdown.clone()).await;
            if result.is_err() {
                shutdown.cancel();
            }
            result
        }))
    } else {
        None
    };

    let update_loop = UpdateLoop::new(provider, documents, &config.updater)?;
    update_loop.run(shutdown).await;

    if let Some(server) = server {
        server.await?.context("Device API failed")?;
    }

    Ok(())
}
