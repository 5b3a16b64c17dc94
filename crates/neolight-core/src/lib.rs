pub mod config;
pub mod error;

pub use config::{
    Config, DatabaseConfig, ServerConfig, UpdaterConfig, ValidationResult, WeatherConfig,
};
pub use error::{
    ConfigError, DatabaseError, NetworkError, ReqwestErrorExt, RusqliteErrorExt,
};

use anyhow::Result;

/// Initialize logging and pick up a `.env` file if one is present.
pub fn init() -> Result<()> {
    // Env vars can also be set externally, so a missing .env is fine
    let dotenv = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    match dotenv {
        Ok(path) => tracing::debug!("Loaded environment from {}", path.display()),
        Err(e) if e.not_found() => tracing::debug!("No .env file found"),
        Err(e) => tracing::warn!("Failed to load .env file: {}", e),
    }

    tracing::info!("Neolight core initialized");
    Ok(())
}
