use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use url::Url;

use crate::error::ConfigError;

/// Environment variable holding the OpenWeatherMap API key.
pub const ENV_API_KEY: &str = "OPENWEATHER_API_KEY";
/// Environment variable overriding `database.path`.
pub const ENV_DATABASE: &str = "NEOLIGHT_DATABASE";
/// Environment variable overriding the port of `server.bind`.
pub const ENV_PORT: &str = "PORT";

/// Intervals below this trip the provider's free-tier rate limit.
const MIN_SENSIBLE_INTERVAL_SECS: u64 = 10;

/// Configuration validation errors
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Result of config validation
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationResult {
    /// Returns true if there are no errors (warnings are OK)
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Summary of all errors joined by `; `
    pub fn error_summary(&self) -> String {
        self.errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub weather: WeatherConfig,

    #[serde(default)]
    pub updater: UpdaterConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub server: ServerConfig,
}

/// OpenWeatherMap settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherConfig {
    /// Provider API key (usually supplied via `OPENWEATHER_API_KEY`)
    pub api_key: String,

    pub city: String,

    /// ISO 3166 country code
    pub country: String,

    /// Unit system passed to the provider
    pub units: String,

    /// Base URL of the current-weather API, without the `/weather` path
    pub base_url: String,

    pub timeout_secs: u64,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            city: "New Delhi".to_string(),
            country: "IN".to_string(),
            units: "metric".to_string(),
            base_url: "http://api.openweathermap.org/data/2.5".to_string(),
            timeout_secs: 10,
        }
    }
}

/// Update loop settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdaterConfig {
    /// Name of the single status document maintained by the loop
    pub record_name: String,

    /// IANA timezone used for date, time, sunrise and sunset strings
    pub timezone: String,

    /// Seconds to sleep between cycles
    pub interval_secs: u64,
}

impl Default for UpdaterConfig {
    fn default() -> Self {
        Self {
            record_name: "neo".to_string(),
            timezone: "Asia/Kolkata".to_string(),
            interval_secs: 60,
        }
    }
}

impl UpdaterConfig {
    /// Parse the configured timezone.
    pub fn tz(&self) -> Result<chrono_tz::Tz, ConfigError> {
        self.timezone
            .parse::<chrono_tz::Tz>()
            .map_err(|_| ConfigError::Invalid(format!("unknown timezone: {}", self.timezone)))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite database file
    pub path: PathBuf,

    /// Collection the status document lives in
    pub collection: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        let path = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("neolight")
            .join("neolight.db");

        Self {
            path,
            collection: "data".to_string(),
        }
    }
}

/// Device API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_server_enabled")]
    pub enabled: bool,

    #[serde(default = "default_bind")]
    pub bind: String,
}

fn default_server_enabled() -> bool {
    true
}

fn default_bind() -> String {
    "0.0.0.0:3000".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            enabled: default_server_enabled(),
            bind: default_bind(),
        }
    }
}

impl ServerConfig {
    /// Parse the bind address.
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.bind
            .parse()
            .map_err(|e| ConfigError::Invalid(format!("server.bind '{}': {}", self.bind, e)))
    }
}

impl Config {
    /// Load configuration from the default location, creating it if it doesn't exist.
    /// Environment overrides are applied on top.
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        let mut config = if config_path.exists() {
            Self::read(&config_path)?
        } else {
            let config = Self::default();
            config.save_to(&config_path)?;
            tracing::info!("Wrote default configuration to {}", config_path.display());
            config
        };

        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load configuration from an explicit file, then apply environment overrides.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()).into());
        }

        let mut config = Self::read(path)?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load configuration and validate it
    ///
    /// Warnings are logged; errors fail the load.
    pub fn load_validated(path: Option<&Path>) -> Result<(Self, ValidationResult)> {
        let config = match path {
            Some(path) => Self::load_from(path)?,
            None => Self::load()?,
        };
        let validation = config.validate();

        if !validation.is_valid() {
            return Err(ConfigError::Invalid(validation.error_summary()).into());
        }

        for warning in &validation.warnings {
            tracing::warn!("Config warning: {}", warning);
        }

        Ok((config, validation))
    }

    fn read(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        toml::from_str(&contents)
            .map_err(|e| ConfigError::ParseError(e.to_string()))
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Apply environment overrides. `lookup` is `std::env::var` outside tests.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup(ENV_API_KEY).filter(|k| !k.is_empty()) {
            self.weather.api_key = key;
        }

        if let Some(path) = lookup(ENV_DATABASE).filter(|p| !p.is_empty()) {
            self.database.path = PathBuf::from(path);
        }

        if let Some(port) = lookup(ENV_PORT) {
            match port.parse::<u16>() {
                Ok(port) => {
                    let host = self
                        .server
                        .bind
                        .rsplit_once(':')
                        .map(|(host, _)| host.to_string())
                        .unwrap_or_else(|| "0.0.0.0".to_string());
                    self.server.bind = format!("{}:{}", host, port);
                }
                Err(_) => tracing::warn!("Ignoring invalid {} value: {}", ENV_PORT, port),
            }
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        if self.weather.api_key.trim().is_empty() {
            result.add_error(
                "weather.api_key",
                format!("API key is required (set it in the config file or {})", ENV_API_KEY),
            );
        }

        if self.weather.city.trim().is_empty() {
            result.add_error("weather.city", "City must not be empty");
        }

        if self.weather.country.trim().is_empty() {
            result.add_error("weather.country", "Country code must not be empty");
        }

        if self.weather.timeout_secs == 0 {
            result.add_error("weather.timeout_secs", "Timeout must be greater than 0");
        }

        self.validate_url(&self.weather.base_url, "weather.base_url", &mut result);

        if self.updater.record_name.trim().is_empty() {
            result.add_error("updater.record_name", "Record name must not be empty");
        }

        if let Err(e) = self.updater.tz() {
            result.add_error("updater.timezone", e.to_string());
        }

        if self.updater.interval_secs == 0 {
            result.add_error("updater.interval_secs", "Interval must be greater than 0");
        } else if self.updater.interval_secs < MIN_SENSIBLE_INTERVAL_SECS {
            result.add_warning(
                "updater.interval_secs",
                format!(
                    "Polling more often than every {}s may exceed the provider rate limit",
                    MIN_SENSIBLE_INTERVAL_SECS
                ),
            );
        }

        if self.database.collection.trim().is_empty() {
            result.add_error("database.collection", "Collection must not be empty");
        }

        if self.server.enabled {
            if let Err(e) = self.server.socket_addr() {
                result.add_error("server.bind", e.to_string());
            }
        }

        result
    }

    /// Validate a URL field
    fn validate_url(&self, url_str: &str, field_name: &str, result: &mut ValidationResult) {
        match Url::parse(url_str) {
            Ok(url) => {
                if url.scheme() != "http" && url.scheme() != "https" {
                    result.add_error(
                        field_name,
                        format!("URL must use http or https scheme, got: {}", url.scheme()),
                    );
                }

                if url.host().is_none() {
                    result.add_error(field_name, "URL must have a host");
                }
            }
            Err(e) => {
                result.add_error(field_name, format!("Invalid URL: {}", e));
            }
        }
    }

    /// Save configuration to a file, creating parent directories
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(path, contents).context("Failed to write config file")?;

        Ok(())
    }

    /// Get the path to the configuration file
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get config directory")?
            .join("neolight");

        Ok(config_dir.join("config.toml"))
    }
}
