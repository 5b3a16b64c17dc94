//! OpenWeatherMap current-weather client.

use crate::types::{CurrentWeatherResponse, WeatherError, WeatherObservation};
use chrono_tz::Tz;
use neolight_core::{NetworkError, WeatherConfig};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tracing::instrument;

const USER_AGENT: &str = concat!("neolight/", env!("CARGO_PKG_VERSION"));
/// Longest slice of an unparsable body kept in error messages
const BODY_EXCERPT_LEN: usize = 200;

#[derive(Debug, Clone)]
pub struct WeatherProvider {
    client: Arc<Client>,
    endpoint: String,
    location: String,
    api_key: String,
    units: String,
    tz: Tz,
}

impl WeatherProvider {
    pub fn new(config: &WeatherConfig, tz: Tz) -> Result<Self, WeatherError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client: Arc::new(client),
            endpoint: format!("{}/weather", config.base_url.trim_end_matches('/')),
            location: format!("{},{}", config.city, config.country),
            api_key: config.api_key.clone(),
            units: config.units.clone(),
            tz,
        })
    }

    /// "City,CC" as sent to the provider.
    pub fn location(&self) -> &str {
        &self.location
    }

    /// Fetch current conditions for the configured location.
    ///
    /// The provider reports failures in the body, so the body is parsed
    /// whatever the HTTP status.
    #[instrument(skip(self), fields(location = %self.location), level = "debug")]
    pub async fn fetch(&self) -> Result<WeatherObservation, WeatherError> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("q", self.location.as_str()),
                ("appid", self.api_key.as_str()),
                ("units", self.units.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        let parsed: CurrentWeatherResponse = match serde_json::from_str(&body) {
            Ok(parsed) => parsed,
            Err(_) if !status.is_success() => {
                return Err(NetworkError::ServerError {
                    status: status.as_u16(),
                    message: excerpt(&body),
                }
                .into());
            }
            Err(e) => {
                tracing::debug!("Unparsable weather body: {}", excerpt(&body));
                return Err(WeatherError::Parse(e.to_string()));
            }
        };

        let observation = parsed.into_observation(self.tz)?;
        tracing::debug!(
            "Weather for {}: {} (sunrise {}, sunset {})",
            self.location,
            observation.condition,
            observation.sunrise,
            observation.sunset
        );
        Ok(observation)
    }
}

fn excerpt(body: &str) -> String {
    body.chars().take(BODY_EXCERPT_LEN).collect()
}
