use chrono::{DateTime, NaiveTime};
use chrono_tz::Tz;
use neolight_core::{NetworkError, ReqwestErrorExt};
use serde::{Deserialize, Serialize};

/// Success value of the provider's in-body `cod` field
pub const PROVIDER_OK: i64 = 200;

/// Normalized result of one current-weather lookup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeatherObservation {
    /// Lowercased provider condition group, e.g. "clear", "rain", "clouds"
    pub condition: String,
    /// Local sunrise for the configured timezone
    pub sunrise: NaiveTime,
    /// Local sunset, taken from the same response as `sunrise`
    pub sunset: NaiveTime,
}

/// `cod` arrives as a number on success and as a string ("404") on errors.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub(crate) enum ResponseCode {
    Number(i64),
    Text(String),
}

impl ResponseCode {
    pub(crate) fn is_ok(&self) -> bool {
        match self {
            Self::Number(n) => *n == PROVIDER_OK,
            Self::Text(s) => s.trim().parse::<i64>().ok() == Some(PROVIDER_OK),
        }
    }

    pub(crate) fn to_code_string(&self) -> String {
        match self {
            Self::Number(n) => n.to_string(),
            Self::Text(s) => s.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct CurrentWeatherResponse {
    pub cod: Option<ResponseCode>,
    pub message: Option<String>,
    #[serde(default)]
    pub weather: Vec<ConditionEntry>,
    pub sys: Option<SunTimes>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ConditionEntry {
    pub main: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SunTimes {
    pub sunrise: i64,
    pub sunset: i64,
}

impl CurrentWeatherResponse {
    /// Check the status code and derive the observation.
    pub(crate) fn into_observation(self, tz: Tz) -> Result<WeatherObservation, WeatherError> {
        match &self.cod {
            Some(code) if code.is_ok() => {}
            Some(code) => {
                return Err(WeatherError::Api {
                    code: code.to_code_string(),
                    message: self.message.unwrap_or_default(),
                })
            }
            None => return Err(WeatherError::Parse("response has no status code".into())),
        }

        let condition = self
            .weather
            .first()
            .map(|entry| entry.main.to_lowercase())
            .ok_or_else(|| WeatherError::Parse("response has no weather entry".into()))?;

        let sys = self
            .sys
            .ok_or_else(|| WeatherError::Parse("response has no sunrise/sunset".into()))?;

        Ok(WeatherObservation {
            condition,
            sunrise: local_time_of(sys.sunrise, tz)?,
            sunset: local_time_of(sys.sunset, tz)?,
        })
    }
}

/// Convert Unix epoch seconds to the wall-clock time in `tz`.
pub fn local_time_of(epoch_secs: i64, tz: Tz) -> Result<NaiveTime, WeatherError> {
    DateTime::from_timestamp(epoch_secs, 0)
        .map(|utc| utc.with_timezone(&tz).time())
        .ok_or_else(|| WeatherError::Parse(format!("timestamp out of range: {}", epoch_secs)))
}

/// Weather provider errors
#[derive(Debug, thiserror::Error)]
pub enum WeatherError {
    #[error("Network error: {0}")]
    Network(#[from] NetworkError),
    #[error("Provider returned status {code}: {message}")]
    Api { code: String, message: String },
    #[error("Parse error: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for WeatherError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network(err.into_network_error())
    }
}

impl WeatherError {
    /// Whether waiting for the next cycle is likely to help.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Network(e) => e.is_transient(),
            Self::Api { code, .. } => code
                .parse::<u16>()
                .map(|c| c == 429 || c >= 500)
                .unwrap_or(false),
            Self::Parse(_) => false,
        }
    }
}
