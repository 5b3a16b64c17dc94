//! Current weather for the Neolight status updater.
//!
//! Talks to the OpenWeatherMap current-weather endpoint and normalizes the
//! response into a `WeatherObservation`.

pub mod provider;
pub mod types;

pub use provider::WeatherProvider;
pub use types::{local_time_of, WeatherError, WeatherObservation};
