use chrono::{DateTime, TimeZone};
use neolight_weather::WeatherObservation;
use serde::{Deserialize, Serialize};

use crate::document_store::Document;

/// `DD-MM-YYYY`
pub const DATE_FORMAT: &str = "%d-%m-%Y";
/// `HH:MM:SS`, used for the clock and for sunrise/sunset
pub const TIME_FORMAT: &str = "%H:%M:%S";

/// Latest known weather and clock state for one named device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusRecord {
    pub name: String,
    pub date: String,
    pub time: String,
    pub weather: String,
    pub sunrise: String,
    pub sunset: String,
}

impl StatusRecord {
    /// Combine the local clock reading with one observation.
    pub fn new<Tz: TimeZone>(name: &str, now: &DateTime<Tz>, observation: &WeatherObservation) -> Self
    where
        Tz::Offset: std::fmt::Display,
    {
        Self {
            name: name.to_string(),
            date: now.format(DATE_FORMAT).to_string(),
            time: now.format(TIME_FORMAT).to_string(),
            weather: observation.condition.clone(),
            sunrise: observation.sunrise.format(TIME_FORMAT).to_string(),
            sunset: observation.sunset.format(TIME_FORMAT).to_string(),
        }
    }

    /// All six fields, ready for a `$set` upsert.
    pub fn to_fields(&self) -> Document {
        let mut fields = Document::new();
        for (key, value) in [
            ("name", &self.name),
            ("date", &self.date),
            ("time", &self.time),
            ("weather", &self.weather),
            ("sunrise", &self.sunrise),
            ("sunset", &self.sunset),
        ] {
            fields.insert(key.to_string(), serde_json::Value::String(value.clone()));
        }
        fields
    }
}
