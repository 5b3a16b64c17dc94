//! Fixed-interval weather polling.
//!
//! Every cycle stamps the local date/time, fetches the current weather and
//! upserts the status document. Failures are logged and absorbed; the next
//! cycle starts after the interval regardless of how the previous one ended.

use std::future::Future;
use std::time::Duration;

use chrono_tz::Tz;
use neolight_core::{ConfigError, DatabaseError, UpdaterConfig};
use neolight_weather::{WeatherError, WeatherObservation, WeatherProvider};
use tokio_util::sync::CancellationToken;

use crate::clock::{Clock, SystemClock};
use crate::document_client::DocumentClient;
use crate::status::StatusRecord;

/// Where observations come from.
pub trait ObservationSource: Send + Sync {
    fn fetch(&self) -> impl Future<Output = Result<WeatherObservation, WeatherError>> + Send;
}

impl ObservationSource for WeatherProvider {
    async fn fetch(&self) -> Result<WeatherObservation, WeatherError> {
        WeatherProvider::fetch(self).await
    }
}

/// Where status records go.
pub trait StatusSink: Send + Sync {
    fn write_status(
        &self,
        record: &StatusRecord,
    ) -> impl Future<Output = Result<(), DatabaseError>> + Send;
}

impl StatusSink for DocumentClient {
    async fn write_status(&self, record: &StatusRecord) -> Result<(), DatabaseError> {
        self.set_fields(&record.name, record.to_fields()).await.map(|_| ())
    }
}

/// How a single cycle ended.
#[derive(Debug)]
pub enum CycleOutcome {
    Updated(StatusRecord),
    /// The write was skipped.
    FetchFailed(WeatherError),
    WriteFailed(DatabaseError),
}

impl CycleOutcome {
    pub fn is_updated(&self) -> bool {
        matches!(self, Self::Updated(_))
    }
}

/// Tally of cycle outcomes for one `run`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopStats {
    pub cycles: u64,
    pub updates: u64,
    pub fetch_failures: u64,
    pub write_failures: u64,
}

impl LoopStats {
    fn record(&mut self, outcome: &CycleOutcome) {
        self.cycles += 1;
        match outcome {
            CycleOutcome::Updated(_) => self.updates += 1,
            CycleOutcome::FetchFailed(_) => self.fetch_failures += 1,
            CycleOutcome::WriteFailed(_) => self.write_failures += 1,
        }
    }
}

pub struct UpdateLoop<S, W, C = SystemClock> {
    source: S,
    sink: W,
    clock: C,
    record_name: String,
    tz: Tz,
    interval: Duration,
}

impl<S: ObservationSource, W: StatusSink> UpdateLoop<S, W, SystemClock> {
    pub fn new(source: S, sink: W, config: &UpdaterConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            source,
            sink,
            clock: SystemClock,
            record_name: config.record_name.clone(),
            tz: config.tz()?,
            interval: Duration::from_secs(config.interval_secs),
        })
    }
}

impl<S: ObservationSource, W: StatusSink, C: Clock> UpdateLoop<S, W, C> {
    pub fn with_clock<C2: Clock>(self, clock: C2) -> UpdateLoop<S, W, C2> {
        UpdateLoop {
            source: self.source,
            sink: self.sink,
            clock,
            record_name: self.record_name,
            tz: self.tz,
            interval: self.interval,
        }
    }

    /// Fetch once and, if that worked, write once.
    pub async fn run_cycle(&self) -> CycleOutcome {
        let now = self.clock.now().with_timezone(&self.tz);

        let observation = match self.source.fetch().await {
            Ok(observation) => observation,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    transient = e.is_transient(),
                    "Skipping update due to weather fetch error"
                );
                return CycleOutcome::FetchFailed(e);
            }
        };

        let record = StatusRecord::new(&self.record_name, &now, &observation);

        match self.sink.write_status(&record).await {
            Ok(()) => {
                tracing::info!(
                    "Updated '{}' at {} {}: weather={}, sunrise={}, sunset={}",
                    record.name,
                    record.date,
                    record.time,
                    record.weather,
                    record.sunrise,
                    record.sunset
                );
                CycleOutcome::Updated(record)
            }
            Err(e) => {
                tracing::error!(
                    error = %e,
                    transient = e.is_transient(),
                    "Failed to write status for '{}'",
                    record.name
                );
                CycleOutcome::WriteFailed(e)
            }
        }
    }

    /// Run cycles until `shutdown` fires.
    ///
    /// A cycle in progress always completes; cancellation is observed before
    /// a cycle starts and during the sleep.
    pub async fn run(&self, shutdown: CancellationToken) -> LoopStats {
        let mut stats = LoopStats::default();
        tracing::info!(
            "Updating '{}' every {}s",
            self.record_name,
            self.interval.as_secs()
        );

        while !shutdown.is_cancelled() {
            let outcome = self.run_cycle().await;
            stats.record(&outcome);

            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = tokio::time::sleep(self.interval) => {}
            }
        }

        tracing::info!(
            "Update loop stopped after {} cycles ({} updates, {} fetch failures, {} write failures)",
            stats.cycles,
            stats.updates,
            stats.fetch_failures,
            stats.write_failures
        );
        stats
    }
}
