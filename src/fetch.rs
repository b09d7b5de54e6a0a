//! Fetch stage
//!
//! Requests one sounding per configured location, writes each as an
//! artifact and collects a per-location outcome. A failing location is
//! logged and the run moves on.

use std::path::PathBuf;

use chrono::{DateTime, DurationRound, TimeDelta, Timelike, Utc};
use tracing::{debug, info};

use crate::artifact::{SOUNDING_EXTENSION, SoundingArtifact};
use crate::config::FetchConfig;
use crate::error::FetchError;
use crate::locations::LocationRegistry;
use crate::models::{Location, Model, Sounding};
use crate::report::RunReport;
use crate::retention;
use crate::weather::{SoundingProvider, SoundingRequest};

/// A fetched sounding and the artifact it was written to
#[derive(Debug, Clone)]
pub struct FetchedSounding {
    pub sounding: Sounding,
    pub path: PathBuf,
}

pub type FetchReport = RunReport<FetchedSounding, FetchError>;

/// Valid time targeted by a run: the current hour plus the lead time
#[must_use]
pub fn target_valid_time(now: DateTime<Utc>, lead_hours: u32) -> DateTime<Utc> {
    let hour = now.duration_trunc(TimeDelta::hours(1)).unwrap_or(now);
    hour + TimeDelta::hours(i64::from(lead_hours))
}

/// Parse a requested valid time. The model output is hourly, so the time
/// must fall on the hour.
pub fn parse_valid_time(value: &str) -> Result<DateTime<Utc>, String> {
    let time = DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| format!("expected an RFC 3339 time like 2026-10-18T06:00:00Z: {e}"))?;
    if time.minute() != 0 || time.second() != 0 || time.nanosecond() != 0 {
        return Err(format!(
            "{value} is not on the hour, soundings are hourly (e.g. {})",
            time.format("%Y-%m-%dT%H:00:00Z")
        ));
    }
    Ok(time)
}

/// Whole hours from the hour of `now` to `valid_time`, negative for a
/// valid time in the past
#[must_use]
pub fn lead_hours(now: DateTime<Utc>, valid_time: DateTime<Utc>) -> i64 {
    (valid_time - target_valid_time(now, 0)).num_hours()
}

/// Fetches soundings through a provider and persists them
pub struct DataFetcher<P> {
    provider: P,
    config: FetchConfig,
}

impl<P: SoundingProvider> DataFetcher<P> {
    #[must_use]
    pub fn new(provider: P, config: FetchConfig) -> Self {
        Self { provider, config }
    }

    #[must_use]
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// Fetch one location and write its artifact, replacing an earlier
    /// artifact for the same location and valid time
    pub fn fetch(
        &self,
        location: &Location,
        model: Model,
        valid_time: DateTime<Utc>,
    ) -> Result<FetchedSounding, FetchError> {
        debug!(
            location = %location.name,
            coordinates = %location.format_coordinates(),
            "Requesting sounding"
        );
        let request = SoundingRequest::new(location.clone(), &self.config, model, valid_time);
        let sounding = self.provider.fetch(&request)?;

        let mut artifact = SoundingArtifact::new(sounding, self.provider.name());
        artifact.lead_hours = Some(lead_hours(artifact.fetched_at, valid_time));
        let path = artifact.write(&self.config.artifact_dir)?;

        info!(
            location = %location.name,
            levels = artifact.sounding.levels.len(),
            path = %path.display(),
            "Fetched sounding"
        );

        Ok(FetchedSounding {
            sounding: artifact.sounding,
            path,
        })
    }

    /// Fetch every location in order, one attempt each
    pub fn run(&self, registry: &LocationRegistry, model: Model, valid_time: DateTime<Utc>) -> FetchReport {
        info!(
            "Fetching {} for {} locations, valid {}",
            model,
            registry.len(),
            valid_time.format("%Y-%m-%d %H:%M UTC")
        );

        let mut report = FetchReport::new("fetch");
        for location in registry.iter() {
            report.record(location.name.clone(), self.fetch(location, model, valid_time));
        }

        if let Some(days) = self.config.retention_days {
            retention::prune(&self.config.artifact_dir, SOUNDING_EXTENSION, days, Utc::now());
        }

        report
    }
}
