//! Weather-data provider seam
//!
//! The fetch stage talks to a [`SoundingProvider`]; the production
//! implementation is the Open-Meteo client in [`open_meteo`].

use chrono::{DateTime, Utc};

use crate::config::FetchConfig;
use crate::error::FetchError;
use crate::models::{Location, Model, Sounding};

pub mod open_meteo;

pub use open_meteo::OpenMeteoProvider;

/// Everything a provider needs to produce one sounding
#[derive(Debug, Clone, PartialEq)]
pub struct SoundingRequest {
    pub location: Location,
    pub model: Model,
    /// Valid time of the requested profile, on the hour
    pub valid_time: DateTime<Utc>,
    /// Pressure levels in hPa, surface first
    pub pressure_levels: Vec<f64>,
    pub include_surface: bool,
}

impl SoundingRequest {
    #[must_use]
    pub fn new(location: Location, config: &FetchConfig, model: Model, valid_time: DateTime<Utc>) -> Self {
        Self {
            location,
            model,
            valid_time,
            pressure_levels: config.pressure_levels.clone(),
            include_surface: config.include_surface,
        }
    }
}

/// A source of model soundings. One call, one attempt.
pub trait SoundingProvider {
    /// Short provider name recorded in artifacts
    fn name(&self) -> &'static str;

    fn fetch(&self, request: &SoundingRequest) -> Result<Sounding, FetchError>;
}
