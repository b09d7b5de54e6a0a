//! Sounding model: a vertical atmospheric profile

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Location;
use crate::error::ParseError;

/// Numerical weather prediction model a sounding is taken from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Model {
    #[default]
    #[serde(rename = "ICON-CH1")]
    IconCh1,
    #[serde(rename = "ICON-CH2")]
    IconCh2,
}

impl Model {
    /// Identifier of the model on the Open-Meteo API
    #[must_use]
    pub fn provider_id(self) -> &'static str {
        match self {
            Model::IconCh1 => "meteoswiss_icon_ch1",
            Model::IconCh2 => "meteoswiss_icon_ch2",
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Model::IconCh1 => "ICON-CH1",
            Model::IconCh2 => "ICON-CH2",
        }
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Model {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().replace('_', "-").as_str() {
            "ICON-CH1" => Ok(Model::IconCh1),
            "ICON-CH2" => Ok(Model::IconCh2),
            other => Err(format!(
                "Unknown model '{other}'. Must be one of: ICON-CH1, ICON-CH2"
            )),
        }
    }
}

/// One level of a sounding, in provider units
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Level {
    /// Pressure in hPa
    pub pressure: f64,
    /// Temperature in °C
    pub temperature: f64,
    /// Dew point in °C
    pub dew_point: f64,
    /// Wind speed in km/h
    pub wind_speed: f64,
    /// Direction the wind blows from, degrees clockwise from north
    pub wind_direction: f64,
    /// Geopotential height in m above sea level
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
}

/// Vertical profile at one location and valid time.
///
/// Levels run from the surface upwards, so pressure is strictly decreasing.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Sounding {
    pub location: Location,
    pub model: Model,
    /// Valid time of the profile
    pub timestamp: DateTime<Utc>,
    pub levels: Vec<Level>,
}

impl Sounding {
    /// Build a sounding, rejecting empty or misordered profiles
    pub fn new(
        location: Location,
        model: Model,
        timestamp: DateTime<Utc>,
        levels: Vec<Level>,
    ) -> Result<Self, ParseError> {
        if levels.is_empty() {
            return Err(ParseError::NoLevels);
        }
        check_pressure_order(&levels)?;

        Ok(Self {
            location,
            model,
            timestamp,
            levels,
        })
    }

    /// Run tag used in file names, e.g. `20261018_0600`
    #[must_use]
    pub fn time_tag(&self) -> String {
        time_tag(&self.timestamp)
    }

    /// Pressure of the lowest level
    #[must_use]
    pub fn surface_pressure(&self) -> Option<f64> {
        self.levels.first().map(|l| l.pressure)
    }
}

/// Format used for run tags in file names
pub const TIME_TAG_FORMAT: &str = "%Y%m%d_%H%M";

#[must_use]
pub fn time_tag(timestamp: &DateTime<Utc>) -> String {
    timestamp.format(TIME_TAG_FORMAT).to_string()
}

/// Check that pressures are positive and strictly decreasing
pub fn check_pressure_order(levels: &[Level]) -> Result<(), ParseError> {
    let mut previous: Option<f64> = None;
    for (index, level) in levels.iter().enumerate() {
        let pressure = level.pressure;
        // NaN fails this too
        if !(pressure > 0.0) {
            return Err(ParseError::NonPositivePressure { index, pressure });
        }
        if let Some(previous) = previous {
            if pressure >= previous {
                return Err(ParseError::NonMonotonicPressure {
                    index,
                    previous,
                    pressure,
                });
            }
        }
        previous = Some(pressure);
    }
    Ok(())
}
