//! Open-Meteo forecast API client and response parser
//!
//! Open-Meteo serves MeteoSwiss ICON-CH1/CH2 output on pressure levels.
//! Units are pinned in the request and checked in the response; values
//! are passed through unconverted.

use std::collections::HashMap;
use std::time::Duration;

use reqwest::Url;
use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use super::{SoundingProvider, SoundingRequest};
use crate::config::ProviderConfig;
use crate::error::{ConfigError, FetchError, ParseError};
use crate::models::{Level, Sounding};

pub const PROVIDER_NAME: &str = "open-meteo";

/// Format of `hourly.time` entries with `timezone=GMT`
const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M";

const UNIT_TEMPERATURE: &str = "°C";
const UNIT_WIND_SPEED: &str = "km/h";
const UNIT_DIRECTION: &str = "°";
const UNIT_PRESSURE: &str = "hPa";
const UNIT_HEIGHT: &str = "m";

const SURFACE_PRESSURE: &str = "surface_pressure";
const SURFACE_TEMPERATURE: &str = "temperature_2m";
const SURFACE_DEW_POINT: &str = "dew_point_2m";
const SURFACE_WIND_SPEED: &str = "wind_speed_10m";
const SURFACE_WIND_DIRECTION: &str = "wind_direction_10m";

/// Blocking Open-Meteo client
pub struct OpenMeteoProvider {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl OpenMeteoProvider {
    /// Create a new client with a bounded per-request timeout
    pub fn new(config: &ProviderConfig) -> Result<Self, ConfigError> {
        let timeout = Duration::from_secs(u64::from(config.timeout_seconds));
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| ConfigError::invalid(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout,
        })
    }

    /// Full forecast URL for one request
    pub fn request_url(&self, request: &SoundingRequest) -> Result<Url, FetchError> {
        let time = request.valid_time.format(TIME_FORMAT).to_string();
        let params = [
            ("latitude", request.location.latitude.to_string()),
            ("longitude", request.location.longitude.to_string()),
            ("models", request.model.provider_id().to_string()),
            ("hourly", hourly_variables(request).join(",")),
            ("temperature_unit", "celsius".to_string()),
            ("wind_speed_unit", "kmh".to_string()),
            ("timezone", "GMT".to_string()),
            ("start_hour", time.clone()),
            ("end_hour", time),
        ];

        Url::parse_with_params(&format!("{}/forecast", self.base_url), &params)
            .map_err(|e| FetchError::Network(format!("Invalid provider URL: {e}")))
    }

    fn download(&self, url: Url) -> Result<String, FetchError> {
        let response = self.client.get(url).send().map_err(|e| {
            if e.is_timeout() {
                FetchError::Network(format!(
                    "request timed out after {}s",
                    self.timeout.as_secs()
                ))
            } else {
                FetchError::Network(format!("API request failed: {e}"))
            }
        })?;

        let status = response.status();
        let body = response
            .text()
            .map_err(|e| FetchError::Network(format!("Failed to read response body: {e}")))?;

        if !status.is_success() {
            return Err(status_error(status.as_u16(), &body));
        }
        Ok(body)
    }
}

impl SoundingProvider for OpenMeteoProvider {
    fn name(&self) -> &'static str {
        PROVIDER_NAME
    }

    fn fetch(&self, request: &SoundingRequest) -> Result<Sounding, FetchError> {
        let url = self.request_url(request)?;
        debug!(location = %request.location.name, %url, "Requesting sounding");

        let body = self.download(url)?;
        Ok(parse_response(&body, request)?)
    }
}

/// Map a non-success response to a [`FetchError::Status`], keeping the
/// provider's `reason` when the body is an Open-Meteo error object
#[must_use]
pub fn status_error(status: u16, body: &str) -> FetchError {
    #[derive(Deserialize)]
    struct ErrorBody {
        reason: String,
    }

    let reason = serde_json::from_str::<ErrorBody>(body)
        .map(|e| e.reason)
        .unwrap_or_else(|_| body.chars().take(200).collect());

    FetchError::Status { status, reason }
}

fn level_field(variable: &str, pressure: f64) -> String {
    format!("{variable}_{pressure}hPa")
}

/// Hourly variables requested for a sounding
#[must_use]
pub fn hourly_variables(request: &SoundingRequest) -> Vec<String> {
    let mut variables = Vec::new();
    if request.include_surface {
        variables.extend(
            [
                SURFACE_PRESSURE,
                SURFACE_TEMPERATURE,
                SURFACE_DEW_POINT,
                SURFACE_WIND_SPEED,
                SURFACE_WIND_DIRECTION,
            ]
            .map(String::from),
        );
    }
    for &pressure in &request.pressure_levels {
        for variable in [
            "temperature",
            "dew_point",
            "wind_speed",
            "wind_direction",
            "geopotential_height",
        ] {
            variables.push(level_field(variable, pressure));
        }
    }
    variables
}

/// Forecast response from `OpenMeteo`
#[derive(Debug, Deserialize)]
struct ForecastResponse {
    /// Model terrain height at the grid point
    elevation: Option<f64>,
    hourly_units: HashMap<String, String>,
    hourly: HashMap<String, Value>,
}

impl ForecastResponse {
    fn time_index(&self, time: &str) -> Result<usize, ParseError> {
        let times = self
            .hourly
            .get("time")
            .and_then(Value::as_array)
            .ok_or_else(|| ParseError::MissingField {
                field: "time".to_string(),
            })?;

        times
            .iter()
            .position(|t| t.as_str() == Some(time))
            .ok_or_else(|| ParseError::MissingTime {
                time: time.to_string(),
            })
    }

    /// Value of `field` at `index`; `None` for null
    fn value(&self, field: &str, unit: &'static str, index: usize) -> Result<Option<f64>, ParseError> {
        let series = self.hourly.get(field).ok_or_else(|| ParseError::MissingField {
            field: field.to_string(),
        })?;

        let found = self
            .hourly_units
            .get(field)
            .ok_or_else(|| ParseError::MissingField {
                field: format!("hourly_units.{field}"),
            })?;
        if found != unit {
            return Err(ParseError::UnexpectedUnit {
                field: field.to_string(),
                expected: unit,
                found: found.clone(),
            });
        }

        let values = series
            .as_array()
            .ok_or_else(|| ParseError::Malformed(format!("'{field}' is not an array")))?;

        match values.get(index) {
            None => Err(ParseError::Malformed(format!(
                "'{field}' has {} values, expected at least {}",
                values.len(),
                index + 1
            ))),
            Some(Value::Null) => Ok(None),
            Some(value) => value
                .as_f64()
                .map(Some)
                .ok_or_else(|| ParseError::Malformed(format!("'{field}' holds a non-numeric value"))),
        }
    }

    fn required(&self, field: &str, unit: &'static str, index: usize) -> Result<f64, ParseError> {
        self.value(field, unit, index)?
            .ok_or_else(|| ParseError::Malformed(format!("'{field}' is null")))
    }
}

/// Parse a forecast body into a validated sounding
pub fn parse_response(body: &str, request: &SoundingRequest) -> Result<Sounding, ParseError> {
    let response: ForecastResponse =
        serde_json::from_str(body).map_err(|e| ParseError::Malformed(e.to_string()))?;

    let time = request.valid_time.format(TIME_FORMAT).to_string();
    let index = response.time_index(&time)?;

    let mut levels = Vec::with_capacity(request.pressure_levels.len() + 1);

    if request.include_surface {
        let surface = Level {
            pressure: response.required(SURFACE_PRESSURE, UNIT_PRESSURE, index)?,
            temperature: response.required(SURFACE_TEMPERATURE, UNIT_TEMPERATURE, index)?,
            dew_point: response.required(SURFACE_DEW_POINT, UNIT_TEMPERATURE, index)?,
            wind_speed: response.required(SURFACE_WIND_SPEED, UNIT_WIND_SPEED, index)?,
            wind_direction: response.required(SURFACE_WIND_DIRECTION, UNIT_DIRECTION, index)?,
            height: response.elevation,
        };
        validate_wind(&surface, SURFACE_WIND_SPEED, SURFACE_WIND_DIRECTION)?;
        levels.push(surface);
    }
    let surface_pressure = levels.first().map(|l| l.pressure);

    for &pressure in &request.pressure_levels {
        let temperature =
            response.value(&level_field("temperature", pressure), UNIT_TEMPERATURE, index)?;
        let dew_point =
            response.value(&level_field("dew_point", pressure), UNIT_TEMPERATURE, index)?;
        let wind_speed =
            response.value(&level_field("wind_speed", pressure), UNIT_WIND_SPEED, index)?;
        let wind_direction =
            response.value(&level_field("wind_direction", pressure), UNIT_DIRECTION, index)?;
        let height =
            response.value(&level_field("geopotential_height", pressure), UNIT_HEIGHT, index)?;

        let level = match (temperature, dew_point, wind_speed, wind_direction, height) {
            (Some(temperature), Some(dew_point), Some(wind_speed), Some(wind_direction), height) => {
                Level {
                    pressure,
                    temperature,
                    dew_point,
                    wind_speed,
                    wind_direction,
                    height,
                }
            }
            (None, None, None, None, None) => {
                debug!(pressure, "Level below model terrain, skipping");
                continue;
            }
            _ => return Err(ParseError::IncompleteLevel { pressure }),
        };

        if surface_pressure.is_some_and(|surface| pressure >= surface) {
            debug!(pressure, "Level at or below the surface, skipping");
            continue;
        }

        validate_wind(
            &level,
            &level_field("wind_speed", pressure),
            &level_field("wind_direction", pressure),
        )?;
        levels.push(level);
    }

    Ok(Sounding::new(
        request.location.clone(),
        request.model,
        request.valid_time,
        levels,
    )?)
}

fn validate_wind(level: &Level, speed_field: &str, direction_field: &str) -> Result<(), ParseError> {
    if level.wind_speed < 0.0 {
        return Err(ParseError::InvalidValue {
            field: speed_field.to_string(),
            value: level.wind_speed,
        });
    }
    if !(0.0..=360.0).contains(&level.wind_direction) {
        return Err(ParseError::InvalidValue {
            field: direction_field.to_string(),
            value: level.wind_direction,
        });
    }
    Ok(())
}
