//! Configuration management for the sounding pipeline
//!
//! Handles loading configuration from files and environment variables,
//! and validates every setting before a run starts.

use crate::error::ConfigError;
use crate::models::Model;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PipelineConfig {
    /// Location source settings
    #[serde(default)]
    pub locations: LocationsConfig,
    /// Weather-data provider settings
    #[serde(default)]
    pub provider: ProviderConfig,
    /// Fetch stage settings
    #[serde(default)]
    pub fetch: FetchConfig,
    /// Plot stage settings
    #[serde(default)]
    pub plot: PlotConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Where the location list lives
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationsConfig {
    #[serde(default = "default_locations_path")]
    pub path: PathBuf,
}

/// Weather API configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Base URL for the Open-Meteo API
    #[serde(default = "default_provider_base_url")]
    pub base_url: String,
    /// Request timeout in seconds
    #[serde(default = "default_provider_timeout")]
    pub timeout_seconds: u32,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

/// Fetch stage settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    #[serde(default)]
    pub model: Model,
    /// Directory sounding artifacts are written to
    #[serde(default = "default_artifact_dir")]
    pub artifact_dir: PathBuf,
    /// Requested pressure levels in hPa, surface first
    #[serde(default = "default_pressure_levels")]
    pub pressure_levels: Vec<f64>,
    /// Prepend the 2 m / 10 m surface values as the lowest level
    #[serde(default = "default_true")]
    pub include_surface: bool,
    /// Forecast hours ahead of the current hour
    #[serde(default)]
    pub lead_hours: u32,
    /// Delete artifacts older than this many days after a run
    #[serde(default)]
    pub retention_days: Option<u32>,
}

/// Plot stage settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlotConfig {
    /// Directory images are written to
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    /// Isotherm skew in °C per e-fold of pressure
    #[serde(default = "default_skew")]
    pub skew: f64,
    /// Pressure at the bottom edge of the diagram in hPa
    #[serde(default = "default_bottom_pressure")]
    pub bottom_pressure: f64,
    /// Pressure at the top edge of the diagram in hPa
    #[serde(default = "default_top_pressure")]
    pub top_pressure: f64,
    /// TrueType font for labels; system fonts are tried when unset
    #[serde(default)]
    pub font_path: Option<PathBuf>,
    /// Delete images older than this many days after a run
    #[serde(default)]
    pub retention_days: Option<u32>,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (pretty or json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default value functions
fn default_locations_path() -> PathBuf {
    PathBuf::from("locations.json")
}

fn default_provider_base_url() -> String {
    "https://api.open-meteo.com/v1".to_string()
}

fn default_provider_timeout() -> u32 {
    30
}

fn default_user_agent() -> String {
    format!("icon-skewt/{}", crate::VERSION)
}

fn default_artifact_dir() -> PathBuf {
    PathBuf::from("soundings")
}

fn default_pressure_levels() -> Vec<f64> {
    vec![
        1000.0, 975.0, 950.0, 925.0, 900.0, 850.0, 800.0, 700.0, 600.0, 500.0, 400.0, 300.0,
        250.0, 200.0, 150.0, 100.0,
    ]
}

fn default_true() -> bool {
    true
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("plots")
}

fn default_width() -> u32 {
    1200
}

fn default_height() -> u32 {
    900
}

fn default_skew() -> f64 {
    35.0
}

fn default_bottom_pressure() -> f64 {
    1050.0
}

fn default_top_pressure() -> f64 {
    100.0
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LocationsConfig {
    fn default() -> Self {
        Self {
            path: default_locations_path(),
        }
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: default_provider_base_url(),
            timeout_seconds: default_provider_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            model: Model::default(),
            artifact_dir: default_artifact_dir(),
            pressure_levels: default_pressure_levels(),
            include_surface: true,
            lead_hours: 0,
            retention_days: None,
        }
    }
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            width: default_width(),
            height: default_height(),
            skew: default_skew(),
            bottom_pressure: default_bottom_pressure(),
            top_pressure: default_top_pressure(),
            font_path: None,
            retention_days: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

/// File name looked up in the working directory
pub const LOCAL_CONFIG_FILE: &str = "icon-skewt.toml";

/// Prefix of environment overrides, e.g. `ICON_SKEWT_PROVIDER__TIMEOUT_SECONDS`
pub const ENV_PREFIX: &str = "ICON_SKEWT";

impl PipelineConfig {
    /// Load configuration from the default file locations and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_path(None)
    }

    /// Load configuration from specified path.
    ///
    /// An explicitly given file must exist; the default locations are optional.
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        match config_path {
            Some(path) => {
                if !path.exists() {
                    return Err(ConfigError::invalid(format!(
                        "Config file {} does not exist",
                        path.display()
                    )));
                }
                builder = builder.add_source(
                    File::from(path)
                        .required(true)
                        .format(config::FileFormat::Toml),
                );
            }
            None => {
                if let Some(path) = Self::find_default_config() {
                    builder = builder.add_source(
                        File::from(path)
                            .required(false)
                            .format(config::FileFormat::Toml),
                    );
                }
            }
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .map_err(|e| ConfigError::invalid(format!("Failed to build configuration: {e}")))?;

        let config: PipelineConfig = settings
            .try_deserialize()
            .map_err(|e| ConfigError::invalid(format!("Failed to deserialize configuration: {e}")))?;

        config.validate()?;

        Ok(config)
    }

    /// First existing default config file: working directory, then user config dir
    #[must_use]
    pub fn find_default_config() -> Option<PathBuf> {
        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.exists() {
            return Some(local);
        }
        Self::get_config_path().filter(|path| path.exists())
    }

    /// Get the per-user configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("icon-skewt").join("config.toml"))
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_provider()?;
        self.validate_fetch()?;
        self.validate_plot()?;
        self.validate_logging()?;
        Ok(())
    }

    fn validate_provider(&self) -> Result<(), ConfigError> {
        if self.provider.timeout_seconds == 0 || self.provider.timeout_seconds > 300 {
            return Err(ConfigError::invalid(
                "Provider timeout must be between 1 and 300 seconds",
            ));
        }

        if !self.provider.base_url.starts_with("http://")
            && !self.provider.base_url.starts_with("https://")
        {
            return Err(ConfigError::invalid(
                "Provider base URL must be a valid HTTP or HTTPS URL",
            ));
        }

        Ok(())
    }

    fn validate_fetch(&self) -> Result<(), ConfigError> {
        let levels = &self.fetch.pressure_levels;
        if levels.is_empty() {
            return Err(ConfigError::invalid("At least one pressure level is required"));
        }
        if levels.iter().any(|p| !(*p > 0.0)) {
            return Err(ConfigError::invalid("Pressure levels must be positive"));
        }
        if levels.windows(2).any(|pair| pair[1] >= pair[0]) {
            return Err(ConfigError::invalid(
                "Pressure levels must be listed surface first, strictly decreasing",
            ));
        }

        if self.fetch.lead_hours > 120 {
            return Err(ConfigError::invalid("Lead time cannot exceed 120 hours"));
        }

        Ok(())
    }

    fn validate_plot(&self) -> Result<(), ConfigError> {
        let plot = &self.plot;
        if plot.width < 400 || plot.height < 300 {
            return Err(ConfigError::invalid("Plot size must be at least 400x300 pixels"));
        }
        if !(plot.top_pressure > 0.0) || plot.bottom_pressure <= plot.top_pressure {
            return Err(ConfigError::invalid(
                "Plot pressure range must satisfy bottom_pressure > top_pressure > 0",
            ));
        }
        if !(plot.skew > 0.0) {
            return Err(ConfigError::invalid("Plot skew must be positive"));
        }
        Ok(())
    }

    fn validate_logging(&self) -> Result<(), ConfigError> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(ConfigError::invalid(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            )));
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(ConfigError::invalid(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            )));
        }

        Ok(())
    }
}
