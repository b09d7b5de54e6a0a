//! Error types for the fetch and plot stages

use std::path::PathBuf;
use thiserror::Error;

/// Bad configuration or location source. Fatal at startup.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The location source could not be read
    #[error("Cannot read location source {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The location source is not a valid location list
    #[error("Malformed location source {path}: {message}")]
    Malformed { path: PathBuf, message: String },

    /// A location has a coordinate outside the valid range
    #[error("Location '{name}': {field} {value} is outside [{min}, {max}]")]
    OutOfRange {
        name: String,
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    /// Two locations share the same name
    #[error("Duplicate location name '{name}'")]
    DuplicateName { name: String },

    /// Two location names map to the same artifact file name
    #[error("Locations '{first}' and '{second}' share the file name '{slug}'")]
    SlugCollision {
        first: String,
        second: String,
        slug: String,
    },

    /// Application settings failed to load or validate
    #[error("Configuration error: {message}")]
    Invalid { message: String },
}

impl ConfigError {
    /// Create a new settings error
    pub fn invalid<S: Into<String>>(message: S) -> Self {
        Self::Invalid {
            message: message.into(),
        }
    }

    pub fn malformed<S: Into<String>>(path: impl Into<PathBuf>, message: S) -> Self {
        Self::Malformed {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Provider response does not match the expected structure
#[derive(Error, Debug, PartialEq)]
pub enum ParseError {
    #[error("Malformed response: {0}")]
    Malformed(String),

    #[error("Response has no '{field}' series")]
    MissingField { field: String },

    #[error("Response has no data for {time}")]
    MissingTime { time: String },

    #[error("'{field}' is reported in '{found}', expected '{expected}'")]
    UnexpectedUnit {
        field: String,
        expected: &'static str,
        found: String,
    },

    #[error("Level {pressure} hPa is only partially populated")]
    IncompleteLevel { pressure: f64 },

    #[error("'{field}' has invalid value {value}")]
    InvalidValue { field: String, value: f64 },

    #[error("Sounding has no levels above ground")]
    NoLevels,

    #[error("Pressure {pressure} hPa at level {index} is not positive")]
    NonPositivePressure { index: usize, pressure: f64 },

    #[error("Pressure is not strictly decreasing at level {index} ({previous} hPa -> {pressure} hPa)")]
    NonMonotonicPressure {
        index: usize,
        previous: f64,
        pressure: f64,
    },
}

/// Reading or writing a sounding artifact failed
#[derive(Error, Debug)]
pub enum ArtifactError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot encode artifact: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("Cannot decode artifact {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Written by an incompatible fetch stage
    #[error("Artifact {path} has schema '{schema}' v{version}, expected '{expected_schema}' v{expected_version}")]
    Incompatible {
        path: PathBuf,
        schema: String,
        version: u32,
        expected_schema: &'static str,
        expected_version: u32,
    },
}

impl ArtifactError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Failure fetching one location
#[derive(Error, Debug)]
pub enum FetchError {
    /// Transport failure, including timeouts
    #[error("Network error: {0}")]
    Network(String),

    /// Provider answered with a non-success status
    #[error("Provider returned HTTP {status}: {reason}")]
    Status { status: u16, reason: String },

    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Artifact error: {0}")]
    Artifact(#[from] ArtifactError),
}

impl FetchError {
    #[must_use]
    pub fn is_parse(&self) -> bool {
        matches!(self, Self::Parse(_))
    }
}

/// Failure plotting one sounding
#[derive(Error, Debug)]
pub enum PlotError {
    #[error("Sounding has {count} level(s), at least 2 are needed")]
    InsufficientLevels { count: usize },

    #[error("Pressure is not strictly decreasing at level {index}")]
    NonMonotonicPressure { index: usize },

    #[error("Pressure is not positive at level {index}")]
    NonPositivePressure { index: usize },

    #[error("Artifact error: {0}")]
    Artifact(#[from] ArtifactError),

    #[error("Rendering failed: {0}")]
    Render(String),
}

impl PlotError {
    pub fn render<E: std::fmt::Display>(err: E) -> Self {
        Self::Render(err.to_string())
    }
}
