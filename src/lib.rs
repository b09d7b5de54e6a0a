//! `icon-skewt` - ICON-CH1 soundings and Skew-T log-P diagrams
//!
//! The library has two stages coupled only through files on disk: the
//! fetch stage downloads a vertical profile per configured location and
//! writes it as a versioned artifact, the plot stage renders every
//! artifact as a PNG diagram.

pub mod artifact;
pub mod config;
pub mod error;
pub mod fetch;
pub mod locations;
pub mod logging;
pub mod models;
pub mod plot;
pub mod report;
pub mod retention;
pub mod weather;

// Re-export core types for public API
pub use artifact::SoundingArtifact;
pub use config::PipelineConfig;
pub use error::{ArtifactError, ConfigError, FetchError, ParseError, PlotError};
pub use fetch::{DataFetcher, FetchReport, FetchedSounding};
pub use locations::LocationRegistry;
pub use models::{Level, Location, Model, Sounding};
pub use plot::{PlotArtifact, PlotReport, SkewTPlotter};
pub use report::RunReport;
pub use weather::{OpenMeteoProvider, SoundingProvider, SoundingRequest};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
