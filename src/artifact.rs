//! On-disk sounding artifacts
//!
//! The only coupling between the fetch and plot stages. Artifacts are
//! self-describing JSON documents carrying a schema name and version so
//! the plot stage can reject files from an incompatible fetch stage.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::error::ArtifactError;
use crate::models::location::slugify;
use crate::models::sounding::{TIME_TAG_FORMAT, time_tag};
use crate::models::Sounding;

pub const SCHEMA: &str = "icon-skewt.sounding";
pub const SCHEMA_VERSION: u32 = 1;

/// Extension of sounding artifacts
pub const SOUNDING_EXTENSION: &str = "sounding";
/// Extension of rendered plots
pub const PLOT_EXTENSION: &str = "png";

/// Units of every level field, recorded in each artifact
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Units {
    pub pressure: String,
    pub temperature: String,
    pub dew_point: String,
    pub wind_speed: String,
    pub wind_direction: String,
    pub height: String,
}

impl Default for Units {
    fn default() -> Self {
        Self {
            pressure: "hPa".to_string(),
            temperature: "°C".to_string(),
            dew_point: "°C".to_string(),
            wind_speed: "km/h".to_string(),
            wind_direction: "°".to_string(),
            height: "m".to_string(),
        }
    }
}

/// Versioned artifact document
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SoundingArtifact {
    pub schema: String,
    pub version: u32,
    /// Provider the sounding came from
    pub provider: String,
    pub fetched_at: DateTime<Utc>,
    /// Hours from the hour of the fetch to the valid time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lead_hours: Option<i64>,
    pub units: Units,
    pub sounding: Sounding,
}

#[derive(Deserialize)]
struct Header {
    schema: String,
    version: u32,
}

impl SoundingArtifact {
    #[must_use]
    pub fn new(sounding: Sounding, provider: &str) -> Self {
        Self {
            schema: SCHEMA.to_string(),
            version: SCHEMA_VERSION,
            provider: provider.to_string(),
            fetched_at: Utc::now(),
            lead_hours: None,
            units: Units::default(),
            sounding,
        }
    }

    /// Serialize into `dir`, atomically replacing an existing artifact
    /// for the same location and timestamp
    pub fn write(&self, dir: &Path) -> Result<PathBuf, ArtifactError> {
        fs::create_dir_all(dir).map_err(|e| ArtifactError::io(dir, e))?;
        let path = dir.join(file_name(
            &self.sounding.location.name,
            &self.sounding.timestamp,
            SOUNDING_EXTENSION,
        ));

        let bytes = serde_json::to_vec_pretty(self).map_err(ArtifactError::Encode)?;

        let mut temp = NamedTempFile::new_in(dir).map_err(|e| ArtifactError::io(dir, e))?;
        temp.write_all(&bytes)
            .map_err(|e| ArtifactError::io(temp.path(), e))?;
        temp.persist(&path)
            .map_err(|e| ArtifactError::io(&path, e.error))?;

        debug!(path = %path.display(), "Wrote sounding artifact");
        Ok(path)
    }

    /// Read an artifact, checking schema and version before the body
    pub fn read(path: &Path) -> Result<Self, ArtifactError> {
        let bytes = fs::read(path).map_err(|e| ArtifactError::io(path, e))?;

        let header: Header = serde_json::from_slice(&bytes).map_err(|e| ArtifactError::Decode {
            path: path.to_path_buf(),
            source: e,
        })?;
        if header.schema != SCHEMA || header.version != SCHEMA_VERSION {
            return Err(ArtifactError::Incompatible {
                path: path.to_path_buf(),
                schema: header.schema,
                version: header.version,
                expected_schema: SCHEMA,
                expected_version: SCHEMA_VERSION,
            });
        }

        serde_json::from_slice(&bytes).map_err(|e| ArtifactError::Decode {
            path: path.to_path_buf(),
            source: e,
        })
    }
}

/// `<slug>_<YYYYMMDD_HHMM>.<extension>`
#[must_use]
pub fn file_name(location_name: &str, timestamp: &DateTime<Utc>, extension: &str) -> String {
    format!("{}_{}.{}", slugify(location_name), time_tag(timestamp), extension)
}

/// Recover the timestamp encoded in a file name written by [`file_name`]
#[must_use]
pub fn timestamp_from_file_name(path: &Path, extension: &str) -> Option<DateTime<Utc>> {
    if path.extension()?.to_str()? != extension {
        return None;
    }
    let stem = path.file_stem()?.to_str()?;
    // tag is the last 13 characters: YYYYMMDD_HHMM
    let split = stem.len().checked_sub(13)?;
    if split == 0 || !stem.is_char_boundary(split) || stem.as_bytes()[split - 1] != b'_' {
        return None;
    }
    NaiveDateTime::parse_from_str(&stem[split..], TIME_TAG_FORMAT)
        .ok()
        .map(|dt| dt.and_utc())
}

/// All files with `extension` directly inside `dir`, sorted by name
pub fn list_files(dir: &Path, extension: &str) -> Result<Vec<PathBuf>, ArtifactError> {
    if !dir.exists() {
        warn!(dir = %dir.display(), "Directory does not exist");
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(|e| ArtifactError::io(dir, e))? {
        let entry = entry.map_err(|e| ArtifactError::io(dir, e))?;
        let path = entry.path();
        if path.is_file() && path.extension().and_then(|e| e.to_str()) == Some(extension) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}
