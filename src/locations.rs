//! Location registry
//!
//! Loads the static list of named coordinates the pipeline runs for.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;
use tracing::info;

use crate::error::ConfigError;
use crate::models::Location;

/// Immutable, validated list of locations in declaration order
#[derive(Debug, Clone, PartialEq)]
pub struct LocationRegistry {
    locations: Vec<Location>,
}

impl LocationRegistry {
    /// Load and validate a JSON location list
    pub fn load<P: AsRef<Path>>(source: P) -> Result<Self, ConfigError> {
        let path = source.as_ref();
        info!("Loading locations from: {:?}", path);

        let content = fs::read_to_string(path).map_err(|e| ConfigError::Unreadable {
            path: path.to_path_buf(),
            source: e,
        })?;

        let registry = Self::parse(&content).map_err(|e| match e {
            ConfigError::Malformed { message, .. } => ConfigError::malformed(path, message),
            other => other,
        })?;

        info!("Loaded {} locations", registry.len());
        Ok(registry)
    }

    /// Parse location JSON content
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let locations: Vec<Location> = serde_json::from_str(content)
            .map_err(|e| ConfigError::malformed("<inline>", e.to_string()))?;

        Self::from_locations(locations)
    }

    /// Validate an already deserialized list
    pub fn from_locations(locations: Vec<Location>) -> Result<Self, ConfigError> {
        if locations.is_empty() {
            return Err(ConfigError::malformed(
                "<inline>",
                "location list is empty",
            ));
        }

        let mut seen = HashSet::new();
        // artifacts and plots are keyed by slug, so slugs must be unique too
        let mut slugs: HashMap<String, &str> = HashMap::new();
        for location in &locations {
            validate_location(location)?;
            if !seen.insert(location.name.as_str()) {
                return Err(ConfigError::DuplicateName {
                    name: location.name.clone(),
                });
            }
            let slug = location.slug();
            if let Some(first) = slugs.get(&slug) {
                return Err(ConfigError::SlugCollision {
                    first: (*first).to_string(),
                    second: location.name.clone(),
                    slug,
                });
            }
            slugs.insert(slug, location.name.as_str());
        }

        Ok(Self { locations })
    }

    #[must_use]
    pub fn locations(&self) -> &[Location] {
        &self.locations
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.locations.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Location> {
        self.locations.iter()
    }
}

fn validate_location(location: &Location) -> Result<(), ConfigError> {
    if location.name.trim().is_empty() {
        return Err(ConfigError::malformed("<inline>", "location name is empty"));
    }
    check_range(&location.name, "latitude", location.latitude, 90.0)?;
    check_range(&location.name, "longitude", location.longitude, 180.0)?;
    Ok(())
}

fn check_range(name: &str, field: &'static str, value: f64, limit: f64) -> Result<(), ConfigError> {
    if !(-limit..=limit).contains(&value) {
        return Err(ConfigError::OutOfRange {
            name: name.to_string(),
            field,
            value,
            min: -limit,
            max: limit,
        });
    }
    Ok(())
}
