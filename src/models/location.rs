//! Location model for geographic coordinates

use serde::{Deserialize, Serialize};

/// A named point a sounding is fetched for
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Location {
    /// Display name, unique within the registry
    pub name: String,
    /// Latitude in decimal degrees
    pub latitude: f64,
    /// Longitude in decimal degrees
    pub longitude: f64,
}

impl Location {
    /// Create a new location
    #[must_use]
    pub fn new(name: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            name: name.into(),
            latitude,
            longitude,
        }
    }

    /// Format location as coordinates string
    #[must_use]
    pub fn format_coordinates(&self) -> String {
        format!("{:.4}, {:.4}", self.latitude, self.longitude)
    }

    /// Filesystem-safe, lowercase form of the name used in artifact file names
    #[must_use]
    pub fn slug(&self) -> String {
        slugify(&self.name)
    }
}

/// Transliterates umlauts, keeps `[A-Za-z0-9_-]`, maps whitespace to `_`.
#[must_use]
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.trim().chars() {
        match c {
            'ä' | 'Ä' => slug.push_str("ae"),
            'ö' | 'Ö' => slug.push_str("oe"),
            'ü' | 'Ü' => slug.push_str("ue"),
            'ß' => slug.push_str("ss"),
            c if c.is_ascii_alphanumeric() || c == '-' || c == '_' => {
                slug.push(c.to_ascii_lowercase());
            }
            c if c.is_whitespace() => slug.push('_'),
            _ => {}
        }
    }

    if slug.is_empty() {
        "unnamed".to_string()
    } else {
        slug
    }
}
