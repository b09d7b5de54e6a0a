//! Plot stage: Skew-T log-P diagrams from sounding artifacts
//!
//! Reads the artifacts written by the fetch stage, renders one PNG per
//! sounding and reports an outcome per location.

pub mod barbs;
pub mod font;
pub mod render;
pub mod skew;
pub mod thermo;

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::artifact::{PLOT_EXTENSION, SOUNDING_EXTENSION, SoundingArtifact, file_name, list_files};
use crate::config::PlotConfig;
use crate::error::{ArtifactError, ParseError, PlotError};
use crate::models::Sounding;
use crate::models::sounding::check_pressure_order;
use crate::report::RunReport;
use crate::retention;

/// A rendered diagram
#[derive(Debug, Clone, PartialEq)]
pub struct PlotArtifact {
    pub location: String,
    /// Valid time of the plotted sounding
    pub timestamp: DateTime<Utc>,
    pub path: PathBuf,
}

pub type PlotReport = RunReport<PlotArtifact, PlotError>;

/// Check that a sounding can be drawn
pub fn validate(sounding: &Sounding) -> Result<(), PlotError> {
    let count = sounding.levels.len();
    if count < 2 {
        return Err(PlotError::InsufficientLevels { count });
    }
    check_pressure_order(&sounding.levels).map_err(|e| match e {
        ParseError::NonPositivePressure { index, .. } => PlotError::NonPositivePressure { index },
        ParseError::NonMonotonicPressure { index, .. } => PlotError::NonMonotonicPressure { index },
        other => PlotError::render(other),
    })
}

pub struct SkewTPlotter {
    config: PlotConfig,
    labels: bool,
}

impl SkewTPlotter {
    /// Create a plotter, registering a label font if one can be found
    #[must_use]
    pub fn new(config: PlotConfig) -> Self {
        let labels = font::ensure_registered(config.font_path.as_deref());
        Self { config, labels }
    }

    #[must_use]
    pub fn config(&self) -> &PlotConfig {
        &self.config
    }

    /// Where the image for `sounding` is written
    #[must_use]
    pub fn output_path(&self, sounding: &Sounding) -> PathBuf {
        self.config.output_dir.join(file_name(
            &sounding.location.name,
            &sounding.timestamp,
            PLOT_EXTENSION,
        ))
    }

    /// Render one sounding, replacing an earlier image of the same
    /// location and valid time. `lead_hours` is shown in the title.
    pub fn plot(&self, sounding: &Sounding, lead_hours: Option<i64>) -> Result<PlotArtifact, PlotError> {
        validate(sounding)?;

        let dir = &self.config.output_dir;
        fs::create_dir_all(dir).map_err(|e| ArtifactError::io(dir, e))?;
        let path = self.output_path(sounding);

        // render beside the target so a failed draw never leaves a partial image
        let temp = tempfile::Builder::new()
            .prefix(".render-")
            .suffix(&format!(".{PLOT_EXTENSION}"))
            .tempfile_in(dir)
            .map_err(|e| ArtifactError::io(dir, e))?;
        let rendered = render::render(temp.path(), sounding, lead_hours, &self.config, self.labels)?;
        temp.persist(&path)
            .map_err(|e| ArtifactError::io(&path, e.error))?;

        info!(
            location = %sounding.location.name,
            levels = sounding.levels.len(),
            barbs = rendered.barbs,
            path = %path.display(),
            "Plotted sounding"
        );
        Ok(PlotArtifact {
            location: sounding.location.name.clone(),
            timestamp: sounding.timestamp,
            path,
        })
    }

    /// Plot the artifacts in `artifact_dir`: the newest per location, or
    /// every artifact when `all` is set
    pub fn run(&self, artifact_dir: &Path, all: bool) -> PlotReport {
        let mut report = PlotReport::new("plot");

        let files = match list_files(artifact_dir, SOUNDING_EXTENSION) {
            Ok(files) => files,
            Err(e) => {
                report.record(artifact_dir.display().to_string(), Err(e.into()));
                return report;
            }
        };
        if files.is_empty() {
            warn!(dir = %artifact_dir.display(), "No sounding artifacts to plot");
            return report;
        }

        let mut selected: BTreeMap<String, Vec<SoundingArtifact>> = BTreeMap::new();
        for path in files {
            match SoundingArtifact::read(&path) {
                Ok(artifact) => {
                    let entry = selected
                        .entry(artifact.sounding.location.name.clone())
                        .or_default();
                    if all {
                        entry.push(artifact);
                    } else if entry
                        .first()
                        .is_none_or(|a| a.sounding.timestamp < artifact.sounding.timestamp)
                    {
                        *entry = vec![artifact];
                    }
                }
                Err(e) => {
                    let key = path
                        .file_name()
                        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
                    report.record(key, Err(e.into()));
                }
            }
        }

        info!(
            "Plotting {} for {} locations",
            if all { "all soundings" } else { "latest soundings" },
            selected.len()
        );

        for (name, artifacts) in &selected {
            for artifact in artifacts {
                let key = if all {
                    format!("{} {}", name, artifact.sounding.time_tag())
                } else {
                    name.clone()
                };
                report.record(key, self.plot(&artifact.sounding, artifact.lead_hours));
            }
        }

        if let Some(days) = self.config.retention_days {
            retention::prune(&self.config.output_dir, PLOT_EXTENSION, days, Utc::now());
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::sounding::tests::level;
    use crate::models::{Location, Model};
    use chrono::TimeZone;
    use tempfile::tempdir;

    fn time(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 18, hour, 0, 0).unwrap()
    }

    fn sounding(name: &str, hour: u32) -> Sounding {
        let mut levels = vec![
            level(965.0, 11.0),
            level(850.0, 4.0),
            level(700.0, -4.0),
            level(500.0, -20.0),
            level(300.0, -45.0),
        ];
        for (i, l) in levels.iter_mut().enumerate() {
            l.height = Some(400.0 + 1_400.0 * i as f64);
            l.wind_speed = 10.0 + 25.0 * i as f64;
        }
        Sounding::new(Location::new(name, 47.37, 8.55), Model::IconCh1, time(hour), levels).unwrap()
    }

    fn plotter(dir: &Path) -> SkewTPlotter {
        SkewTPlotter::new(PlotConfig {
            output_dir: dir.to_path_buf(),
            width: 600,
            height: 450,
            ..PlotConfig::default()
        })
    }

    #[test]
    fn test_plot_writes_png() {
        let dir = tempdir().unwrap();
        let plotted = plotter(dir.path()).plot(&sounding("Zürich", 6), Some(6)).unwrap();

        assert_eq!(plotted.path, dir.path().join("zuerich_20261018_0600.png"));
        assert_eq!(plotted.location, "Zürich");
        assert_eq!(plotted.timestamp, time(6));
        let bytes = fs::read(&plotted.path).unwrap();
        assert!(bytes.starts_with(b"\x89PNG"));
        // only the image, no leftover temp file
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_two_levels_are_enough() {
        let dir = tempdir().unwrap();
        let mut s = sounding("Zurich", 6);
        s.levels.truncate(2);
        let plotted = plotter(dir.path()).plot(&s, None).unwrap();
        assert!(fs::metadata(plotted.path).unwrap().len() > 0);
    }

    #[test]
    fn test_single_level_rejected() {
        let dir = tempdir().unwrap();
        let mut s = sounding("Zurich", 6);
        s.levels.truncate(1);

        let err = plotter(dir.path()).plot(&s, None).unwrap_err();
        assert!(matches!(err, PlotError::InsufficientLevels { count: 1 }));
        assert_eq!(fs::read_dir(dir.path()).map(|d| d.count()).unwrap_or(0), 0);
    }

    #[test]
    fn test_unordered_pressure_rejected() {
        let dir = tempdir().unwrap();
        let mut s = sounding("Zurich", 6);
        s.levels.swap(1, 2);

        let err = plotter(dir.path()).plot(&s, None).unwrap_err();
        assert!(matches!(err, PlotError::NonMonotonicPressure { index: 2 }));
    }

    #[test]
    fn test_run_plots_latest_per_location() {
        let artifacts = tempdir().unwrap();
        let plots = tempdir().unwrap();
        for s in [sounding("Zurich", 0), sounding("Zurich", 6), sounding("Payerne", 3)] {
            SoundingArtifact::new(s, "fake").write(artifacts.path()).unwrap();
        }

        let report = plotter(plots.path()).run(artifacts.path(), false);
        assert!(report.is_success());
        let keys: Vec<&str> = report.outcomes().iter().map(|o| o.key.as_str()).collect();
        assert_eq!(keys, vec!["Payerne", "Zurich"]);
        assert!(plots.path().join("zurich_20261018_0600.png").exists());
        assert!(!plots.path().join("zurich_20261018_0000.png").exists());

        let report = plotter(plots.path()).run(artifacts.path(), true);
        assert_eq!(report.len(), 3);
        assert!(plots.path().join("zurich_20261018_0000.png").exists());
    }

    #[test]
    fn test_run_reports_unreadable_artifact() {
        let artifacts = tempdir().unwrap();
        let plots = tempdir().unwrap();
        SoundingArtifact::new(sounding("Zurich", 6), "fake")
            .write(artifacts.path())
            .unwrap();
        fs::write(artifacts.path().join("broken_20261018_0600.sounding"), "not json").unwrap();

        let report = plotter(plots.path()).run(artifacts.path(), false);
        assert_eq!(report.len(), 2);
        assert_eq!(report.failed(), 1);
        assert!(plots.path().join("zurich_20261018_0600.png").exists());
    }

    #[test]
    fn test_run_without_artifacts_is_empty_success() {
        let plots = tempdir().unwrap();
        let report = plotter(plots.path()).run(&plots.path().join("none"), false);
        assert!(report.is_empty());
        assert!(report.is_success());
    }
}
