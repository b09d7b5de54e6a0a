//! Integration tests for the fetch and plot stages and the CLI

use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use chrono::{DateTime, TimeZone, Utc};
use serde_json::{Map, Value, json};
use tempfile::{TempDir, tempdir};

use icon_skewt::artifact::{PLOT_EXTENSION, SOUNDING_EXTENSION, list_files};
use icon_skewt::config::{FetchConfig, PlotConfig};
use icon_skewt::weather::open_meteo::parse_response;
use icon_skewt::{
    DataFetcher, FetchError, Location, LocationRegistry, Model, ParseError, SkewTPlotter, Sounding,
    SoundingArtifact, SoundingProvider, SoundingRequest,
};

const SURFACE_PRESSURE: f64 = 965.0;

fn valid_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 18, 6, 0, 0).unwrap()
}

/// Open-Meteo style body for `request`, standard atmosphere aloft
fn forecast_body(request: &SoundingRequest) -> Value {
    let mut hourly = Map::new();
    let mut units = Map::new();
    hourly.insert(
        "time".into(),
        json!([request.valid_time.format("%Y-%m-%dT%H:%M").to_string()]),
    );
    units.insert("time".into(), json!("iso8601"));

    let mut put = |field: String, value: Value, unit: &str| {
        hourly.insert(field.clone(), json!([value]));
        units.insert(field, json!(unit));
    };

    put("surface_pressure".into(), json!(SURFACE_PRESSURE), "hPa");
    put("temperature_2m".into(), json!(12.1), "°C");
    put("dew_point_2m".into(), json!(7.9), "°C");
    put("wind_speed_10m".into(), json!(5.4), "km/h");
    put("wind_direction_10m".into(), json!(225.0), "°");

    for &p in &request.pressure_levels {
        let below_ground = p >= SURFACE_PRESSURE;
        let value = |v: f64| if below_ground { Value::Null } else { json!(v) };
        let height = 44_330.0 * (1.0 - (p / 1013.25_f64).powf(0.1903));
        let temperature = 15.0 - 0.0065 * height;
        let name = |var: &str| format!("{var}_{p}hPa");
        put(name("temperature"), value(temperature), "°C");
        put(name("dew_point"), value(temperature - 5.0), "°C");
        put(name("wind_speed"), value(8.0 + height / 150.0), "km/h");
        put(name("wind_direction"), value(250.0), "°");
        put(name("geopotential_height"), value(height.round()), "m");
    }

    json!({
        "latitude": 47.38,
        "longitude": 8.56,
        "elevation": 408.0,
        "hourly_units": units,
        "hourly": hourly,
    })
}

/// Provider serving canned bodies through the real response parser
struct CannedProvider {
    drop_field_for: Option<(&'static str, &'static str)>,
    calls: RefCell<Vec<String>>,
}

impl CannedProvider {
    fn new() -> Self {
        Self {
            drop_field_for: None,
            calls: RefCell::new(Vec::new()),
        }
    }
}

impl SoundingProvider for CannedProvider {
    fn name(&self) -> &'static str {
        "canned"
    }

    fn fetch(&self, request: &SoundingRequest) -> Result<Sounding, FetchError> {
        self.calls.borrow_mut().push(request.location.name.clone());
        let mut body = forecast_body(request);
        if let Some((location, field)) = self.drop_field_for {
            if request.location.name == location {
                body["hourly"].as_object_mut().unwrap().remove(field);
            }
        }
        Ok(parse_response(&body.to_string(), request)?)
    }
}

struct Workspace {
    _root: TempDir,
    artifacts: PathBuf,
    plots: PathBuf,
}

fn workspace() -> Workspace {
    let root = tempdir().unwrap();
    Workspace {
        artifacts: root.path().join("soundings"),
        plots: root.path().join("plots"),
        _root: root,
    }
}

fn fetcher<P: SoundingProvider>(provider: P, ws: &Workspace) -> DataFetcher<P> {
    DataFetcher::new(
        provider,
        FetchConfig {
            artifact_dir: ws.artifacts.clone(),
            ..FetchConfig::default()
        },
    )
}

fn plotter(ws: &Workspace) -> SkewTPlotter {
    SkewTPlotter::new(PlotConfig {
        output_dir: ws.plots.clone(),
        width: 800,
        height: 600,
        ..PlotConfig::default()
    })
}

fn file_names(dir: &Path, extension: &str) -> Vec<String> {
    list_files(dir, extension)
        .unwrap()
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect()
}

#[test]
fn test_zurich_fetch_then_plot() {
    let ws = workspace();
    let registry = LocationRegistry::parse(
        r#"[{"name": "Zurich", "latitude": 47.37, "longitude": 8.55}]"#,
    )
    .unwrap();

    let fetch_report = fetcher(CannedProvider::new(), &ws).run(&registry, Model::IconCh1, valid_time());
    assert!(fetch_report.is_success());
    assert_eq!(
        file_names(&ws.artifacts, SOUNDING_EXTENSION),
        vec!["zurich_20261018_0600.sounding"]
    );

    let artifact = SoundingArtifact::read(&ws.artifacts.join("zurich_20261018_0600.sounding")).unwrap();
    let levels = &artifact.sounding.levels;
    assert!(!levels.is_empty());
    assert!(levels.windows(2).all(|w| w[0].pressure > w[1].pressure));
    assert_eq!(levels[0].pressure, SURFACE_PRESSURE);
    assert_eq!(artifact.sounding.model, Model::IconCh1);
    assert!(artifact.lead_hours.is_some());

    let plot_report = plotter(&ws).run(&ws.artifacts, false);
    assert!(plot_report.is_success());
    assert_eq!(
        file_names(&ws.plots, PLOT_EXTENSION),
        vec!["zurich_20261018_0600.png"]
    );
    assert!(fs::metadata(ws.plots.join("zurich_20261018_0600.png")).unwrap().len() > 0);
}

#[test]
fn test_missing_temperature_fails_only_that_location() {
    let ws = workspace();
    let registry = LocationRegistry::from_locations(vec![
        Location::new("Zurich", 47.37, 8.55),
        Location::new("Payerne", 46.81, 6.94),
        Location::new("Locarno", 46.17, 8.79),
    ])
    .unwrap();

    let mut provider = CannedProvider::new();
    provider.drop_field_for = Some(("Payerne", "temperature_700hPa"));
    let fetcher = fetcher(provider, &ws);
    let report = fetcher.run(&registry, Model::IconCh1, valid_time());

    assert_eq!(report.len(), 3);
    assert_eq!(report.failed(), 1);
    assert!(!report.is_success());
    assert!(matches!(
        &report.outcomes()[1].result,
        Err(FetchError::Parse(ParseError::MissingField { .. }))
    ));
    assert_eq!(
        file_names(&ws.artifacts, SOUNDING_EXTENSION),
        vec!["locarno_20261018_0600.sounding", "zurich_20261018_0600.sounding"]
    );

    // the plot stage only sees the successful locations
    let plot_report = plotter(&ws).run(&ws.artifacts, false);
    assert_eq!(plot_report.len(), 2);
    assert!(plot_report.is_success());
}

// CLI

fn toml_path(path: &Path) -> String {
    path.display().to_string().replace('\\', "/")
}

fn write_config(dir: &Path, locations: &Path) -> PathBuf {
    let path = dir.join("icon-skewt.toml");
    let content = format!(
        r#"[locations]
path = "{}"

[provider]
base_url = "http://127.0.0.1:9/v1"
timeout_seconds = 2

[fetch]
artifact_dir = "{}"

[plot]
output_dir = "{}"
width = 800
height = 600
"#,
        toml_path(locations),
        toml_path(&dir.join("soundings")),
        toml_path(&dir.join("plots")),
    );
    fs::write(&path, content).unwrap();
    path
}

fn run_cli(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_icon-skewt"))
        .args(args)
        .current_dir(dir)
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute icon-skewt")
}

#[test]
fn test_cli_help() {
    let dir = tempdir().unwrap();
    let output = run_cli(dir.path(), &["--help"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("fetch"));
    assert!(stdout.contains("plot"));
}

#[test]
fn test_cli_missing_locations_is_config_error() {
    let dir = tempdir().unwrap();
    let config = write_config(dir.path(), &dir.path().join("missing.json"));

    let output = run_cli(dir.path(), &["--config", &toml_path(&config), "fetch"]);
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("missing.json"));
}

#[test]
fn test_cli_invalid_config_is_config_error() {
    let dir = tempdir().unwrap();
    let config = dir.path().join("bad.toml");
    fs::write(&config, "[provider]\ntimeout_seconds = 0\n").unwrap();

    let output = run_cli(dir.path(), &["--config", &toml_path(&config), "plot"]);
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_cli_unreachable_provider_exits_nonzero() {
    let dir = tempdir().unwrap();
    let locations = dir.path().join("locations.json");
    fs::write(
        &locations,
        r#"[{"name": "Zurich", "latitude": 47.37, "longitude": 8.55}]"#,
    )
    .unwrap();
    let config = write_config(dir.path(), &locations);

    let output = run_cli(
        dir.path(),
        &[
            "--config",
            &toml_path(&config),
            "fetch",
            "--valid-time",
            "2026-10-18T06:00:00Z",
        ],
    );
    assert_eq!(output.status.code(), Some(1));
    assert!(file_names(&dir.path().join("soundings"), SOUNDING_EXTENSION).is_empty());
}

#[test]
fn test_cli_valid_time_off_the_hour_is_usage_error() {
    let dir = tempdir().unwrap();
    let locations = dir.path().join("locations.json");
    fs::write(
        &locations,
        r#"[{"name": "Zurich", "latitude": 47.37, "longitude": 8.55}]"#,
    )
    .unwrap();
    let config = write_config(dir.path(), &locations);

    let output = run_cli(
        dir.path(),
        &[
            "--config",
            &toml_path(&config),
            "fetch",
            "--valid-time",
            "2026-10-18T06:30:00Z",
        ],
    );
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("not on the hour"));
    assert!(!dir.path().join("soundings").exists());
}

#[test]
fn test_cli_plot_renders_artifacts() {
    let dir = tempdir().unwrap();
    let config = write_config(dir.path(), &dir.path().join("locations.json"));

    let request = SoundingRequest::new(
        Location::new("Zürich", 47.37, 8.55),
        &FetchConfig::default(),
        Model::IconCh1,
        valid_time(),
    );
    let sounding = parse_response(&forecast_body(&request).to_string(), &request).unwrap();
    SoundingArtifact::new(sounding, "canned")
        .write(&dir.path().join("soundings"))
        .unwrap();

    let output = run_cli(dir.path(), &["--config", &toml_path(&config), "plot"]);
    assert!(
        output.status.success(),
        "{}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert_eq!(
        file_names(&dir.path().join("plots"), PLOT_EXTENSION),
        vec!["zuerich_20261018_0600.png"]
    );
}
