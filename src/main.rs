use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use tracing::{error, info};

use icon_skewt::config::LoggingConfig;
use icon_skewt::fetch::{parse_valid_time, target_valid_time};
use icon_skewt::{
    ConfigError, DataFetcher, LocationRegistry, Model, OpenMeteoProvider, PipelineConfig,
    SkewTPlotter, logging,
};

/// Exit status for a configuration error before any location ran
const EXIT_CONFIG: u8 = 2;

#[derive(Debug, Parser)]
#[command(name = "icon-skewt", version, about = "ICON-CH1 soundings and Skew-T log-P diagrams")]
struct Args {
    /// TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Fetch a sounding per configured location and write artifacts
    Fetch {
        /// Locations JSON file, overrides `locations.path`
        #[arg(short, long)]
        locations: Option<PathBuf>,

        /// Valid time (RFC 3339, on the hour), defaults to the current hour plus `fetch.lead_hours`
        #[arg(long, value_parser = parse_valid_time)]
        valid_time: Option<DateTime<Utc>>,

        /// Model to request, overrides `fetch.model`
        #[arg(short, long)]
        model: Option<Model>,
    },
    /// Render a Skew-T diagram per fetched sounding
    Plot {
        /// Plot every artifact instead of the newest per location
        #[arg(long)]
        all: bool,
    },
}

fn main() -> ExitCode {
    let args = Args::parse();

    let config = match PipelineConfig::load_from_path(args.config.clone()) {
        Ok(config) => config,
        Err(e) => {
            // logging is not configured yet, fall back to defaults to report
            let _ = logging::init(&LoggingConfig::default(), args.verbose);
            error!("{:#}", anyhow::Error::new(e).context("Invalid configuration"));
            return ExitCode::from(EXIT_CONFIG);
        }
    };

    if let Err(e) = logging::init(&config.logging, args.verbose) {
        eprintln!("{e}");
        return ExitCode::from(EXIT_CONFIG);
    }

    match run(args.command, config) {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            if e.downcast_ref::<ConfigError>().is_some() {
                ExitCode::from(EXIT_CONFIG)
            } else {
                ExitCode::FAILURE
            }
        }
    }
}

fn run(command: Command, mut config: PipelineConfig) -> anyhow::Result<ExitCode> {
    match command {
        Command::Fetch {
            locations,
            valid_time,
            model,
        } => {
            if let Some(path) = locations {
                config.locations.path = path;
            }
            let model = model.unwrap_or(config.fetch.model);
            let valid_time =
                valid_time.unwrap_or_else(|| target_valid_time(Utc::now(), config.fetch.lead_hours));

            let registry = LocationRegistry::load(&config.locations.path)
                .context("Failed to load locations")?;
            let provider =
                OpenMeteoProvider::new(&config.provider).context("Failed to create provider")?;

            let fetcher = DataFetcher::new(provider, config.fetch);
            let report = fetcher.run(&registry, model, valid_time);
            report.log_summary();
            Ok(report.exit_code())
        }
        Command::Plot { all } => {
            let plotter = SkewTPlotter::new(config.plot);
            info!(dir = %config.fetch.artifact_dir.display(), "Reading sounding artifacts");
            let report = plotter.run(&config.fetch.artifact_dir, all);
            report.log_summary();
            Ok(report.exit_code())
        }
    }
}
