//! CLI entry point for the IQT rater.
//!
//! Provides subcommands for rating every route of a network snapshot and for
//! inspecting the indicator weights in effect.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use iqt_rater::config::IqtConfig;
use iqt_rater::output::{print_json, print_pretty, print_summary, write_reports_csv, write_reports_json};
use iqt_rater::pipeline::{Inputs, rate_routes};
use iqt_rater::scoring::types::{INDICATOR_CODES, INDICATOR_COUNT};
use iqt_rater::tables::{load_table, load_table_or_empty};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "iqt_rater")]
#[command(about = "Rates bus routes with the Transport Quality Index (IQT)", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rate every route in a network snapshot
    Rate {
        /// Route table: route_id, WKT geometry and categorical attributes
        #[arg(long)]
        routes: PathBuf,

        /// Stop table with latitude and longitude columns
        #[arg(long)]
        stops: PathBuf,

        /// Residence table with latitude and longitude columns
        #[arg(long)]
        residences: PathBuf,

        /// Optional: service window table used for headway
        #[arg(long)]
        frequency: Option<PathBuf>,

        /// Optional: trip timestamp table used for punctuality
        #[arg(long)]
        punctuality: Option<PathBuf>,

        /// Optional: executed kilometres per trip
        #[arg(long)]
        completion: Option<PathBuf>,

        /// Optional: JSON config file with weights, threshold and CRS
        #[arg(short, long)]
        config: Option<String>,

        /// Coverage distance threshold in metres, overrides the config file
        #[arg(short, long)]
        threshold: Option<f64>,

        /// CSV file to write the route reports to
        #[arg(short, long, default_value = "iqt.csv")]
        output: PathBuf,

        /// Optional: JSON file with reports and served stop positions
        #[arg(long)]
        json: Option<PathBuf>,

        /// Also log every report as pretty-printed JSON
        #[arg(long, default_value_t = false)]
        verbose: bool,
    },
    /// Show the indicator weights and normalization constant in effect
    ShowWeights {
        /// Optional: JSON config file with weights
        #[arg(short, long)]
        config: Option<String>,
    },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/iqt_rater.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("iqt_rater.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Rate {
            routes,
            stops,
            residences,
            frequency,
            punctuality,
            completion,
            config,
            threshold,
            output,
            json,
            verbose,
        } => {
            let mut config = load_config(config.as_deref())?;
            if let Some(threshold) = threshold {
                config.coverage_threshold_m = threshold;
                config.validate()?;
            }

            let inputs = Inputs {
                routes: load_table("routes", &routes)?,
                stops: load_table_or_empty("stops", &stops),
                residences: load_table_or_empty("residences", &residences),
                frequency: load_optional("frequency", frequency.as_deref()),
                punctuality: load_optional("punctuality", punctuality.as_deref()),
                completion: load_optional("completion", completion.as_deref()),
            };

            let reports = rate_routes(&inputs, &config).context("rating failed")?;

            print_summary(&reports);
            if verbose {
                print_pretty(&reports);
                print_json(&reports)?;
            }

            write_reports_csv(&output, &reports)?;
            info!(path = %output.display(), routes = reports.len(), "CSV report written");

            if let Some(path) = json {
                write_reports_json(&path, &reports)?;
                info!(path = %path.display(), "JSON report written");
            }
        }
        Commands::ShowWeights { config } => {
            let config = load_config(config.as_deref())?;
            let weights = config.weights()?;

            for (code, weight) in INDICATOR_CODES.iter().zip(weights.values()) {
                info!(indicator = *code, weight, "Weight");
            }
            info!(
                normalization = weights.normalization(),
                max_iqt = weights.compute_iqt(&[3.0; INDICATOR_COUNT]),
                "Weight summary"
            );
        }
    }

    Ok(())
}

/// Reads the config file when given, otherwise the built-in defaults.
fn load_config(path: Option<&str>) -> Result<IqtConfig> {
    match path {
        Some(path) => {
            let config = IqtConfig::load(path)?;
            info!(path, "Config loaded");
            Ok(config)
        }
        None => Ok(IqtConfig::default()),
    }
}

/// Loads an optional table. A table that was not given is empty.
fn load_optional<T: serde::de::DeserializeOwned>(table: &str, path: Option<&Path>) -> Vec<T> {
    match path {
        Some(path) => load_table_or_empty(table, path),
        None => {
            warn!(table, "Table not provided, dependent indicators will score 0");
            Vec::new()
        }
    }
}
