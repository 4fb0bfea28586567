//! Check recorded household agent traces against a safety rule set.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use thiserror::Error;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

use hearth::config::MonitorConfig;
use hearth::error::{ConfigError, RuleSetError};
use hearth::monitor::Monitor;
use hearth::rules::RuleSet;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(
    name = "hearth",
    version,
    about = "Offline safety-rule monitor for household agent traces"
)]
struct Args {
    /// Rule set to check, as JSON, TOML or one formula per line.
    #[arg(long, short)]
    rules: PathBuf,

    /// Optional TOML file overriding thresholds and predicate tables.
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Output format for the report.
    #[arg(long, value_enum, default_value_t = Format::Text)]
    format: Format,

    /// Recorded trace files to check.
    #[arg(required = true)]
    traces: Vec<PathBuf>,
}

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Rules(#[from] RuleSetError),

    #[error("Could not serialize report: {0}")]
    Json(#[from] serde_json::Error),
}

fn run(args: Args) -> Result<bool, CliError> {
    let config = match &args.config {
        Some(path) => MonitorConfig::load(path)?,
        None => MonitorConfig::default(),
    };

    let rules = RuleSet::load(&args.rules)?;
    let monitor = Monitor::new(config, &rules);
    let report = monitor.check_batch(&args.traces);

    match args.format {
        Format::Text => print!("{}", report),
        Format::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }

    Ok(report.passed())
}

fn main() -> ExitCode {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match run(Args::parse()) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(error) => {
            tracing::error!("{}", error);
            ExitCode::from(2)
        }
    }
}
