// Lint configuration for this crate
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! `HaulGuard` CLI - quota-aware API fallback for truck-driver tooling.
//!
//! # Examples
//!
//! ```bash
//! # Where am I? (device fix if given, else geolocation providers)
//! haulguard location
//! haulguard location --lat 41.59 --lon -87.35
//!
//! # Weather at the current position
//! haulguard weather
//!
//! # Analyze trouble codes
//! haulguard diagnose P0300 P2002 --mileage 412000
//!
//! # Ask the assistant
//! haulguard ask "where can I park tonight" --hos-remaining 45
//!
//! # Quota and cost report
//! haulguard usage --format json --pretty
//!
//! # Hours of service from an ELD export
//! haulguard hos --log duty.json --cycle 70
//! ```

mod app;
mod commands;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use haulguard_store::Config;
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use commands::{ask, config, diagnose, hos, location, maintenance, providers, usage, weather};

// ============================================================================
// CLI Definition
// ============================================================================

/// `HaulGuard` CLI - hybrid API fallback and cost control.
#[derive(Parser)]
#[command(name = "haulguard")]
#[command(about = "Quota-aware API fallback for truck-driver tooling")]
#[command(long_about = r"
HaulGuard routes location, weather, diagnostics and assistant requests
through free and paid providers, tracking daily and monthly quotas and
falling back to cached, device or rule-based answers.

Examples:
  haulguard location                   # Current position
  haulguard weather 39.1 -94.6         # Weather at a coordinate
  haulguard diagnose P0300 U0100       # Trouble code analysis
  haulguard ask 'how long can I drive' # Driver assistant
  haulguard usage                      # Quota and cost report
  haulguard hos --log duty.json        # Hours-of-service clocks
")]
#[command(version)]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Commands,

    /// Output format (text or json).
    #[arg(long, short = 'f', default_value = "text", global = true)]
    pub format: OutputFormat,

    /// Pretty-print JSON output.
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Config file to use instead of the default.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output (debug logging).
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Disable colored output.
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Quiet mode (no logging, no error text).
    #[arg(long, short, global = true)]
    pub quiet: bool,
}

/// CLI commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Show the current position.
    #[command(visible_alias = "l")]
    Location(location::LocationArgs),

    /// Show weather and driving hazards.
    #[command(visible_alias = "w")]
    Weather(weather::WeatherArgs),

    /// Analyze diagnostic trouble codes.
    #[command(visible_alias = "d")]
    Diagnose(diagnose::DiagnoseArgs),

    /// Ask the driver assistant.
    #[command(visible_alias = "a")]
    Ask(ask::AskArgs),

    /// Show quota usage and estimated cost.
    #[command(visible_alias = "u")]
    Usage(usage::UsageArgs),

    /// List configured providers.
    #[command(visible_alias = "p")]
    Providers,

    /// Check hours-of-service clocks from a duty log.
    Hos(hos::HosArgs),

    /// Service history and maintenance alerts.
    #[command(visible_alias = "m")]
    Maintenance(maintenance::MaintenanceArgs),

    /// Manage configuration.
    Config(config::ConfigArgs),
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    /// Human-readable text with colors.
    #[default]
    Text,
    /// JSON output for scripting.
    Json,
}

/// CLI exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Success.
    Success = 0,
    /// General error.
    Error = 1,
    /// Every source came up empty.
    NoData = 2,
}

impl Cli {
    /// Loads the config file named on the command line, or the default one.
    pub fn load_config(&self) -> Result<Config> {
        let path = self.config.clone().unwrap_or_else(Config::default_path);
        Ok(Config::load_from(&path)?)
    }
}

// ============================================================================
// Logging Setup
// ============================================================================

fn setup_logging(verbose: bool, quiet: bool, level: &str) {
    if quiet {
        return;
    }

    let filter = if verbose {
        EnvFilter::new("haulguard=debug,info")
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(format!("haulguard={level}")))
    };

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .without_time()
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = cli.load_config();
    let level = config
        .as_ref()
        .map_or("warn", |c| c.general.log_level.as_str())
        .to_ascii_lowercase();
    setup_logging(cli.verbose, cli.quiet, &level);

    let result = match config {
        Ok(config) => run(&cli, &config).await,
        Err(e) => Err(e),
    };

    let code = match result {
        Ok(code) => code,
        Err(e) => {
            if !cli.quiet {
                eprintln!("Error: {e:#}");
            }
            ExitCode::Error
        }
    };

    if code != ExitCode::Success {
        std::process::exit(code as i32);
    }
}

async fn run(cli: &Cli, config: &Config) -> Result<ExitCode> {
    match &cli.command {
        Commands::Location(args) => location::run(args, cli, config).await,
        Commands::Weather(args) => weather::run(args, cli, config).await,
        Commands::Diagnose(args) => diagnose::run(args, cli, config).await,
        Commands::Ask(args) => ask::run(args, cli, config).await,
        Commands::Usage(args) => usage::run(args, cli, config).await,
        Commands::Providers => providers::run(cli, config).await,
        Commands::Hos(args) => hos::run(args, cli),
        Commands::Maintenance(args) => maintenance::run(args, cli, config).await,
        Commands::Config(args) => config::run(args, cli, config),
    }
}
