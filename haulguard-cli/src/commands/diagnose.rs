//! Diagnose command - trouble code analysis.

use anyhow::Result;
use clap::Args;
use haulguard_store::Config;

use super::emit;
use crate::app::build_hybrid;
use crate::{Cli, ExitCode};

/// Arguments for the diagnose command.
#[derive(Args)]
pub struct DiagnoseArgs {
    /// Trouble codes, space or comma separated (e.g. P0300 U0100).
    #[arg(required = true, value_delimiter = ',')]
    pub codes: Vec<String>,

    /// Vehicle identification number.
    #[arg(long)]
    pub vin: Option<String>,

    /// Odometer reading in miles.
    #[arg(long)]
    pub mileage: Option<u64>,
}

/// Runs the diagnose command.
///
/// Always answers: providers first, local rules otherwise.
pub async fn run(args: &DiagnoseArgs, cli: &Cli, config: &Config) -> Result<ExitCode> {
    let hybrid = build_hybrid(config).await;
    let report = hybrid
        .analyze_diagnostics(&args.codes, args.vin.as_deref(), args.mileage)
        .await;

    emit(cli, &report, |f| f.format_diagnostics(&report))?;
    Ok(ExitCode::Success)
}
