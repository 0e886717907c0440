//! Usage command - quota and cost report.

use anyhow::Result;
use clap::Args;
use haulguard_store::Config;
use tracing::info;

use super::emit;
use crate::app::build_hybrid;
use crate::{Cli, ExitCode};

/// Arguments for the usage command.
#[derive(Args, Default)]
pub struct UsageArgs {
    /// Clear the failure counter of a provider before reporting.
    #[arg(long, value_name = "PROVIDER")]
    pub reset_failures: Option<String>,

    /// Clear all usage counters before reporting.
    #[arg(long, conflicts_with = "reset_failures")]
    pub reset_all: bool,
}

/// Runs the usage command.
pub async fn run(args: &UsageArgs, cli: &Cli, config: &Config) -> Result<ExitCode> {
    let hybrid = build_hybrid(config).await;

    if let Some(provider) = &args.reset_failures {
        if hybrid.registry().get(provider).is_none() {
            anyhow::bail!("Unknown provider: {provider}");
        }
        hybrid.reset_failures(provider).await;
        info!(provider = %provider, "Failure counter reset");
    }
    if args.reset_all {
        hybrid.tracker().reset_all().await;
        info!("Usage counters reset");
    }

    let report = hybrid.usage_report().await;
    emit(cli, &report, |f| f.format_usage_report(&report))?;
    Ok(ExitCode::Success)
}
