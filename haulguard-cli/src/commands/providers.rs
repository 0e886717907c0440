//! Providers command - list built-in providers and their state.

use anyhow::Result;
use haulguard_fetch::ProviderInfo;
use haulguard_providers::builtin_descriptors;
use haulguard_store::Config;
use tracing::info;

use crate::app::build_hybrid;
use crate::output::{JsonFormatter, ProviderOutput, TextFormatter};
use crate::{Cli, ExitCode, OutputFormat};

/// Runs the providers command.
pub async fn run(cli: &Cli, config: &Config) -> Result<ExitCode> {
    info!("Listing providers");

    let hybrid = build_hybrid(config).await;
    let registry = hybrid.registry();

    // Disabled providers are not in the registry; describe them from the descriptor.
    let rows: Vec<(ProviderInfo, bool)> = builtin_descriptors()
        .iter()
        .map(|desc| match registry.get(&desc.name) {
            Some(provider) => (ProviderInfo::from_provider(provider.as_ref()), true),
            None => (
                ProviderInfo {
                    id: desc.name.clone(),
                    display_name: desc.display_name.clone(),
                    tier: desc.tier,
                    capabilities: desc.capabilities.iter().copied().collect(),
                    available: false,
                    daily_limit: desc.rate_limits.daily,
                    monthly_limit: desc.rate_limits.monthly,
                },
                false,
            ),
        })
        .collect();

    match cli.format {
        OutputFormat::Text => {
            let formatter = TextFormatter::new(!cli.no_color);

            println!("{}", formatter.format_providers_header());
            println!("{}", "─".repeat(80));

            for (info, enabled) in &rows {
                println!(
                    "{}",
                    formatter.format_provider_line(info, registry.key_source(&info.id), *enabled)
                );
            }

            println!();
            println!(
                "Total: {} providers ({} ready)",
                rows.len(),
                rows.iter().filter(|(i, enabled)| *enabled && i.available).count()
            );
        }
        OutputFormat::Json => {
            let outputs: Vec<ProviderOutput<'_>> = rows
                .iter()
                .map(|(info, enabled)| ProviderOutput {
                    info,
                    enabled: *enabled,
                    key_source: registry.key_source(&info.id),
                })
                .collect();
            println!("{}", JsonFormatter::new(cli.pretty).format(&outputs)?);
        }
    }

    Ok(ExitCode::Success)
}
