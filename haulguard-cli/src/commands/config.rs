//! Config command - manage configuration.

use anyhow::Result;
use clap::{Args, Subcommand};
use haulguard_store::{Config, default_config_dir};
use std::path::Path;
use tracing::info;

use crate::output::JsonFormatter;
use crate::{Cli, ExitCode, OutputFormat};

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Config subcommands.
#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show current configuration.
    Show,

    /// Show configuration paths.
    Path,

    /// Write a default configuration file.
    Init {
        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
}

/// Runs the config command.
pub fn run(args: &ConfigArgs, cli: &Cli, config: &Config) -> Result<ExitCode> {
    let path = cli.config.clone().unwrap_or_else(Config::default_path);
    match &args.action {
        ConfigAction::Show => show_config(config, cli)?,
        ConfigAction::Path => show_paths(&path, config, cli)?,
        ConfigAction::Init { force } => init_config(&path, *force)?,
    }
    Ok(ExitCode::Success)
}

fn show_config(config: &Config, cli: &Cli) -> Result<()> {
    match cli.format {
        OutputFormat::Text => {
            let general = &config.general;
            println!("HaulGuard Configuration");
            println!("{}", "─".repeat(40));
            println!();
            println!("Log level:          {}", general.log_level);
            println!("Cache capacity:     {}", general.cache_capacity);
            println!("Degraded threshold: {} failures", general.degraded_failure_threshold);
            println!("Request timeout:    {}s", general.request_timeout_secs);
            println!("Data dir:           {}", config.data_dir().display());
            println!();
            println!("Cache TTL (hours):");
            let ttl = &config.ttl_hours;
            println!(
                "  geolocation {}  weather {}  diagnostics {}  nlp {}",
                ttl.geolocation, ttl.weather, ttl.diagnostics, ttl.nlp
            );

            if !config.providers.is_empty() {
                println!();
                println!("Provider overrides:");
                for (name, settings) in &config.providers {
                    let state = if settings.enabled { "enabled" } else { "disabled" };
                    println!("  • {name} ({state})");
                }
            }
        }
        OutputFormat::Json => {
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format(&redacted(config))?);
        }
    }

    Ok(())
}

/// Copy of `config` with inline API keys masked.
fn redacted(config: &Config) -> Config {
    let mut copy = config.clone();
    for settings in copy.providers.values_mut() {
        if settings.api_key.is_some() {
            settings.api_key = Some("********".to_string());
        }
    }
    copy
}

fn show_paths(config_path: &Path, config: &Config, cli: &Cli) -> Result<()> {
    let config_dir = default_config_dir();
    let data_dir = config.data_dir();

    match cli.format {
        OutputFormat::Text => {
            println!("Configuration Paths");
            println!("{}", "─".repeat(40));
            println!();
            println!("Config dir:  {}", config_dir.display());
            println!("Config file: {}", config_path.display());
            println!("Data dir:    {}", data_dir.display());
        }
        OutputFormat::Json => {
            let paths = serde_json::json!({
                "config_dir": config_dir.display().to_string(),
                "config_file": config_path.display().to_string(),
                "data_dir": data_dir.display().to_string(),
            });
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format(&paths)?);
        }
    }

    Ok(())
}

/// Writes the default config to `path`.
fn init_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        anyhow::bail!(
            "{} already exists (use --force to overwrite)",
            path.display()
        );
    }

    Config::default().save_to(path)?;
    info!(path = %path.display(), "Config initialized");
    println!("Wrote {}", path.display());
    Ok(())
}
