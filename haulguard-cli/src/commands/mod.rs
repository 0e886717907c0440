//! CLI command implementations.

pub mod ask;
pub mod config;
pub mod diagnose;
pub mod hos;
pub mod location;
pub mod maintenance;
pub mod providers;
pub mod usage;
pub mod weather;

use anyhow::Result;
use chrono::Utc;
use serde::Serialize;

use crate::output::{JsonFormatter, TextFormatter};
use crate::{Cli, ExitCode, OutputFormat};

/// Prints `value` in the selected format.
pub(crate) fn emit<T: Serialize + ?Sized>(
    cli: &Cli,
    value: &T,
    text: impl FnOnce(&TextFormatter) -> String,
) -> Result<()> {
    match cli.format {
        OutputFormat::Text => println!("{}", text(&TextFormatter::new(!cli.no_color))),
        OutputFormat::Json => println!("{}", JsonFormatter::new(cli.pretty).format(value)?),
    }
    Ok(())
}

/// Reports that nothing was available and returns [`ExitCode::NoData`].
pub(crate) fn no_data(cli: &Cli, kind: &str) -> Result<ExitCode> {
    match cli.format {
        OutputFormat::Text => {
            println!("{}", TextFormatter::new(!cli.no_color).format_no_data(kind));
        }
        OutputFormat::Json => {
            println!("{}", JsonFormatter::new(cli.pretty).format_no_data(kind, Utc::now())?);
        }
    }
    Ok(ExitCode::NoData)
}
