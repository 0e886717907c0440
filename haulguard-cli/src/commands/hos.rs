//! HOS command - hours-of-service clocks from a duty log.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Args;
use haulguard_services::{CycleRule, DutyEntry, check_compliance};
use std::path::{Path, PathBuf};
use tracing::debug;

use super::emit;
use crate::{Cli, ExitCode};

/// Arguments for the hos command.
#[derive(Args)]
pub struct HosArgs {
    /// JSON file with an array of duty entries
    /// (`{"status": "driving", "start": "...", "end": "..."}`).
    #[arg(long)]
    pub log: PathBuf,

    /// Weekly cycle: 60 (60/7) or 70 (70/8).
    #[arg(long, default_value = "70")]
    pub cycle: CycleRule,

    /// Evaluate at this instant (RFC 3339) instead of now.
    #[arg(long)]
    pub at: Option<DateTime<Utc>>,
}

/// Reads a duty log file.
pub fn read_log(path: &Path) -> Result<Vec<DutyEntry>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading duty log {}", path.display()))?;
    let entries: Vec<DutyEntry> = serde_json::from_str(&content)
        .with_context(|| format!("parsing duty log {}", path.display()))?;
    debug!(entries = entries.len(), "Loaded duty log");
    Ok(entries)
}

/// Runs the hos command.
pub fn run(args: &HosArgs, cli: &Cli) -> Result<ExitCode> {
    let log = read_log(&args.log)?;
    let now = args.at.unwrap_or_else(Utc::now);
    let report = check_compliance(&log, now, args.cycle)?;

    emit(cli, &report, |f| f.format_compliance(&report))?;
    Ok(ExitCode::Success)
}

#[cfg(test)]
mod tests {
    use super::*;
    use haulguard_services::DutyStatus;

    #[test]
    fn test_read_log() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("duty.json");
        std::fs::write(
            &path,
            r#"[
                {"status": "off_duty", "start": "2024-10-06T20:00:00Z", "end": "2024-10-07T06:00:00Z"},
                {"status": "driving", "start": "2024-10-07T06:00:00Z"}
            ]"#,
        )
        .unwrap();

        let log = read_log(&path).unwrap();
        assert_eq!(log.len(), 2);
        assert_eq!(log[1].status, DutyStatus::Driving);
        assert!(log[1].end.is_none());
    }

    #[test]
    fn test_read_log_errors() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_log(&dir.path().join("missing.json")).is_err());

        let path = dir.path().join("bad.json");
        std::fs::write(&path, r#"[{"status": "napping"}]"#).unwrap();
        assert!(read_log(&path).is_err());
    }
}
