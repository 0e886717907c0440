//! Location command - resolve the current position.

use anyhow::Result;
use clap::Args;
use haulguard_services::{DeviceLocator, LocationService, NoDevice, StaticLocator};
use haulguard_store::Config;
use std::sync::Arc;
use tracing::info;

use super::{emit, no_data};
use crate::app::build_hybrid;
use crate::{Cli, ExitCode};

/// Arguments for the location command.
#[derive(Args, Default)]
pub struct LocationArgs {
    /// Device latitude (GPS fix), used before any provider.
    #[arg(long, requires = "lon", allow_hyphen_values = true)]
    pub lat: Option<f64>,

    /// Device longitude (GPS fix).
    #[arg(long, requires = "lat", allow_hyphen_values = true)]
    pub lon: Option<f64>,
}

impl LocationArgs {
    /// The device locator these arguments describe.
    pub fn locator(&self) -> Arc<dyn DeviceLocator> {
        match (self.lat, self.lon) {
            (Some(lat), Some(lon)) => Arc::new(StaticLocator::new(lat, lon)),
            _ => Arc::new(NoDevice),
        }
    }
}

/// Runs the location command.
pub async fn run(args: &LocationArgs, cli: &Cli, config: &Config) -> Result<ExitCode> {
    let hybrid = build_hybrid(config).await;
    let service = LocationService::new(Arc::clone(&hybrid), args.locator());

    let Some(location) = service.current_location().await else {
        return no_data(cli, "location");
    };

    info!(source = %location.source, "Resolved location");
    emit(cli, &location, |f| f.format_location(&location))?;
    Ok(ExitCode::Success)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_locator_from_args() {
        let args = LocationArgs {
            lat: Some(41.6),
            lon: Some(-87.5),
        };
        let fix = args.locator().current_fix().await.unwrap();
        assert!((fix.latitude - 41.6).abs() < f64::EPSILON);

        assert!(LocationArgs::default().locator().current_fix().await.is_none());
    }
}
