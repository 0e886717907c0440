//! Weather command - conditions and driving hazards.

use anyhow::Result;
use clap::Args;
use haulguard_services::{LocationService, NoDevice};
use haulguard_store::Config;
use std::sync::Arc;

use super::{emit, no_data};
use crate::app::build_hybrid;
use crate::{Cli, ExitCode};

/// Arguments for the weather command.
#[derive(Args)]
pub struct WeatherArgs {
    /// Latitude; defaults to the current location.
    #[arg(requires = "lon", allow_hyphen_values = true)]
    pub lat: Option<f64>,

    /// Longitude.
    #[arg(allow_hyphen_values = true)]
    pub lon: Option<f64>,
}

/// Runs the weather command.
pub async fn run(args: &WeatherArgs, cli: &Cli, config: &Config) -> Result<ExitCode> {
    let hybrid = build_hybrid(config).await;

    let (lat, lon) = match (args.lat, args.lon) {
        (Some(lat), Some(lon)) => (lat, lon),
        _ => {
            let locations = LocationService::new(Arc::clone(&hybrid), Arc::new(NoDevice));
            match locations.current_location().await {
                Some(here) => (here.latitude, here.longitude),
                None => return no_data(cli, "location"),
            }
        }
    };

    let Some(weather) = hybrid.get_weather_data(lat, lon).await else {
        return no_data(cli, "weather");
    };

    emit(cli, &weather, |f| f.format_weather(&weather))?;
    Ok(ExitCode::Success)
}
