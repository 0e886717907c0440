//! Maintenance command - service history and alerts.

use anyhow::Result;
use chrono::{NaiveDate, Utc};
use clap::{Args, Subcommand};
use haulguard_core::{MaintenanceItem, ServiceInterval, ServiceRecord, ServiceShop};
use haulguard_services::predict_maintenance;
use haulguard_store::{Config, MaintenanceStore};
use tracing::info;

use super::emit;
use crate::app::open_store;
use crate::{Cli, ExitCode};

/// Arguments for the maintenance command.
#[derive(Args)]
pub struct MaintenanceArgs {
    #[command(subcommand)]
    pub action: MaintenanceAction,
}

/// Maintenance subcommands.
#[derive(Subcommand)]
pub enum MaintenanceAction {
    /// Show items due soon or overdue.
    Status {
        /// Current odometer reading in miles.
        #[arg(long)]
        odometer: u64,

        /// Current engine hours.
        #[arg(long)]
        engine_hours: Option<u64>,
    },

    /// Record a completed service.
    Record {
        /// Item serviced (oil, tires, brakes, dpf, transmission, coolant, air-filter).
        item: MaintenanceItem,

        /// Odometer reading at the service.
        #[arg(long)]
        odometer: u64,

        /// Service date (YYYY-MM-DD); defaults to today.
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Engine hours at the service.
        #[arg(long)]
        engine_hours: Option<u64>,

        /// Shop that did the work.
        #[arg(long)]
        shop: Option<String>,

        /// Invoice total in USD.
        #[arg(long)]
        cost: Option<f64>,
    },

    /// Show service history.
    History,

    /// Add a preferred shop.
    AddShop {
        /// Shop name.
        name: String,

        /// City or address.
        #[arg(long)]
        location: Option<String>,

        /// Phone number.
        #[arg(long)]
        phone: Option<String>,
    },

    /// Override the service interval of an item.
    Interval {
        /// Item to change.
        item: MaintenanceItem,

        /// Miles between services.
        #[arg(long)]
        miles: Option<u64>,

        /// Days between services.
        #[arg(long)]
        days: Option<u32>,

        /// Engine hours between services.
        #[arg(long)]
        engine_hours: Option<u64>,
    },
}

/// Runs the maintenance command.
pub async fn run(args: &MaintenanceArgs, cli: &Cli, config: &Config) -> Result<ExitCode> {
    let store = MaintenanceStore::load(open_store(config)).await;
    let today = Utc::now().date_naive();

    match &args.action {
        MaintenanceAction::Status {
            odometer,
            engine_hours,
        } => {
            let state = store.get().await;
            let alerts =
                predict_maintenance(*odometer, *engine_hours, &state.history, &state.settings, today);
            emit(cli, &alerts, |f| f.format_maintenance(&alerts))?;
        }
        MaintenanceAction::Record {
            item,
            odometer,
            date,
            engine_hours,
            shop,
            cost,
        } => {
            let record = ServiceRecord {
                item: *item,
                performed_on: date.unwrap_or(today),
                odometer_mi: *odometer,
                engine_hours: *engine_hours,
                shop: shop.clone(),
                cost_usd: *cost,
            };
            store.record_service(record.clone()).await?;
            info!(item = %item, odometer, "Service recorded");
            emit(cli, &record, |_| format!("Recorded {} at {odometer} mi", item.display_name()))?;
        }
        MaintenanceAction::History => {
            let state = store.get().await;
            emit(cli, &state.history, |f| f.format_history(&state.history))?;
        }
        MaintenanceAction::AddShop {
            name,
            location,
            phone,
        } => {
            let shop = ServiceShop {
                name: name.clone(),
                location: location.clone(),
                phone: phone.clone(),
            };
            store.add_preferred_shop(shop.clone()).await?;
            emit(cli, &shop, |_| format!("Saved shop: {name}"))?;
        }
        MaintenanceAction::Interval {
            item,
            miles,
            days,
            engine_hours,
        } => {
            if miles.is_none() && days.is_none() && engine_hours.is_none() {
                anyhow::bail!("Give at least one of --miles, --days or --engine-hours");
            }
            let interval = ServiceInterval::new(*miles, *days, *engine_hours);
            let mut settings = store.get().await.settings;
            settings.intervals.insert(*item, interval);
            store.set_settings(settings).await?;
            emit(cli, &interval, |_| {
                format!("Updated {} interval", item.display_name())
            })?;
        }
    }

    Ok(ExitCode::Success)
}
