//! Predictive maintenance alerts.
//!
//! Compares the miles, days and engine hours since each item's last
//! service against its interval. Items inside the warning margin are due
//! soon; items past any limit are overdue.

use chrono::{Duration, NaiveDate};
use haulguard_core::{MaintenanceItem, MaintenanceSettings, ServiceInterval, ServiceRecord};
use serde::Serialize;
use tracing::debug;

/// Engine hours before an hours-based interval at which to warn.
pub const ENGINE_HOURS_WARNING: u64 = 50;

/// How urgent an alert is. Sorts most urgent first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertStatus {
    /// Past at least one limit.
    Overdue,
    /// Inside the warning margin.
    DueSoon,
    /// Never serviced on record.
    NoHistory,
}

impl AlertStatus {
    /// Returns the display name for this status.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Overdue => "Overdue",
            Self::DueSoon => "Due soon",
            Self::NoHistory => "No history",
        }
    }
}

/// One item that needs attention.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MaintenanceAlert {
    /// The item.
    pub item: MaintenanceItem,
    /// Urgency.
    pub status: AlertStatus,
    /// Miles until due; negative when overdue.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub miles_remaining: Option<i64>,
    /// Days until due; negative when overdue.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub days_remaining: Option<i64>,
    /// Engine hours until due; negative when overdue.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub engine_hours_remaining: Option<i64>,
    /// The service this is measured from.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_service: Option<ServiceRecord>,
    /// Driver-facing summary.
    pub message: String,
}

fn signed_diff(a: u64, b: u64) -> i64 {
    if a >= b {
        i64::try_from(a - b).unwrap_or(i64::MAX)
    } else {
        i64::try_from(b - a).map_or(i64::MIN, |d| -d)
    }
}

fn latest(history: &[ServiceRecord], item: MaintenanceItem) -> Option<&ServiceRecord> {
    history
        .iter()
        .filter(|r| r.item == item)
        .max_by_key(|r| (r.performed_on, r.odometer_mi))
}

struct Remaining {
    miles: Option<i64>,
    days: Option<i64>,
    hours: Option<i64>,
}

fn remaining(
    interval: ServiceInterval,
    last: &ServiceRecord,
    odometer_mi: u64,
    engine_hours: Option<u64>,
    today: NaiveDate,
) -> Remaining {
    Remaining {
        miles: interval
            .miles
            .map(|m| signed_diff(last.odometer_mi.saturating_add(m), odometer_mi)),
        days: interval.days.map(|d| {
            let due = last.performed_on + Duration::days(i64::from(d));
            (due - today).num_days()
        }),
        hours: match (interval.engine_hours, last.engine_hours, engine_hours) {
            (Some(every), Some(at), Some(now)) => Some(signed_diff(at.saturating_add(every), now)),
            _ => None,
        },
    }
}

fn describe(value: Option<i64>, unit: &str) -> Option<String> {
    value.map(|v| {
        if v < 0 {
            format!("{} {unit} overdue", v.unsigned_abs())
        } else {
            format!("due in {v} {unit}")
        }
    })
}

/// Alerts for every item that is due soon, overdue or has no history.
///
/// Sorted overdue first, then due soon, then no history; item order
/// breaks ties.
pub fn predict_maintenance(
    odometer_mi: u64,
    engine_hours: Option<u64>,
    history: &[ServiceRecord],
    settings: &MaintenanceSettings,
    today: NaiveDate,
) -> Vec<MaintenanceAlert> {
    let warn_miles = i64::try_from(settings.warning_miles).unwrap_or(i64::MAX);
    let warn_days = i64::from(settings.warning_days);
    let warn_hours = i64::try_from(ENGINE_HOURS_WARNING).unwrap_or(i64::MAX);

    let mut alerts: Vec<MaintenanceAlert> = MaintenanceItem::all()
        .iter()
        .filter_map(|&item| {
            let Some(last) = latest(history, item) else {
                return Some(MaintenanceAlert {
                    item,
                    status: AlertStatus::NoHistory,
                    miles_remaining: None,
                    days_remaining: None,
                    engine_hours_remaining: None,
                    last_service: None,
                    message: format!("{}: no service on record", item.display_name()),
                });
            };

            let left = remaining(settings.interval_for(item), last, odometer_mi, engine_hours, today);
            let values = [left.miles, left.days, left.hours];
            let status = if values.iter().flatten().any(|v| *v < 0) {
                AlertStatus::Overdue
            } else if left.miles.is_some_and(|m| m <= warn_miles)
                || left.days.is_some_and(|d| d <= warn_days)
                || left.hours.is_some_and(|h| h <= warn_hours)
            {
                AlertStatus::DueSoon
            } else {
                return None;
            };

            let parts: Vec<String> = [
                describe(left.miles, "mi"),
                describe(left.days, "days"),
                describe(left.hours, "engine hours"),
            ]
            .into_iter()
            .flatten()
            .collect();

            Some(MaintenanceAlert {
                item,
                status,
                miles_remaining: left.miles,
                days_remaining: left.days,
                engine_hours_remaining: left.hours,
                last_service: Some(last.clone()),
                message: format!(
                    "{} {}: {}",
                    item.display_name(),
                    status.display_name().to_lowercase(),
                    parts.join(", ")
                ),
            })
        })
        .collect();

    alerts.sort_by_key(|a| a.status);
    debug!(alerts = alerts.len(), odometer_mi, "Maintenance predicted");
    alerts
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn day(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, d).unwrap()
    }

    fn record(item: MaintenanceItem, on: NaiveDate, odometer_mi: u64) -> ServiceRecord {
        ServiceRecord {
            item,
            performed_on: on,
            odometer_mi,
            engine_hours: None,
            shop: None,
            cost_usd: None,
        }
    }

    fn full_history(on: NaiveDate, odometer_mi: u64) -> Vec<ServiceRecord> {
        MaintenanceItem::all()
            .iter()
            .map(|item| record(*item, on, odometer_mi))
            .collect()
    }

    #[test]
    fn test_fresh_service_has_no_alerts() {
        let history = full_history(day(6, 1), 100_000);
        let alerts =
            predict_maintenance(101_000, None, &history, &MaintenanceSettings::default(), day(6, 10));
        assert!(alerts.is_empty());
    }

    #[test]
    fn test_oil_due_soon_by_miles() {
        let history = full_history(day(6, 1), 100_000);
        let alerts =
            predict_maintenance(124_500, None, &history, &MaintenanceSettings::default(), day(6, 20));

        assert_eq!(alerts.len(), 1);
        let oil = &alerts[0];
        assert_eq!(oil.item, MaintenanceItem::OilChange);
        assert_eq!(oil.status, AlertStatus::DueSoon);
        assert_eq!(oil.miles_remaining, Some(500));
        assert!(oil.message.contains("due in 500 mi"));
    }

    #[test]
    fn test_overdue_by_days() {
        let history = full_history(day(1, 2), 100_000);
        let alerts =
            predict_maintenance(100_100, None, &history, &MaintenanceSettings::default(), day(6, 1));

        let oil = alerts
            .iter()
            .find(|a| a.item == MaintenanceItem::OilChange)
            .unwrap();
        assert_eq!(oil.status, AlertStatus::Overdue);
        assert!(oil.days_remaining.unwrap() < 0);
        assert!(oil.message.contains("days overdue"));
        assert_eq!(alerts[0].status, AlertStatus::Overdue);
    }

    #[test]
    fn test_engine_hours() {
        let mut history = full_history(day(6, 1), 100_000);
        for r in &mut history {
            r.engine_hours = Some(2_000);
        }
        let alerts = predict_maintenance(
            100_500,
            Some(2_460),
            &history,
            &MaintenanceSettings::default(),
            day(6, 5),
        );
        let oil = &alerts[0];
        assert_eq!(oil.item, MaintenanceItem::OilChange);
        assert_eq!(oil.engine_hours_remaining, Some(40));
        assert_eq!(oil.status, AlertStatus::DueSoon);
    }

    #[test]
    fn test_uses_latest_record_and_overrides() {
        let history = vec![
            record(MaintenanceItem::Brakes, day(1, 1), 50_000),
            record(MaintenanceItem::Brakes, day(5, 1), 80_000),
        ];
        let mut settings = MaintenanceSettings::default();
        settings.intervals.insert(
            MaintenanceItem::Brakes,
            ServiceInterval::new(Some(10_000), None, None),
        );

        let alerts = predict_maintenance(89_500, None, &history, &settings, day(5, 10));
        let brakes = alerts
            .iter()
            .find(|a| a.item == MaintenanceItem::Brakes)
            .unwrap();
        assert_eq!(brakes.miles_remaining, Some(500));
        assert_eq!(brakes.last_service.as_ref().unwrap().odometer_mi, 80_000);
    }

    #[test]
    fn test_missing_history_sorts_last() {
        let history = vec![record(MaintenanceItem::OilChange, day(1, 1), 0)];
        let alerts =
            predict_maintenance(30_000, None, &history, &MaintenanceSettings::default(), day(2, 1));

        assert_eq!(alerts[0].item, MaintenanceItem::OilChange);
        assert_eq!(alerts[0].status, AlertStatus::Overdue);
        assert_eq!(alerts.len(), MaintenanceItem::all().len());
        assert!(alerts[1..].iter().all(|a| a.status == AlertStatus::NoHistory));
    }
}
