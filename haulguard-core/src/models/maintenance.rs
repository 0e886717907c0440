//! Maintenance history and service intervals.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

// ============================================================================
// Maintenance Item
// ============================================================================

/// A serviceable component with a recurring interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaintenanceItem {
    /// Engine oil and filter.
    OilChange,
    /// Tire inspection and rotation.
    Tires,
    /// Brake inspection and adjustment.
    Brakes,
    /// Diesel particulate filter cleaning.
    Dpf,
    /// Transmission fluid change.
    TransmissionFluid,
    /// Coolant flush.
    Coolant,
    /// Engine air filter.
    AirFilter,
}

impl MaintenanceItem {
    /// Returns all items.
    pub fn all() -> &'static [MaintenanceItem] {
        &[
            Self::OilChange,
            Self::Tires,
            Self::Brakes,
            Self::Dpf,
            Self::TransmissionFluid,
            Self::Coolant,
            Self::AirFilter,
        ]
    }

    /// Stable identifier used in config and JSON.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OilChange => "oil_change",
            Self::Tires => "tires",
            Self::Brakes => "brakes",
            Self::Dpf => "dpf",
            Self::TransmissionFluid => "transmission_fluid",
            Self::Coolant => "coolant",
            Self::AirFilter => "air_filter",
        }
    }

    /// Human-readable name.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::OilChange => "Oil change",
            Self::Tires => "Tire rotation",
            Self::Brakes => "Brake inspection",
            Self::Dpf => "DPF cleaning",
            Self::TransmissionFluid => "Transmission fluid",
            Self::Coolant => "Coolant flush",
            Self::AirFilter => "Air filter",
        }
    }

    /// Typical Class 8 interval for this item.
    pub fn default_interval(&self) -> ServiceInterval {
        match self {
            Self::OilChange => ServiceInterval::new(Some(25_000), Some(90), Some(500)),
            Self::Tires => ServiceInterval::new(Some(50_000), Some(180), None),
            Self::Brakes => ServiceInterval::new(Some(30_000), Some(90), None),
            Self::Dpf => ServiceInterval::new(Some(200_000), Some(365), Some(4_500)),
            Self::TransmissionFluid => ServiceInterval::new(Some(250_000), Some(730), None),
            Self::Coolant => ServiceInterval::new(Some(300_000), Some(730), None),
            Self::AirFilter => ServiceInterval::new(Some(50_000), Some(365), None),
        }
    }
}

impl fmt::Display for MaintenanceItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for MaintenanceItem {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "oil" | "oil_change" => Ok(Self::OilChange),
            "tires" | "tyres" | "tire_rotation" => Ok(Self::Tires),
            "brakes" => Ok(Self::Brakes),
            "dpf" => Ok(Self::Dpf),
            "transmission" | "transmission_fluid" => Ok(Self::TransmissionFluid),
            "coolant" => Ok(Self::Coolant),
            "air_filter" => Ok(Self::AirFilter),
            _ => Err(CoreError::InvalidData(format!(
                "unknown maintenance item: {s}"
            ))),
        }
    }
}

// ============================================================================
// Intervals
// ============================================================================

/// How often an item is due. Whichever limit is reached first applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceInterval {
    /// Miles between services.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub miles: Option<u64>,
    /// Days between services.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub days: Option<u32>,
    /// Engine hours between services.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engine_hours: Option<u64>,
}

impl ServiceInterval {
    /// Creates an interval.
    pub const fn new(miles: Option<u64>, days: Option<u32>, engine_hours: Option<u64>) -> Self {
        Self {
            miles,
            days,
            engine_hours,
        }
    }
}

// ============================================================================
// History
// ============================================================================

/// One completed service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceRecord {
    /// What was serviced.
    pub item: MaintenanceItem,
    /// Day the work was done.
    pub performed_on: NaiveDate,
    /// Odometer reading at the time.
    pub odometer_mi: u64,
    /// Engine hours at the time, if recorded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engine_hours: Option<u64>,
    /// Shop that did the work.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shop: Option<String>,
    /// Invoice total.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost_usd: Option<f64>,
}

/// A shop the driver likes to use.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceShop {
    /// Shop name.
    pub name: String,
    /// City or address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Phone number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// Alert thresholds and interval overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaintenanceSettings {
    /// Warn this many miles before an item is due.
    #[serde(default = "default_warning_miles")]
    pub warning_miles: u64,
    /// Warn this many days before an item is due.
    #[serde(default = "default_warning_days")]
    pub warning_days: u32,
    /// Per-item intervals replacing the defaults.
    #[serde(default)]
    pub intervals: BTreeMap<MaintenanceItem, ServiceInterval>,
}

fn default_warning_miles() -> u64 {
    1_000
}

fn default_warning_days() -> u32 {
    14
}

impl Default for MaintenanceSettings {
    fn default() -> Self {
        Self {
            warning_miles: default_warning_miles(),
            warning_days: default_warning_days(),
            intervals: BTreeMap::new(),
        }
    }
}

impl MaintenanceSettings {
    /// Interval for `item`: the override if set, else the default.
    pub fn interval_for(&self, item: MaintenanceItem) -> ServiceInterval {
        self.intervals
            .get(&item)
            .copied()
            .unwrap_or_else(|| item.default_interval())
    }
}

// ============================================================================
// Tests
// ============================================================================
