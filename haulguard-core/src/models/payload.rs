//! Request and response payloads for each capability.
//!
//! Every provider call is described by a [`ProviderRequest`] and answered
//! with a [`ProviderResponse`]. Both are tagged by [`Capability`] so the
//! fallback layer can route, cache and type-check them uniformly.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::provider::Capability;
use crate::error::CoreError;

// ============================================================================
// Response Source
// ============================================================================

/// Where an answer came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "provider", rename_all = "snake_case")]
pub enum ResponseSource {
    /// A named external provider.
    Provider(String),
    /// The on-device locator (GPS).
    Device,
    /// Local rule-based logic.
    RuleBased,
    /// A previously remembered value.
    LastKnown,
}

impl fmt::Display for ResponseSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Provider(name) => write!(f, "{name}"),
            Self::Device => f.write_str("device"),
            Self::RuleBased => f.write_str("rule-based"),
            Self::LastKnown => f.write_str("last known"),
        }
    }
}

// ============================================================================
// Location
// ============================================================================

/// A position fix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
    /// City name, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    /// State / region, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    /// Country, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    /// Estimated accuracy radius in meters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accuracy_m: Option<f64>,
    /// Where the fix came from.
    pub source: ResponseSource,
}

impl Location {
    /// Creates a bare coordinate fix.
    pub fn new(latitude: f64, longitude: f64, source: ResponseSource) -> Self {
        Self {
            latitude,
            longitude,
            city: None,
            region: None,
            country: None,
            accuracy_m: None,
            source,
        }
    }

    /// Returns true if the coordinate lies on the globe.
    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.latitude) && (-180.0..=180.0).contains(&self.longitude)
    }

    /// Returns "City, Region" or the raw coordinate.
    pub fn display_name(&self) -> String {
        match (&self.city, &self.region) {
            (Some(city), Some(region)) => format!("{city}, {region}"),
            (Some(city), None) => city.clone(),
            _ => format!("{:.4}, {:.4}", self.latitude, self.longitude),
        }
    }
}

// ============================================================================
// Weather
// ============================================================================

/// Conditions that matter to a loaded truck.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeatherHazard {
    /// Temperature at or below freezing with moisture.
    Ice,
    /// Sustained wind strong enough to push a high-profile vehicle.
    HighWind,
    /// Visibility under one mile.
    LowVisibility,
    /// Heavy rain, snow or thunderstorms.
    HeavyPrecipitation,
    /// Extreme heat (tires, brakes, reefer load).
    ExtremeHeat,
}

impl WeatherHazard {
    /// Short driver-facing advice.
    pub fn advice(&self) -> &'static str {
        match self {
            Self::Ice => "Possible ice: increase following distance and avoid sudden braking",
            Self::HighWind => "High wind: empty and high-profile trailers at rollover risk",
            Self::LowVisibility => "Low visibility: reduce speed and use low beams",
            Self::HeavyPrecipitation => "Heavy precipitation: expect reduced traction and delays",
            Self::ExtremeHeat => "Extreme heat: check tire pressure and reefer temperature",
        }
    }
}

/// Current conditions at a coordinate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherData {
    /// Air temperature in °F.
    pub temperature_f: f64,
    /// Apparent temperature in °F.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feels_like_f: Option<f64>,
    /// Relative humidity percent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub humidity_pct: Option<f64>,
    /// Wind speed in mph.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wind_speed_mph: Option<f64>,
    /// Short condition label (e.g. "Snow").
    pub conditions: String,
    /// Longer description, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Visibility in miles.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility_mi: Option<f64>,
    /// Observation time.
    pub observed_at: DateTime<Utc>,
    /// Where the data came from.
    pub source: ResponseSource,
}

/// Wind above this speed (mph) is flagged for high-profile vehicles.
const HIGH_WIND_MPH: f64 = 30.0;

/// Visibility below this (miles) is flagged.
const LOW_VISIBILITY_MI: f64 = 1.0;

/// Temperature at or above this (°F) is flagged.
const EXTREME_HEAT_F: f64 = 100.0;

impl WeatherData {
    /// Rule-based hazard detection for the current conditions.
    pub fn driving_hazards(&self) -> Vec<WeatherHazard> {
        let mut hazards = Vec::new();
        let conditions = self.conditions.to_ascii_lowercase();
        let wet = ["snow", "sleet", "rain", "drizzle", "freezing", "ice", "hail"]
            .iter()
            .any(|w| conditions.contains(w));

        if self.temperature_f <= 32.0 && (wet || self.humidity_pct.is_some_and(|h| h >= 90.0)) {
            hazards.push(WeatherHazard::Ice);
        }
        if self.wind_speed_mph.is_some_and(|w| w >= HIGH_WIND_MPH) {
            hazards.push(WeatherHazard::HighWind);
        }
        if self.visibility_mi.is_some_and(|v| v < LOW_VISIBILITY_MI)
            || conditions.contains("fog")
        {
            hazards.push(WeatherHazard::LowVisibility);
        }
        if ["heavy", "thunder", "blizzard", "storm"]
            .iter()
            .any(|w| conditions.contains(w))
        {
            hazards.push(WeatherHazard::HeavyPrecipitation);
        }
        if self.temperature_f >= EXTREME_HEAT_F {
            hazards.push(WeatherHazard::ExtremeHeat);
        }

        hazards
    }
}

// ============================================================================
// Diagnostics
// ============================================================================

/// How urgent a finding is. Ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational only.
    Info,
    /// Schedule service soon.
    Low,
    /// Service at the next stop.
    Medium,
    /// Stop driving as soon as it is safe.
    High,
    /// Pull over now.
    Critical,
}

impl Severity {
    /// Returns the display name for this severity.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Vehicle subsystem a trouble code belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VehicleSystem {
    /// Fuel and air metering.
    FuelAir,
    /// Ignition and misfire.
    Ignition,
    /// Emissions controls (EGR, DPF, SCR).
    Emissions,
    /// Vehicle speed and idle control.
    SpeedIdle,
    /// Computer and output circuits.
    Computer,
    /// Transmission.
    Transmission,
    /// Chassis (brakes, ABS, steering).
    Chassis,
    /// Body (airbags, HVAC, lighting).
    Body,
    /// Network / communication bus.
    Network,
    /// Not determined.
    Unknown,
}

impl VehicleSystem {
    /// Returns the display name for this system.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::FuelAir => "Fuel & air metering",
            Self::Ignition => "Ignition / misfire",
            Self::Emissions => "Emissions controls",
            Self::SpeedIdle => "Speed & idle control",
            Self::Computer => "Computer & output circuits",
            Self::Transmission => "Transmission",
            Self::Chassis => "Chassis",
            Self::Body => "Body",
            Self::Network => "Network",
            Self::Unknown => "Unknown",
        }
    }
}

/// Analysis of a single trouble code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticFinding {
    /// Normalized code (e.g. `P0300`).
    pub code: String,
    /// What the code means.
    pub description: String,
    /// How urgent it is.
    pub severity: Severity,
    /// Affected subsystem.
    pub system: VehicleSystem,
    /// What the driver should do.
    pub recommended_action: String,
    /// Rough repair cost estimate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_cost_usd: Option<f64>,
}

/// Result of analyzing a set of trouble codes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticReport {
    /// One finding per code.
    pub findings: Vec<DiagnosticFinding>,
    /// Highest severity across findings.
    pub overall: Severity,
    /// Where the analysis came from.
    pub source: ResponseSource,
    /// When the report was produced.
    pub generated_at: DateTime<Utc>,
}

impl DiagnosticReport {
    /// Builds a report, deriving `overall` from the findings.
    pub fn new(
        findings: Vec<DiagnosticFinding>,
        source: ResponseSource,
        generated_at: DateTime<Utc>,
    ) -> Self {
        let overall = findings
            .iter()
            .map(|f| f.severity)
            .max()
            .unwrap_or(Severity::Info);
        Self {
            findings,
            overall,
            source,
            generated_at,
        }
    }

    /// Total estimated repair cost of findings that carry one.
    pub fn estimated_total_usd(&self) -> f64 {
        self.findings
            .iter()
            .filter_map(|f| f.estimated_cost_usd)
            .sum()
    }

    /// Returns true if the driver should stop.
    pub fn requires_stop(&self) -> bool {
        self.overall >= Severity::High
    }
}

// ============================================================================
// Chat
// ============================================================================

/// An answer from the driver assistant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatReply {
    /// The answer text.
    pub text: String,
    /// Where the answer came from.
    pub source: ResponseSource,
    /// Follow-up questions the driver might ask.
    #[serde(default)]
    pub suggestions: Vec<String>,
}

// ============================================================================
// Request / Response Envelopes
// ============================================================================

/// A capability-tagged provider request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "capability", rename_all = "lowercase")]
pub enum ProviderRequest {
    /// Look up the caller's position.
    #[serde(rename = "geolocation")]
    Location,
    /// Current weather at a coordinate.
    Weather {
        /// Latitude in degrees.
        lat: f64,
        /// Longitude in degrees.
        lon: f64,
    },
    /// Analyze trouble codes.
    Diagnostics {
        /// Raw codes as entered or read from the ECU.
        codes: Vec<String>,
        /// Vehicle identification number.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        vin: Option<String>,
        /// Current odometer reading.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        mileage: Option<u64>,
    },
    /// Driver assistant completion.
    #[serde(rename = "nlp")]
    Chat {
        /// The driver's question.
        prompt: String,
        /// Extra context (HOS state, load info) as free text.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        context: Option<String>,
    },
}

impl ProviderRequest {
    /// The capability this request needs.
    pub fn capability(&self) -> Capability {
        match self {
            Self::Location => Capability::Geolocation,
            Self::Weather { .. } => Capability::Weather,
            Self::Diagnostics { .. } => Capability::Diagnostics,
            Self::Chat { .. } => Capability::Nlp,
        }
    }

    /// Logical endpoint name used in cache keys.
    pub fn endpoint(&self) -> &'static str {
        match self {
            Self::Location => "location",
            Self::Weather { .. } => "current",
            Self::Diagnostics { .. } => "diag",
            Self::Chat { .. } => "completion",
        }
    }

    /// Request parameters as JSON, used in cache keys.
    pub fn params(&self) -> serde_json::Value {
        match self {
            Self::Location => serde_json::json!({}),
            Self::Weather { lat, lon } => serde_json::json!({ "lat": lat, "lon": lon }),
            Self::Diagnostics { codes, vin, mileage } => {
                serde_json::json!({ "codes": codes, "vin": vin, "mileage": mileage })
            }
            Self::Chat { prompt, context } => {
                serde_json::json!({ "prompt": prompt, "context": context })
            }
        }
    }
}

/// A capability-tagged provider response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "capability", content = "data", rename_all = "lowercase")]
pub enum ProviderResponse {
    /// A position fix.
    #[serde(rename = "geolocation")]
    Location(Location),
    /// Current conditions.
    Weather(WeatherData),
    /// Trouble code analysis.
    Diagnostics(DiagnosticReport),
    /// Assistant reply.
    #[serde(rename = "nlp")]
    Chat(ChatReply),
}

impl ProviderResponse {
    /// The capability this response answers.
    pub fn capability(&self) -> Capability {
        match self {
            Self::Location(_) => Capability::Geolocation,
            Self::Weather(_) => Capability::Weather,
            Self::Diagnostics(_) => Capability::Diagnostics,
            Self::Chat(_) => Capability::Nlp,
        }
    }

    fn mismatch(&self, expected: Capability) -> CoreError {
        CoreError::CapabilityMismatch {
            expected: expected.to_string(),
            actual: self.capability().to_string(),
        }
    }

    /// Unwraps a location response.
    pub fn into_location(self) -> Result<Location, CoreError> {
        match self {
            Self::Location(l) => Ok(l),
            other => Err(other.mismatch(Capability::Geolocation)),
        }
    }

    /// Unwraps a weather response.
    pub fn into_weather(self) -> Result<WeatherData, CoreError> {
        match self {
            Self::Weather(w) => Ok(w),
            other => Err(other.mismatch(Capability::Weather)),
        }
    }

    /// Unwraps a diagnostics response.
    pub fn into_diagnostics(self) -> Result<DiagnosticReport, CoreError> {
        match self {
            Self::Diagnostics(d) => Ok(d),
            other => Err(other.mismatch(Capability::Diagnostics)),
        }
    }

    /// Unwraps a chat response.
    pub fn into_chat(self) -> Result<ChatReply, CoreError> {
        match self {
            Self::Chat(c) => Ok(c),
            other => Err(other.mismatch(Capability::Nlp)),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn weather(temp: f64, conditions: &str) -> WeatherData {
        WeatherData {
            temperature_f: temp,
            feels_like_f: None,
            humidity_pct: None,
            wind_speed_mph: None,
            conditions: conditions.to_string(),
            description: None,
            visibility_mi: None,
            observed_at: Utc::now(),
            source: ResponseSource::RuleBased,
        }
    }

    #[test]
    fn test_ice_hazard() {
        let w = weather(28.0, "Light Snow");
        assert!(w.driving_hazards().contains(&WeatherHazard::Ice));

        let dry = weather(28.0, "Clear");
        assert!(dry.driving_hazards().is_empty());
    }

    #[test]
    fn test_wind_and_fog() {
        let mut w = weather(55.0, "Fog");
        w.wind_speed_mph = Some(42.0);
        let hazards = w.driving_hazards();
        assert!(hazards.contains(&WeatherHazard::HighWind));
        assert!(hazards.contains(&WeatherHazard::LowVisibility));
    }

    #[test]
    fn test_report_overall_severity() {
        let finding = |sev| DiagnosticFinding {
            code: "P0000".to_string(),
            description: String::new(),
            severity: sev,
            system: VehicleSystem::Unknown,
            recommended_action: String::new(),
            estimated_cost_usd: Some(100.0),
        };
        let report = DiagnosticReport::new(
            vec![finding(Severity::Low), finding(Severity::High)],
            ResponseSource::RuleBased,
            Utc::now(),
        );
        assert_eq!(report.overall, Severity::High);
        assert!(report.requires_stop());
        assert!((report.estimated_total_usd() - 200.0).abs() < f64::EPSILON);

        let empty = DiagnosticReport::new(vec![], ResponseSource::RuleBased, Utc::now());
        assert_eq!(empty.overall, Severity::Info);
    }

    #[test]
    fn test_request_capability_and_params() {
        let req = ProviderRequest::Weather { lat: 41.5, lon: -93.6 };
        assert_eq!(req.capability(), Capability::Weather);
        assert_eq!(req.params()["lat"], 41.5);
        assert_eq!(ProviderRequest::Location.params(), serde_json::json!({}));
    }

    #[test]
    fn test_response_unwrap_mismatch() {
        let resp = ProviderResponse::Location(Location::new(1.0, 2.0, ResponseSource::Device));
        assert!(resp.clone().into_location().is_ok());
        let err = resp.into_weather().unwrap_err();
        assert!(err.to_string().contains("expected weather"));
    }

    #[test]
    fn test_location_display_name() {
        let mut loc = Location::new(41.59, -93.62, ResponseSource::Device);
        assert_eq!(loc.display_name(), "41.5900, -93.6200");
        loc.city = Some("Des Moines".to_string());
        loc.region = Some("IA".to_string());
        assert_eq!(loc.display_name(), "Des Moines, IA");
        assert!(loc.is_valid());
    }
}
