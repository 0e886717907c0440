//! Weather response parsers.

use chrono::{DateTime, NaiveDateTime, Utc};
use haulguard_core::{ResponseSource, WeatherData};
use haulguard_fetch::FetchError;
use serde::Deserialize;
use tracing::debug;

use super::METERS_PER_MILE;

// ============================================================================
// OpenWeatherMap
// ============================================================================

/// Response from OpenWeatherMap `/data/2.5/weather`.
#[derive(Debug, Deserialize)]
pub struct OpenWeatherMapResponse {
    #[serde(default)]
    weather: Vec<OwmCondition>,
    main: OwmMain,
    #[serde(default)]
    wind: Option<OwmWind>,
    /// Visibility in meters.
    #[serde(default)]
    visibility: Option<f64>,
    /// Observation time, unix seconds.
    #[serde(default)]
    dt: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct OwmCondition {
    main: String,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OwmMain {
    temp: f64,
    #[serde(default)]
    feels_like: Option<f64>,
    #[serde(default)]
    humidity: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OwmWind {
    #[serde(default)]
    speed: Option<f64>,
}

impl OpenWeatherMapResponse {
    /// Converts to [`WeatherData`]. `now` stands in for a missing `dt`.
    pub fn into_weather(self, provider: &str, now: DateTime<Utc>) -> WeatherData {
        let condition = self.weather.into_iter().next();
        let observed_at = self
            .dt
            .and_then(|ts| DateTime::from_timestamp(ts, 0))
            .unwrap_or(now);

        let data = WeatherData {
            temperature_f: self.main.temp,
            feels_like_f: self.main.feels_like,
            humidity_pct: self.main.humidity,
            wind_speed_mph: self.wind.and_then(|w| w.speed),
            conditions: condition
                .as_ref()
                .map_or_else(|| "Unknown".to_string(), |c| c.main.clone()),
            description: condition.and_then(|c| c.description),
            visibility_mi: self.visibility.map(|m| m / METERS_PER_MILE),
            observed_at,
            source: ResponseSource::Provider(provider.to_string()),
        };
        debug!(provider, conditions = %data.conditions, temp = data.temperature_f, "Parsed weather");
        data
    }
}

// ============================================================================
// Open-Meteo
// ============================================================================

/// Response from Open-Meteo `/v1/forecast?current=...`.
#[derive(Debug, Deserialize)]
pub struct OpenMeteoResponse {
    current: Option<OpenMeteoCurrent>,
}

#[derive(Debug, Deserialize)]
struct OpenMeteoCurrent {
    #[serde(default)]
    time: Option<String>,
    temperature_2m: f64,
    #[serde(default)]
    relative_humidity_2m: Option<f64>,
    #[serde(default)]
    apparent_temperature: Option<f64>,
    #[serde(default)]
    weather_code: Option<u16>,
    #[serde(default)]
    wind_speed_10m: Option<f64>,
    #[serde(default)]
    visibility: Option<f64>,
}

impl OpenMeteoResponse {
    /// Converts to [`WeatherData`]. Fails when the `current` block is
    /// missing.
    pub fn into_weather(self, provider: &str, now: DateTime<Utc>) -> Result<WeatherData, FetchError> {
        let current = self.current.ok_or_else(|| {
            FetchError::InvalidResponse(format!("{provider} returned no current block"))
        })?;

        // Times are local to the requested timezone, which is GMT by default.
        let observed_at = current
            .time
            .as_deref()
            .and_then(|t| NaiveDateTime::parse_from_str(t, "%Y-%m-%dT%H:%M").ok())
            .map_or(now, |naive| naive.and_utc());

        let (conditions, description) = current
            .weather_code
            .map_or(("Unknown", None), |code| {
                let (main, detail) = wmo_description(code);
                (main, Some(detail.to_string()))
            });

        Ok(WeatherData {
            temperature_f: current.temperature_2m,
            feels_like_f: current.apparent_temperature,
            humidity_pct: current.relative_humidity_2m,
            wind_speed_mph: current.wind_speed_10m,
            conditions: conditions.to_string(),
            description,
            visibility_mi: current.visibility.map(|m| m / METERS_PER_MILE),
            observed_at,
            source: ResponseSource::Provider(provider.to_string()),
        })
    }
}

/// Maps a WMO weather interpretation code to `(conditions, description)`.
pub fn wmo_description(code: u16) -> (&'static str, &'static str) {
    match code {
        0 => ("Clear", "clear sky"),
        1 => ("Clear", "mainly clear"),
        2 => ("Clouds", "partly cloudy"),
        3 => ("Clouds", "overcast"),
        45 | 48 => ("Fog", "fog"),
        51 | 53 | 55 => ("Drizzle", "drizzle"),
        56 | 57 => ("Freezing Drizzle", "freezing drizzle"),
        61 | 63 => ("Rain", "rain"),
        65 => ("Heavy Rain", "heavy rain"),
        66 | 67 => ("Freezing Rain", "freezing rain"),
        71 | 73 => ("Snow", "snow"),
        75 => ("Heavy Snow", "heavy snow"),
        77 => ("Snow", "snow grains"),
        80 | 81 => ("Rain", "rain showers"),
        82 => ("Heavy Rain", "violent rain showers"),
        85 | 86 => ("Snow", "snow showers"),
        95 => ("Thunderstorm", "thunderstorm"),
        96 | 99 => ("Thunderstorm", "thunderstorm with hail"),
        _ => ("Unknown", "unknown"),
    }
}

// ============================================================================
// Tests
// ============================================================================
