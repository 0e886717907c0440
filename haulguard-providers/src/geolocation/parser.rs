//! Geolocation response parsers.
//!
//! Each provider has its own JSON shape; all of them end up as a
//! [`Location`] tagged with the provider name.

use haulguard_core::{Location, ResponseSource};
use haulguard_fetch::FetchError;
use serde::{Deserialize, Deserializer};
use tracing::debug;

use super::IP_FIX_ACCURACY_M;

// ============================================================================
// ipgeolocation.io
// ============================================================================

/// Response from `ipgeolocation.io/ipgeo`.
#[derive(Debug, Deserialize)]
pub struct IpGeolocationResponse {
    /// Latitude; the API sends it as a string.
    #[serde(deserialize_with = "number_or_string")]
    pub latitude: f64,
    /// Longitude; the API sends it as a string.
    #[serde(deserialize_with = "number_or_string")]
    pub longitude: f64,
    #[serde(default)]
    city: Option<String>,
    #[serde(default)]
    state_prov: Option<String>,
    #[serde(default)]
    country_name: Option<String>,
}

impl IpGeolocationResponse {
    /// Converts to a [`Location`].
    pub fn into_location(self, provider: &str) -> Result<Location, FetchError> {
        finish(
            Location {
                city: non_empty(self.city),
                region: non_empty(self.state_prov),
                country: non_empty(self.country_name),
                ..Location::new(self.latitude, self.longitude, source(provider))
            },
            provider,
        )
    }
}

// ============================================================================
// ip-api.com
// ============================================================================

/// Response from `ip-api.com/json`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IpApiResponse {
    status: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    lat: Option<f64>,
    #[serde(default)]
    lon: Option<f64>,
    #[serde(default)]
    city: Option<String>,
    #[serde(default)]
    region_name: Option<String>,
    #[serde(default)]
    country: Option<String>,
}

impl IpApiResponse {
    /// Converts to a [`Location`]. `status: "fail"` becomes an error.
    pub fn into_location(self, provider: &str) -> Result<Location, FetchError> {
        if self.status != "success" {
            return Err(FetchError::InvalidResponse(format!(
                "{provider} lookup failed: {}",
                self.message.as_deref().unwrap_or("no message")
            )));
        }
        let (Some(lat), Some(lon)) = (self.lat, self.lon) else {
            return Err(FetchError::InvalidResponse(format!(
                "{provider} returned no coordinates"
            )));
        };
        finish(
            Location {
                city: non_empty(self.city),
                region: non_empty(self.region_name),
                country: non_empty(self.country),
                ..Location::new(lat, lon, source(provider))
            },
            provider,
        )
    }
}

// ============================================================================
// ipapi.co
// ============================================================================

/// Response from `ipapi.co/json/`.
#[derive(Debug, Deserialize)]
pub struct IpApiCoResponse {
    #[serde(default)]
    error: bool,
    #[serde(default)]
    reason: Option<String>,
    #[serde(default)]
    latitude: Option<f64>,
    #[serde(default)]
    longitude: Option<f64>,
    #[serde(default)]
    city: Option<String>,
    #[serde(default)]
    region: Option<String>,
    #[serde(default)]
    country_name: Option<String>,
}

impl IpApiCoResponse {
    /// Converts to a [`Location`]. `error: true` becomes an error; the
    /// usual reason is `RateLimited`.
    pub fn into_location(self, provider: &str) -> Result<Location, FetchError> {
        if self.error {
            return Err(FetchError::InvalidResponse(format!(
                "{provider} lookup failed: {}",
                self.reason.as_deref().unwrap_or("unknown reason")
            )));
        }
        let (Some(lat), Some(lon)) = (self.latitude, self.longitude) else {
            return Err(FetchError::InvalidResponse(format!(
                "{provider} returned no coordinates"
            )));
        };
        finish(
            Location {
                city: non_empty(self.city),
                region: non_empty(self.region),
                country: non_empty(self.country_name),
                ..Location::new(lat, lon, source(provider))
            },
            provider,
        )
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn source(provider: &str) -> ResponseSource {
    ResponseSource::Provider(provider.to_string())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn finish(mut location: Location, provider: &str) -> Result<Location, FetchError> {
    if !location.is_valid() {
        return Err(FetchError::InvalidResponse(format!(
            "{provider} returned out-of-range coordinates"
        )));
    }
    location.accuracy_m = Some(IP_FIX_ACCURACY_M);
    debug!(provider, place = %location.display_name(), "Parsed location");
    Ok(location)
}

fn number_or_string<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => Ok(n),
        Raw::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ipgeolocation() {
        let json = r#"{
            "ip": "8.8.8.8",
            "city": "Chicago",
            "state_prov": "Illinois",
            "country_name": "United States",
            "latitude": "41.85003",
            "longitude": "-87.65005"
        }"#;
        let response: IpGeolocationResponse = serde_json::from_str(json).unwrap();
        let location = response.into_location("ipgeolocation").unwrap();

        assert!((location.latitude - 41.85003).abs() < 1e-9);
        assert_eq!(location.display_name(), "Chicago, Illinois");
        assert_eq!(location.source, ResponseSource::Provider("ipgeolocation".into()));
        assert_eq!(location.accuracy_m, Some(IP_FIX_ACCURACY_M));
    }

    #[test]
    fn test_parse_ipgeolocation_numeric_coordinates() {
        let json = r#"{"latitude": 35.1, "longitude": -90.0, "city": ""}"#;
        let response: IpGeolocationResponse = serde_json::from_str(json).unwrap();
        let location = response.into_location("ipgeolocation").unwrap();
        assert!(location.city.is_none());
    }

    #[test]
    fn test_parse_ip_api_success() {
        let json = r#"{
            "status": "success",
            "country": "United States",
            "regionName": "Texas",
            "city": "Dallas",
            "lat": 32.7767,
            "lon": -96.797
        }"#;
        let response: IpApiResponse = serde_json::from_str(json).unwrap();
        let location = response.into_location("ip-api").unwrap();
        assert_eq!(location.region.as_deref(), Some("Texas"));
    }

    #[test]
    fn test_parse_ip_api_failure() {
        let json = r#"{"status": "fail", "message": "reserved range"}"#;
        let response: IpApiResponse = serde_json::from_str(json).unwrap();
        let err = response.into_location("ip-api").unwrap_err();
        assert!(err.to_string().contains("reserved range"));
    }

    #[test]
    fn test_parse_ipapi_co_rate_limited() {
        let json = r#"{"error": true, "reason": "RateLimited"}"#;
        let response: IpApiCoResponse = serde_json::from_str(json).unwrap();
        assert!(response.into_location("ipapi.co").is_err());
    }

    #[test]
    fn test_out_of_range_rejected() {
        let json = r#"{"latitude": 123.0, "longitude": 0.0}"#;
        let response: IpApiCoResponse = serde_json::from_str(json).unwrap();
        assert!(response.into_location("ipapi.co").is_err());
    }
}
