//! Weather provider implementations.

use async_trait::async_trait;
use haulguard_core::{ApiConfig, ProviderRequest, ProviderResponse};
use haulguard_fetch::{ApiProvider, FetchContext, FetchError, ResponseExt};
use tracing::{debug, instrument};

use super::descriptor::{open_meteo_descriptor, openweathermap_descriptor};
use super::parser::{OpenMeteoResponse, OpenWeatherMapResponse};

/// Fields requested from Open-Meteo's `current` block.
const OPEN_METEO_FIELDS: &str = "temperature_2m,relative_humidity_2m,apparent_temperature,weather_code,wind_speed_10m,visibility";

// ============================================================================
// OpenWeatherMap
// ============================================================================

/// OpenWeatherMap current weather (`appid` query parameter).
#[derive(Debug, Clone)]
pub struct OpenWeatherMapProvider {
    config: ApiConfig,
}

impl OpenWeatherMapProvider {
    /// Creates the provider from a descriptor.
    pub fn new(config: ApiConfig) -> Self {
        Self { config }
    }
}

impl Default for OpenWeatherMapProvider {
    fn default() -> Self {
        Self::new(openweathermap_descriptor())
    }
}

#[async_trait]
impl ApiProvider for OpenWeatherMapProvider {
    fn config(&self) -> &ApiConfig {
        &self.config
    }

    #[instrument(skip(self, request, ctx), fields(provider = %self.config.name))]
    async fn fetch(
        &self,
        request: &ProviderRequest,
        ctx: &FetchContext,
    ) -> Result<ProviderResponse, FetchError> {
        let ProviderRequest::Weather { lat, lon } = *request else {
            return Err(self.unsupported(request));
        };
        let key = self.require_key()?;
        debug!(lat, lon, "Fetching current weather");

        let query = [
            ("lat", lat.to_string()),
            ("lon", lon.to_string()),
            ("units", "imperial".to_string()),
            ("appid", key.to_string()),
        ];
        let response = ctx.http.get_with_query(&self.config.base_url, &query).await?;
        let body: OpenWeatherMapResponse = response.json_or_error().await?;

        Ok(ProviderResponse::Weather(
            body.into_weather(self.id(), ctx.clock.now()),
        ))
    }
}

// ============================================================================
// Open-Meteo
// ============================================================================

/// Open-Meteo current conditions (no key).
#[derive(Debug, Clone)]
pub struct OpenMeteoProvider {
    config: ApiConfig,
}

impl OpenMeteoProvider {
    /// Creates the provider from a descriptor.
    pub fn new(config: ApiConfig) -> Self {
        Self { config }
    }
}

impl Default for OpenMeteoProvider {
    fn default() -> Self {
        Self::new(open_meteo_descriptor())
    }
}

#[async_trait]
impl ApiProvider for OpenMeteoProvider {
    fn config(&self) -> &ApiConfig {
        &self.config
    }

    #[instrument(skip(self, request, ctx), fields(provider = %self.config.name))]
    async fn fetch(
        &self,
        request: &ProviderRequest,
        ctx: &FetchContext,
    ) -> Result<ProviderResponse, FetchError> {
        let ProviderRequest::Weather { lat, lon } = *request else {
            return Err(self.unsupported(request));
        };
        debug!(lat, lon, "Fetching current weather");

        let query = [
            ("latitude", lat.to_string()),
            ("longitude", lon.to_string()),
            ("current", OPEN_METEO_FIELDS.to_string()),
            ("temperature_unit", "fahrenheit".to_string()),
            ("wind_speed_unit", "mph".to_string()),
        ];
        let response = ctx.http.get_with_query(&self.config.base_url, &query).await?;
        let body: OpenMeteoResponse = response.json_or_error().await?;

        Ok(ProviderResponse::Weather(
            body.into_weather(self.id(), ctx.clock.now())?,
        ))
    }
}

// ============================================================================
// Tests
// ============================================================================
