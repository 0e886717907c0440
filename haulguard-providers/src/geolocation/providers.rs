//! Geolocation provider implementations.

use async_trait::async_trait;
use haulguard_core::{ApiConfig, ProviderRequest, ProviderResponse};
use haulguard_fetch::{ApiProvider, FetchContext, FetchError, ResponseExt};
use tracing::{debug, instrument};

use super::descriptor::{ip_api_descriptor, ipapi_co_descriptor, ipgeolocation_descriptor};
use super::parser::{IpApiCoResponse, IpApiResponse, IpGeolocationResponse};

// ============================================================================
// ipgeolocation.io
// ============================================================================

/// ipgeolocation.io lookup (`apiKey` query parameter).
#[derive(Debug, Clone)]
pub struct IpGeolocationProvider {
    config: ApiConfig,
}

impl IpGeolocationProvider {
    /// Creates the provider from a descriptor.
    pub fn new(config: ApiConfig) -> Self {
        Self { config }
    }
}

impl Default for IpGeolocationProvider {
    fn default() -> Self {
        Self::new(ipgeolocation_descriptor())
    }
}

#[async_trait]
impl ApiProvider for IpGeolocationProvider {
    fn config(&self) -> &ApiConfig {
        &self.config
    }

    #[instrument(skip(self, request, ctx), fields(provider = %self.config.name))]
    async fn fetch(
        &self,
        request: &ProviderRequest,
        ctx: &FetchContext,
    ) -> Result<ProviderResponse, FetchError> {
        if !matches!(request, ProviderRequest::Location) {
            return Err(self.unsupported(request));
        }
        let key = self.require_key()?;
        debug!("Looking up location");

        let response = ctx
            .http
            .get_with_query(&self.config.base_url, &[("apiKey", key.to_string())])
            .await?;
        let body: IpGeolocationResponse = response.json_or_error().await?;

        Ok(ProviderResponse::Location(body.into_location(self.id())?))
    }
}

// ============================================================================
// ip-api.com
// ============================================================================

/// ip-api.com lookup (no key).
#[derive(Debug, Clone)]
pub struct IpApiProvider {
    config: ApiConfig,
}

impl IpApiProvider {
    /// Creates the provider from a descriptor.
    pub fn new(config: ApiConfig) -> Self {
        Self { config }
    }
}

impl Default for IpApiProvider {
    fn default() -> Self {
        Self::new(ip_api_descriptor())
    }
}

#[async_trait]
impl ApiProvider for IpApiProvider {
    fn config(&self) -> &ApiConfig {
        &self.config
    }

    #[instrument(skip(self, request, ctx), fields(provider = %self.config.name))]
    async fn fetch(
        &self,
        request: &ProviderRequest,
        ctx: &FetchContext,
    ) -> Result<ProviderResponse, FetchError> {
        if !matches!(request, ProviderRequest::Location) {
            return Err(self.unsupported(request));
        }

        let response = ctx
            .http
            .get_with_query(
                &self.config.base_url,
                &[("fields", "status,message,country,regionName,city,lat,lon".to_string())],
            )
            .await?;
        let body: IpApiResponse = response.json_or_error().await?;

        Ok(ProviderResponse::Location(body.into_location(self.id())?))
    }
}

// ============================================================================
// ipapi.co
// ============================================================================

/// ipapi.co lookup (no key).
#[derive(Debug, Clone)]
pub struct IpApiCoProvider {
    config: ApiConfig,
}

impl IpApiCoProvider {
    /// Creates the provider from a descriptor.
    pub fn new(config: ApiConfig) -> Self {
        Self { config }
    }
}

impl Default for IpApiCoProvider {
    fn default() -> Self {
        Self::new(ipapi_co_descriptor())
    }
}

#[async_trait]
impl ApiProvider for IpApiCoProvider {
    fn config(&self) -> &ApiConfig {
        &self.config
    }

    #[instrument(skip(self, request, ctx), fields(provider = %self.config.name))]
    async fn fetch(
        &self,
        request: &ProviderRequest,
        ctx: &FetchContext,
    ) -> Result<ProviderResponse, FetchError> {
        if !matches!(request, ProviderRequest::Location) {
            return Err(self.unsupported(request));
        }

        let response = ctx.http.get(&self.config.base_url).await?;
        let body: IpApiCoResponse = response.json_or_error().await?;

        Ok(ProviderResponse::Location(body.into_location(self.id())?))
    }
}

// ============================================================================
// Tests
// ============================================================================
