//! CarMD diagnostics provider.

use async_trait::async_trait;
use haulguard_core::{
    ApiConfig, Capability, DiagnosticReport, ProviderRequest, ProviderResponse, ProviderTier,
    RateLimits, ResponseSource,
};
use haulguard_fetch::{ApiProvider, FetchContext, FetchError, ResponseExt};
use reqwest::header::{HeaderMap, HeaderValue};
use tracing::{debug, instrument};

use super::parser::CarMdResponse;

/// CarMD v3 diagnostics. Trial plans allow very few calls.
pub fn carmd_descriptor() -> ApiConfig {
    ApiConfig::new(
        "carmd",
        "CarMD",
        "https://api.carmd.com/v3.0/diag",
        ProviderTier::Primary,
        RateLimits::new(10, 100),
    )
    .with_capability(Capability::Diagnostics)
    .requiring_key()
    .with_cost_per_call(0.10)
}

/// CarMD lookup, one HTTP call per trouble code.
#[derive(Debug, Clone)]
pub struct CarMdProvider {
    config: ApiConfig,
}

impl CarMdProvider {
    /// Creates the provider from a descriptor.
    pub fn new(config: ApiConfig) -> Self {
        Self { config }
    }

    fn headers(&self) -> Result<HeaderMap, FetchError> {
        let credential = self.require_key()?;
        let (authorization, partner_token) = credential.split_once(':').ok_or_else(|| {
            FetchError::AuthenticationFailed(
                "carmd key must be <authorization>:<partner-token>".to_string(),
            )
        })?;

        let invalid = |e: reqwest::header::InvalidHeaderValue| {
            FetchError::AuthenticationFailed(format!("invalid carmd credential: {e}"))
        };
        let mut headers = HeaderMap::new();
        headers.insert(
            "authorization",
            HeaderValue::from_str(&format!("Basic {authorization}")).map_err(invalid)?,
        );
        headers.insert("partner-token", HeaderValue::from_str(partner_token).map_err(invalid)?);
        Ok(headers)
    }
}

impl Default for CarMdProvider {
    fn default() -> Self {
        Self::new(carmd_descriptor())
    }
}

#[async_trait]
impl ApiProvider for CarMdProvider {
    fn config(&self) -> &ApiConfig {
        &self.config
    }

    fn can_handle(&self, request: &ProviderRequest) -> bool {
        matches!(
            request,
            ProviderRequest::Diagnostics { vin: Some(vin), codes, .. } if !vin.is_empty() && !codes.is_empty()
        )
    }

    #[instrument(skip(self, request, ctx), fields(provider = %self.config.name))]
    async fn fetch(
        &self,
        request: &ProviderRequest,
        ctx: &FetchContext,
    ) -> Result<ProviderResponse, FetchError> {
        let ProviderRequest::Diagnostics {
            codes,
            vin: Some(vin),
            mileage,
        } = request
        else {
            return Err(self.unsupported(request));
        };
        let headers = self.headers()?;

        let mut findings = Vec::with_capacity(codes.len());
        for code in codes {
            debug!(code = %code, "Looking up trouble code");
            let mut query = vec![("vin", vin.clone()), ("dtc", code.clone())];
            if let Some(mileage) = mileage {
                query.push(("mileage", mileage.to_string()));
            }

            let response = ctx
                .http
                .get_with_headers(&self.config.base_url, &query, headers.clone())
                .await?;
            let body: CarMdResponse = response.json_or_error().await?;
            findings.extend(body.into_findings()?);
        }

        Ok(ProviderResponse::Diagnostics(DiagnosticReport::new(
            findings,
            ResponseSource::Provider(self.id().to_string()),
            ctx.clock.now(),
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(vin: Option<&str>) -> ProviderRequest {
        ProviderRequest::Diagnostics {
            codes: vec!["P0300".to_string()],
            vin: vin.map(str::to_string),
            mileage: Some(412_000),
        }
    }

    #[test]
    fn test_requires_vin() {
        let provider = CarMdProvider::default();
        assert!(provider.can_handle(&request(Some("1FUJGLDR12LM12345"))));
        assert!(!provider.can_handle(&request(None)));
        assert!(!provider.can_handle(&request(Some(""))));
    }

    #[test]
    fn test_headers_need_both_parts() {
        let provider = CarMdProvider::new(carmd_descriptor().with_api_key("only-one-part"));
        assert!(matches!(
            provider.headers(),
            Err(FetchError::AuthenticationFailed(_))
        ));

        let provider = CarMdProvider::new(carmd_descriptor().with_api_key("abc:def"));
        let headers = provider.headers().unwrap();
        assert_eq!(headers["authorization"], "Basic abc");
        assert_eq!(headers["partner-token"], "def");
    }
}
