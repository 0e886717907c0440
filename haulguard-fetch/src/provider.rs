//! Provider trait and reporting types.
//!
//! Every external API (geolocation, weather, diagnostics, NLP) is wrapped
//! in an [`ApiProvider`]. The provider owns its static [`ApiConfig`] and
//! knows how to turn a [`ProviderRequest`] into an HTTP call.

use async_trait::async_trait;
use haulguard_core::{ApiConfig, Capability, ProviderRequest, ProviderResponse, ProviderTier};
use serde::{Deserialize, Serialize};

use crate::context::FetchContext;
use crate::error::FetchError;

// ============================================================================
// Provider Trait
// ============================================================================

/// An external API that answers one or more capabilities.
///
/// ## Implementing a Provider
///
/// ```ignore
/// struct IpApiProvider { config: ApiConfig }
///
/// #[async_trait]
/// impl ApiProvider for IpApiProvider {
///     fn config(&self) -> &ApiConfig {
///         &self.config
///     }
///
///     async fn fetch(
///         &self,
///         request: &ProviderRequest,
///         ctx: &FetchContext,
///     ) -> Result<ProviderResponse, FetchError> {
///         let response = ctx.http.get(&self.config.base_url).await?;
///         // Parse and return ProviderResponse::Location(..)
///     }
/// }
/// ```
#[async_trait]
pub trait ApiProvider: Send + Sync {
    /// Static descriptor (name, tier, limits, capabilities).
    fn config(&self) -> &ApiConfig;

    /// Unique identifier, e.g. `ipgeolocation`.
    fn id(&self) -> &str {
        &self.config().name
    }

    /// Priority tier.
    fn tier(&self) -> ProviderTier {
        self.config().tier
    }

    /// Returns true if this provider serves `capability`.
    fn serves(&self, capability: Capability) -> bool {
        self.config().serves(capability)
    }

    /// Returns true if this provider can answer this particular request.
    ///
    /// Defaults to a capability check. Providers with extra input
    /// requirements (a VIN, say) narrow it further.
    fn can_handle(&self, request: &ProviderRequest) -> bool {
        self.serves(request.capability())
    }

    /// Quick local check (no network): does the provider have a key if it
    /// needs one.
    fn is_available(&self) -> bool {
        self.config().is_configured()
    }

    /// Performs one call against the provider.
    async fn fetch(
        &self,
        request: &ProviderRequest,
        ctx: &FetchContext,
    ) -> Result<ProviderResponse, FetchError>;

    /// Error for a request this provider cannot answer.
    fn unsupported(&self, request: &ProviderRequest) -> FetchError {
        FetchError::Unsupported {
            provider: self.id().to_string(),
            capability: request.capability(),
        }
    }

    /// Returns the API key or a `MissingApiKey` error.
    fn require_key(&self) -> Result<&str, FetchError> {
        self.config()
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| FetchError::MissingApiKey(self.id().to_string()))
    }
}

// ============================================================================
// Provider Info
// ============================================================================

/// Information about a provider (for reporting).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderInfo {
    /// Provider id.
    pub id: String,
    /// Display name.
    pub display_name: String,
    /// Tier.
    pub tier: ProviderTier,
    /// Capabilities served.
    pub capabilities: Vec<Capability>,
    /// Whether the provider is usable right now (key present if needed).
    pub available: bool,
    /// Daily ceiling.
    pub daily_limit: u64,
    /// Monthly ceiling.
    pub monthly_limit: u64,
}

impl ProviderInfo {
    /// Creates info from a provider.
    pub fn from_provider(provider: &dyn ApiProvider) -> Self {
        let config = provider.config();
        Self {
            id: provider.id().to_string(),
            display_name: config.display_name.clone(),
            tier: provider.tier(),
            capabilities: config.capabilities.iter().copied().collect(),
            available: provider.is_available(),
            daily_limit: config.rate_limits.daily,
            monthly_limit: config.rate_limits.monthly,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
