//! Provider registry.
//!
//! Holds the built-in descriptors (static, initialized once) and builds
//! the live provider set from them, applying config overrides and
//! resolved API keys.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, OnceLock};

use haulguard_core::{ApiConfig, Capability, ProviderOverride};
use haulguard_fetch::{ApiProvider, KeychainApi, ProviderInfo};
use tracing::{debug, info, warn};

use crate::credentials::{KeySource, default_env_var, resolve_api_key};
use crate::diagnostics::{CarMdProvider, carmd_descriptor};
use crate::geolocation::{
    IpApiCoProvider, IpApiProvider, IpGeolocationProvider, ip_api_descriptor, ipapi_co_descriptor,
    ipgeolocation_descriptor,
};
use crate::nlp::{HuggingFaceProvider, OpenAiProvider, huggingface_descriptor, openai_descriptor};
use crate::weather::{
    OpenMeteoProvider, OpenWeatherMapProvider, open_meteo_descriptor, openweathermap_descriptor,
};

// ============================================================================
// Static Descriptors
// ============================================================================

static DESCRIPTORS: OnceLock<Vec<ApiConfig>> = OnceLock::new();

/// Registration order. Ties in provider selection keep this order.
fn init_descriptors() -> Vec<ApiConfig> {
    vec![
        // Geolocation
        ipgeolocation_descriptor(),
        ip_api_descriptor(),
        ipapi_co_descriptor(),
        // Weather
        openweathermap_descriptor(),
        open_meteo_descriptor(),
        // Diagnostics
        carmd_descriptor(),
        // NLP
        openai_descriptor(),
        huggingface_descriptor(),
    ]
}

/// Returns every built-in descriptor, without keys.
pub fn builtin_descriptors() -> &'static [ApiConfig] {
    DESCRIPTORS.get_or_init(init_descriptors)
}

/// Looks up a built-in descriptor by id.
pub fn builtin_descriptor(id: &str) -> Option<&'static ApiConfig> {
    builtin_descriptors().iter().find(|d| d.name == id)
}

/// Wraps a descriptor in its provider implementation.
fn instantiate(config: ApiConfig) -> Option<Arc<dyn ApiProvider>> {
    let provider: Arc<dyn ApiProvider> = match config.name.as_str() {
        "ipgeolocation" => Arc::new(IpGeolocationProvider::new(config)),
        "ip-api" => Arc::new(IpApiProvider::new(config)),
        "ipapi.co" => Arc::new(IpApiCoProvider::new(config)),
        "openweathermap" => Arc::new(OpenWeatherMapProvider::new(config)),
        "open-meteo" => Arc::new(OpenMeteoProvider::new(config)),
        "carmd" => Arc::new(CarMdProvider::new(config)),
        "openai" => Arc::new(OpenAiProvider::new(config)),
        "huggingface" => Arc::new(HuggingFaceProvider::new(config)),
        other => {
            warn!(provider = other, "No implementation for provider");
            return None;
        }
    };
    Some(provider)
}

// ============================================================================
// Provider Registry
// ============================================================================

/// The live provider set, in registration order.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    providers: Vec<Arc<dyn ApiProvider>>,
    key_sources: HashMap<String, KeySource>,
}

impl ProviderRegistry {
    /// Built-in providers with no keys and no overrides.
    pub fn builtin() -> Self {
        Self::from_providers(
            builtin_descriptors()
                .iter()
                .cloned()
                .filter_map(instantiate)
                .collect(),
        )
    }

    /// Wraps an explicit provider list (tests, embedding).
    pub fn from_providers(providers: Vec<Arc<dyn ApiProvider>>) -> Self {
        Self {
            providers,
            key_sources: HashMap::new(),
        }
    }

    /// Builds the registry from the built-ins, applying overrides and
    /// resolving keys.
    ///
    /// Disabled providers are left out entirely.
    pub async fn configure(
        overrides: &BTreeMap<String, ProviderOverride>,
        keychain: &dyn KeychainApi,
    ) -> Self {
        let mut providers = Vec::new();
        let mut key_sources = HashMap::new();

        for descriptor in builtin_descriptors() {
            let settings = overrides.get(&descriptor.name).cloned().unwrap_or_default();
            if !settings.enabled {
                debug!(provider = %descriptor.name, "Provider disabled in config");
                continue;
            }

            let mut config = settings.apply_limits(descriptor.clone());
            let env_var = settings
                .api_key_env
                .as_deref()
                .or_else(|| default_env_var(&descriptor.name));

            if config.requires_key || settings.api_key.is_some() {
                if let Some(key) = resolve_api_key(
                    &descriptor.name,
                    env_var,
                    settings.api_key.as_deref(),
                    keychain,
                )
                .await
                {
                    key_sources.insert(descriptor.name.clone(), key.source);
                    config = config.with_api_key(key.value);
                }
            }

            if let Some(provider) = instantiate(config) {
                providers.push(provider);
            }
        }

        let registry = Self {
            providers,
            key_sources,
        };
        info!(
            total = registry.providers.len(),
            available = registry.providers.iter().filter(|p| p.is_available()).count(),
            "Provider registry configured"
        );
        registry
    }

    /// All providers in registration order.
    pub fn all(&self) -> &[Arc<dyn ApiProvider>] {
        &self.providers
    }

    /// Looks up a provider by id.
    pub fn get(&self, id: &str) -> Option<&Arc<dyn ApiProvider>> {
        self.providers.iter().find(|p| p.id() == id)
    }

    /// Providers serving `capability`, in registration order.
    pub fn serving(&self, capability: Capability) -> Vec<Arc<dyn ApiProvider>> {
        self.providers
            .iter()
            .filter(|p| p.serves(capability))
            .cloned()
            .collect()
    }

    /// Descriptors of all providers.
    pub fn configs(&self) -> Vec<ApiConfig> {
        self.providers.iter().map(|p| p.config().clone()).collect()
    }

    /// Where each provider's key came from, if it has one.
    pub fn key_source(&self, id: &str) -> Option<KeySource> {
        self.key_sources.get(id).copied()
    }

    /// Reporting info for all providers.
    pub fn info(&self) -> Vec<ProviderInfo> {
        self.providers
            .iter()
            .map(|p| ProviderInfo::from_provider(p.as_ref()))
            .collect()
    }

    /// Returns the number of providers.
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// Returns true if there are no providers.
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field(
                "providers",
                &self.providers.iter().map(|p| p.id()).collect::<Vec<_>>(),
            )
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use haulguard_core::ProviderTier;
    use haulguard_fetch::{MemoryKeychain, accounts};

    #[test]
    fn test_builtin_descriptors_unique() {
        let descriptors = builtin_descriptors();
        let mut names: Vec<_> = descriptors.iter().map(|d| d.name.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), descriptors.len());
    }

    #[test]
    fn test_every_capability_has_a_primary() {
        for capability in Capability::all() {
            assert!(
                builtin_descriptors()
                    .iter()
                    .any(|d| d.serves(*capability) && d.tier == ProviderTier::Primary),
                "no primary for {capability}"
            );
        }
    }

    #[test]
    fn test_builtin_registry() {
        let registry = ProviderRegistry::builtin();
        assert_eq!(registry.len(), builtin_descriptors().len());

        let geo: Vec<_> = registry
            .serving(Capability::Geolocation)
            .iter()
            .map(|p| p.id().to_string())
            .collect();
        assert_eq!(geo, vec!["ipgeolocation", "ip-api", "ipapi.co"]);
        assert!(registry.get("carmd").is_some());
        assert!(registry.get("nope").is_none());
    }

    #[tokio::test]
    async fn test_configure_applies_overrides() {
        let keychain = MemoryKeychain::new();
        keychain
            .set("openweathermap", accounts::API_KEY, "owm-key")
            .await
            .unwrap();

        let mut overrides = BTreeMap::new();
        overrides.insert(
            "ipapi.co".to_string(),
            ProviderOverride {
                enabled: false,
                ..Default::default()
            },
        );
        overrides.insert(
            "open-meteo".to_string(),
            ProviderOverride {
                daily_limit: Some(50),
                ..Default::default()
            },
        );
        // Point at an env var that will not exist.
        overrides.insert(
            "openweathermap".to_string(),
            ProviderOverride {
                api_key_env: Some("HAULGUARD_TEST_UNSET_OWM_KEY".to_string()),
                ..Default::default()
            },
        );

        let registry = ProviderRegistry::configure(&overrides, &keychain).await;

        assert!(registry.get("ipapi.co").is_none());
        assert_eq!(
            registry.get("open-meteo").unwrap().config().rate_limits.daily,
            50
        );

        let owm = registry.get("openweathermap").unwrap();
        assert!(owm.is_available());
        assert_eq!(registry.key_source("openweathermap"), Some(KeySource::Keychain));
    }
}
