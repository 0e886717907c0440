//! Fetch context providing access to host APIs.
//!
//! The fetch context is passed to every provider call and bundles the
//! shared HTTP client, the keychain and the clock.

use std::sync::Arc;
use std::time::Duration;

use haulguard_core::{ApiConfig, Clock, SystemClock};
use url::Url;

use crate::host::{http::HttpClient, keychain::KeychainApi, keychain::SystemKeychain};

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

// ============================================================================
// Fetch Settings
// ============================================================================

/// Settings for fetch operations.
#[derive(Debug, Clone)]
pub struct FetchSettings {
    /// Timeout for a single provider request.
    pub timeout: Duration,
    /// Optional domain allowlist for outbound requests.
    pub allowed_domains: Option<Vec<String>>,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            allowed_domains: None,
        }
    }
}

impl FetchSettings {
    /// Creates settings with custom timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Restricts outbound requests to the given domains.
    #[must_use]
    pub fn with_allowed_domains(mut self, domains: Vec<String>) -> Self {
        self.allowed_domains = Some(domains);
        self
    }

    /// Restricts outbound requests to the hosts of the providers' base URLs.
    #[must_use]
    pub fn with_provider_hosts(self, configs: &[ApiConfig]) -> Self {
        let mut hosts: Vec<String> = configs
            .iter()
            .filter_map(|config| {
                let url = Url::parse(&config.base_url).ok()?;
                url.host_str().map(str::to_string)
            })
            .collect();
        hosts.sort();
        hosts.dedup();
        self.with_allowed_domains(hosts)
    }

    fn http_client(&self) -> HttpClient {
        let client = HttpClient::with_timeout(self.timeout);
        match &self.allowed_domains {
            Some(domains) => client.with_allowed_domains(domains.clone()),
            None => client,
        }
    }
}

// ============================================================================
// Fetch Context
// ============================================================================

/// Context provided to providers, giving access to host APIs.
pub struct FetchContext {
    /// Secure credential storage.
    pub keychain: Arc<dyn KeychainApi>,
    /// HTTP client with tracing.
    pub http: Arc<HttpClient>,
    /// Time source for timestamps on responses.
    pub clock: Arc<dyn Clock>,
    /// Fetch settings.
    pub settings: FetchSettings,
}

impl FetchContext {
    /// Creates a new fetch context with default host API implementations.
    pub fn new() -> Self {
        Self::with_settings(FetchSettings::default())
    }

    /// Creates a context with custom settings.
    pub fn with_settings(settings: FetchSettings) -> Self {
        Self {
            keychain: Arc::new(SystemKeychain::new()),
            http: Arc::new(settings.http_client()),
            clock: Arc::new(SystemClock),
            settings,
        }
    }

    /// Creates a builder for customizing the context.
    pub fn builder() -> FetchContextBuilder {
        FetchContextBuilder::new()
    }

    /// Returns the effective timeout for provider requests.
    pub fn timeout(&self) -> Duration {
        self.settings.timeout
    }
}

impl Default for FetchContext {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for FetchContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchContext")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Fetch Context Builder
// ============================================================================

/// Builder for constructing a `FetchContext`.
#[derive(Default)]
pub struct FetchContextBuilder {
    keychain: Option<Arc<dyn KeychainApi>>,
    http: Option<Arc<HttpClient>>,
    clock: Option<Arc<dyn Clock>>,
    settings: FetchSettings,
}

impl FetchContextBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the keychain implementation.
    #[must_use]
    pub fn keychain(mut self, keychain: Arc<dyn KeychainApi>) -> Self {
        self.keychain = Some(keychain);
        self
    }

    /// Sets the HTTP client.
    #[must_use]
    pub fn http(mut self, http: Arc<HttpClient>) -> Self {
        self.http = Some(http);
        self
    }

    /// Sets the clock.
    #[must_use]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Sets the fetch settings.
    #[must_use]
    pub fn settings(mut self, settings: FetchSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Sets the timeout.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.settings.timeout = timeout;
        self
    }

    /// Builds the fetch context.
    pub fn build(self) -> FetchContext {
        let http = self
            .http
            .unwrap_or_else(|| Arc::new(self.settings.http_client()));
        FetchContext {
            keychain: self.keychain.unwrap_or_else(|| Arc::new(SystemKeychain::new())),
            http,
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
            settings: self.settings,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::keychain::MemoryKeychain;
    use chrono::{TimeZone, Utc};
    use haulguard_core::ManualClock;

    #[test]
    fn test_context_builder() {
        let start = Utc.with_ymd_and_hms(2024, 7, 4, 12, 0, 0).unwrap();
        let ctx = FetchContext::builder()
            .keychain(Arc::new(MemoryKeychain::new()))
            .clock(Arc::new(ManualClock::new(start)))
            .timeout(Duration::from_secs(5))
            .build();

        assert_eq!(ctx.timeout(), Duration::from_secs(5));
        assert_eq!(ctx.clock.now(), start);
    }

    #[test]
    fn test_provider_hosts_allowlist() {
        use haulguard_core::{ProviderTier, RateLimits};

        let configs = [
            ApiConfig::new(
                "openmeteo",
                "Open-Meteo",
                "https://api.open-meteo.com/v1/forecast",
                ProviderTier::Fallback,
                RateLimits::new(10, 100),
            ),
            ApiConfig::new(
                "openmeteo-archive",
                "Open-Meteo archive",
                "https://api.open-meteo.com/v1/archive",
                ProviderTier::Fallback,
                RateLimits::new(10, 100),
            ),
            ApiConfig::new(
                "ipapi",
                "ip-api",
                "http://ip-api.com/json",
                ProviderTier::Fallback,
                RateLimits::new(10, 100),
            ),
            ApiConfig::new("broken", "Broken", "not a url", ProviderTier::Primary, RateLimits::new(1, 1)),
        ];

        let settings = FetchSettings::default().with_provider_hosts(&configs);
        assert_eq!(
            settings.allowed_domains,
            Some(vec!["api.open-meteo.com".to_string(), "ip-api.com".to_string()])
        );
    }

    #[test]
    fn test_default_context() {
        let ctx = FetchContext::new();
        assert_eq!(ctx.settings.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        assert!(ctx.settings.allowed_domains.is_none());
    }
}
