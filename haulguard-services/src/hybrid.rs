//! The hybrid API layer.
//!
//! [`HybridApiService`] ties the provider registry, the usage tracker and
//! the response cache together. Each capability has a fallback chain:
//!
//! 1. Serve from cache when a fresh entry exists
//! 2. Order providers: primary tier first, then fewest failures
//! 3. Try each provider with quota left; count the call and its outcome
//! 4. Cache the first success under the capability's TTL
//!
//! When every provider is skipped or fails, the chain yields `None`
//! (diagnostics falls back to local rules). Chains never return errors.

use chrono::{DateTime, Utc};
use haulguard_core::{
    Capability, ChatReply, Clock, DiagnosticReport, Location, ProviderRequest, ProviderResponse,
    ProviderTier, WeatherData,
};
use haulguard_fetch::{ApiProvider, FetchContext, FetchSettings, KeychainApi, ProviderChain};
use haulguard_providers::ProviderRegistry;
use haulguard_store::{Config, KeyValueStore, ResponseCache, TtlConfig, UsageTracker, cache_key};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::diagnostics::{analyze_codes_locally, normalize_code};

/// Default failure count above which a primary provider triggers degraded mode.
pub const DEFAULT_DEGRADED_FAILURE_THRESHOLD: u64 = 10;

// ============================================================================
// Settings
// ============================================================================

/// Tunables for the hybrid layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HybridSettings {
    /// Failures above which a primary provider puts the layer in degraded mode.
    pub degraded_failure_threshold: u64,
    /// Cache lifetimes per capability.
    pub ttl: TtlConfig,
}

impl Default for HybridSettings {
    fn default() -> Self {
        Self {
            degraded_failure_threshold: DEFAULT_DEGRADED_FAILURE_THRESHOLD,
            ttl: TtlConfig::default(),
        }
    }
}

impl From<&Config> for HybridSettings {
    fn from(config: &Config) -> Self {
        Self {
            degraded_failure_threshold: config.general.degraded_failure_threshold,
            ttl: config.ttl_hours,
        }
    }
}

// ============================================================================
// Usage Report
// ============================================================================

/// One provider's line in the usage report.
#[derive(Debug, Clone, Serialize)]
pub struct ProviderUsage {
    /// Provider id.
    pub id: String,
    /// Display name.
    pub display_name: String,
    /// Tier.
    pub tier: ProviderTier,
    /// Capabilities served.
    pub capabilities: Vec<Capability>,
    /// Whether the provider has the key it needs.
    pub available: bool,
    /// Calls today.
    pub daily_calls: u64,
    /// Daily ceiling.
    pub daily_limit: u64,
    /// Calls this month.
    pub monthly_calls: u64,
    /// Monthly ceiling.
    pub monthly_limit: u64,
    /// Recorded failures.
    pub failures: u64,
    /// Calls left today.
    pub remaining_today: u64,
    /// Estimated spend today.
    pub cost_today_usd: f64,
    /// Estimated spend this month.
    pub cost_month_usd: f64,
    /// A ceiling has been reached.
    pub quota_exhausted: bool,
    /// Failures exceed the degraded-mode threshold.
    pub failing: bool,
}

/// Usage and cost across all providers.
#[derive(Debug, Clone, Serialize)]
pub struct UsageReport {
    /// When the report was built.
    pub generated_at: DateTime<Utc>,
    /// Whether degraded mode is active.
    pub degraded_mode: bool,
    /// Failure threshold in effect.
    pub failure_threshold: u64,
    /// Per-provider lines, in registration order.
    pub providers: Vec<ProviderUsage>,
    /// Estimated spend today across providers.
    pub total_cost_today_usd: f64,
    /// Estimated spend this month across providers.
    pub total_cost_month_usd: f64,
}

// ============================================================================
// Hybrid Service
// ============================================================================

/// Quota-aware, cached fallback over the configured providers.
pub struct HybridApiService {
    registry: ProviderRegistry,
    tracker: Arc<UsageTracker>,
    cache: ResponseCache,
    ctx: FetchContext,
    settings: HybridSettings,
}

impl HybridApiService {
    /// Assembles the service from its parts.
    pub fn new(
        registry: ProviderRegistry,
        tracker: Arc<UsageTracker>,
        cache: ResponseCache,
        ctx: FetchContext,
        settings: HybridSettings,
    ) -> Self {
        Self {
            registry,
            tracker,
            cache,
            ctx,
            settings,
        }
    }

    /// Builds the service from the config file's settings.
    ///
    /// Resolves provider keys, loads persisted usage and sizes the cache.
    /// Outbound requests are limited to the registered providers' hosts.
    pub async fn from_config(
        config: &Config,
        store: Arc<dyn KeyValueStore>,
        keychain: Arc<dyn KeychainApi>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let registry = ProviderRegistry::configure(&config.providers, keychain.as_ref()).await;
        let tracker = Arc::new(
            UsageTracker::initialize(store, &registry.configs(), Arc::clone(&clock)).await,
        );
        let cache = ResponseCache::new(config.general.cache_capacity, Arc::clone(&clock));
        let ctx = FetchContext::builder()
            .keychain(keychain)
            .clock(clock)
            .settings(
                FetchSettings::default()
                    .with_timeout(config.request_timeout())
                    .with_provider_hosts(&registry.configs()),
            )
            .build();

        Self::new(registry, tracker, cache, ctx, HybridSettings::from(config))
    }

    /// The provider registry.
    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    /// The usage tracker.
    pub fn tracker(&self) -> &Arc<UsageTracker> {
        &self.tracker
    }

    /// The response cache.
    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    /// The time source.
    pub fn clock(&self) -> Arc<dyn Clock> {
        Arc::clone(&self.ctx.clock)
    }

    /// Settings in effect.
    pub fn settings(&self) -> HybridSettings {
        self.settings
    }

    // ========================================================================
    // Selection & Quota
    // ========================================================================

    /// Providers serving `capability`, best first.
    ///
    /// Primary before fallback; within a tier, fewer recorded failures
    /// first; ties keep registration order.
    pub async fn available_providers(&self, capability: Capability) -> Vec<Arc<dyn ApiProvider>> {
        let mut ranked = Vec::new();
        for provider in self.registry.serving(capability) {
            let failures = self.tracker.failures(provider.id()).await;
            ranked.push((provider.tier(), failures, provider));
        }
        ranked.sort_by_key(|(tier, failures, _)| (*tier, *failures));
        ranked.into_iter().map(|(_, _, provider)| provider).collect()
    }

    /// Returns true if `provider` is under both ceilings.
    pub async fn can_make_request(&self, provider: &str) -> bool {
        self.tracker.can_make_request(provider).await
    }

    /// Counts a call (and a failure when `success` is false).
    pub async fn increment_usage(&self, provider: &str, success: bool) {
        self.tracker.increment_usage(provider, success).await;
    }

    /// True when any configured primary provider is out of quota or failing.
    pub async fn is_degraded_mode(&self) -> bool {
        for provider in self
            .registry
            .all()
            .iter()
            .filter(|p| p.tier() == ProviderTier::Primary && p.is_available())
        {
            let id = provider.id();
            if !self.tracker.can_make_request(id).await {
                debug!(provider = %id, "Degraded: primary quota exhausted");
                return true;
            }
            let failures = self.tracker.failures(id).await;
            if failures > self.settings.degraded_failure_threshold {
                debug!(provider = %id, failures, "Degraded: primary failing");
                return true;
            }
        }
        false
    }

    // ========================================================================
    // Fallback Chains
    // ========================================================================

    #[instrument(skip(self, request), fields(capability = %request.capability()))]
    async fn run_chain(&self, request: ProviderRequest) -> Option<ProviderResponse> {
        let capability = request.capability();
        let key = cache_key(capability.as_str(), request.endpoint(), &request.params());

        if let Some(hit) = self.cache.get::<ProviderResponse>(&key).await {
            debug!("Served from cache");
            return Some(hit);
        }

        let providers = self.available_providers(capability).await;
        if providers.is_empty() {
            warn!("No providers registered");
            return None;
        }

        let outcome = ProviderChain::new(providers)
            .execute(&request, &self.ctx, self.tracker.as_ref())
            .await;
        let calls = outcome.calls_made();

        match outcome.result {
            Ok(success) => {
                info!(
                    provider = %success.provider_id,
                    calls,
                    "Chain answered"
                );
                self.cache
                    .set(&key, &success.response, self.settings.ttl.for_capability(capability))
                    .await;
                Some(success.response)
            }
            Err(e) => {
                warn!(error = %e, attempts = outcome.attempts.len(), "Chain exhausted");
                None
            }
        }
    }

    /// Current position from the geolocation providers.
    pub async fn get_location(&self) -> Option<Location> {
        self.run_chain(ProviderRequest::Location)
            .await
            .and_then(|r| r.into_location().ok())
    }

    /// Current weather at a coordinate.
    pub async fn get_weather_data(&self, lat: f64, lon: f64) -> Option<WeatherData> {
        self.run_chain(ProviderRequest::Weather { lat, lon })
            .await
            .and_then(|r| r.into_weather().ok())
    }

    /// Analyzes trouble codes, falling back to local rules.
    ///
    /// Codes are trimmed and upper-cased first; blanks are dropped.
    pub async fn analyze_diagnostics(
        &self,
        codes: &[String],
        vin: Option<&str>,
        mileage: Option<u64>,
    ) -> DiagnosticReport {
        let codes: Vec<String> = codes
            .iter()
            .map(|c| normalize_code(c))
            .filter(|c| !c.is_empty())
            .collect();

        if !codes.is_empty() {
            let request = ProviderRequest::Diagnostics {
                codes: codes.clone(),
                vin: vin.map(str::to_string),
                mileage,
            };
            if let Some(report) = self
                .run_chain(request)
                .await
                .and_then(|r| r.into_diagnostics().ok())
            {
                return report;
            }
            debug!("Using rule-based diagnostics");
        }

        analyze_codes_locally(&codes, self.ctx.clock.now())
    }

    /// Assistant completion from the NLP providers.
    pub async fn complete_chat(&self, prompt: &str, context: Option<&str>) -> Option<ChatReply> {
        self.run_chain(ProviderRequest::Chat {
            prompt: prompt.to_string(),
            context: context.map(str::to_string),
        })
        .await
        .and_then(|r| r.into_chat().ok())
    }

    // ========================================================================
    // Reporting
    // ========================================================================

    /// Usage, quota and estimated cost for every provider.
    #[allow(clippy::cast_precision_loss)]
    pub async fn usage_report(&self) -> UsageReport {
        let status = self.tracker.usage_status().await;
        let threshold = self.settings.degraded_failure_threshold;

        let providers: Vec<ProviderUsage> = self
            .registry
            .all()
            .iter()
            .map(|provider| {
                let config = provider.config();
                let limits = config.rate_limits;
                let stats = status.get(&config.name);
                let (daily, monthly, failures) =
                    stats.map_or((0, 0, 0), |s| (s.daily_calls, s.monthly_calls, s.failures));

                ProviderUsage {
                    id: config.name.clone(),
                    display_name: config.display_name.clone(),
                    tier: config.tier,
                    capabilities: config.capabilities.iter().copied().collect(),
                    available: provider.is_available(),
                    daily_calls: daily,
                    daily_limit: limits.daily,
                    monthly_calls: monthly,
                    monthly_limit: limits.monthly,
                    failures,
                    remaining_today: stats.map_or(limits.daily.min(limits.monthly), |s| {
                        s.remaining_today(&limits)
                    }),
                    cost_today_usd: daily as f64 * config.cost_per_call_usd,
                    cost_month_usd: monthly as f64 * config.cost_per_call_usd,
                    quota_exhausted: !limits.allows(daily, monthly),
                    failing: failures > threshold,
                }
            })
            .collect();

        UsageReport {
            generated_at: self.ctx.clock.now(),
            degraded_mode: self.is_degraded_mode().await,
            failure_threshold: threshold,
            total_cost_today_usd: providers.iter().map(|p| p.cost_today_usd).sum(),
            total_cost_month_usd: providers.iter().map(|p| p.cost_month_usd).sum(),
            providers,
        }
    }

    /// Clears one provider's failure counter.
    pub async fn reset_failures(&self, provider: &str) {
        self.tracker.reset_failures(provider).await;
    }
}

impl std::fmt::Debug for HybridApiService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HybridApiService")
            .field("registry", &self.registry)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use haulguard_core::{
        ApiConfig, ManualClock, ProviderOverride, RateLimits, ResponseSource, Severity,
    };
    use haulguard_fetch::{FetchError, MemoryKeychain};
    use haulguard_store::MemoryKeyValueStore;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Scripted {
        config: ApiConfig,
        calls: AtomicUsize,
        reply: Option<ProviderResponse>,
    }

    #[async_trait]
    impl ApiProvider for Scripted {
        fn config(&self) -> &ApiConfig {
            &self.config
        }

        async fn fetch(
            &self,
            _request: &ProviderRequest,
            _ctx: &FetchContext,
        ) -> Result<ProviderResponse, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.reply
                .clone()
                .ok_or_else(|| FetchError::InvalidResponse("scripted failure".to_string()))
        }
    }

    fn scripted(
        name: &str,
        tier: ProviderTier,
        capability: Capability,
        reply: Option<ProviderResponse>,
    ) -> Arc<Scripted> {
        Arc::new(Scripted {
            config: ApiConfig::new(name, name, "https://example.invalid", tier, RateLimits::new(5, 50))
                .with_capability(capability)
                .with_cost_per_call(0.01),
            calls: AtomicUsize::new(0),
            reply,
        })
    }

    fn service(providers: Vec<Arc<dyn ApiProvider>>, clock: &ManualClock) -> HybridApiService {
        let registry = ProviderRegistry::from_providers(providers);
        let clock: Arc<dyn Clock> = Arc::new(clock.clone());
        let tracker = Arc::new(UsageTracker::new(
            Arc::new(MemoryKeyValueStore::new()),
            &registry.configs(),
            Arc::clone(&clock),
        ));
        let ctx = FetchContext::builder()
            .keychain(Arc::new(MemoryKeychain::new()))
            .clock(Arc::clone(&clock))
            .build();
        HybridApiService::new(
            registry,
            tracker,
            ResponseCache::new(16, clock),
            ctx,
            HybridSettings::default(),
        )
    }

    fn clock() -> ManualClock {
        ManualClock::new(Utc.with_ymd_and_hms(2024, 9, 2, 14, 0, 0).unwrap())
    }

    fn fix(provider: &str) -> ProviderResponse {
        ProviderResponse::Location(Location::new(
            41.6,
            -87.5,
            ResponseSource::Provider(provider.to_string()),
        ))
    }

    #[tokio::test]
    async fn test_falls_through_to_fallback() {
        let primary = scripted("p", ProviderTier::Primary, Capability::Geolocation, None);
        let fallback = scripted("f", ProviderTier::Fallback, Capability::Geolocation, Some(fix("f")));
        let svc = service(vec![primary.clone() as Arc<dyn ApiProvider>, fallback.clone()], &clock());

        let location = svc.get_location().await.unwrap();
        assert_eq!(location.source, ResponseSource::Provider("f".to_string()));
        assert_eq!(primary.calls.load(Ordering::SeqCst), 1);
        assert_eq!(svc.tracker().failures("p").await, 1);
        assert_eq!(svc.tracker().stats("f").await.unwrap().daily_calls, 1);
    }

    #[tokio::test]
    async fn test_exhaustion_yields_none() {
        let a = scripted("a", ProviderTier::Primary, Capability::Weather, None);
        let svc = service(vec![a as Arc<dyn ApiProvider>], &clock());
        assert!(svc.get_weather_data(40.0, -90.0).await.is_none());
        assert!(svc.complete_chat("hello", None).await.is_none());
    }

    #[tokio::test]
    async fn test_diagnostics_fall_back_to_rules() {
        let svc = service(Vec::new(), &clock());
        let report = svc
            .analyze_diagnostics(&[" p0300 ".to_string(), String::new()], None, None)
            .await;
        assert_eq!(report.source, ResponseSource::RuleBased);
        assert_eq!(report.findings.len(), 1);
        assert_eq!(report.findings[0].code, "P0300");
        assert!(report.overall >= Severity::Medium);
    }

    #[tokio::test]
    async fn test_usage_report_costs() {
        let a = scripted("a", ProviderTier::Primary, Capability::Geolocation, Some(fix("a")));
        let svc = service(vec![a as Arc<dyn ApiProvider>], &clock());
        svc.increment_usage("a", true).await;
        svc.increment_usage("a", false).await;

        let report = svc.usage_report().await;
        let line = &report.providers[0];
        assert_eq!(line.daily_calls, 2);
        assert_eq!(line.failures, 1);
        assert_eq!(line.remaining_today, 3);
        assert!((line.cost_month_usd - 0.02).abs() < 1e-9);
        assert!((report.total_cost_today_usd - 0.02).abs() < 1e-9);
        assert!(!report.degraded_mode);
    }

    #[tokio::test]
    async fn test_degraded_on_primary_quota() {
        let a = scripted("a", ProviderTier::Primary, Capability::Geolocation, Some(fix("a")));
        let b = scripted("b", ProviderTier::Fallback, Capability::Geolocation, Some(fix("b")));
        let svc = service(vec![a as Arc<dyn ApiProvider>, b], &clock());

        for _ in 0..5 {
            svc.increment_usage("b", true).await;
        }
        assert!(!svc.is_degraded_mode().await, "fallback quota does not count");

        for _ in 0..5 {
            svc.increment_usage("a", true).await;
        }
        assert!(svc.is_degraded_mode().await);
    }

    #[tokio::test]
    async fn test_from_config_limits_hosts_to_providers() {
        let mut config = Config::default();
        config.providers.insert(
            "openai".to_string(),
            ProviderOverride {
                enabled: false,
                ..ProviderOverride::default()
            },
        );

        let svc = HybridApiService::from_config(
            &config,
            Arc::new(MemoryKeyValueStore::new()),
            Arc::new(MemoryKeychain::new()),
            Arc::new(clock()),
        )
        .await;

        let hosts = svc.ctx.settings.allowed_domains.clone().unwrap();
        assert!(hosts.contains(&"api.open-meteo.com".to_string()));
        assert!(hosts.contains(&"ip-api.com".to_string()));
        assert!(!hosts.contains(&"api.openai.com".to_string()));
    }
}
