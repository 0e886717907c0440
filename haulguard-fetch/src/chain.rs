//! Fallback chain for executing providers in order.
//!
//! The chain takes an already-ordered list of providers and tries them one
//! after another until one answers. Quota is consulted through a
//! [`QuotaGate`] before every call and every outcome is reported back to it.
//! Failures never stop the chain: each one is recorded and the next
//! provider is tried.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use haulguard_core::{ProviderRequest, ProviderResponse};
use tracing::{debug, info, instrument, warn};

use crate::context::FetchContext;
use crate::error::FetchError;
use crate::provider::ApiProvider;

// ============================================================================
// Quota Gate
// ============================================================================

/// Quota bookkeeping consulted by the chain.
#[async_trait]
pub trait QuotaGate: Send + Sync {
    /// Atomically checks the provider's ceilings and, if there is room,
    /// counts the call. Returns false when the quota is exhausted.
    async fn try_acquire(&self, provider: &str) -> bool;

    /// Records how an acquired call ended.
    async fn record_outcome(&self, provider: &str, success: bool);
}

/// Gate that never refuses and keeps no books.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnlimitedQuota;

#[async_trait]
impl QuotaGate for UnlimitedQuota {
    async fn try_acquire(&self, _provider: &str) -> bool {
        true
    }

    async fn record_outcome(&self, _provider: &str, _success: bool) {}
}

// ============================================================================
// Chain Attempt
// ============================================================================

/// How a single provider in the chain was handled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptStatus {
    /// The provider answered.
    Succeeded,
    /// The provider was called and failed.
    Failed(String),
    /// Skipped because the daily or monthly ceiling is reached.
    SkippedQuota,
    /// Skipped because a required API key is missing.
    SkippedUnconfigured,
}

impl AttemptStatus {
    /// Returns true if the provider was actually called.
    pub fn was_called(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed(_))
    }
}

/// Record of a single provider attempt.
#[derive(Debug, Clone)]
pub struct ChainAttempt {
    /// The provider that was considered.
    pub provider_id: String,
    /// What happened.
    pub status: AttemptStatus,
    /// How long the attempt took.
    pub duration: Duration,
}

impl ChainAttempt {
    fn new(provider_id: &str, status: AttemptStatus, duration: Duration) -> Self {
        Self {
            provider_id: provider_id.to_string(),
            status,
            duration,
        }
    }
}

// ============================================================================
// Chain Outcome
// ============================================================================

/// A successful chain answer.
#[derive(Debug, Clone)]
pub struct ChainSuccess {
    /// The decoded response.
    pub response: ProviderResponse,
    /// The provider that produced it.
    pub provider_id: String,
}

/// The outcome of a chain execution.
#[derive(Debug)]
pub struct ChainOutcome {
    /// The result (success or final error).
    pub result: Result<ChainSuccess, FetchError>,
    /// All attempts made, in order.
    pub attempts: Vec<ChainAttempt>,
    /// Total duration of all attempts.
    pub duration: Duration,
}

impl ChainOutcome {
    /// Returns true if some provider answered.
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    /// Returns the number of providers that were actually called.
    pub fn calls_made(&self) -> usize {
        self.attempts.iter().filter(|a| a.status.was_called()).count()
    }

    /// Returns the successful provider ID, if any.
    pub fn successful_provider(&self) -> Option<&str> {
        self.result.as_ref().ok().map(|r| r.provider_id.as_str())
    }

    /// Returns all errors that occurred.
    pub fn errors(&self) -> Vec<&str> {
        self.attempts
            .iter()
            .filter_map(|a| match &a.status {
                AttemptStatus::Failed(e) => Some(e.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Consumes the outcome, returning the response if there is one.
    pub fn into_response(self) -> Option<ProviderResponse> {
        self.result.ok().map(|s| s.response)
    }
}

// ============================================================================
// Provider Chain
// ============================================================================

/// An ordered list of providers tried one after another.
pub struct ProviderChain {
    providers: Vec<Arc<dyn ApiProvider>>,
}

impl ProviderChain {
    /// Creates a chain. The providers are tried in the given order.
    pub fn new(providers: Vec<Arc<dyn ApiProvider>>) -> Self {
        Self { providers }
    }

    /// Returns the number of providers in the chain.
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// Returns true if the chain is empty.
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Provider ids in execution order.
    pub fn provider_ids(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.id()).collect()
    }

    /// Execute the chain until one provider answers.
    #[instrument(skip(self, request, ctx, gate), fields(capability = %request.capability(), providers = self.providers.len()))]
    pub async fn execute(
        &self,
        request: &ProviderRequest,
        ctx: &FetchContext,
        gate: &dyn QuotaGate,
    ) -> ChainOutcome {
        let start = Instant::now();
        let capability = request.capability();
        let mut attempts = Vec::new();

        let candidates: Vec<_> = self
            .providers
            .iter()
            .filter(|p| p.can_handle(request))
            .collect();

        if candidates.is_empty() {
            return ChainOutcome {
                result: Err(FetchError::NoProviders(capability)),
                attempts,
                duration: start.elapsed(),
            };
        }

        debug!(count = candidates.len(), "Executing provider chain");

        for provider in candidates {
            let id = provider.id();

            if !provider.is_available() {
                debug!(provider = %id, "Provider missing API key, skipping");
                attempts.push(ChainAttempt::new(
                    id,
                    AttemptStatus::SkippedUnconfigured,
                    Duration::ZERO,
                ));
                continue;
            }

            if !gate.try_acquire(id).await {
                debug!(provider = %id, "Provider quota exhausted, skipping");
                attempts.push(ChainAttempt::new(
                    id,
                    AttemptStatus::SkippedQuota,
                    Duration::ZERO,
                ));
                continue;
            }

            let attempt_start = Instant::now();
            let result = provider.fetch(request, ctx).await.and_then(|response| {
                if response.capability() == capability {
                    Ok(response)
                } else {
                    Err(FetchError::InvalidResponse(format!(
                        "expected {capability} payload, got {}",
                        response.capability()
                    )))
                }
            });
            let duration = attempt_start.elapsed();

            match result {
                Ok(response) => {
                    info!(provider = %id, duration = ?duration, "Provider succeeded");
                    gate.record_outcome(id, true).await;
                    attempts.push(ChainAttempt::new(id, AttemptStatus::Succeeded, duration));

                    return ChainOutcome {
                        result: Ok(ChainSuccess {
                            response,
                            provider_id: id.to_string(),
                        }),
                        attempts,
                        duration: start.elapsed(),
                    };
                }
                Err(error) => {
                    warn!(provider = %id, error = %error, duration = ?duration, "Provider failed");
                    gate.record_outcome(id, false).await;
                    attempts.push(ChainAttempt::new(
                        id,
                        AttemptStatus::Failed(error.to_string()),
                        duration,
                    ));
                }
            }
        }

        warn!("All providers failed or were skipped");
        ChainOutcome {
            result: Err(FetchError::AllProvidersFailed),
            attempts,
            duration: start.elapsed(),
        }
    }
}

impl std::fmt::Debug for ProviderChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderChain")
            .field("providers", &self.provider_ids())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use haulguard_core::{
        ApiConfig, Capability, Location, ProviderTier, RateLimits, ResponseSource,
    };
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct MockProvider {
        config: ApiConfig,
        succeed: bool,
        calls: AtomicUsize,
    }

    impl MockProvider {
        fn new(id: &str, succeed: bool) -> Arc<Self> {
            Arc::new(Self {
                config: ApiConfig::new(
                    id,
                    id,
                    "https://example.com",
                    ProviderTier::Primary,
                    RateLimits::new(10, 100),
                )
                .with_capability(Capability::Geolocation),
                succeed,
                calls: AtomicUsize::new(0),
            })
        }

        fn keyed(id: &str) -> Arc<Self> {
            let mut provider = Self::new(id, true);
            if let Some(p) = Arc::get_mut(&mut provider) {
                p.config.requires_key = true;
            }
            provider
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ApiProvider for MockProvider {
        fn config(&self) -> &ApiConfig {
            &self.config
        }

        async fn fetch(
            &self,
            _request: &ProviderRequest,
            _ctx: &FetchContext,
        ) -> Result<ProviderResponse, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.succeed {
                Ok(ProviderResponse::Location(Location::new(
                    41.88,
                    -87.63,
                    ResponseSource::Provider(self.config.name.clone()),
                )))
            } else {
                Err(FetchError::InvalidResponse("Mock error".to_string()))
            }
        }
    }

    #[derive(Default)]
    struct MockGate {
        exhausted: Vec<String>,
        outcomes: Mutex<HashMap<String, Vec<bool>>>,
    }

    #[async_trait]
    impl QuotaGate for MockGate {
        async fn try_acquire(&self, provider: &str) -> bool {
            !self.exhausted.iter().any(|p| p == provider)
        }

        async fn record_outcome(&self, provider: &str, success: bool) {
            self.outcomes
                .lock()
                .unwrap()
                .entry(provider.to_string())
                .or_default()
                .push(success);
        }
    }

    fn chain(providers: &[Arc<MockProvider>]) -> ProviderChain {
        ProviderChain::new(
            providers
                .iter()
                .map(|p| Arc::clone(p) as Arc<dyn ApiProvider>)
                .collect(),
        )
    }

    #[tokio::test]
    async fn test_empty_chain() {
        let outcome = ProviderChain::new(Vec::new())
            .execute(&ProviderRequest::Location, &FetchContext::new(), &UnlimitedQuota)
            .await;

        assert!(!outcome.is_success());
        assert!(matches!(
            outcome.result,
            Err(FetchError::NoProviders(Capability::Geolocation))
        ));
    }

    #[tokio::test]
    async fn test_capability_filter() {
        let provider = MockProvider::new("geo", true);
        let outcome = chain(&[provider.clone()])
            .execute(
                &ProviderRequest::Weather { lat: 1.0, lon: 2.0 },
                &FetchContext::new(),
                &UnlimitedQuota,
            )
            .await;

        assert!(matches!(outcome.result, Err(FetchError::NoProviders(_))));
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_fallback_on_failure() {
        let failing = MockProvider::new("primary", false);
        let working = MockProvider::new("fallback", true);
        let gate = MockGate::default();

        let outcome = chain(&[failing.clone(), working.clone()])
            .execute(&ProviderRequest::Location, &FetchContext::new(), &gate)
            .await;

        assert!(outcome.is_success());
        assert_eq!(outcome.calls_made(), 2);
        assert_eq!(outcome.successful_provider(), Some("fallback"));
        assert_eq!(outcome.errors(), vec!["Invalid response: Mock error"]);

        let outcomes = gate.outcomes.lock().unwrap();
        assert_eq!(outcomes["primary"], vec![false]);
        assert_eq!(outcomes["fallback"], vec![true]);
    }

    #[tokio::test]
    async fn test_first_success_stops_chain() {
        let first = MockProvider::new("first", true);
        let second = MockProvider::new("second", true);

        let outcome = chain(&[first.clone(), second.clone()])
            .execute(&ProviderRequest::Location, &FetchContext::new(), &UnlimitedQuota)
            .await;

        assert_eq!(outcome.successful_provider(), Some("first"));
        assert_eq!(first.calls(), 1);
        assert_eq!(second.calls(), 0);
    }

    #[tokio::test]
    async fn test_skip_exhausted_quota() {
        let exhausted = MockProvider::new("exhausted", true);
        let open = MockProvider::new("open", true);
        let gate = MockGate {
            exhausted: vec!["exhausted".to_string()],
            ..Default::default()
        };

        let outcome = chain(&[exhausted.clone(), open.clone()])
            .execute(&ProviderRequest::Location, &FetchContext::new(), &gate)
            .await;

        assert_eq!(outcome.successful_provider(), Some("open"));
        assert_eq!(exhausted.calls(), 0);
        assert_eq!(outcome.attempts[0].status, AttemptStatus::SkippedQuota);
    }

    #[tokio::test]
    async fn test_skip_unconfigured() {
        let keyless = MockProvider::keyed("keyless");
        let open = MockProvider::new("open", true);

        let outcome = chain(&[keyless.clone(), open])
            .execute(&ProviderRequest::Location, &FetchContext::new(), &UnlimitedQuota)
            .await;

        assert_eq!(outcome.successful_provider(), Some("open"));
        assert_eq!(keyless.calls(), 0);
        assert_eq!(
            outcome.attempts[0].status,
            AttemptStatus::SkippedUnconfigured
        );
    }

    #[tokio::test]
    async fn test_all_failed() {
        let a = MockProvider::new("a", false);
        let b = MockProvider::new("b", false);

        let outcome = chain(&[a, b])
            .execute(&ProviderRequest::Location, &FetchContext::new(), &UnlimitedQuota)
            .await;

        assert!(matches!(outcome.result, Err(FetchError::AllProvidersFailed)));
        assert_eq!(outcome.errors().len(), 2);
        assert!(outcome.into_response().is_none());
    }
}
