//! Per-provider quota bookkeeping.
//!
//! The tracker owns the usage map (provider id → [`UsageStats`]) and
//! persists the whole map under [`USAGE_STATS_KEY`] after every mutation.
//! Counters roll over lazily: whenever a provider's stats are touched on a
//! new day, its daily counter (and on a new month its monthly counter) is
//! zeroed first.
//!
//! Check and increment happen under one mutex ([`UsageTracker::try_acquire`]),
//! so concurrent callers cannot both slip under the last unit of quota.

use async_trait::async_trait;
use chrono::NaiveDate;
use haulguard_core::{ApiConfig, Clock, RateLimits, UsageStats};
use haulguard_fetch::QuotaGate;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::kv::{KeyValueStore, load_value, save_value};

/// Store key of the persisted usage map.
pub const USAGE_STATS_KEY: &str = "api_usage_stats";

type UsageMap = HashMap<String, UsageStats>;

/// Returns the provider's stats after rolling them over to today.
fn touch<'a>(map: &'a mut UsageMap, provider: &str, today: NaiveDate) -> &'a mut UsageStats {
    let stats = map
        .entry(provider.to_string())
        .or_insert_with(|| UsageStats::new(today));
    stats.apply_lazy_reset(today);
    stats
}

/// Usage counters for every known provider.
pub struct UsageTracker {
    store: Arc<dyn KeyValueStore>,
    limits: HashMap<String, RateLimits>,
    clock: Arc<dyn Clock>,
    stats: Mutex<UsageMap>,
}

impl UsageTracker {
    /// Creates a tracker with empty counters. Call [`load`](Self::load) to
    /// pick up persisted state, or use [`initialize`](Self::initialize).
    pub fn new(store: Arc<dyn KeyValueStore>, configs: &[ApiConfig], clock: Arc<dyn Clock>) -> Self {
        let limits = configs
            .iter()
            .map(|c| (c.name.clone(), c.rate_limits))
            .collect();
        Self {
            store,
            limits,
            clock,
            stats: Mutex::new(HashMap::new()),
        }
    }

    /// Creates a tracker and loads persisted counters.
    pub async fn initialize(
        store: Arc<dyn KeyValueStore>,
        configs: &[ApiConfig],
        clock: Arc<dyn Clock>,
    ) -> Self {
        let tracker = Self::new(store, configs, clock);
        tracker.load().await;
        tracker
    }

    /// Replaces in-memory counters with the persisted map.
    ///
    /// Missing or unreadable data yields an empty map. Lazy resets are
    /// applied right away and persisted if anything rolled over.
    pub async fn load(&self) {
        let mut loaded: UsageMap = match load_value(self.store.as_ref(), USAGE_STATS_KEY).await {
            Ok(Some(map)) => map,
            Ok(None) => {
                debug!("No persisted usage stats");
                HashMap::new()
            }
            Err(e) => {
                warn!(error = %e, "Failed to load usage stats, starting empty");
                HashMap::new()
            }
        };

        let today = self.today();
        let mut rolled = false;
        for stats in loaded.values_mut() {
            rolled |= stats.apply_lazy_reset(today);
        }

        info!(providers = loaded.len(), "Usage stats loaded");
        let mut guard = self.stats.lock().await;
        *guard = loaded;
        if rolled {
            self.persist(&guard).await;
        }
    }

    fn today(&self) -> NaiveDate {
        self.clock.now().date_naive()
    }

    /// Writes the map; failures are logged, never returned.
    async fn persist(&self, map: &UsageMap) {
        if let Err(e) = save_value(self.store.as_ref(), USAGE_STATS_KEY, map).await {
            warn!(error = %e, "Failed to persist usage stats");
        }
    }

    /// Ceilings configured for `provider`.
    pub fn limits(&self, provider: &str) -> Option<RateLimits> {
        self.limits.get(provider).copied()
    }

    /// Returns true if `provider` is known and under both ceilings.
    ///
    /// A pure check: nothing is counted or persisted.
    pub async fn can_make_request(&self, provider: &str) -> bool {
        let Some(limits) = self.limits(provider) else {
            return false;
        };
        let today = self.today();
        let map = self.stats.lock().await;
        match map.get(provider) {
            Some(stats) => {
                let mut stats = stats.clone();
                stats.apply_lazy_reset(today);
                stats.has_quota(&limits)
            }
            None => limits.allows(0, 0),
        }
    }

    /// Counts one call, plus one failure when `success` is false, and
    /// persists the map.
    pub async fn increment_usage(&self, provider: &str, success: bool) {
        let today = self.today();
        let mut map = self.stats.lock().await;
        let stats = touch(&mut map, provider, today);
        stats.record_call();
        if !success {
            stats.record_failure();
        }
        debug!(
            provider,
            success,
            daily = stats.daily_calls,
            monthly = stats.monthly_calls,
            failures = stats.failures,
            "Usage incremented"
        );
        self.persist(&map).await;
    }

    /// Counts one call if `provider` still has quota.
    ///
    /// Returns false, counting nothing, when the provider is unknown or a
    /// ceiling has been reached.
    pub async fn try_acquire(&self, provider: &str) -> bool {
        let Some(limits) = self.limits(provider) else {
            warn!(provider, "Quota requested for unknown provider");
            return false;
        };
        let today = self.today();
        let mut map = self.stats.lock().await;
        let stats = touch(&mut map, provider, today);
        if !stats.has_quota(&limits) {
            debug!(
                provider,
                daily = stats.daily_calls,
                monthly = stats.monthly_calls,
                "Quota exhausted"
            );
            return false;
        }
        stats.record_call();
        self.persist(&map).await;
        true
    }

    /// Records the outcome of a call counted by [`try_acquire`](Self::try_acquire).
    pub async fn record_outcome(&self, provider: &str, success: bool) {
        if success {
            return;
        }
        let today = self.today();
        let mut map = self.stats.lock().await;
        touch(&mut map, provider, today).record_failure();
        self.persist(&map).await;
    }

    /// Snapshot of every known provider's counters, rolled over to today.
    ///
    /// Providers that were never called appear with zeroed counters.
    pub async fn usage_status(&self) -> BTreeMap<String, UsageStats> {
        let today = self.today();
        let mut map = self.stats.lock().await;

        let mut rolled = false;
        for stats in map.values_mut() {
            rolled |= stats.apply_lazy_reset(today);
        }
        if rolled {
            self.persist(&map).await;
        }

        let mut snapshot: BTreeMap<String, UsageStats> = self
            .limits
            .keys()
            .map(|name| (name.clone(), UsageStats::new(today)))
            .collect();
        snapshot.extend(map.iter().map(|(k, v)| (k.clone(), v.clone())));
        snapshot
    }

    /// Current counters for one provider.
    pub async fn stats(&self, provider: &str) -> Option<UsageStats> {
        let today = self.today();
        let map = self.stats.lock().await;
        map.get(provider).map(|stats| {
            let mut stats = stats.clone();
            stats.apply_lazy_reset(today);
            stats
        })
    }

    /// Recorded failures for one provider.
    pub async fn failures(&self, provider: &str) -> u64 {
        self.stats
            .lock()
            .await
            .get(provider)
            .map_or(0, |s| s.failures)
    }

    /// Calls left today for one provider, if it is known.
    pub async fn remaining_today(&self, provider: &str) -> Option<u64> {
        let limits = self.limits(provider)?;
        let stats = self
            .stats(provider)
            .await
            .unwrap_or_else(|| UsageStats::new(self.today()));
        Some(stats.remaining_today(&limits))
    }

    /// Clears the failure counter of one provider.
    pub async fn reset_failures(&self, provider: &str) {
        let mut map = self.stats.lock().await;
        if let Some(stats) = map.get_mut(provider) {
            stats.failures = 0;
            info!(provider, "Failure counter reset");
            self.persist(&map).await;
        }
    }

    /// Forgets all counters.
    pub async fn reset_all(&self) {
        let mut map = self.stats.lock().await;
        map.clear();
        info!("All usage counters reset");
        self.persist(&map).await;
    }
}

impl std::fmt::Debug for UsageTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UsageTracker")
            .field("limits", &self.limits)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl QuotaGate for UsageTracker {
    async fn try_acquire(&self, provider: &str) -> bool {
        UsageTracker::try_acquire(self, provider).await
    }

    async fn record_outcome(&self, provider: &str, success: bool) {
        UsageTracker::record_outcome(self, provider, success).await;
    }
}

// ============================================================================
// Tests
// ============================================================================
