//! Bounded TTL response cache.
//!
//! Values are stored as JSON under `"{service}_{endpoint}_{params}"` keys
//! with a per-entry TTL. An entry is fresh while `now - timestamp < ttl`.
//!
//! The cache holds at most `capacity` entries. Inserting a new key into a
//! full cache first sweeps stale entries, then evicts the oldest one.

use chrono::{DateTime, Duration, Utc};
use haulguard_core::Clock;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, trace, warn};

/// Default number of entries kept.
pub const DEFAULT_CACHE_CAPACITY: usize = 256;

/// Longest TTL honoured (ten years).
const MAX_TTL_HOURS: u64 = 24 * 365 * 10;

/// A cached value with its timestamp and lifetime.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// Serialized value.
    pub data: Value,
    /// When the value was stored.
    pub timestamp: DateTime<Utc>,
    /// How long the value stays fresh.
    pub ttl: Duration,
}

impl CacheEntry {
    /// Returns true while `now - timestamp < ttl`.
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now - self.timestamp < self.ttl
    }
}

/// Builds the cache key for a service call.
///
/// `params` is rendered as compact JSON, so equal parameter objects with
/// the same field order produce equal keys.
pub fn cache_key(service: &str, endpoint: &str, params: &Value) -> String {
    format!("{service}_{endpoint}_{params}")
}

/// In-memory response cache.
pub struct ResponseCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
    capacity: usize,
    clock: Arc<dyn Clock>,
}

impl ResponseCache {
    /// Creates a cache holding at most `capacity` entries.
    pub fn new(capacity: usize, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            capacity,
            clock,
        }
    }

    /// Creates a cache with [`DEFAULT_CACHE_CAPACITY`].
    pub fn with_default_capacity(clock: Arc<dyn Clock>) -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY, clock)
    }

    /// Maximum number of entries.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the fresh value under `key`, or `None` on a miss.
    ///
    /// Stale entries are dropped when found.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let now = self.clock.now();
        let mut entries = self.entries.lock().await;

        let entry = entries.get(key)?;
        if !entry.is_fresh(now) {
            trace!(key, "Cache entry stale");
            entries.remove(key);
            return None;
        }

        match serde_json::from_value(entry.data.clone()) {
            Ok(value) => {
                trace!(key, "Cache hit");
                Some(value)
            }
            Err(e) => {
                warn!(key, error = %e, "Cached value has unexpected shape");
                None
            }
        }
    }

    /// Stores `data` under `key` for `ttl_hours`.
    ///
    /// A TTL of zero disables caching for the call.
    pub async fn set<T: Serialize>(&self, key: &str, data: &T, ttl_hours: u64) {
        if ttl_hours == 0 || self.capacity == 0 {
            return;
        }
        let data = match serde_json::to_value(data) {
            Ok(data) => data,
            Err(e) => {
                warn!(key, error = %e, "Value not cacheable");
                return;
            }
        };

        let now = self.clock.now();
        let ttl = Duration::hours(i64::try_from(ttl_hours.min(MAX_TTL_HOURS)).unwrap_or_default());
        let mut entries = self.entries.lock().await;

        if !entries.contains_key(key) && entries.len() >= self.capacity {
            let before = entries.len();
            entries.retain(|_, entry| entry.is_fresh(now));
            if entries.len() < before {
                debug!(swept = before - entries.len(), "Swept stale cache entries");
            }

            if entries.len() >= self.capacity {
                let oldest = entries
                    .iter()
                    .min_by_key(|(_, entry)| entry.timestamp)
                    .map(|(k, _)| k.clone());
                if let Some(oldest) = oldest {
                    debug!(key = %oldest, "Evicting oldest cache entry");
                    entries.remove(&oldest);
                }
            }
        }

        entries.insert(
            key.to_string(),
            CacheEntry {
                data,
                timestamp: now,
                ttl,
            },
        );
    }

    /// Number of entries, fresh or not.
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    /// Returns true if the cache holds nothing.
    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }

    /// Drops every entry.
    pub async fn clear(&self) {
        self.entries.lock().await.clear();
    }

    /// Drops stale entries and returns how many were removed.
    pub async fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let mut entries = self.entries.lock().await;
        let before = entries.len();
        entries.retain(|_, entry| entry.is_fresh(now));
        before - entries.len()
    }
}

impl std::fmt::Debug for ResponseCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseCache")
            .field("capacity", &self.capacity)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use haulguard_core::ManualClock;
    use serde_json::json;

    fn clock() -> ManualClock {
        ManualClock::new(Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap())
    }

    #[test]
    fn test_cache_key_format() {
        let key = cache_key("weather", "current", &json!({"lat": 41.5, "lon": -87.6}));
        assert_eq!(key, r#"weather_current_{"lat":41.5,"lon":-87.6}"#);
    }

    #[tokio::test]
    async fn test_one_hour_ttl() {
        let clock = clock();
        let cache = ResponseCache::new(8, Arc::new(clock.clone()));
        cache.set("k", &"value", 1).await;

        assert_eq!(cache.get::<String>("k").await.as_deref(), Some("value"));

        clock.advance(Duration::minutes(59));
        assert!(cache.get::<String>("k").await.is_some());

        clock.advance(Duration::minutes(2));
        assert!(cache.get::<String>("k").await.is_none());
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_exact_ttl_is_stale() {
        let clock = clock();
        let cache = ResponseCache::new(8, Arc::new(clock.clone()));
        cache.set("k", &1u32, 1).await;
        clock.advance(Duration::hours(1));
        assert!(cache.get::<u32>("k").await.is_none());
    }

    #[tokio::test]
    async fn test_zero_ttl_not_stored() {
        let cache = ResponseCache::new(8, Arc::new(clock()));
        cache.set("chat", &"hello", 0).await;
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_evicts_oldest_when_full() {
        let clock = clock();
        let cache = ResponseCache::new(2, Arc::new(clock.clone()));

        cache.set("a", &1u32, 24).await;
        clock.advance(Duration::minutes(1));
        cache.set("b", &2u32, 24).await;
        clock.advance(Duration::minutes(1));
        cache.set("c", &3u32, 24).await;

        assert_eq!(cache.len().await, 2);
        assert!(cache.get::<u32>("a").await.is_none());
        assert_eq!(cache.get::<u32>("b").await, Some(2));
        assert_eq!(cache.get::<u32>("c").await, Some(3));
    }

    #[tokio::test]
    async fn test_sweeps_stale_before_evicting() {
        let clock = clock();
        let cache = ResponseCache::new(2, Arc::new(clock.clone()));

        cache.set("old-long", &1u32, 24).await;
        clock.advance(Duration::minutes(1));
        cache.set("short", &2u32, 1).await;
        clock.advance(Duration::hours(2));
        cache.set("new", &3u32, 1).await;

        // The stale entry made room; the older but still fresh one survives.
        assert_eq!(cache.get::<u32>("old-long").await, Some(1));
        assert_eq!(cache.get::<u32>("new").await, Some(3));
    }

    #[tokio::test]
    async fn test_overwrite_at_capacity_keeps_others() {
        let cache = ResponseCache::new(2, Arc::new(clock()));
        cache.set("a", &1u32, 1).await;
        cache.set("b", &2u32, 1).await;
        cache.set("a", &10u32, 1).await;
        assert_eq!(cache.get::<u32>("a").await, Some(10));
        assert_eq!(cache.get::<u32>("b").await, Some(2));
    }

    #[tokio::test]
    async fn test_purge_and_clear() {
        let clock = clock();
        let cache = ResponseCache::with_default_capacity(Arc::new(clock.clone()));
        assert_eq!(cache.capacity(), DEFAULT_CACHE_CAPACITY);

        cache.set("a", &1u32, 1).await;
        cache.set("b", &2u32, 24).await;
        clock.advance(Duration::hours(3));
        assert_eq!(cache.purge_expired().await, 1);
        assert_eq!(cache.len().await, 1);

        cache.clear().await;
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_shape_mismatch_is_miss() {
        let cache = ResponseCache::new(4, Arc::new(clock()));
        cache.set("k", &json!({"a": 1}), 1).await;
        assert!(cache.get::<Vec<u32>>("k").await.is_none());
    }
}
