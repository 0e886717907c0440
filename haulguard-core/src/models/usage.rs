//! Per-provider usage counters.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use super::provider::RateLimits;

// ============================================================================
// Usage Stats
// ============================================================================

/// Mutable call and failure counters for one provider.
///
/// Serialized as part of the usage map under the `api_usage_stats` key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageStats {
    /// Calls made since `last_reset`'s day began.
    pub daily_calls: u64,
    /// Calls made in `last_reset`'s month.
    pub monthly_calls: u64,
    /// Day the counters were last reset.
    pub last_reset: NaiveDate,
    /// Failed attempts recorded.
    pub failures: u64,
}

impl UsageStats {
    /// Creates empty counters anchored at `today`.
    pub fn new(today: NaiveDate) -> Self {
        Self {
            daily_calls: 0,
            monthly_calls: 0,
            last_reset: today,
            failures: 0,
        }
    }

    /// Records one call attempt.
    pub fn record_call(&mut self) {
        self.daily_calls = self.daily_calls.saturating_add(1);
        self.monthly_calls = self.monthly_calls.saturating_add(1);
    }

    /// Records one failure.
    pub fn record_failure(&mut self) {
        self.failures = self.failures.saturating_add(1);
    }

    /// Returns true if another call fits under `limits`.
    pub fn has_quota(&self, limits: &RateLimits) -> bool {
        limits.allows(self.daily_calls, self.monthly_calls)
    }

    /// Zeroes counters whose period ended before `today`.
    ///
    /// The daily counter is zeroed when the stored day differs from
    /// `today`; the monthly counter when the month differs too. Returns
    /// true if anything changed.
    pub fn apply_lazy_reset(&mut self, today: NaiveDate) -> bool {
        if self.last_reset == today {
            return false;
        }

        if self.last_reset.year() != today.year() || self.last_reset.month() != today.month() {
            self.monthly_calls = 0;
        }
        self.daily_calls = 0;
        self.last_reset = today;
        true
    }

    /// Calls left today, bounded by the monthly ceiling.
    pub fn remaining_today(&self, limits: &RateLimits) -> u64 {
        let daily = limits.daily.saturating_sub(self.daily_calls);
        let monthly = limits.monthly.saturating_sub(self.monthly_calls);
        daily.min(monthly)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_record_call_and_failure() {
        let mut stats = UsageStats::new(day(2024, 5, 1));
        stats.record_call();
        stats.record_failure();
        assert_eq!(stats.daily_calls, 1);
        assert_eq!(stats.monthly_calls, 1);
        assert_eq!(stats.failures, 1);
    }

    #[test]
    fn test_counters_saturate() {
        let mut stats = UsageStats {
            daily_calls: u64::MAX,
            monthly_calls: u64::MAX,
            last_reset: day(2024, 5, 1),
            failures: u64::MAX,
        };
        stats.record_call();
        stats.record_failure();
        assert_eq!(stats.daily_calls, u64::MAX);
        assert_eq!(stats.monthly_calls, u64::MAX);
        assert_eq!(stats.failures, u64::MAX);
    }

    #[test]
    fn test_same_day_no_reset() {
        let mut stats = UsageStats::new(day(2024, 5, 1));
        stats.record_call();
        assert!(!stats.apply_lazy_reset(day(2024, 5, 1)));
        assert_eq!(stats.daily_calls, 1);
    }

    #[test]
    fn test_new_day_resets_daily_only() {
        let mut stats = UsageStats::new(day(2024, 5, 1));
        stats.record_call();
        stats.record_call();
        stats.record_failure();

        assert!(stats.apply_lazy_reset(day(2024, 5, 2)));
        assert_eq!(stats.daily_calls, 0);
        assert_eq!(stats.monthly_calls, 2);
        assert_eq!(stats.failures, 1);
        assert_eq!(stats.last_reset, day(2024, 5, 2));
    }

    #[test]
    fn test_new_month_resets_monthly() {
        let mut stats = UsageStats::new(day(2024, 5, 31));
        stats.record_call();
        stats.apply_lazy_reset(day(2024, 6, 1));
        assert_eq!(stats.monthly_calls, 0);
    }

    #[test]
    fn test_remaining_today() {
        let limits = RateLimits::new(5, 6);
        let mut stats = UsageStats::new(day(2024, 5, 1));
        stats.monthly_calls = 4;
        stats.daily_calls = 1;
        assert_eq!(stats.remaining_today(&limits), 2);
    }
}
