//! Hours-of-service compliance.
//!
//! Computes the FMCSA property-carrying clocks from a duty-status log:
//!
//! - 11 hours of driving per shift
//! - 14-hour on-duty window from the start of the shift
//! - 30-minute break after 8 cumulative hours of driving
//! - 60 hours in 7 days or 70 hours in 8 days of on-duty time
//!
//! A shift starts after 10 consecutive hours off duty; a 34-hour rest
//! restarts the cycle. Time not covered by a driving or on-duty entry
//! counts as off duty.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

use crate::error::ServiceError;

const DRIVING_LIMIT_H: i64 = 11;
const WINDOW_LIMIT_H: i64 = 14;
const BREAK_AFTER_H: i64 = 8;
const BREAK_MIN: i64 = 30;
const SHIFT_RESET_H: i64 = 10;
const CYCLE_RESTART_H: i64 = 34;

/// Remaining time under this many minutes raises a warning.
pub const WARNING_THRESHOLD_MIN: i64 = 60;
/// Remaining time under this many minutes raises a critical warning.
pub const CRITICAL_THRESHOLD_MIN: i64 = 30;

// ============================================================================
// Log Types
// ============================================================================

/// ELD duty status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DutyStatus {
    /// Off duty.
    OffDuty,
    /// In the sleeper berth.
    Sleeper,
    /// Driving.
    Driving,
    /// On duty, not driving.
    OnDuty,
}

impl DutyStatus {
    /// Driving or on duty.
    pub fn is_work(self) -> bool {
        matches!(self, Self::Driving | Self::OnDuty)
    }
}

impl FromStr for DutyStatus {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "off" | "off_duty" => Ok(Self::OffDuty),
            "sb" | "sleeper" => Ok(Self::Sleeper),
            "d" | "driving" => Ok(Self::Driving),
            "on" | "on_duty" => Ok(Self::OnDuty),
            other => Err(ServiceError::InvalidInput(format!(
                "unknown duty status '{other}'"
            ))),
        }
    }
}

/// One duty-status change. An entry without `end` runs until now.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DutyEntry {
    /// Status during the entry.
    pub status: DutyStatus,
    /// When the status began.
    pub start: DateTime<Utc>,
    /// When it ended, if it has.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<DateTime<Utc>>,
}

impl DutyEntry {
    /// A finished entry.
    pub fn new(status: DutyStatus, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            status,
            start,
            end: Some(end),
        }
    }

    /// An entry still in progress.
    pub fn ongoing(status: DutyStatus, start: DateTime<Utc>) -> Self {
        Self {
            status,
            start,
            end: None,
        }
    }
}

/// Weekly on-duty limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CycleRule {
    /// 60 hours in 7 days.
    #[serde(rename = "60/7")]
    SixtySeven,
    /// 70 hours in 8 days.
    #[default]
    #[serde(rename = "70/8")]
    SeventyEight,
}

impl CycleRule {
    /// Limit in hours.
    pub fn limit_hours(self) -> i64 {
        match self {
            Self::SixtySeven => 60,
            Self::SeventyEight => 70,
        }
    }

    /// Look-back period in days.
    pub fn days(self) -> i64 {
        match self {
            Self::SixtySeven => 7,
            Self::SeventyEight => 8,
        }
    }
}

impl FromStr for CycleRule {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "60" | "60/7" => Ok(Self::SixtySeven),
            "70" | "70/8" => Ok(Self::SeventyEight),
            other => Err(ServiceError::InvalidInput(format!(
                "unknown cycle '{other}', expected 60/7 or 70/8"
            ))),
        }
    }
}

impl fmt::Display for CycleRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SixtySeven => f.write_str("60/7"),
            Self::SeventyEight => f.write_str("70/8"),
        }
    }
}

// ============================================================================
// Report Types
// ============================================================================

/// One of the four HOS limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HosLimit {
    /// 11-hour driving limit.
    Driving,
    /// 14-hour duty window.
    DutyWindow,
    /// 30-minute break requirement.
    Break,
    /// 60/70-hour cycle.
    Cycle,
}

impl HosLimit {
    /// Returns the display name for this limit.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Driving => "11-hour driving limit",
            Self::DutyWindow => "14-hour duty window",
            Self::Break => "30-minute break",
            Self::Cycle => "Weekly cycle",
        }
    }
}

/// Remaining time per limit, in minutes. Negative means exceeded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HosClock {
    /// Whether the driver is inside a shift.
    pub in_shift: bool,
    /// Start of the current shift.
    pub shift_start: Option<DateTime<Utc>>,
    /// Driving minutes left in the shift.
    pub driving_remaining_min: i64,
    /// Minutes left in the 14-hour window.
    pub window_remaining_min: i64,
    /// Driving minutes left before a 30-minute break is required.
    pub break_remaining_min: i64,
    /// On-duty minutes left in the cycle.
    pub cycle_remaining_min: i64,
    /// On-duty minutes counted toward the cycle.
    pub cycle_used_min: i64,
}

impl HosClock {
    fn remaining(&self, limit: HosLimit) -> i64 {
        match limit {
            HosLimit::Driving => self.driving_remaining_min,
            HosLimit::DutyWindow => self.window_remaining_min,
            HosLimit::Break => self.break_remaining_min,
            HosLimit::Cycle => self.cycle_remaining_min,
        }
    }

    /// Minutes the driver may still drive before any limit stops them.
    pub fn available_driving_min(&self) -> i64 {
        self.driving_remaining_min
            .min(self.window_remaining_min)
            .min(self.break_remaining_min)
            .min(self.cycle_remaining_min)
            .max(0)
    }

    /// The limit that runs out first.
    pub fn binding_limit(&self) -> HosLimit {
        [
            HosLimit::Driving,
            HosLimit::DutyWindow,
            HosLimit::Break,
            HosLimit::Cycle,
        ]
        .into_iter()
        .min_by_key(|limit| self.remaining(*limit))
        .unwrap_or(HosLimit::Driving)
    }
}

/// Driving done past a limit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    /// Limit that was broken.
    pub limit: HosLimit,
    /// Minutes of driving beyond it.
    pub over_by_min: i64,
}

/// How close a limit is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WarningLevel {
    /// Under an hour left.
    Warning,
    /// Under half an hour left.
    Critical,
}

/// A limit about to run out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComplianceWarning {
    /// The limit.
    pub limit: HosLimit,
    /// Minutes left.
    pub remaining_min: i64,
    /// Urgency.
    pub level: WarningLevel,
    /// Driver-facing text.
    pub message: String,
}

/// Result of [`check_compliance`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComplianceReport {
    /// Cycle rule applied.
    pub cycle: CycleRule,
    /// Remaining time per limit.
    pub clock: HosClock,
    /// Limits already broken.
    pub violations: Vec<Violation>,
    /// Limits about to run out, most urgent first.
    pub warnings: Vec<ComplianceWarning>,
}

impl ComplianceReport {
    /// No violations recorded.
    pub fn is_compliant(&self) -> bool {
        self.violations.is_empty()
    }
}

// ============================================================================
// Computation
// ============================================================================

#[derive(Debug, Clone, Copy)]
struct Span {
    status: DutyStatus,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl Span {
    fn len(&self) -> Duration {
        self.end - self.start
    }

    fn driving(&self) -> bool {
        self.status == DutyStatus::Driving
    }

    /// Length of the part inside `[from, to)`.
    fn overlap(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> Duration {
        let start = self.start.max(from);
        let end = self.end.min(to);
        if end > start { end - start } else { Duration::zero() }
    }
}

/// Validates the log and returns the work spans clipped to `now`, in order.
fn work_spans(log: &[DutyEntry], now: DateTime<Utc>) -> Result<Vec<Span>, ServiceError> {
    let mut entries: Vec<&DutyEntry> = log.iter().collect();
    entries.sort_by_key(|e| e.start);

    let mut spans = Vec::new();
    let mut previous_end: Option<DateTime<Utc>> = None;

    for entry in entries {
        if let Some(end) = entry.end {
            if end < entry.start {
                return Err(ServiceError::InvalidDutyEntry {
                    start: entry.start,
                    end,
                });
            }
        }
        if previous_end.is_some_and(|prev| entry.start < prev) {
            return Err(ServiceError::OverlappingDutyEntries { at: entry.start });
        }

        let end = entry.end.unwrap_or(now).min(now);
        previous_end = Some(entry.end.unwrap_or(now));

        if entry.start >= now || end <= entry.start {
            continue;
        }
        if entry.status.is_work() {
            spans.push(Span {
                status: entry.status,
                start: entry.start,
                end,
            });
        }
    }
    Ok(spans)
}

/// Start of the latest rest of at least `rest` between work spans.
///
/// Returns the start of the span that follows it, `now` if the trailing
/// rest qualifies, or `None` if no such rest exists inside the log.
fn after_last_rest(spans: &[Span], now: DateTime<Utc>, rest: Duration) -> Option<DateTime<Utc>> {
    let last = spans.last()?;
    if now - last.end >= rest {
        return Some(now);
    }
    spans
        .windows(2)
        .rev()
        .find(|pair| pair[1].start - pair[0].end >= rest)
        .map(|pair| pair[1].start)
}

fn hours(h: i64) -> Duration {
    Duration::hours(h)
}

/// Checks a duty log against the HOS limits as of `now`.
///
/// # Errors
///
/// Returns an error if an entry ends before it starts or two entries
/// overlap.
pub fn check_compliance(
    log: &[DutyEntry],
    now: DateTime<Utc>,
    cycle: CycleRule,
) -> Result<ComplianceReport, ServiceError> {
    let spans = work_spans(log, now)?;
    let mut violations = Vec::new();

    // Shift: work since the last 10-hour rest (or the first entry).
    let shift_start = match after_last_rest(&spans, now, hours(SHIFT_RESET_H)) {
        Some(at) if at == now => None,
        Some(at) => Some(at),
        None => spans.first().map(|s| s.start),
    };
    let shift: Vec<Span> = shift_start
        .map(|start| spans.iter().copied().filter(|s| s.start >= start).collect())
        .unwrap_or_default();

    // 11-hour driving.
    let driving_used: Duration = shift
        .iter()
        .filter(|s| s.driving())
        .map(Span::len)
        .fold(Duration::zero(), |acc, d| acc + d);
    if driving_used > hours(DRIVING_LIMIT_H) {
        violations.push(Violation {
            limit: HosLimit::Driving,
            over_by_min: (driving_used - hours(DRIVING_LIMIT_H)).num_minutes(),
        });
    }

    // 14-hour window.
    let window_remaining = match shift_start {
        Some(start) => {
            let window_end = start + hours(WINDOW_LIMIT_H);
            let late: Duration = shift
                .iter()
                .filter(|s| s.driving())
                .map(|s| s.overlap(window_end, now))
                .fold(Duration::zero(), |acc, d| acc + d);
            if late > Duration::zero() {
                violations.push(Violation {
                    limit: HosLimit::DutyWindow,
                    over_by_min: late.num_minutes(),
                });
            }
            window_end - now
        }
        None => hours(WINDOW_LIMIT_H),
    };

    // 30-minute break: driving since the last 30 minutes without driving.
    let mut since_break = Duration::zero();
    let mut worst = Duration::zero();
    if let Some(start) = shift_start {
        let mut rest_run = Duration::zero();
        let mut cursor = start;
        for span in &shift {
            rest_run += span.start - cursor;
            if span.driving() {
                if rest_run >= Duration::minutes(BREAK_MIN) {
                    since_break = Duration::zero();
                }
                rest_run = Duration::zero();
                since_break += span.len();
                worst = worst.max(since_break);
            } else {
                rest_run += span.len();
            }
            cursor = span.end;
        }
        rest_run += now - cursor;
        if rest_run >= Duration::minutes(BREAK_MIN) {
            since_break = Duration::zero();
        }
    }
    if worst > hours(BREAK_AFTER_H) {
        violations.push(Violation {
            limit: HosLimit::Break,
            over_by_min: (worst - hours(BREAK_AFTER_H)).num_minutes(),
        });
    }

    // 60/70-hour cycle, restarted by 34 hours off.
    let lookback = now - Duration::days(cycle.days());
    let cycle_start = after_last_rest(&spans, now, hours(CYCLE_RESTART_H))
        .map_or(lookback, |restart| restart.max(lookback));
    let cycle_limit = hours(cycle.limit_hours());
    let mut cycle_used = Duration::zero();
    let mut driving_over_cycle = Duration::zero();
    for span in &spans {
        let counted = span.overlap(cycle_start, now);
        let before = cycle_used;
        cycle_used += counted;
        if span.driving() && cycle_used > cycle_limit {
            driving_over_cycle += counted.min(cycle_used - before.max(cycle_limit));
        }
    }
    if driving_over_cycle > Duration::zero() {
        violations.push(Violation {
            limit: HosLimit::Cycle,
            over_by_min: driving_over_cycle.num_minutes(),
        });
    }

    let clock = HosClock {
        in_shift: shift_start.is_some(),
        shift_start,
        driving_remaining_min: (hours(DRIVING_LIMIT_H) - driving_used).num_minutes(),
        window_remaining_min: window_remaining.num_minutes(),
        break_remaining_min: (hours(BREAK_AFTER_H) - since_break).num_minutes(),
        cycle_remaining_min: (cycle_limit - cycle_used).num_minutes(),
        cycle_used_min: cycle_used.num_minutes(),
    };

    let warnings = predictive_warnings(&clock);
    debug!(
        in_shift = clock.in_shift,
        available = clock.available_driving_min(),
        violations = violations.len(),
        warnings = warnings.len(),
        "HOS computed"
    );

    Ok(ComplianceReport {
        cycle,
        clock,
        violations,
        warnings,
    })
}

/// Warnings for limits with less than an hour left.
///
/// Shift limits only warn inside a shift; the cycle always does.
fn predictive_warnings(clock: &HosClock) -> Vec<ComplianceWarning> {
    let limits: &[HosLimit] = if clock.in_shift {
        &[
            HosLimit::Driving,
            HosLimit::DutyWindow,
            HosLimit::Break,
            HosLimit::Cycle,
        ]
    } else {
        &[HosLimit::Cycle]
    };

    let mut warnings: Vec<ComplianceWarning> = limits
        .iter()
        .filter_map(|&limit| {
            let remaining = clock.remaining(limit);
            if !(0..WARNING_THRESHOLD_MIN).contains(&remaining) {
                return None;
            }
            let level = if remaining < CRITICAL_THRESHOLD_MIN {
                WarningLevel::Critical
            } else {
                WarningLevel::Warning
            };
            let message = match limit {
                HosLimit::Break => format!("30-minute break required in {remaining} min"),
                _ => format!("{}: {remaining} min left", limit.display_name()),
            };
            Some(ComplianceWarning {
                limit,
                remaining_min: remaining,
                level,
                message,
            })
        })
        .collect();

    warnings.sort_by_key(|w| w.remaining_min);
    warnings
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 10, day, hour, minute, 0).unwrap()
    }

    fn entry(status: DutyStatus, start: DateTime<Utc>, end: DateTime<Utc>) -> DutyEntry {
        DutyEntry::new(status, start, end)
    }

    use DutyStatus::{Driving, OffDuty, OnDuty, Sleeper};

    #[test]
    fn test_empty_log_is_fresh() {
        let report = check_compliance(&[], at(7, 8, 0), CycleRule::SixtySeven).unwrap();
        let clock = &report.clock;
        assert!(!clock.in_shift);
        assert_eq!(clock.driving_remaining_min, 660);
        assert_eq!(clock.window_remaining_min, 840);
        assert_eq!(clock.break_remaining_min, 480);
        assert_eq!(clock.cycle_remaining_min, 3600);
        assert!(report.is_compliant());
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_typical_shift() {
        let log = vec![
            entry(OffDuty, at(6, 18, 0), at(7, 6, 0)),
            entry(Driving, at(7, 6, 0), at(7, 10, 0)),
            entry(OnDuty, at(7, 10, 0), at(7, 10, 30)),
            DutyEntry::ongoing(Driving, at(7, 10, 30)),
        ];
        let report = check_compliance(&log, at(7, 14, 30), CycleRule::SeventyEight).unwrap();
        let clock = &report.clock;

        assert_eq!(clock.shift_start, Some(at(7, 6, 0)));
        assert_eq!(clock.driving_remaining_min, 180);
        assert_eq!(clock.window_remaining_min, 330);
        // The 30 minutes on duty count as the break.
        assert_eq!(clock.break_remaining_min, 240);
        assert_eq!(clock.cycle_used_min, 510);
        assert_eq!(clock.available_driving_min(), 180);
        assert_eq!(clock.binding_limit(), HosLimit::Driving);
        assert!(report.is_compliant());
    }

    #[test]
    fn test_break_due_is_critical() {
        let log = vec![DutyEntry::ongoing(Driving, at(7, 6, 0))];
        let report = check_compliance(&log, at(7, 13, 40), CycleRule::SeventyEight).unwrap();

        assert_eq!(report.clock.break_remaining_min, 20);
        let first = &report.warnings[0];
        assert_eq!(first.limit, HosLimit::Break);
        assert_eq!(first.level, WarningLevel::Critical);
    }

    #[test]
    fn test_driving_limit_warning() {
        let log = vec![
            entry(Driving, at(7, 6, 0), at(7, 11, 0)),
            entry(OffDuty, at(7, 11, 0), at(7, 11, 30)),
            entry(Driving, at(7, 11, 30), at(7, 16, 20)),
        ];
        let report = check_compliance(&log, at(7, 16, 20), CycleRule::SeventyEight).unwrap();

        assert_eq!(report.clock.driving_remaining_min, 50);
        let driving = report
            .warnings
            .iter()
            .find(|w| w.limit == HosLimit::Driving)
            .unwrap();
        assert_eq!(driving.level, WarningLevel::Warning);
    }

    #[test]
    fn test_driving_limit_violation() {
        let log = vec![
            entry(Driving, at(7, 6, 0), at(7, 11, 0)),
            entry(Sleeper, at(7, 11, 0), at(7, 12, 0)),
            entry(Driving, at(7, 12, 0), at(7, 18, 30)),
        ];
        let report = check_compliance(&log, at(7, 18, 30), CycleRule::SeventyEight).unwrap();

        assert_eq!(report.clock.driving_remaining_min, -30);
        assert!(report.violations.contains(&Violation {
            limit: HosLimit::Driving,
            over_by_min: 30,
        }));
    }

    #[test]
    fn test_window_violation() {
        let log = vec![
            entry(OnDuty, at(7, 5, 0), at(7, 13, 0)),
            entry(Driving, at(7, 13, 0), at(7, 17, 0)),
            entry(Driving, at(7, 19, 0), at(7, 20, 0)),
        ];
        let report = check_compliance(&log, at(7, 20, 0), CycleRule::SeventyEight).unwrap();

        assert_eq!(report.clock.window_remaining_min, -60);
        assert!(report.violations.iter().any(|v| v.limit == HosLimit::DutyWindow && v.over_by_min == 60));
    }

    #[test]
    fn test_ten_hour_rest_starts_new_shift() {
        let log = vec![
            entry(Driving, at(6, 6, 0), at(6, 16, 0)),
            entry(OffDuty, at(6, 16, 0), at(7, 6, 0)),
            DutyEntry::ongoing(Driving, at(7, 6, 0)),
        ];
        let report = check_compliance(&log, at(7, 7, 0), CycleRule::SeventyEight).unwrap();

        assert_eq!(report.clock.shift_start, Some(at(7, 6, 0)));
        assert_eq!(report.clock.driving_remaining_min, 600);
        assert_eq!(report.clock.cycle_used_min, 660);
    }

    #[test]
    fn test_off_duty_for_ten_hours_ends_shift() {
        let log = vec![entry(Driving, at(7, 0, 0), at(7, 4, 0))];
        let report = check_compliance(&log, at(7, 15, 0), CycleRule::SeventyEight).unwrap();
        assert!(!report.clock.in_shift);
        assert_eq!(report.clock.driving_remaining_min, 660);
        assert_eq!(report.clock.cycle_used_min, 240);
    }

    #[test]
    fn test_cycle_restart_after_34_hours() {
        let log = vec![
            entry(OnDuty, at(2, 6, 0), at(2, 20, 0)),
            entry(OnDuty, at(3, 6, 0), at(3, 20, 0)),
            // 34+ hours off: 3rd 20:00 to 5th 08:00.
            DutyEntry::ongoing(Driving, at(5, 8, 0)),
        ];
        let report = check_compliance(&log, at(5, 9, 0), CycleRule::SixtySeven).unwrap();
        assert_eq!(report.clock.cycle_used_min, 60);
    }

    #[test]
    fn test_cycle_lookback_window() {
        // Nine days of 9-hour shifts; only the last seven days count under 60/7.
        let log: Vec<DutyEntry> = (1..=9)
            .map(|day| entry(OnDuty, at(day, 6, 0), at(day, 15, 0)))
            .collect();
        let report = check_compliance(&log, at(10, 0, 0), CycleRule::SixtySeven).unwrap();
        assert_eq!(report.clock.cycle_used_min, 7 * 9 * 60);
        assert_eq!(report.clock.cycle_remaining_min, -180);
        // All of it was on-duty time, not driving.
        assert!(report.violations.iter().all(|v| v.limit != HosLimit::Cycle));
    }

    #[test]
    fn test_invalid_entries() {
        let backwards = vec![entry(Driving, at(7, 10, 0), at(7, 9, 0))];
        assert!(matches!(
            check_compliance(&backwards, at(7, 12, 0), CycleRule::SeventyEight),
            Err(ServiceError::InvalidDutyEntry { .. })
        ));

        let overlapping = vec![
            entry(Driving, at(7, 6, 0), at(7, 9, 0)),
            entry(OnDuty, at(7, 8, 0), at(7, 10, 0)),
        ];
        assert!(matches!(
            check_compliance(&overlapping, at(7, 12, 0), CycleRule::SeventyEight),
            Err(ServiceError::OverlappingDutyEntries { .. })
        ));
    }

    #[test]
    fn test_parse_inputs() {
        assert_eq!("on-duty".parse::<DutyStatus>().unwrap(), OnDuty);
        assert_eq!("SB".parse::<DutyStatus>().unwrap(), Sleeper);
        assert!("napping".parse::<DutyStatus>().is_err());
        assert_eq!("60".parse::<CycleRule>().unwrap(), CycleRule::SixtySeven);
        assert_eq!(CycleRule::default().to_string(), "70/8");
    }
}
