//! Text output formatting with progress bars and colors.

use haulguard_core::{
    Capability, ChatReply, DiagnosticReport, Location, ServiceRecord, Severity, WeatherData,
};
use haulguard_fetch::ProviderInfo;
use haulguard_providers::KeySource;
use haulguard_services::{
    AlertStatus, ComplianceReport, MaintenanceAlert, ProviderUsage, UsageReport, WarningLevel,
};

// ============================================================================
// ANSI Colors
// ============================================================================

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const RED: &str = "\x1b[31m";
const CYAN: &str = "\x1b[36m";

// Progress bar characters
const BAR_FULL: char = '█';
const BAR_EMPTY: char = '░';

/// Text formatter with optional colors.
pub struct TextFormatter {
    use_colors: bool,
    bar_width: usize,
}

impl TextFormatter {
    /// Creates a new text formatter.
    pub fn new(use_colors: bool) -> Self {
        Self {
            use_colors,
            bar_width: 10,
        }
    }

    // ========================================================================
    // Location & Weather
    // ========================================================================

    /// Formats a position fix.
    pub fn format_location(&self, location: &Location) -> String {
        let mut lines = vec![format!(
            "{} ({})",
            self.bold(&location.display_name()),
            self.dim(&location.source.to_string())
        )];
        lines.push(format!(
            "Coordinates: {:.5}, {:.5}",
            location.latitude, location.longitude
        ));
        if let Some(country) = &location.country {
            lines.push(format!("Country:     {country}"));
        }
        if let Some(accuracy) = location.accuracy_m {
            lines.push(format!("Accuracy:    ±{accuracy:.0} m"));
        }
        lines.join("\n")
    }

    /// Formats current conditions and hazards.
    pub fn format_weather(&self, weather: &WeatherData) -> String {
        let mut lines = vec![format!(
            "{} {:.0}°F ({})",
            self.bold(&weather.conditions),
            weather.temperature_f,
            self.dim(&weather.source.to_string())
        )];

        if let Some(description) = &weather.description {
            lines.push(description.clone());
        }
        if let Some(feels) = weather.feels_like_f {
            lines.push(format!("Feels like: {feels:.0}°F"));
        }
        if let Some(wind) = weather.wind_speed_mph {
            lines.push(format!("Wind:       {wind:.0} mph"));
        }
        if let Some(visibility) = weather.visibility_mi {
            lines.push(format!("Visibility: {visibility:.1} mi"));
        }
        if let Some(humidity) = weather.humidity_pct {
            lines.push(format!("Humidity:   {humidity:.0}%"));
        }

        let hazards = weather.driving_hazards();
        if hazards.is_empty() {
            lines.push(self.green("No driving hazards"));
        } else {
            lines.push(String::new());
            for hazard in hazards {
                lines.push(format!("{} {}", self.yellow("⚠"), hazard.advice()));
            }
        }
        lines.join("\n")
    }

    // ========================================================================
    // Diagnostics & Assistant
    // ========================================================================

    /// Formats a diagnostics report.
    pub fn format_diagnostics(&self, report: &DiagnosticReport) -> String {
        let mut lines = vec![format!(
            "Diagnostics ({}) - overall {}",
            self.dim(&report.source.to_string()),
            self.color_for_severity(report.overall, report.overall.display_name())
        )];
        lines.push("─".repeat(50));

        if report.findings.is_empty() {
            lines.push(self.dim("No codes to analyze"));
            return lines.join("\n");
        }

        for finding in &report.findings {
            lines.push(format!(
                "{:<6} {:<9} {}",
                self.bold(&finding.code),
                self.color_for_severity(finding.severity, finding.severity.display_name()),
                finding.description
            ));
            lines.push(format!(
                "       {} · {}",
                self.dim(finding.system.display_name()),
                finding.recommended_action
            ));
        }

        let total = report.estimated_total_usd();
        if total > 0.0 {
            lines.push(String::new());
            lines.push(format!("Estimated repairs: {}", self.cyan(&format!("${total:.0}"))));
        }
        if report.requires_stop() {
            lines.push(self.red("Stop as soon as it is safe."));
        }
        lines.join("\n")
    }

    /// Formats an assistant reply.
    pub fn format_chat(&self, reply: &ChatReply) -> String {
        let mut lines = vec![reply.text.clone()];
        lines.push(self.dim(&format!("({})", reply.source)));
        if !reply.suggestions.is_empty() {
            lines.push(String::new());
            lines.push(self.dim("You could also ask:"));
            for suggestion in &reply.suggestions {
                lines.push(format!("  • {suggestion}"));
            }
        }
        lines.join("\n")
    }

    // ========================================================================
    // Usage & Providers
    // ========================================================================

    /// Formats the quota and cost report.
    pub fn format_usage_report(&self, report: &UsageReport) -> String {
        let mut lines = vec![self.bold("API Usage")];
        lines.push("─".repeat(60));

        for provider in &report.providers {
            lines.push(self.format_usage_line(provider));
        }

        lines.push(String::new());
        lines.push(format!(
            "Cost today: {}   this month: {}",
            self.green(&format!("${:.2}", report.total_cost_today_usd)),
            self.green(&format!("${:.2}", report.total_cost_month_usd))
        ));
        if report.degraded_mode {
            lines.push(self.red("Degraded mode: a primary provider is out of quota or failing"));
        }
        lines.join("\n")
    }

    #[allow(clippy::cast_precision_loss)]
    fn format_usage_line(&self, usage: &ProviderUsage) -> String {
        let remaining_pct = if usage.daily_limit == 0 {
            0.0
        } else {
            usage.remaining_today as f64 / usage.daily_limit as f64 * 100.0
        };

        let mut line = format!(
            "{:<18} {} {:>5}/{:<6} today  {:>6}/{:<7} month",
            usage.display_name,
            self.progress_bar(remaining_pct),
            usage.daily_calls,
            usage.daily_limit,
            usage.monthly_calls,
            usage.monthly_limit
        );
        if usage.failures > 0 {
            let text = format!("  {} failures", usage.failures);
            line.push_str(&if usage.failing { self.red(&text) } else { self.yellow(&text) });
        }
        if usage.quota_exhausted {
            line.push_str(&format!("  {}", self.red("exhausted")));
        }
        if !usage.available {
            line.push_str(&format!("  {}", self.dim("no key")));
        }
        line
    }

    /// Formats provider list header.
    pub fn format_providers_header(&self) -> String {
        format!(
            "{:<18} {:<9} {:<28} {:<8} {}",
            self.bold("Provider"),
            self.bold("Tier"),
            self.bold("Capabilities"),
            self.bold("Key"),
            self.bold("Limits")
        )
    }

    /// Formats a single provider line.
    pub fn format_provider_line(
        &self,
        info: &ProviderInfo,
        key_source: Option<KeySource>,
        enabled: bool,
    ) -> String {
        let status = if !enabled {
            self.dim("off")
        } else if info.available {
            self.green("✓")
        } else {
            self.red("✗")
        };

        let capabilities: Vec<&str> = info.capabilities.iter().map(Capability::as_str).collect();
        let key = key_source.map_or("−", |k| k.as_str());

        format!(
            "{:<18} {:<9} {:<28} {:<8} {}/day {}/month",
            format!("{} {}", info.id, status),
            info.tier.display_name(),
            capabilities.join(","),
            key,
            info.daily_limit,
            info.monthly_limit
        )
    }

    // ========================================================================
    // Hours of Service
    // ========================================================================

    /// Formats HOS clocks, violations and warnings.
    pub fn format_compliance(&self, report: &ComplianceReport) -> String {
        let clock = &report.clock;
        let mut lines = vec![format!(
            "{} ({} cycle)",
            self.bold("Hours of Service"),
            report.cycle
        )];
        lines.push("─".repeat(50));

        let rows = [
            ("Driving", clock.driving_remaining_min, 11 * 60),
            ("Window", clock.window_remaining_min, 14 * 60),
            ("Break", clock.break_remaining_min, 8 * 60),
            (
                "Cycle",
                clock.cycle_remaining_min,
                clock.cycle_remaining_min + clock.cycle_used_min,
            ),
        ];
        for (label, remaining, total) in rows {
            lines.push(self.format_clock_row(label, remaining, total));
        }

        lines.push(String::new());
        lines.push(format!(
            "Available to drive: {}",
            self.bold(&format_minutes(clock.available_driving_min()))
        ));
        if !clock.in_shift {
            lines.push(self.dim("Off shift: a full 11/14 is available"));
        }

        for violation in &report.violations {
            lines.push(self.red(&format!(
                "VIOLATION {} by {}",
                violation.limit.display_name(),
                format_minutes(violation.over_by_min)
            )));
        }
        for warning in &report.warnings {
            let text = format!("⚠ {}", warning.message);
            lines.push(match warning.level {
                WarningLevel::Critical => self.red(&text),
                WarningLevel::Warning => self.yellow(&text),
            });
        }
        lines.join("\n")
    }

    #[allow(clippy::cast_precision_loss)]
    fn format_clock_row(&self, label: &str, remaining: i64, total: i64) -> String {
        let pct = if total > 0 {
            (remaining.max(0) as f64 / total as f64 * 100.0).min(100.0)
        } else {
            0.0
        };
        let text = if remaining < 0 {
            self.red(&format!("{} over", format_minutes(-remaining)))
        } else {
            self.color_for_percent(pct, &format!("{} left", format_minutes(remaining)))
        };
        format!("{:<8} {} {}", format!("{label}:"), self.progress_bar(pct), text)
    }

    // ========================================================================
    // Maintenance
    // ========================================================================

    /// Formats maintenance alerts.
    pub fn format_maintenance(&self, alerts: &[MaintenanceAlert]) -> String {
        if alerts.is_empty() {
            return self.green("All maintenance up to date");
        }
        alerts
            .iter()
            .map(|alert| {
                let status = match alert.status {
                    AlertStatus::Overdue => self.red(alert.status.display_name()),
                    AlertStatus::DueSoon => self.yellow(alert.status.display_name()),
                    AlertStatus::NoHistory => self.dim(alert.status.display_name()),
                };
                format!("{:<10} {}", status, alert.message)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Formats service history, newest first.
    pub fn format_history(&self, history: &[ServiceRecord]) -> String {
        if history.is_empty() {
            return self.dim("No service history");
        }
        let mut sorted: Vec<&ServiceRecord> = history.iter().collect();
        sorted.sort_by_key(|r| std::cmp::Reverse((r.performed_on, r.odometer_mi)));

        sorted
            .iter()
            .map(|r| {
                let mut line = format!(
                    "{}  {:<20} {:>9} mi",
                    r.performed_on.format("%Y-%m-%d"),
                    r.item.display_name(),
                    r.odometer_mi
                );
                if let Some(shop) = &r.shop {
                    line.push_str(&format!("  {}", self.dim(shop)));
                }
                if let Some(cost) = r.cost_usd {
                    line.push_str(&format!("  ${cost:.2}"));
                }
                line
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    // ========================================================================
    // Messages
    // ========================================================================

    /// Formats a "nothing available" message.
    pub fn format_no_data(&self, what: &str) -> String {
        format!("{}: {}", self.bold(what), self.yellow("no data available"))
    }

    // ========================================================================
    // Color/style helpers
    // ========================================================================

    /// Formats a progress bar.
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    pub fn progress_bar(&self, percent_remaining: f64) -> String {
        let percent = percent_remaining.clamp(0.0, 100.0);
        let filled = ((percent / 100.0) * self.bar_width as f64).round() as usize;
        let empty = self.bar_width.saturating_sub(filled);

        let bar = format!(
            "{}{}",
            BAR_FULL.to_string().repeat(filled),
            BAR_EMPTY.to_string().repeat(empty)
        );

        self.color_for_percent(percent, &bar)
    }

    fn color_for_percent(&self, percent: f64, text: &str) -> String {
        if !self.use_colors {
            return text.to_string();
        }

        if percent < 20.0 {
            self.red(text)
        } else if percent < 50.0 {
            self.yellow(text)
        } else {
            self.green(text)
        }
    }

    fn color_for_severity(&self, severity: Severity, text: &str) -> String {
        match severity {
            Severity::Critical | Severity::High => self.red(text),
            Severity::Medium => self.yellow(text),
            Severity::Low => self.cyan(text),
            Severity::Info => self.dim(text),
        }
    }

    fn paint(&self, code: &str, text: &str) -> String {
        if self.use_colors {
            format!("{code}{text}{RESET}")
        } else {
            text.to_string()
        }
    }

    fn bold(&self, text: &str) -> String {
        self.paint(BOLD, text)
    }

    fn dim(&self, text: &str) -> String {
        self.paint(DIM, text)
    }

    fn green(&self, text: &str) -> String {
        self.paint(GREEN, text)
    }

    fn yellow(&self, text: &str) -> String {
        self.paint(YELLOW, text)
    }

    fn red(&self, text: &str) -> String {
        self.paint(RED, text)
    }

    fn cyan(&self, text: &str) -> String {
        self.paint(CYAN, text)
    }
}

/// Formats minutes as "2h 5m".
pub fn format_minutes(minutes: i64) -> String {
    let sign = if minutes < 0 { "-" } else { "" };
    let minutes = minutes.abs();
    match (minutes / 60, minutes % 60) {
        (0, m) => format!("{sign}{m}m"),
        (h, 0) => format!("{sign}{h}h"),
        (h, m) => format!("{sign}{h}h {m}m"),
    }
}

// ============================================================================
// Tests
// ============================================================================
