//! CLI output formatting tests.
//!
//! These tests verify that CLI output is correctly formatted for both
//! text and JSON output modes.

#[cfg(test)]
mod text_formatter_tests {
    use super::super::text::TextFormatter;
    use chrono::{NaiveDate, TimeZone, Utc};
    use haulguard_core::{
        ChatReply, Location, MaintenanceItem, MaintenanceSettings, ResponseSource, ServiceRecord,
        WeatherData,
    };
    use haulguard_services::{
        CycleRule, DutyEntry, DutyStatus, analyze_codes_locally, check_compliance,
        predict_maintenance,
    };

    #[test]
    fn test_progress_bar_boundary_values() {
        let formatter = TextFormatter::new(false);

        let test_cases = vec![
            (0.0, "░░░░░░░░░░"),
            (10.0, "█░░░░░░░░░"),
            (25.0, "███░░░░░░░"), // 2.5 rounds to 3 blocks
            (50.0, "█████░░░░░"),
            (75.0, "████████░░"), // 7.5 rounds to 8 blocks
            (100.0, "██████████"),
        ];

        for (percent, expected) in test_cases {
            let bar = formatter.progress_bar(percent);
            assert_eq!(bar, expected, "Failed for {percent}%");
        }
    }

    #[test]
    fn test_progress_bar_with_colors() {
        let formatter = TextFormatter::new(true);
        assert!(formatter.progress_bar(10.0).contains("\x1b[31m"), "Should be red for <20%");
        assert!(formatter.progress_bar(40.0).contains("\x1b[33m"), "Should be yellow for <50%");
        assert!(formatter.progress_bar(80.0).contains("\x1b[32m"), "Should be green for >=50%");
    }

    #[test]
    fn test_format_location() {
        let formatter = TextFormatter::new(false);
        let mut location = Location::new(41.59, -87.35, ResponseSource::LastKnown);
        location.city = Some("Gary".to_string());
        location.region = Some("IN".to_string());

        let output = formatter.format_location(&location);
        assert!(output.contains("Gary, IN"));
        assert!(output.contains("last known"));
        assert!(output.contains("41.59000"));
    }

    #[test]
    fn test_format_weather_lists_hazards() {
        let formatter = TextFormatter::new(false);
        let weather = WeatherData {
            temperature_f: 28.0,
            feels_like_f: None,
            humidity_pct: Some(90.0),
            wind_speed_mph: Some(45.0),
            conditions: "Snow".to_string(),
            description: None,
            visibility_mi: Some(0.5),
            observed_at: Utc::now(),
            source: ResponseSource::Provider("openmeteo".to_string()),
        };

        let output = formatter.format_weather(&weather);
        assert!(output.starts_with("Snow 28°F"));
        assert!(output.contains("openmeteo"));
        assert!(!output.contains("No driving hazards"));
    }

    #[test]
    fn test_format_diagnostics() {
        let formatter = TextFormatter::new(false);
        let report = analyze_codes_locally(&["U0100".to_string()], Utc::now());

        let output = formatter.format_diagnostics(&report);
        assert!(output.contains("rule-based"));
        assert!(output.contains("U0100"));
        assert!(output.contains("Stop as soon as it is safe."));
    }

    #[test]
    fn test_format_empty_diagnostics() {
        let formatter = TextFormatter::new(false);
        let report = analyze_codes_locally(&[], Utc::now());
        assert!(formatter.format_diagnostics(&report).contains("No codes to analyze"));
    }

    #[test]
    fn test_format_chat() {
        let formatter = TextFormatter::new(false);
        let reply = ChatReply {
            text: "Take exit 12.".to_string(),
            source: ResponseSource::RuleBased,
            suggestions: vec!["Where is fuel?".to_string()],
        };

        let output = formatter.format_chat(&reply);
        assert!(output.starts_with("Take exit 12."));
        assert!(output.contains("(rule-based)"));
        assert!(output.contains("• Where is fuel?"));
    }

    #[test]
    fn test_format_compliance() {
        let formatter = TextFormatter::new(false);
        let start = Utc.with_ymd_and_hms(2024, 10, 7, 6, 0, 0).unwrap();
        let log = vec![DutyEntry::ongoing(DutyStatus::Driving, start)];
        let report = check_compliance(
            &log,
            Utc.with_ymd_and_hms(2024, 10, 7, 13, 40, 0).unwrap(),
            CycleRule::SeventyEight,
        )
        .unwrap();

        let output = formatter.format_compliance(&report);
        assert!(output.contains("70/8"));
        assert!(output.contains("Break:"));
        assert!(output.contains("20m left"));
        assert!(output.contains("Available to drive: 20m"));
        assert!(output.contains("30-minute break required in 20 min"));
    }

    #[test]
    fn test_format_maintenance() {
        let formatter = TextFormatter::new(false);
        let day = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let history = vec![ServiceRecord {
            item: MaintenanceItem::OilChange,
            performed_on: day,
            odometer_mi: 0,
            engine_hours: None,
            shop: Some("Rush Truck Center".to_string()),
            cost_usd: Some(420.0),
        }];

        let alerts =
            predict_maintenance(26_000, None, &history, &MaintenanceSettings::default(), day);
        let output = formatter.format_maintenance(&alerts);
        assert!(output.lines().next().unwrap().starts_with("Overdue"));
        assert!(output.contains("1000 mi overdue"));

        let listed = formatter.format_history(&history);
        assert!(listed.contains("2024-06-01"));
        assert!(listed.contains("Rush Truck Center"));
        assert!(listed.contains("$420.00"));
    }

    #[test]
    fn test_format_no_data() {
        let formatter = TextFormatter::new(false);
        assert_eq!(formatter.format_no_data("weather"), "weather: no data available");
    }
}

#[cfg(test)]
mod json_formatter_tests {
    use super::super::json::{JsonFormatter, ProviderOutput};
    use haulguard_core::{Capability, ProviderTier};
    use haulguard_fetch::ProviderInfo;
    use haulguard_providers::KeySource;

    #[test]
    fn test_provider_output_flattens_info() {
        let info = ProviderInfo {
            id: "openmeteo".to_string(),
            display_name: "Open-Meteo".to_string(),
            tier: ProviderTier::Fallback,
            capabilities: vec![Capability::Weather],
            available: true,
            daily_limit: 10_000,
            monthly_limit: 300_000,
        };
        let output = ProviderOutput {
            info: &info,
            enabled: true,
            key_source: Some(KeySource::Environment),
        };

        let json = JsonFormatter::new(false).format(&output).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["id"], "openmeteo");
        assert_eq!(value["enabled"], true);
        assert_eq!(value["key_source"], "environment");
    }

    #[test]
    fn test_provider_output_omits_missing_key_source() {
        let info = ProviderInfo {
            id: "ipapi".to_string(),
            display_name: "ip-api".to_string(),
            tier: ProviderTier::Primary,
            capabilities: vec![Capability::Geolocation],
            available: true,
            daily_limit: 1_000,
            monthly_limit: 30_000,
        };
        let output = ProviderOutput {
            info: &info,
            enabled: true,
            key_source: None,
        };

        let json = JsonFormatter::new(false).format(&output).unwrap();
        assert!(!json.contains("key_source"));
    }
}
