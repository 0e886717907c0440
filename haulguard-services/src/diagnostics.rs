//! Rule-based trouble code analysis.
//!
//! Used when no diagnostics provider can answer. Codes follow the SAE J2012
//! shape: a system letter, a digit 0-3, then three hex digits. Known codes
//! get a specific description; others get a description for their
//! subsystem.

use chrono::{DateTime, Utc};
use haulguard_core::{DiagnosticFinding, DiagnosticReport, ResponseSource, Severity, VehicleSystem};
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;
use tracing::debug;

// ============================================================================
// Patterns & Tables
// ============================================================================

/// SAE J2012 trouble code shape.
static DTC_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[PCBU][0-3][0-9A-F]{3}$").expect("Invalid regex"));

struct KnownCode {
    code: &'static str,
    description: &'static str,
    severity: Severity,
    system: VehicleSystem,
    cost_usd: f64,
}

const fn known(
    code: &'static str,
    description: &'static str,
    severity: Severity,
    system: VehicleSystem,
    cost_usd: f64,
) -> KnownCode {
    KnownCode {
        code,
        description,
        severity,
        system,
        cost_usd,
    }
}

#[rustfmt::skip]
const KNOWN_CODES: &[KnownCode] = &[
    known("P0087", "Fuel rail pressure too low", Severity::High, VehicleSystem::FuelAir, 450.0),
    known("P0101", "Mass air flow sensor range/performance", Severity::Low, VehicleSystem::FuelAir, 150.0),
    known("P0171", "System too lean (bank 1)", Severity::Medium, VehicleSystem::FuelAir, 300.0),
    known("P0299", "Turbocharger underboost", Severity::High, VehicleSystem::FuelAir, 1_200.0),
    known("P0300", "Random or multiple cylinder misfire", Severity::High, VehicleSystem::Ignition, 500.0),
    known("P0301", "Cylinder 1 misfire detected", Severity::Medium, VehicleSystem::Ignition, 300.0),
    known("P0401", "EGR flow insufficient", Severity::Medium, VehicleSystem::Emissions, 600.0),
    known("P0420", "Catalyst efficiency below threshold (bank 1)", Severity::Low, VehicleSystem::Emissions, 1_200.0),
    known("P0471", "Exhaust pressure sensor range/performance", Severity::Medium, VehicleSystem::Emissions, 350.0),
    known("P0500", "Vehicle speed sensor malfunction", Severity::Medium, VehicleSystem::SpeedIdle, 200.0),
    known("P0700", "Transmission control system malfunction", Severity::High, VehicleSystem::Transmission, 800.0),
    known("P2002", "Diesel particulate filter efficiency below threshold", Severity::High, VehicleSystem::Emissions, 2_500.0),
    known("P2463", "Diesel particulate filter soot accumulation", Severity::High, VehicleSystem::Emissions, 800.0),
    known("P20EE", "SCR NOx catalyst efficiency below threshold", Severity::High, VehicleSystem::Emissions, 1_800.0),
    known("C0035", "Left front wheel speed sensor circuit", Severity::Medium, VehicleSystem::Chassis, 250.0),
    known("C0265", "ABS actuator relay circuit open", Severity::High, VehicleSystem::Chassis, 700.0),
    known("B0001", "Driver frontal stage 1 deployment control", Severity::Medium, VehicleSystem::Body, 400.0),
    known("U0100", "Lost communication with ECM/PCM", Severity::Critical, VehicleSystem::Network, 500.0),
    known("U0101", "Lost communication with TCM", Severity::High, VehicleSystem::Network, 400.0),
];

// ============================================================================
// Classification
// ============================================================================

/// Trims and upper-cases a raw code.
pub fn normalize_code(raw: &str) -> String {
    raw.trim().to_ascii_uppercase()
}

/// Returns true if `code` (already normalized) has the J2012 shape.
pub fn is_valid_code(code: &str) -> bool {
    DTC_RE.is_match(code)
}

/// Subsystem for a well-formed code that is not in the table.
fn category(code: &str) -> VehicleSystem {
    let mut chars = code.chars();
    let letter = chars.next();
    let subsystem = chars.nth(1);
    match (letter, subsystem) {
        (Some('P'), Some('0' | '1' | '2')) => VehicleSystem::FuelAir,
        (Some('P'), Some('3')) => VehicleSystem::Ignition,
        (Some('P'), Some('4')) => VehicleSystem::Emissions,
        (Some('P'), Some('5')) => VehicleSystem::SpeedIdle,
        (Some('P'), Some('6')) => VehicleSystem::Computer,
        (Some('P'), Some('7' | '8' | '9')) => VehicleSystem::Transmission,
        (Some('C'), _) => VehicleSystem::Chassis,
        (Some('B'), _) => VehicleSystem::Body,
        (Some('U'), _) => VehicleSystem::Network,
        _ => VehicleSystem::Unknown,
    }
}

fn category_severity(system: VehicleSystem) -> Severity {
    match system {
        VehicleSystem::Ignition
        | VehicleSystem::Transmission
        | VehicleSystem::Computer
        | VehicleSystem::Chassis
        | VehicleSystem::Network => Severity::Medium,
        VehicleSystem::FuelAir
        | VehicleSystem::Emissions
        | VehicleSystem::SpeedIdle
        | VehicleSystem::Body => Severity::Low,
        VehicleSystem::Unknown => Severity::Info,
    }
}

/// Driver-facing action for a severity.
pub fn recommended_action(severity: Severity) -> &'static str {
    match severity {
        Severity::Critical => "Pull over safely and stop the engine. Call for roadside service.",
        Severity::High => "Stop driving as soon as it is safe and have the truck inspected.",
        Severity::Medium => "Have it checked at the next planned stop.",
        Severity::Low => "Schedule service within the next week.",
        Severity::Info => "No action needed unless other symptoms appear.",
    }
}

/// Analyzes one normalized code.
pub fn classify_code(code: &str) -> DiagnosticFinding {
    if !is_valid_code(code) {
        return DiagnosticFinding {
            code: code.to_string(),
            description: "Unrecognized code format; expected e.g. P0300".to_string(),
            severity: Severity::Info,
            system: VehicleSystem::Unknown,
            recommended_action: "Re-check the code on the scan tool.".to_string(),
            estimated_cost_usd: None,
        };
    }

    if let Some(known) = KNOWN_CODES.iter().find(|k| k.code == code) {
        return DiagnosticFinding {
            code: code.to_string(),
            description: known.description.to_string(),
            severity: known.severity,
            system: known.system,
            recommended_action: recommended_action(known.severity).to_string(),
            estimated_cost_usd: Some(known.cost_usd),
        };
    }

    let system = category(code);
    let severity = category_severity(system);
    DiagnosticFinding {
        code: code.to_string(),
        description: format!("{} fault", system.display_name()),
        severity,
        system,
        recommended_action: recommended_action(severity).to_string(),
        estimated_cost_usd: None,
    }
}

/// Builds a rule-based report for `codes`.
///
/// Codes are normalized and de-duplicated, keeping first-seen order.
pub fn analyze_codes_locally(codes: &[String], at: DateTime<Utc>) -> DiagnosticReport {
    let mut seen = HashSet::new();
    let findings: Vec<DiagnosticFinding> = codes
        .iter()
        .map(|c| normalize_code(c))
        .filter(|c| !c.is_empty() && seen.insert(c.clone()))
        .map(|c| classify_code(&c))
        .collect();

    debug!(codes = findings.len(), "Rule-based diagnostics");
    DiagnosticReport::new(findings, ResponseSource::RuleBased, at)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn codes(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_code_shape() {
        assert!(is_valid_code("P0300"));
        assert!(is_valid_code("P20EE"));
        assert!(is_valid_code("U0100"));
        assert!(!is_valid_code("P4300"));
        assert!(!is_valid_code("X0300"));
        assert!(!is_valid_code("P030"));
        assert!(!is_valid_code("p0300"));
    }

    #[test]
    fn test_known_code() {
        let finding = classify_code("P2002");
        assert_eq!(finding.system, VehicleSystem::Emissions);
        assert_eq!(finding.severity, Severity::High);
        assert!(finding.estimated_cost_usd.is_some());
    }

    #[test]
    fn test_category_fallback() {
        assert_eq!(classify_code("P0356").system, VehicleSystem::Ignition);
        assert_eq!(classify_code("P0455").system, VehicleSystem::Emissions);
        assert_eq!(classify_code("P0740").system, VehicleSystem::Transmission);
        assert_eq!(classify_code("C1234").system, VehicleSystem::Chassis);
        assert_eq!(classify_code("B1000").system, VehicleSystem::Body);
        assert_eq!(classify_code("U0300").system, VehicleSystem::Network);
        assert!(classify_code("P0356").estimated_cost_usd.is_none());
    }

    #[test]
    fn test_invalid_code_is_info() {
        let finding = classify_code("HELLO");
        assert_eq!(finding.severity, Severity::Info);
        assert_eq!(finding.system, VehicleSystem::Unknown);
        assert!(finding.description.contains("Unrecognized code format"));
    }

    #[test]
    fn test_report_overall_is_max() {
        let report = analyze_codes_locally(&codes(&["p0420", "U0100", "junk"]), Utc::now());
        assert_eq!(report.overall, Severity::Critical);
        assert_eq!(report.source, ResponseSource::RuleBased);
        assert!(report.requires_stop());
    }

    #[test]
    fn test_report_dedupes() {
        let report = analyze_codes_locally(&codes(&["P0300", " p0300", "", "P0171"]), Utc::now());
        let listed: Vec<_> = report.findings.iter().map(|f| f.code.as_str()).collect();
        assert_eq!(listed, vec!["P0300", "P0171"]);
    }

    #[test]
    fn test_empty_report() {
        let report = analyze_codes_locally(&[], Utc::now());
        assert!(report.findings.is_empty());
        assert_eq!(report.overall, Severity::Info);
    }
}
