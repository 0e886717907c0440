//! CarMD response parser.

use haulguard_core::{DiagnosticFinding, Severity, VehicleSystem};
use haulguard_fetch::FetchError;
use serde::{Deserialize, Deserializer};

/// Envelope returned by CarMD `/v3.0/diag`.
#[derive(Debug, Deserialize)]
pub struct CarMdResponse {
    message: CarMdMessage,
    /// A single object for one code, an array otherwise.
    #[serde(default, deserialize_with = "one_or_many")]
    data: Vec<CarMdDiag>,
}

#[derive(Debug, Deserialize)]
struct CarMdMessage {
    code: i64,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct CarMdDiag {
    code: String,
    #[serde(default)]
    urgency: Option<u8>,
    #[serde(default)]
    urgency_desc: Option<String>,
    #[serde(default)]
    layman_definition: Option<String>,
    #[serde(default)]
    tech_definition: Option<String>,
    #[serde(default)]
    effect_on_vehicle: Option<String>,
}

impl CarMdResponse {
    /// Converts the envelope into findings. A non-zero message code is an
    /// error even on HTTP 200.
    pub fn into_findings(self) -> Result<Vec<DiagnosticFinding>, FetchError> {
        if self.message.code != 0 {
            return Err(FetchError::InvalidResponse(format!(
                "carmd error {}: {}",
                self.message.code, self.message.message
            )));
        }

        Ok(self
            .data
            .into_iter()
            .map(|d| {
                let description = d
                    .layman_definition
                    .or(d.tech_definition)
                    .unwrap_or_else(|| "No description available".to_string());
                let recommended_action = d
                    .urgency_desc
                    .or(d.effect_on_vehicle)
                    .unwrap_or_else(|| "Have the vehicle inspected".to_string());

                DiagnosticFinding {
                    system: system_for_code(&d.code),
                    severity: severity_for_urgency(d.urgency),
                    code: d.code,
                    description,
                    recommended_action,
                    estimated_cost_usd: None,
                }
            })
            .collect())
    }
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<CarMdDiag>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        One(CarMdDiag),
        Many(Vec<CarMdDiag>),
        Null(()),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::One(diag) => vec![diag],
        Raw::Many(diags) => diags,
        Raw::Null(()) => Vec::new(),
    })
}

/// CarMD urgency runs 0 (can wait) to 3 (stop driving).
fn severity_for_urgency(urgency: Option<u8>) -> Severity {
    match urgency {
        None => Severity::Info,
        Some(0) => Severity::Low,
        Some(1) => Severity::Medium,
        Some(2) => Severity::High,
        Some(_) => Severity::Critical,
    }
}

fn system_for_code(code: &str) -> VehicleSystem {
    match code.chars().next() {
        Some('P') => VehicleSystem::FuelAir,
        Some('C') => VehicleSystem::Chassis,
        Some('B') => VehicleSystem::Body,
        Some('U') => VehicleSystem::Network,
        _ => VehicleSystem::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_diag() {
        let json = r#"{
            "message": {"code": 0, "message": "ok", "credentials": "valid"},
            "data": [{
                "code": "P0300",
                "urgency": 2,
                "urgency_desc": "Repair immediately if the check engine light is flashing",
                "layman_definition": "Random or multiple cylinder misfire detected",
                "effect_on_vehicle": "Rough running"
            }]
        }"#;
        let response: CarMdResponse = serde_json::from_str(json).unwrap();
        let findings = response.into_findings().unwrap();

        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].code, "P0300");
        assert_eq!(findings[0].severity, Severity::High);
        assert!(findings[0].recommended_action.starts_with("Repair"));
    }

    #[test]
    fn test_parse_single_object() {
        let json = r#"{
            "message": {"code": 0, "message": "ok"},
            "data": {"code": "U0100", "urgency": 3, "tech_definition": "Lost communication with ECM"}
        }"#;
        let response: CarMdResponse = serde_json::from_str(json).unwrap();
        let findings = response.into_findings().unwrap();
        assert_eq!(findings[0].system, VehicleSystem::Network);
        assert_eq!(findings[0].severity, Severity::Critical);
    }

    #[test]
    fn test_error_envelope() {
        let json = r#"{"message": {"code": 1001, "message": "Invalid credentials"}, "data": []}"#;
        let response: CarMdResponse = serde_json::from_str(json).unwrap();
        let err = response.into_findings().unwrap_err();
        assert!(err.to_string().contains("Invalid credentials"));
    }

    #[test]
    fn test_urgency_mapping() {
        assert_eq!(severity_for_urgency(None), Severity::Info);
        assert_eq!(severity_for_urgency(Some(3)), Severity::Critical);
        assert_eq!(severity_for_urgency(Some(9)), Severity::Critical);
    }
}
