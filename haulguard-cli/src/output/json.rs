//! JSON output formatting.

use anyhow::Result;
use chrono::{DateTime, Utc};
use haulguard_fetch::ProviderInfo;
use haulguard_providers::KeySource;
use serde::Serialize;

// ============================================================================
// Output Types
// ============================================================================

/// JSON output for one provider in `providers`.
#[derive(Debug, Serialize)]
pub struct ProviderOutput<'a> {
    #[serde(flatten)]
    pub info: &'a ProviderInfo,
    pub enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_source: Option<KeySource>,
}

/// JSON output when every source came up empty.
#[derive(Debug, Serialize)]
pub struct NoDataOutput<'a> {
    pub kind: &'a str,
    pub available: bool,
    pub checked_at: DateTime<Utc>,
}

// ============================================================================
// JSON Formatter
// ============================================================================

/// JSON formatter.
pub struct JsonFormatter {
    pretty: bool,
}

impl JsonFormatter {
    /// Creates a new JSON formatter.
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    /// Formats any serializable value.
    pub fn format<T: Serialize + ?Sized>(&self, data: &T) -> Result<String> {
        let json = if self.pretty {
            serde_json::to_string_pretty(data)?
        } else {
            serde_json::to_string(data)?
        };
        Ok(json)
    }

    /// Formats a "nothing available" marker.
    pub fn format_no_data(&self, kind: &str, checked_at: DateTime<Utc>) -> Result<String> {
        self.format(&NoDataOutput {
            kind,
            available: false,
            checked_at,
        })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_pretty() {
        let formatter = JsonFormatter::new(true);
        let data = serde_json::json!({"key": "value"});
        let output = formatter.format(&data).unwrap();
        assert!(output.contains('\n'));
    }

    #[test]
    fn test_format_compact() {
        let formatter = JsonFormatter::new(false);
        let data = serde_json::json!({"key": "value"});
        let output = formatter.format(&data).unwrap();
        assert!(!output.contains('\n'));
    }

    #[test]
    fn test_no_data() {
        let formatter = JsonFormatter::new(false);
        let output = formatter.format_no_data("location", Utc::now()).unwrap();
        assert!(output.contains(r#""kind":"location""#));
        assert!(output.contains(r#""available":false"#));
    }
}
