//! Configuration management.
//!
//! A JSON file with three sections:
//!
//! ```json
//! {
//!   "general": { "log_level": "warn", "cache_capacity": 256 },
//!   "ttl_hours": { "weather": 2 },
//!   "providers": { "openai": { "enabled": false } }
//! }
//! ```
//!
//! Every field has a default, so a missing file or a partial one is fine.

use crate::cache::DEFAULT_CACHE_CAPACITY;
use crate::error::StoreError;
use haulguard_core::{Capability, ProviderOverride};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Log levels accepted in `general.log_level`.
const LOG_LEVELS: &[&str] = &["off", "error", "warn", "info", "debug", "trace"];

/// Application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,
    /// Cache lifetimes per capability.
    #[serde(default)]
    pub ttl_hours: TtlConfig,
    /// Per-provider overrides, keyed by provider id.
    #[serde(default)]
    pub providers: BTreeMap<String, ProviderOverride>,
}

/// General application settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Log level used when no `-v`/`-q` flag or `RUST_LOG` is given.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Maximum number of cached responses.
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,
    /// Failures above which a primary provider puts the layer in degraded mode.
    #[serde(default = "default_failure_threshold")]
    pub degraded_failure_threshold: u64,
    /// HTTP request timeout.
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Where persisted state lives. Defaults to the platform data dir.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
}

/// Cache TTL in hours per capability. Zero disables caching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TtlConfig {
    /// Location lookups.
    #[serde(default = "default_one_hour")]
    pub geolocation: u64,
    /// Current weather.
    #[serde(default = "default_one_hour")]
    pub weather: u64,
    /// Trouble-code analysis.
    #[serde(default = "default_diagnostics_ttl")]
    pub diagnostics: u64,
    /// Chat replies.
    #[serde(default)]
    pub nlp: u64,
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_cache_capacity() -> usize {
    DEFAULT_CACHE_CAPACITY
}

fn default_failure_threshold() -> u64 {
    10
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_one_hour() -> u64 {
    1
}

fn default_diagnostics_ttl() -> u64 {
    24
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            cache_capacity: default_cache_capacity(),
            degraded_failure_threshold: default_failure_threshold(),
            request_timeout_secs: default_timeout_secs(),
            data_dir: None,
        }
    }
}

impl Default for TtlConfig {
    fn default() -> Self {
        Self {
            geolocation: default_one_hour(),
            weather: default_one_hour(),
            diagnostics: default_diagnostics_ttl(),
            nlp: 0,
        }
    }
}

impl TtlConfig {
    /// TTL for one capability.
    pub fn for_capability(&self, capability: Capability) -> u64 {
        match capability {
            Capability::Geolocation => self.geolocation,
            Capability::Weather => self.weather,
            Capability::Diagnostics => self.diagnostics,
            Capability::Nlp => self.nlp,
        }
    }
}

impl Config {
    /// Returns the default configuration file path.
    pub fn default_path() -> PathBuf {
        crate::persistence::default_config_path()
    }

    /// Loads configuration from the default path.
    pub fn load() -> Result<Self, StoreError> {
        Self::load_from(&Self::default_path())
    }

    /// Loads configuration from a specific path.
    ///
    /// A missing file yields defaults; a malformed one is an error.
    pub fn load_from(path: &Path) -> Result<Self, StoreError> {
        if !path.exists() {
            debug!(path = %path.display(), "Config file not found, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        config.validate()?;

        info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Saves configuration to the default path.
    pub fn save(&self) -> Result<(), StoreError> {
        self.save_to(&Self::default_path())
    }

    /// Saves configuration to a specific path, owner-readable only.
    pub fn save_to(&self, path: &Path) -> Result<(), StoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
        }

        info!(path = %path.display(), "Saved configuration");
        Ok(())
    }

    /// Checks values serde cannot.
    pub fn validate(&self) -> Result<(), StoreError> {
        let level = self.general.log_level.to_ascii_lowercase();
        if !LOG_LEVELS.contains(&level.as_str()) {
            return Err(StoreError::Config(format!(
                "unknown log_level '{}', expected one of {}",
                self.general.log_level,
                LOG_LEVELS.join(", ")
            )));
        }
        if self.general.request_timeout_secs == 0 {
            return Err(StoreError::Config(
                "request_timeout_secs must be greater than zero".to_string(),
            ));
        }
        if self.general.cache_capacity == 0 {
            return Err(StoreError::Config(
                "cache_capacity must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Directory for persisted state.
    pub fn data_dir(&self) -> PathBuf {
        self.general
            .data_dir
            .clone()
            .unwrap_or_else(crate::persistence::default_data_dir)
    }

    /// HTTP request timeout.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.general.request_timeout_secs)
    }

    /// Returns whether a provider is enabled. Unlisted providers are.
    pub fn is_provider_enabled(&self, provider: &str) -> bool {
        self.providers.get(provider).is_none_or(|p| p.enabled)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.general.cache_capacity, 256);
        assert_eq!(config.general.degraded_failure_threshold, 10);
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.ttl_hours.for_capability(Capability::Geolocation), 1);
        assert_eq!(config.ttl_hours.for_capability(Capability::Weather), 1);
        assert_eq!(config.ttl_hours.for_capability(Capability::Diagnostics), 24);
        assert_eq!(config.ttl_hours.for_capability(Capability::Nlp), 0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let config = Config::load_from(&dir.path().join("absent.json")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_partial_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{
                "general": {"cache_capacity": 16},
                "ttl_hours": {"weather": 3},
                "providers": {"openai": {"enabled": false}, "ip-api": {"daily_limit": 50}}
            }"#,
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.general.cache_capacity, 16);
        assert_eq!(config.general.log_level, "warn");
        assert_eq!(config.ttl_hours.weather, 3);
        assert_eq!(config.ttl_hours.diagnostics, 24);
        assert!(!config.is_provider_enabled("openai"));
        assert!(config.is_provider_enabled("ip-api"));
        assert!(config.is_provider_enabled("carmd"));
        assert_eq!(config.providers["ip-api"].daily_limit, Some(50));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");

        std::fs::write(&path, r#"{"general": {"log_level": "loud"}}"#).unwrap();
        assert!(matches!(Config::load_from(&path), Err(StoreError::Config(_))));

        std::fs::write(&path, r#"{"general": {"request_timeout_secs": 0}}"#).unwrap();
        assert!(matches!(Config::load_from(&path), Err(StoreError::Config(_))));

        std::fs::write(&path, r#"{"general": {"cache_capacity": 0}}"#).unwrap();
        assert!(matches!(Config::load_from(&path), Err(StoreError::Config(_))));

        std::fs::write(&path, "not json").unwrap();
        assert!(matches!(
            Config::load_from(&path),
            Err(StoreError::Serialization(_))
        ));
    }

    #[test]
    fn test_save_and_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let mut config = Config::default();
        config.general.data_dir = Some(dir.path().join("data"));
        config.providers.insert(
            "carmd".to_string(),
            ProviderOverride {
                monthly_limit: Some(20),
                ..Default::default()
            },
        );
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded, config);
        assert_eq!(loaded.data_dir(), dir.path().join("data"));

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&path).unwrap().permissions().mode() & 0o777;
            assert_eq!(mode, 0o600);
        }
    }
}
