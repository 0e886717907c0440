//! API key resolution.
//!
//! Keys are looked up in this order, first hit wins:
//!
//! 1. The provider's environment variable (configurable per provider)
//! 2. The `api_key` field of the provider's config entry
//! 3. The system keychain (`haulguard:<provider>` / `api_key`)

use haulguard_fetch::{KeychainApi, accounts};
use serde::Serialize;
use tracing::{debug, warn};

/// Where a resolved key came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum KeySource {
    /// Environment variable.
    Environment,
    /// Config file.
    Config,
    /// System keychain.
    Keychain,
}

impl KeySource {
    /// Short label for reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Environment => "env",
            Self::Config => "config",
            Self::Keychain => "keychain",
        }
    }
}

/// A key plus its origin.
#[derive(Clone, PartialEq, Eq)]
pub struct ResolvedKey {
    /// The secret.
    pub value: String,
    /// Where it was found.
    pub source: KeySource,
}

impl std::fmt::Debug for ResolvedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedKey")
            .field("value", &"<redacted>")
            .field("source", &self.source)
            .finish()
    }
}

/// Default environment variable for a built-in provider.
pub fn default_env_var(provider: &str) -> Option<&'static str> {
    match provider {
        "ipgeolocation" => Some("IPGEOLOCATION_API_KEY"),
        "openweathermap" => Some("OPENWEATHER_API_KEY"),
        "carmd" => Some("CARMD_API_KEY"),
        "openai" => Some("OPENAI_API_KEY"),
        "huggingface" => Some("HUGGINGFACE_API_KEY"),
        _ => None,
    }
}

/// Resolves a key using the process environment.
pub async fn resolve_api_key(
    provider: &str,
    env_var: Option<&str>,
    configured: Option<&str>,
    keychain: &dyn KeychainApi,
) -> Option<ResolvedKey> {
    resolve_api_key_with(
        |name| std::env::var(name).ok(),
        provider,
        env_var,
        configured,
        keychain,
    )
    .await
}

/// Resolves a key with a custom environment lookup.
pub async fn resolve_api_key_with<F>(
    lookup_env: F,
    provider: &str,
    env_var: Option<&str>,
    configured: Option<&str>,
    keychain: &dyn KeychainApi,
) -> Option<ResolvedKey>
where
    F: Fn(&str) -> Option<String>,
{
    let non_empty = |v: String| {
        let v = v.trim().to_string();
        (!v.is_empty()).then_some(v)
    };

    if let Some(value) = env_var.and_then(&lookup_env).and_then(non_empty) {
        debug!(provider, "API key from environment");
        return Some(ResolvedKey {
            value,
            source: KeySource::Environment,
        });
    }

    if let Some(value) = configured.map(str::to_string).and_then(non_empty) {
        debug!(provider, "API key from config");
        return Some(ResolvedKey {
            value,
            source: KeySource::Config,
        });
    }

    match keychain.get(provider, accounts::API_KEY).await {
        Ok(Some(value)) => non_empty(value).map(|value| {
            debug!(provider, "API key from keychain");
            ResolvedKey {
                value,
                source: KeySource::Keychain,
            }
        }),
        Ok(None) => None,
        Err(e) => {
            warn!(provider, error = %e, "Keychain lookup failed");
            None
        }
    }
}
