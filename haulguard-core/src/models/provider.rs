//! Provider-related types.
//!
//! This module contains the static description of external API providers:
//! - [`Capability`] - What kind of question a provider answers
//! - [`ProviderTier`] - Primary or fallback
//! - [`RateLimits`] - Daily and monthly call ceilings
//! - [`ApiConfig`] - The full descriptor
//! - [`ProviderOverride`] - Config-file tweaks applied on top of a descriptor

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

// ============================================================================
// Capability
// ============================================================================

/// A kind of data a provider can serve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Capability {
    /// Position lookup (IP based or similar).
    Geolocation,
    /// Current conditions at a coordinate.
    Weather,
    /// Engine trouble code analysis.
    Diagnostics,
    /// Natural language completion for the driver assistant.
    Nlp,
}

impl Capability {
    /// Returns all capabilities.
    pub fn all() -> &'static [Capability] {
        &[
            Self::Geolocation,
            Self::Weather,
            Self::Diagnostics,
            Self::Nlp,
        ]
    }

    /// Returns the lowercase tag used in config files and cache keys.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Geolocation => "geolocation",
            Self::Weather => "weather",
            Self::Diagnostics => "diagnostics",
            Self::Nlp => "nlp",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Capability {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "geolocation" | "location" => Ok(Self::Geolocation),
            "weather" => Ok(Self::Weather),
            "diagnostics" | "diag" => Ok(Self::Diagnostics),
            "nlp" | "ai" | "chat" => Ok(Self::Nlp),
            other => Err(CoreError::InvalidConfig(format!("unknown capability: {other}"))),
        }
    }
}

// ============================================================================
// Provider Tier
// ============================================================================

/// Priority tier of a provider.
///
/// The derived ordering puts `Primary` before `Fallback`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderTier {
    /// Preferred provider, usually paid and more accurate.
    Primary,
    /// Used when primaries are exhausted or failing.
    Fallback,
}

impl ProviderTier {
    /// Returns the display name for this tier.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::Fallback => "fallback",
        }
    }
}

impl fmt::Display for ProviderTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

// ============================================================================
// Rate Limits
// ============================================================================

/// Call ceilings for a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimits {
    /// Maximum calls per calendar day.
    pub daily: u64,
    /// Maximum calls per calendar month.
    pub monthly: u64,
}

impl RateLimits {
    /// Creates a new set of limits.
    pub const fn new(daily: u64, monthly: u64) -> Self {
        Self { daily, monthly }
    }

    /// Returns true if the given counters are both below the ceilings.
    pub fn allows(&self, daily_calls: u64, monthly_calls: u64) -> bool {
        daily_calls < self.daily && monthly_calls < self.monthly
    }
}

// ============================================================================
// API Config
// ============================================================================

/// Static descriptor for one external API provider.
///
/// Built once at startup (defaults plus config overrides) and never mutated
/// afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Unique provider id (e.g. `ipgeolocation`).
    pub name: String,
    /// Human readable name.
    pub display_name: String,
    /// Base URL for requests.
    pub base_url: String,
    /// Resolved API key. Never serialized.
    #[serde(skip)]
    pub api_key: Option<String>,
    /// Whether the provider refuses to work without a key.
    pub requires_key: bool,
    /// Call ceilings.
    pub rate_limits: RateLimits,
    /// Priority tier.
    pub tier: ProviderTier,
    /// Capabilities this provider serves.
    pub capabilities: BTreeSet<Capability>,
    /// Estimated cost of a single call in USD.
    pub cost_per_call_usd: f64,
}

impl ApiConfig {
    /// Creates a descriptor with no capabilities and no key.
    pub fn new(
        name: impl Into<String>,
        display_name: impl Into<String>,
        base_url: impl Into<String>,
        tier: ProviderTier,
        rate_limits: RateLimits,
    ) -> Self {
        Self {
            name: name.into(),
            display_name: display_name.into(),
            base_url: base_url.into(),
            api_key: None,
            requires_key: false,
            rate_limits,
            tier,
            capabilities: BTreeSet::new(),
            cost_per_call_usd: 0.0,
        }
    }

    /// Adds a capability.
    #[must_use]
    pub fn with_capability(mut self, capability: Capability) -> Self {
        self.capabilities.insert(capability);
        self
    }

    /// Marks the provider as needing an API key.
    #[must_use]
    pub fn requiring_key(mut self) -> Self {
        self.requires_key = true;
        self
    }

    /// Sets the API key.
    #[must_use]
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the per-call cost estimate.
    #[must_use]
    pub fn with_cost_per_call(mut self, usd: f64) -> Self {
        self.cost_per_call_usd = usd;
        self
    }

    /// Returns true if this provider serves `capability`.
    pub fn serves(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }

    /// Returns true if the provider has what it needs to be called.
    pub fn is_configured(&self) -> bool {
        !self.requires_key || self.api_key.as_deref().is_some_and(|k| !k.is_empty())
    }
}

// ============================================================================
// Provider Override
// ============================================================================

/// User overrides for one provider, read from the config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderOverride {
    /// Set to false to drop the provider entirely.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Environment variable holding the API key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,
    /// API key stored directly in the config file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Replacement daily ceiling.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub daily_limit: Option<u64>,
    /// Replacement monthly ceiling.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monthly_limit: Option<u64>,
}

fn default_true() -> bool {
    true
}

impl Default for ProviderOverride {
    fn default() -> Self {
        Self {
            enabled: true,
            api_key_env: None,
            api_key: None,
            daily_limit: None,
            monthly_limit: None,
        }
    }
}

impl ProviderOverride {
    /// Applies the limit overrides to a descriptor.
    ///
    /// Keys are not applied here; they go through credential resolution.
    #[must_use]
    pub fn apply_limits(&self, mut config: ApiConfig) -> ApiConfig {
        if let Some(daily) = self.daily_limit {
            config.rate_limits.daily = daily;
        }
        if let Some(monthly) = self.monthly_limit {
            config.rate_limits.monthly = monthly;
        }
        config
    }
}

// ============================================================================
// Tests
// ============================================================================
