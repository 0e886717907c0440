//! Domain models for `HaulGuard`.
//!
//! ## Submodules
//!
//! - [`provider`] - Provider descriptors (Capability, ProviderTier, ApiConfig)
//! - [`usage`] - Per-provider usage counters
//! - [`payload`] - Capability-tagged requests and responses
//! - [`maintenance`] - Service history and intervals

mod maintenance;
mod payload;
mod provider;
mod usage;

// Re-export everything at the models level
pub use maintenance::{
    MaintenanceItem, MaintenanceSettings, ServiceInterval, ServiceRecord, ServiceShop,
};
pub use payload::{
    ChatReply, DiagnosticFinding, DiagnosticReport, Location, ProviderRequest, ProviderResponse,
    ResponseSource, Severity, VehicleSystem, WeatherData, WeatherHazard,
};
pub use provider::{ApiConfig, Capability, ProviderOverride, ProviderTier, RateLimits};
pub use usage::UsageStats;
