// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # `HaulGuard` Services
//!
//! Driver-facing services built on the hybrid API layer.
//!
//! ## Hybrid Layer
//!
//! [`HybridApiService`] runs the per-capability fallback chains: cache,
//! then providers ordered by tier and failure count, each gated by its
//! daily and monthly quota. Exhausted chains yield `None`.
//!
//! ## Services
//!
//! - [`LocationService`]: device fix, network, then last known
//! - [`AiAssistant`]: NLP providers with a keyword-rule fallback
//! - [`analyze_codes_locally`]: rule-based trouble code analysis
//! - [`check_compliance`]: hours-of-service clocks and warnings
//! - [`predict_maintenance`]: service interval alerts
//!
//! ## Usage
//!
//! ```ignore
//! use haulguard_services::HybridApiService;
//!
//! let hybrid = HybridApiService::from_config(&config, kv, keychain, clock).await;
//! if let Some(weather) = hybrid.get_weather_data(41.6, -87.5).await {
//!     println!("{} at {:.0}°F", weather.conditions, weather.temperature_f);
//! }
//! ```

pub mod assistant;
pub mod compliance;
pub mod diagnostics;
pub mod error;
pub mod hybrid;
pub mod location;
pub mod maintenance;

pub use assistant::{AiAssistant, AssistantContext, SYSTEM_PROMPT, Topic, detect_topic, rule_based_answer};
pub use compliance::{
    ComplianceReport, ComplianceWarning, CycleRule, DutyEntry, DutyStatus, HosClock, HosLimit,
    Violation, WarningLevel, check_compliance,
};
pub use diagnostics::{analyze_codes_locally, classify_code, is_valid_code, normalize_code};
pub use error::ServiceError;
pub use hybrid::{
    DEFAULT_DEGRADED_FAILURE_THRESHOLD, HybridApiService, HybridSettings, ProviderUsage,
    UsageReport,
};
pub use location::{DeviceLocator, LocationService, NoDevice, StaticLocator};
pub use maintenance::{AlertStatus, MaintenanceAlert, predict_maintenance};
