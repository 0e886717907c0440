// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # `HaulGuard` Core
//!
//! Core types and models for the `HaulGuard` hybrid API layer.
//!
//! This crate provides the foundational types shared by every other
//! `HaulGuard` crate:
//!
//! - Provider descriptors (capabilities, tiers, rate limits)
//! - Per-provider usage counters
//! - Request/response payloads for each capability
//! - A clock abstraction so time-based rules can be tested
//! - The core error type
//!
//! ## Key Types
//!
//! ### Provider Types
//! - [`Capability`] - What a provider can answer (geolocation, weather, ...)
//! - [`ProviderTier`] - Primary or fallback
//! - [`ApiConfig`] - Static provider descriptor
//! - [`RateLimits`] - Daily and monthly call ceilings
//!
//! ### Usage Types
//! - [`UsageStats`] - Mutable call and failure counters
//!
//! ### Payloads
//! - [`ProviderRequest`] / [`ProviderResponse`] - Capability-tagged envelopes
//! - [`Location`], [`WeatherData`], [`DiagnosticReport`], [`ChatReply`]
//!
//! ### Maintenance
//! - [`ServiceRecord`], [`MaintenanceSettings`], [`MaintenanceItem`]

pub mod clock;
pub mod error;
pub mod models;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::CoreError;

pub use models::{
    // Provider types
    ApiConfig,
    Capability,
    ProviderOverride,
    ProviderTier,
    RateLimits,
    // Usage types
    UsageStats,
    // Payloads
    ChatReply,
    DiagnosticFinding,
    DiagnosticReport,
    Location,
    ProviderRequest,
    ProviderResponse,
    ResponseSource,
    Severity,
    VehicleSystem,
    WeatherData,
    WeatherHazard,
    // Maintenance
    MaintenanceItem,
    MaintenanceSettings,
    ServiceInterval,
    ServiceRecord,
    ServiceShop,
};
