// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # `HaulGuard` Store
//!
//! State for the `HaulGuard` hybrid API layer.
//!
//! This crate provides:
//!
//! - **`KeyValueStore`**: Async persistence port with file and memory backends
//! - **`UsageTracker`**: Per-provider quota counters, persisted under `api_usage_stats`
//! - **`ResponseCache`**: Bounded TTL cache for provider responses
//! - **`Config`**: The JSON configuration file
//! - **`MaintenanceStore`**: Service history and shops, persisted under
//!   `predictive-maintenance-store`
//!
//! ## Usage
//!
//! ```ignore
//! use haulguard_store::{Config, FileKeyValueStore, UsageTracker};
//!
//! let config = Config::load()?;
//! let kv = Arc::new(FileKeyValueStore::new(config.data_dir()));
//! let tracker = UsageTracker::initialize(kv, &registry.configs(), Arc::new(SystemClock)).await;
//!
//! if tracker.try_acquire("openweathermap").await {
//!     // make the call, then
//!     tracker.record_outcome("openweathermap", true).await;
//! }
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod kv;
pub mod maintenance_store;
pub mod persistence;
pub mod usage_tracker;

pub use cache::{CacheEntry, DEFAULT_CACHE_CAPACITY, ResponseCache, cache_key};
pub use config::{Config, GeneralConfig, TtlConfig};
pub use error::StoreError;
pub use kv::{FileKeyValueStore, KeyValueStore, MemoryKeyValueStore, load_value, save_value};
pub use maintenance_store::{MAINTENANCE_STORE_KEY, MaintenanceState, MaintenanceStore};
pub use persistence::{
    default_config_dir, default_config_path, default_data_dir, load_json, load_json_or_default,
    save_json,
};
pub use usage_tracker::{USAGE_STATS_KEY, UsageTracker};
