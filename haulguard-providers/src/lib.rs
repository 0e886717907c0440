// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # `HaulGuard` Providers
//!
//! Concrete external APIs behind the `HaulGuard` hybrid layer.
//!
//! Each capability module includes:
//!
//! - **Descriptor**: Static [`ApiConfig`](haulguard_core::ApiConfig) (tier, limits, cost)
//! - **Provider**: An [`ApiProvider`](haulguard_fetch::ApiProvider) implementation
//! - **Parser**: Response shapes and their conversion into core payloads
//!
//! ## Supported Providers
//!
//! | Provider | Capability | Tier | Key |
//! |----------|------------|------|-----|
//! | ipgeolocation.io | geolocation | Primary | ✅ |
//! | ip-api.com | geolocation | Fallback | ❌ |
//! | ipapi.co | geolocation | Fallback | ❌ |
//! | OpenWeatherMap | weather | Primary | ✅ |
//! | Open-Meteo | weather | Fallback | ❌ |
//! | CarMD | diagnostics | Primary | ✅ |
//! | OpenAI | nlp | Primary | ✅ |
//! | Hugging Face | nlp | Fallback | ✅ |
//!
//! ## Usage
//!
//! ```ignore
//! use haulguard_providers::ProviderRegistry;
//! use haulguard_fetch::SystemKeychain;
//!
//! let registry = ProviderRegistry::configure(&config.providers, &SystemKeychain::new()).await;
//! let weather = registry.serving(Capability::Weather);
//! ```

pub mod credentials;
pub mod registry;

// Capability modules (alphabetical)
pub mod diagnostics;
pub mod geolocation;
pub mod nlp;
pub mod weather;

// Re-export key types
pub use credentials::{KeySource, ResolvedKey, default_env_var, resolve_api_key};
pub use registry::{ProviderRegistry, builtin_descriptor, builtin_descriptors};

// Re-export provider types for convenience
pub use diagnostics::CarMdProvider;
pub use geolocation::{IpApiCoProvider, IpApiProvider, IpGeolocationProvider};
pub use nlp::{HuggingFaceProvider, OpenAiProvider};
pub use weather::{OpenMeteoProvider, OpenWeatherMapProvider};
