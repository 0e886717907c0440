// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # HaulGuard Fetch
//!
//! Provider abstraction, fallback chain and host APIs for the `HaulGuard`
//! hybrid API layer.
//!
//! ## Host APIs
//!
//! The [`host`] module provides abstractions for system interactions:
//!
//! - [`host::http`] - Shared HTTP client with tracing, timeout and domain allowlist
//! - [`host::keychain`] - Secure credential storage for provider API keys
//!
//! ## Provider Chain
//!
//! - [`provider::ApiProvider`] - Uniform interface every external API implements
//! - [`chain::ProviderChain`] - Tries providers in order until one answers
//! - [`chain::QuotaGate`] - Quota check/record hook consulted by the chain
//! - [`context::FetchContext`] - Host APIs handed to each provider
//!
//! ## Example
//!
//! ```ignore
//! use haulguard_fetch::{FetchContext, ProviderChain};
//! use haulguard_core::ProviderRequest;
//!
//! let ctx = FetchContext::new();
//! let chain = ProviderChain::new(ordered_providers);
//! let outcome = chain.execute(&ProviderRequest::Location, &ctx, &tracker).await;
//! ```

// Core modules
pub mod chain;
pub mod context;
pub mod error;
pub mod host;
pub mod provider;

// Re-export key types at crate root

// Errors
pub use error::{FetchError, HttpError, KeychainError};

// Host APIs
pub use host::{
    http::{HttpClient, ResponseExt},
    keychain::{KeychainApi, MemoryKeychain, SystemKeychain, accounts},
};

// Provider & Chain
pub use chain::{
    AttemptStatus, ChainAttempt, ChainOutcome, ChainSuccess, ProviderChain, QuotaGate, UnlimitedQuota,
};
pub use context::{FetchContext, FetchContextBuilder, FetchSettings};
pub use provider::{ApiProvider, ProviderInfo};
