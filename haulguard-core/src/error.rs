//! Core error types for `HaulGuard`.

use thiserror::Error;

/// Core error type for `HaulGuard` operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Provider not found or not configured.
    #[error("Provider not found: {0}")]
    ProviderNotFound(String),

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Invalid data from API response.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// A response did not match the capability that was requested.
    #[error("Capability mismatch: expected {expected}, got {actual}")]
    CapabilityMismatch {
        /// Capability the caller asked for.
        expected: String,
        /// Capability carried by the response.
        actual: String,
    },

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}
