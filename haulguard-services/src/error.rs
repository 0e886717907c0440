//! Service error types.

use chrono::{DateTime, Utc};
use haulguard_core::CoreError;
use haulguard_fetch::FetchError;
use haulguard_store::StoreError;
use thiserror::Error;

/// Errors raised by the service layer.
///
/// The fallback chains never return these; they degrade to `None` or a
/// rule-based answer instead.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// A duty-status entry ends before it starts.
    #[error("Duty entry starting {start} ends before it starts ({end})")]
    InvalidDutyEntry {
        /// Entry start.
        start: DateTime<Utc>,
        /// Entry end.
        end: DateTime<Utc>,
    },

    /// Two duty-status entries overlap.
    #[error("Duty entries overlap at {at}")]
    OverlappingDutyEntries {
        /// Start of the later entry.
        at: DateTime<Utc>,
    },

    /// Caller input was rejected.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Store error.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Fetch error.
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Core error.
    #[error("Core error: {0}")]
    Core(#[from] CoreError),
}
