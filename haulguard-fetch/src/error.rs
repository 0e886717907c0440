//! Fetch error types.

use haulguard_core::Capability;
use thiserror::Error;

// ============================================================================
// Main Fetch Error
// ============================================================================

/// Error type for a single provider call.
///
/// The fallback chain turns every one of these into a failure record and
/// moves on; they never reach the end user.
#[derive(Debug, Error)]
pub enum FetchError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Host HTTP client refused or failed the request.
    #[error("HTTP client error: {0}")]
    Host(#[from] HttpError),

    /// Request timed out.
    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    /// Rate limited by the provider.
    #[error("Rate limited, retry after {retry_after:?} seconds")]
    RateLimited {
        /// Seconds to wait before retrying.
        retry_after: Option<u64>,
    },

    /// Authentication failed.
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// No API key configured for a provider that needs one.
    #[error("No API key configured for {0}")]
    MissingApiKey(String),

    /// Invalid response from the provider.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// JSON parsing error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Core error.
    #[error("Core error: {0}")]
    Core(#[from] haulguard_core::CoreError),

    /// Keychain error.
    #[error("Keychain error: {0}")]
    Keychain(#[from] KeychainError),

    /// The provider does not serve the requested capability.
    #[error("Provider {provider} does not serve {capability}")]
    Unsupported {
        /// Provider id.
        provider: String,
        /// Requested capability.
        capability: Capability,
    },

    /// No provider is registered for the capability.
    #[error("No providers for {0}")]
    NoProviders(Capability),

    /// Every provider was skipped or failed.
    #[error("All providers failed")]
    AllProvidersFailed,
}

impl FetchError {
    /// Returns true if the failure points at credentials rather than the
    /// network.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::AuthenticationFailed(_) | Self::MissingApiKey(_) | Self::Keychain(_)
        )
    }
}

// ============================================================================
// HTTP Error
// ============================================================================

/// HTTP-specific error type.
#[derive(Debug, Error)]
pub enum HttpError {
    /// Request error.
    #[error("Request error: {0}")]
    Request(#[from] reqwest::Error),

    /// Domain not allowed.
    #[error("Domain not allowed: {0}")]
    DomainNotAllowed(String),

    /// Invalid URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

// ============================================================================
// Keychain Error
// ============================================================================

/// Error type for keychain operations.
#[derive(Debug, Error)]
pub enum KeychainError {
    /// Credential not found.
    #[error("Credential not found for {service}/{account}")]
    NotFound {
        /// Service name.
        service: String,
        /// Account name.
        account: String,
    },

    /// Access denied.
    #[error("Access denied to keychain")]
    AccessDenied,

    /// Platform error.
    #[error("Platform error: {0}")]
    Platform(String),

    /// Generic error.
    #[error("Keychain error: {0}")]
    Other(String),
}

impl From<keyring::Error> for KeychainError {
    fn from(err: keyring::Error) -> Self {
        match err {
            keyring::Error::NoEntry => KeychainError::NotFound {
                service: String::new(),
                account: String::new(),
            },
            keyring::Error::PlatformFailure(e) => KeychainError::Platform(e.to_string()),
            keyring::Error::NoStorageAccess(_) => KeychainError::AccessDenied,
            _ => KeychainError::Other(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_errors() {
        assert!(FetchError::MissingApiKey("carmd".to_string()).is_configuration());
        assert!(FetchError::AuthenticationFailed("bad key".to_string()).is_configuration());
        assert!(!FetchError::Timeout(30).is_configuration());
        assert!(!FetchError::InvalidResponse("html".to_string()).is_configuration());
    }

    #[test]
    fn test_unsupported_message() {
        let err = FetchError::Unsupported {
            provider: "ip-api".to_string(),
            capability: Capability::Weather,
        };
        assert_eq!(err.to_string(), "Provider ip-api does not serve weather");
    }
}
