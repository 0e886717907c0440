//! Host APIs for `HaulGuard` providers.
//!
//! - [`http`] - Shared HTTP client with tracing, timeout and domain allowlist
//! - [`keychain`] - Secure credential storage (system keychain)

pub mod http;
pub mod keychain;

// Re-export key types
pub use http::{HttpClient, ResponseExt};
pub use keychain::{KeychainApi, MemoryKeychain, SystemKeychain};
