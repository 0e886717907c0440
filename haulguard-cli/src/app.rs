//! Wiring shared by the commands.

use haulguard_core::{Clock, SystemClock};
use haulguard_fetch::{KeychainApi, SystemKeychain};
use haulguard_services::HybridApiService;
use haulguard_store::{Config, FileKeyValueStore, KeyValueStore};
use std::sync::Arc;
use tracing::debug;

/// File store under the configured data directory.
pub fn open_store(config: &Config) -> Arc<dyn KeyValueStore> {
    let data_dir = config.data_dir();
    debug!(data_dir = %data_dir.display(), "Opening store");
    Arc::new(FileKeyValueStore::new(data_dir))
}

/// Builds the hybrid layer on the file store and the system keychain.
pub async fn build_hybrid(config: &Config) -> Arc<HybridApiService> {
    let keychain: Arc<dyn KeychainApi> = Arc::new(SystemKeychain::new());
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    Arc::new(HybridApiService::from_config(config, open_store(config), keychain, clock).await)
}
