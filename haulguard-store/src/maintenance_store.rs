//! Persistent maintenance state.
//!
//! Service history, preferred shops and alert settings live together under
//! [`MAINTENANCE_STORE_KEY`], separate from the usage counters.

use haulguard_core::{MaintenanceItem, MaintenanceSettings, ServiceRecord, ServiceShop};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::error::StoreError;
use crate::kv::{KeyValueStore, load_value, save_value};

/// Store key of the persisted maintenance state.
pub const MAINTENANCE_STORE_KEY: &str = "predictive-maintenance-store";

/// Everything the maintenance planner remembers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaintenanceState {
    /// Completed services, oldest first.
    #[serde(default)]
    pub history: Vec<ServiceRecord>,
    /// Shops the driver prefers.
    #[serde(default)]
    pub preferred_shops: Vec<ServiceShop>,
    /// Thresholds and interval overrides.
    #[serde(default)]
    pub settings: MaintenanceSettings,
}

impl MaintenanceState {
    /// Most recent service of `item`, by date then odometer.
    pub fn last_service(&self, item: MaintenanceItem) -> Option<&ServiceRecord> {
        self.history
            .iter()
            .filter(|r| r.item == item)
            .max_by_key(|r| (r.performed_on, r.odometer_mi))
    }
}

/// Maintenance state backed by a [`KeyValueStore`].
pub struct MaintenanceStore {
    state: RwLock<MaintenanceState>,
    store: Arc<dyn KeyValueStore>,
}

impl MaintenanceStore {
    /// Loads the state, falling back to defaults when missing or unreadable.
    pub async fn load(store: Arc<dyn KeyValueStore>) -> Self {
        let state = match load_value(store.as_ref(), MAINTENANCE_STORE_KEY).await {
            Ok(Some(state)) => {
                info!("Maintenance state loaded");
                state
            }
            Ok(None) => {
                debug!("No maintenance state yet, using defaults");
                MaintenanceState::default()
            }
            Err(e) => {
                warn!(error = %e, "Failed to load maintenance state, using defaults");
                MaintenanceState::default()
            }
        };

        Self {
            state: RwLock::new(state),
            store,
        }
    }

    /// Gets a copy of the current state.
    pub async fn get(&self) -> MaintenanceState {
        self.state.read().await.clone()
    }

    /// Applies `f` and persists the result.
    ///
    /// # Errors
    ///
    /// Returns error if the state cannot be written. The in-memory change
    /// is kept either way.
    pub async fn update<F>(&self, f: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut MaintenanceState),
    {
        let mut state = self.state.write().await;
        f(&mut state);
        save_value(self.store.as_ref(), MAINTENANCE_STORE_KEY, &*state).await
    }

    /// Appends a completed service.
    ///
    /// # Errors
    ///
    /// Returns error if the state cannot be written.
    pub async fn record_service(&self, record: ServiceRecord) -> Result<(), StoreError> {
        info!(item = %record.item, odometer = record.odometer_mi, "Recording service");
        self.update(|state| state.history.push(record)).await
    }

    /// Adds a shop, replacing one with the same name.
    ///
    /// # Errors
    ///
    /// Returns error if the state cannot be written.
    pub async fn add_preferred_shop(&self, shop: ServiceShop) -> Result<(), StoreError> {
        self.update(|state| {
            state.preferred_shops.retain(|s| s.name != shop.name);
            state.preferred_shops.push(shop);
        })
        .await
    }

    /// Replaces the alert settings.
    ///
    /// # Errors
    ///
    /// Returns error if the state cannot be written.
    pub async fn set_settings(&self, settings: MaintenanceSettings) -> Result<(), StoreError> {
        self.update(|state| state.settings = settings).await
    }
}

impl std::fmt::Debug for MaintenanceStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MaintenanceStore").finish_non_exhaustive()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::MemoryKeyValueStore;
    use crate::usage_tracker::USAGE_STATS_KEY;
    use chrono::NaiveDate;

    fn record(item: MaintenanceItem, day: u32, odometer_mi: u64) -> ServiceRecord {
        ServiceRecord {
            item,
            performed_on: NaiveDate::from_ymd_opt(2024, 4, day).unwrap(),
            odometer_mi,
            engine_hours: None,
            shop: None,
            cost_usd: None,
        }
    }

    #[tokio::test]
    async fn test_record_and_reload() {
        let kv = MemoryKeyValueStore::new();
        let store = MaintenanceStore::load(Arc::new(kv.clone())).await;
        assert!(store.get().await.history.is_empty());

        store
            .record_service(record(MaintenanceItem::OilChange, 2, 410_000))
            .await
            .unwrap();

        assert!(kv.get(MAINTENANCE_STORE_KEY).await.unwrap().is_some());
        assert!(kv.get(USAGE_STATS_KEY).await.unwrap().is_none());

        let reloaded = MaintenanceStore::load(Arc::new(kv)).await;
        assert_eq!(reloaded.get().await.history.len(), 1);
    }

    #[test]
    fn test_last_service_picks_latest() {
        let mut state = MaintenanceState::default();
        state.history.push(record(MaintenanceItem::Brakes, 20, 430_000));
        state.history.push(record(MaintenanceItem::Brakes, 3, 400_000));
        state.history.push(record(MaintenanceItem::OilChange, 25, 431_000));

        let last = state.last_service(MaintenanceItem::Brakes).unwrap();
        assert_eq!(last.odometer_mi, 430_000);
        assert!(state.last_service(MaintenanceItem::Dpf).is_none());
    }

    #[tokio::test]
    async fn test_shops_deduplicated_by_name() {
        let store = MaintenanceStore::load(Arc::new(MemoryKeyValueStore::new())).await;
        let shop = |phone: &str| ServiceShop {
            name: "Big Rig Repair".to_string(),
            location: Some("Joliet, IL".to_string()),
            phone: Some(phone.to_string()),
        };
        store.add_preferred_shop(shop("555-0100")).await.unwrap();
        store.add_preferred_shop(shop("555-0199")).await.unwrap();

        let shops = store.get().await.preferred_shops;
        assert_eq!(shops.len(), 1);
        assert_eq!(shops[0].phone.as_deref(), Some("555-0199"));
    }

    #[tokio::test]
    async fn test_corrupt_state_falls_back() {
        let kv = MemoryKeyValueStore::new();
        kv.set(MAINTENANCE_STORE_KEY, "[1,2,3]").await.unwrap();
        let store = MaintenanceStore::load(Arc::new(kv)).await;
        assert_eq!(store.get().await, MaintenanceState::default());
    }

    #[tokio::test]
    async fn test_settings_persist() {
        let kv = MemoryKeyValueStore::new();
        let store = MaintenanceStore::load(Arc::new(kv.clone())).await;

        let mut settings = MaintenanceSettings::default();
        settings.warning_miles = 2_500;
        store.set_settings(settings).await.unwrap();
        assert_eq!(store.get().await.settings.warning_miles, 2_500);

        let reloaded = MaintenanceStore::load(Arc::new(kv)).await;
        assert_eq!(reloaded.get().await.settings.warning_miles, 2_500);
    }
}
