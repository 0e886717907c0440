//! Location with device, network and last-known fallbacks.

use async_trait::async_trait;
use haulguard_core::{Location, ResponseSource};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::hybrid::HybridApiService;

/// On-device position source (GPS, ELD telematics).
#[async_trait]
pub trait DeviceLocator: Send + Sync {
    /// Returns a fix if the device has one right now.
    async fn current_fix(&self) -> Option<Location>;
}

/// A locator that never has a fix.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDevice;

#[async_trait]
impl DeviceLocator for NoDevice {
    async fn current_fix(&self) -> Option<Location> {
        None
    }
}

/// A locator that reports a fixed coordinate, e.g. one passed on the command line.
#[derive(Debug, Clone, Default)]
pub struct StaticLocator {
    fix: Option<Location>,
}

impl StaticLocator {
    /// Reports `latitude`/`longitude` as a device fix.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            fix: Some(Location::new(latitude, longitude, ResponseSource::Device)),
        }
    }

    /// Reports no fix.
    pub fn empty() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DeviceLocator for StaticLocator {
    async fn current_fix(&self) -> Option<Location> {
        self.fix.clone()
    }
}

/// Resolves the truck's position.
///
/// Order: device fix, then (unless degraded) the geolocation providers,
/// then the last position seen.
pub struct LocationService {
    hybrid: Arc<HybridApiService>,
    device: Arc<dyn DeviceLocator>,
    last_known: RwLock<Option<Location>>,
}

impl LocationService {
    /// Creates the service.
    pub fn new(hybrid: Arc<HybridApiService>, device: Arc<dyn DeviceLocator>) -> Self {
        Self {
            hybrid,
            device,
            last_known: RwLock::new(None),
        }
    }

    /// Seeds the last-known position.
    pub async fn remember(&self, location: Location) {
        *self.last_known.write().await = Some(location);
    }

    /// The last position seen, tagged [`ResponseSource::LastKnown`].
    pub async fn last_known(&self) -> Option<Location> {
        self.last_known.read().await.clone().map(|mut location| {
            location.source = ResponseSource::LastKnown;
            location
        })
    }

    /// Best available position, or `None` if nothing has ever been seen.
    pub async fn current_location(&self) -> Option<Location> {
        if let Some(mut fix) = self.device.current_fix().await.filter(Location::is_valid) {
            debug!("Using device fix");
            fix.source = ResponseSource::Device;
            self.remember(fix.clone()).await;
            return Some(fix);
        }

        if self.hybrid.is_degraded_mode().await {
            info!("Degraded mode, skipping network location");
            return self.last_known().await;
        }

        if let Some(location) = self.hybrid.get_location().await {
            self.remember(location.clone()).await;
            return Some(location);
        }

        debug!("Network location unavailable, using last known");
        self.last_known().await
    }
}

impl std::fmt::Debug for LocationService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocationService").finish_non_exhaustive()
    }
}
