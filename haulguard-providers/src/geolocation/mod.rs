//! IP-based geolocation providers.
//!
//! | Provider | Tier | Key |
//! |----------|------|-----|
//! | ipgeolocation.io | Primary | required |
//! | ip-api.com | Fallback | none |
//! | ipapi.co | Fallback | none |
//!
//! All three locate the caller by public IP, so the request carries no
//! parameters and the fix is city-level at best.

mod descriptor;
pub(crate) mod parser;
mod providers;

pub use descriptor::{ip_api_descriptor, ipapi_co_descriptor, ipgeolocation_descriptor};
pub use providers::{IpApiCoProvider, IpApiProvider, IpGeolocationProvider};

/// Accuracy radius reported for IP-based fixes, in meters.
pub const IP_FIX_ACCURACY_M: f64 = 5_000.0;
