//! Geolocation provider descriptors.

use haulguard_core::{ApiConfig, Capability, ProviderTier, RateLimits};

/// ipgeolocation.io, the paid primary.
pub fn ipgeolocation_descriptor() -> ApiConfig {
    ApiConfig::new(
        "ipgeolocation",
        "ipgeolocation.io",
        "https://api.ipgeolocation.io/ipgeo",
        ProviderTier::Primary,
        RateLimits::new(1_000, 30_000),
    )
    .with_capability(Capability::Geolocation)
    .requiring_key()
    .with_cost_per_call(0.0005)
}

/// ip-api.com free endpoint. HTTPS is a paid feature there, so this one
/// stays on plain HTTP.
pub fn ip_api_descriptor() -> ApiConfig {
    ApiConfig::new(
        "ip-api",
        "ip-api.com",
        "http://ip-api.com/json",
        ProviderTier::Fallback,
        RateLimits::new(1_000, 30_000),
    )
    .with_capability(Capability::Geolocation)
}

/// ipapi.co free tier.
pub fn ipapi_co_descriptor() -> ApiConfig {
    ApiConfig::new(
        "ipapi.co",
        "ipapi.co",
        "https://ipapi.co/json/",
        ProviderTier::Fallback,
        RateLimits::new(1_000, 30_000),
    )
    .with_capability(Capability::Geolocation)
}
