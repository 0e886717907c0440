//! Weather provider descriptors.

use haulguard_core::{ApiConfig, Capability, ProviderTier, RateLimits};

/// OpenWeatherMap current weather (free tier: 1,000 calls a day).
pub fn openweathermap_descriptor() -> ApiConfig {
    ApiConfig::new(
        "openweathermap",
        "OpenWeatherMap",
        "https://api.openweathermap.org/data/2.5/weather",
        ProviderTier::Primary,
        RateLimits::new(1_000, 30_000),
    )
    .with_capability(Capability::Weather)
    .requiring_key()
    .with_cost_per_call(0.0015)
}

/// Open-Meteo forecast API, current block only.
pub fn open_meteo_descriptor() -> ApiConfig {
    ApiConfig::new(
        "open-meteo",
        "Open-Meteo",
        "https://api.open-meteo.com/v1/forecast",
        ProviderTier::Fallback,
        RateLimits::new(10_000, 300_000),
    )
    .with_capability(Capability::Weather)
}
