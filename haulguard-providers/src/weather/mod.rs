//! Current-conditions weather providers.
//!
//! | Provider | Tier | Key |
//! |----------|------|-----|
//! | OpenWeatherMap | Primary | required |
//! | Open-Meteo | Fallback | none |
//!
//! Both are asked for imperial units so the payload needs no conversion
//! beyond visibility, which both report in meters.

mod descriptor;
pub(crate) mod parser;
mod providers;

pub use descriptor::{open_meteo_descriptor, openweathermap_descriptor};
pub use parser::wmo_description;
pub use providers::{OpenMeteoProvider, OpenWeatherMapProvider};

/// Meters in a statute mile.
const METERS_PER_MILE: f64 = 1_609.344;
