//! Engine trouble-code diagnostics providers.
//!
//! Only CarMD is wired up. It needs a VIN, so requests without one never
//! reach it and fall through to the local rule-based analysis.
//!
//! CarMD authenticates with two headers. Both travel in the single API key
//! slot as `<authorization>:<partner-token>`.

mod carmd;
pub(crate) mod parser;

pub use carmd::{CarMdProvider, carmd_descriptor};
pub use parser::CarMdResponse;
