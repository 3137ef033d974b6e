//! Multi-stage rocket mass budgets with extended-precision delta-V.
//!
//! The workspace crates are re-exported here so front-ends (the `ship_report`
//! CLI, tests, embedding applications) depend on a single library.

pub mod hangar;

pub use budget_config as config;
pub use budget_export as export;
pub use budget_numeric as numeric;
pub use budget_propulsion as propulsion;
pub use budget_ship as ship;

pub use hangar::{Hangar, HangarError};

/// Returns the version of the library for smoke tests.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
