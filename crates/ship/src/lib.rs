//! Multi-stage vehicle aggregates.
//!
//! A [`Ship`] owns an ordered list of [`Stage`]s and keeps three aggregates in
//! step with every edit: each stage's total mass, the ship's mass, and the
//! per-stage and ship delta-V from the rocket equation.

mod ship;
mod stage;

use budget_numeric::NumericError;
use thiserror::Error;

pub use ship::Ship;
pub use stage::Stage;

/// Errors surfaced by ship mutations and queries.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ShipError {
    #[error("stage index {index} is out of range for a ship with {len} stages")]
    Index { index: usize, len: usize },
    #[error("stage {stage} cannot burn: {source}")]
    Domain {
        stage: usize,
        #[source]
        source: NumericError,
    },
    #[error(transparent)]
    Numeric(#[from] NumericError),
}
