//! Extended-precision numeric values shared across the Stage Budget workspace.
//!
//! Every mass and velocity in the workspace is held as a [`Numeric`]. Values are
//! produced by a [`MathContext`], which carries the working precision explicitly
//! instead of reading it from process-wide state.

mod context;
mod value;

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use context::{DEFAULT_PRECISION_BITS, MAX_PRECISION_BITS, MIN_PRECISION_BITS, MathContext};
pub use value::Numeric;

/// Errors raised while building or combining numeric values.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NumericError {
    #[error("'{input}' is not a decimal number")]
    Parse { input: String },
    #[error("{operation} is undefined for {operand}")]
    Domain { operation: &'static str, operand: f64 },
    #[error("precision of {0} bits is outside the supported range")]
    InvalidPrecision(usize),
    #[error("numeric backend failure: {0}")]
    Backend(String),
}

/// A numeric quantity as it arrives from a caller or a manifest.
///
/// Decimal strings are preferred: they enter extended precision without passing
/// through a native float first. Floats are accepted for convenience and carry
/// whatever rounding `f64` already applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NumberInput {
    Decimal(String),
    Float(f64),
}

impl From<&str> for NumberInput {
    fn from(value: &str) -> Self {
        NumberInput::Decimal(value.to_string())
    }
}

impl From<String> for NumberInput {
    fn from(value: String) -> Self {
        NumberInput::Decimal(value)
    }
}

impl From<f64> for NumberInput {
    fn from(value: f64) -> Self {
        NumberInput::Float(value)
    }
}

impl fmt::Display for NumberInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NumberInput::Decimal(text) => f.write_str(text),
            NumberInput::Float(value) => write!(f, "{value}"),
        }
    }
}

/// Relative-tolerance comparison on the native-float surface.
///
/// Two exact zeros compare equal; otherwise the difference is measured against
/// the larger magnitude.
pub fn relative_eq(a: f64, b: f64, rel_tol: f64) -> bool {
    if a == b {
        return true;
    }
    if !a.is_finite() || !b.is_finite() {
        return false;
    }
    (a - b).abs() <= rel_tol * a.abs().max(b.abs())
}
