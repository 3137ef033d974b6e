use std::cmp::Ordering;
use std::fmt;

use astro_float::BigFloat;

use crate::relative_eq;

/// An extended-precision real number.
///
/// Values are immutable; arithmetic goes through [`crate::MathContext`] and
/// always yields a fresh value. Cloning copies the full mantissa.
#[derive(Debug, Clone)]
pub struct Numeric {
    value: BigFloat,
    precision_bits: usize,
}

impl Numeric {
    pub(crate) fn from_raw(value: BigFloat, precision_bits: usize) -> Self {
        Self {
            value,
            precision_bits,
        }
    }

    pub(crate) fn raw(&self) -> &BigFloat {
        &self.value
    }

    /// Precision the value was produced at.
    pub fn precision_bits(&self) -> usize {
        self.precision_bits
    }

    pub fn is_zero(&self) -> bool {
        self.value.is_zero()
    }

    /// Strictly greater than zero.
    pub fn is_positive(&self) -> bool {
        !self.value.is_zero() && !self.value.is_nan() && self.value.is_positive()
    }

    /// Nearest native float, for presentation only.
    pub fn to_f64(&self) -> f64 {
        if self.value.is_zero() {
            return 0.0;
        }
        self.value
            .to_string()
            .trim()
            .parse::<f64>()
            .unwrap_or(f64::NAN)
    }

    /// Relative-tolerance comparison on the native-float surface.
    pub fn approx_eq(&self, other: &Numeric, rel_tol: f64) -> bool {
        relative_eq(self.to_f64(), other.to_f64(), rel_tol)
    }
}

impl PartialEq for Numeric {
    fn eq(&self, other: &Self) -> bool {
        self.partial_cmp(other) == Some(Ordering::Equal)
    }
}

impl PartialOrd for Numeric {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.value.cmp(&other.value).map(|sign| sign.cmp(&0))
    }
}

impl fmt::Display for Numeric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.value, f)
    }
}
