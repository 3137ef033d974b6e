//! Working-precision context and the arithmetic it performs.

use std::cell::RefCell;

use astro_float::{BigFloat, Consts, Radix, RoundingMode};

use crate::{NumberInput, Numeric, NumericError};

/// Precision used when a session does not pick one.
pub const DEFAULT_PRECISION_BITS: usize = 1024;
/// Smallest accepted working precision.
pub const MIN_PRECISION_BITS: usize = 64;
/// Largest accepted working precision.
pub const MAX_PRECISION_BITS: usize = 1 << 20;

const ROUNDING: RoundingMode = RoundingMode::ToEven;

thread_local! {
    // Memoised ln 2 / pi / e for the backend. Results do not depend on it.
    static CONSTS: RefCell<Option<Consts>> = const { RefCell::new(None) };
}

fn with_consts<T>(f: impl FnOnce(&mut Consts) -> T) -> Result<T, NumericError> {
    CONSTS.with(|slot| {
        let mut slot = slot.borrow_mut();
        if slot.is_none() {
            let consts = Consts::new().map_err(|err| NumericError::Backend(format!("{err:?}")))?;
            *slot = Some(consts);
        }
        let consts = slot
            .as_mut()
            .ok_or_else(|| NumericError::Backend("constants cache unavailable".to_string()))?;
        Ok(f(consts))
    })
}

/// Explicit working precision threaded through every value-producing call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MathContext {
    precision_bits: usize,
}

impl Default for MathContext {
    fn default() -> Self {
        Self {
            precision_bits: DEFAULT_PRECISION_BITS,
        }
    }
}

impl MathContext {
    /// Build a context with the given precision in bits.
    pub fn new(precision_bits: usize) -> Result<Self, NumericError> {
        if !(MIN_PRECISION_BITS..=MAX_PRECISION_BITS).contains(&precision_bits) {
            return Err(NumericError::InvalidPrecision(precision_bits));
        }
        Ok(Self { precision_bits })
    }

    pub fn precision_bits(&self) -> usize {
        self.precision_bits
    }

    pub fn zero(&self) -> Numeric {
        Numeric::from_raw(BigFloat::from_f64(0.0, self.precision_bits), self.precision_bits)
    }

    /// Parse a plain or scientific decimal literal such as `-12.5e3`.
    pub fn parse(&self, input: &str) -> Result<Numeric, NumericError> {
        let canonical = canonical_decimal(input.trim()).ok_or_else(|| NumericError::Parse {
            input: input.to_string(),
        })?;
        let value = with_consts(|cc| {
            BigFloat::parse(&canonical, Radix::Dec, self.precision_bits, ROUNDING, cc)
        })?;
        if value.is_nan() || value.is_inf() {
            return Err(NumericError::Parse {
                input: input.to_string(),
            });
        }
        Ok(Numeric::from_raw(value, self.precision_bits))
    }

    /// Lift a native float. The value is taken exactly as `f64` stores it.
    pub fn from_f64(&self, value: f64) -> Result<Numeric, NumericError> {
        if !value.is_finite() {
            return Err(NumericError::Parse {
                input: value.to_string(),
            });
        }
        Ok(Numeric::from_raw(
            BigFloat::from_f64(value, self.precision_bits),
            self.precision_bits,
        ))
    }

    /// Resolve a caller-supplied [`NumberInput`].
    pub fn resolve(&self, input: &NumberInput) -> Result<Numeric, NumericError> {
        match input {
            NumberInput::Decimal(text) => self.parse(text),
            NumberInput::Float(value) => self.from_f64(*value),
        }
    }

    pub fn add(&self, a: &Numeric, b: &Numeric) -> Numeric {
        self.wrap(a.raw().add(b.raw(), self.precision_bits, ROUNDING))
    }

    pub fn sub(&self, a: &Numeric, b: &Numeric) -> Numeric {
        self.wrap(a.raw().sub(b.raw(), self.precision_bits, ROUNDING))
    }

    pub fn mul(&self, a: &Numeric, b: &Numeric) -> Numeric {
        self.wrap(a.raw().mul(b.raw(), self.precision_bits, ROUNDING))
    }

    pub fn div(&self, a: &Numeric, b: &Numeric) -> Result<Numeric, NumericError> {
        if b.is_zero() {
            return Err(NumericError::Domain {
                operation: "division",
                operand: 0.0,
            });
        }
        Ok(self.wrap(a.raw().div(b.raw(), self.precision_bits, ROUNDING)))
    }

    /// Natural logarithm; only strictly positive arguments are accepted.
    pub fn ln(&self, a: &Numeric) -> Result<Numeric, NumericError> {
        if !a.is_positive() {
            return Err(NumericError::Domain {
                operation: "natural log",
                operand: a.to_f64(),
            });
        }
        let value = with_consts(|cc| a.raw().ln(self.precision_bits, ROUNDING, cc))?;
        Ok(self.wrap(value))
    }

    /// `a + b - c`, the shape of every incremental mass adjustment.
    pub fn adjust(&self, a: &Numeric, added: &Numeric, removed: &Numeric) -> Numeric {
        self.sub(&self.add(a, added), removed)
    }

    pub fn sum<'a, I>(&self, values: I) -> Numeric
    where
        I: IntoIterator<Item = &'a Numeric>,
    {
        values
            .into_iter()
            .fold(self.zero(), |acc, value| self.add(&acc, value))
    }

    fn wrap(&self, value: BigFloat) -> Numeric {
        Numeric::from_raw(value, self.precision_bits)
    }
}

/// Validate a decimal literal and rewrite it as `[-]int.frac[e[-]exp]`.
fn canonical_decimal(text: &str) -> Option<String> {
    let bytes = text.as_bytes();
    let mut i = 0;
    let negative = match bytes.first() {
        Some(b'-') => {
            i += 1;
            true
        }
        Some(b'+') => {
            i += 1;
            false
        }
        _ => false,
    };

    let int_start = i;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    let int_digits = &text[int_start..i];

    let mut frac_digits = "";
    if i < bytes.len() && bytes[i] == b'.' {
        i += 1;
        let frac_start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        frac_digits = &text[frac_start..i];
    }
    if int_digits.is_empty() && frac_digits.is_empty() {
        return None;
    }

    let mut exponent = String::new();
    if i < bytes.len() && matches!(bytes[i], b'e' | b'E') {
        i += 1;
        let exp_negative = match bytes.get(i) {
            Some(b'-') => {
                i += 1;
                true
            }
            Some(b'+') => {
                i += 1;
                false
            }
            _ => false,
        };
        let exp_start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        if i == exp_start {
            return None;
        }
        exponent.push('e');
        if exp_negative {
            exponent.push('-');
        }
        exponent.push_str(&text[exp_start..i]);
    }
    if i != bytes.len() {
        return None;
    }

    let mut canonical = String::with_capacity(text.len() + 4);
    if negative {
        canonical.push('-');
    }
    canonical.push_str(if int_digits.is_empty() { "0" } else { int_digits });
    canonical.push('.');
    canonical.push_str(if frac_digits.is_empty() { "0" } else { frac_digits });
    canonical.push_str(&exponent);
    Some(canonical)
}
