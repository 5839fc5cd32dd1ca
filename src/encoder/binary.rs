//! Binary encoder - fixed-width base-2 representation of a number

use super::SparseVector;
use crate::{Error, Result};

/// Encodes the integer part of a numeric string as exactly `N` bits,
/// most significant bit first, left-padded with zeros.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BinaryEncoder {
    total_bits: usize,
}

impl BinaryEncoder {
    /// Create an encoder producing `total_bits`-wide vectors.
    ///
    /// # Errors
    ///
    /// Returns `Error::Configuration` if `total_bits` is zero.
    pub fn new(total_bits: usize) -> Result<Self> {
        if total_bits == 0 {
            return Err(Error::Configuration(
                "binary encoder needs at least one bit".to_string(),
            ));
        }
        Ok(Self { total_bits })
    }

    /// Output width `N`.
    #[must_use]
    pub const fn total_bits(&self) -> usize {
        self.total_bits
    }

    /// Encode a numeric string.
    ///
    /// The value is parsed as a real number and truncated toward zero.
    ///
    /// # Errors
    ///
    /// - `Error::InputValidation` if the input is not a finite, non-negative number
    /// - `Error::Configuration` if the integer part needs more than `N` bits
    pub fn encode(&self, input: &str) -> Result<SparseVector> {
        let trimmed = input.trim();
        let value: f64 = trimmed.parse().map_err(|_| {
            Error::InputValidation(format!("value '{input}' cannot be parsed as a number"))
        })?;

        if !value.is_finite() {
            return Err(Error::InputValidation(format!(
                "value '{input}' is not finite"
            )));
        }

        let truncated = value.trunc();
        if truncated < 0.0 {
            return Err(Error::InputValidation(format!(
                "value '{input}' is negative; the binary encoder only accepts values >= 0"
            )));
        }

        let bits = integer_bits(truncated);
        if bits.len() > self.total_bits {
            return Err(Error::Configuration(format!(
                "value '{input}' needs {} bits but the encoder is {} bits wide",
                bits.len(),
                self.total_bits
            )));
        }

        let padding = self.total_bits - bits.len();
        Ok(SparseVector::from_bits(
            std::iter::repeat(0).take(padding).chain(bits),
        ))
    }
}

/// Base-2 digits of a non-negative integral `f64`, most significant first.
///
/// Read straight from the IEEE 754 fields, so every representable integer is
/// exact regardless of magnitude.
fn integer_bits(value: f64) -> Vec<u8> {
    if value < 1.0 {
        return vec![0];
    }
    let raw = value.to_bits();
    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    let exponent = ((raw >> 52) & 0x7ff) as i32 - 1075;
    let mantissa = (raw & ((1 << 52) - 1)) | (1 << 52);

    // values >= 1 have exponent >= -52, and integral ones drop only zero bits
    let (significand, trailing_zeros) = if exponent < 0 {
        (mantissa >> exponent.unsigned_abs(), 0)
    } else {
        (mantissa, exponent.unsigned_abs() as usize)
    };
    let width = u64::BITS - significand.leading_zeros();

    (0..width)
        .rev()
        .map(|i| u8::from((significand >> i) & 1 == 1))
        .chain(std::iter::repeat(0).take(trailing_zeros))
        .collect()
}
