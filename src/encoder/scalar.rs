//! Scalar encoder - locality-preserving range mapping
//!
//! A value in `[min, max]` becomes a contiguous run of `W` active bits among
//! `N`. Neighbouring values share most of their active bits, the minimum maps
//! to the first run and the maximum to the last one.
//!
//! ```text
//! N = 12, W = 3, range [0, 9]
//!
//! 0.0  -> 111000000000
//! 4.5  -> 000011100000
//! 9.0  -> 000000000111
//! ```
//!
//! Periodic encoders treat the domain as the half-open circle `[min, max)`,
//! so runs near the end wrap around to the first bits.

use serde::{Deserialize, Serialize};

use super::SparseVector;
use crate::{Error, Result};

/// Typed parameter set for a range-based encoder.
///
/// Validated entirely by [`ScalarEncoder::new`]; an encoder never exists with
/// invalid geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalarEncoderConfig {
    /// Encoder name (appears in logs and composite layouts).
    #[serde(default)]
    pub name: String,
    /// Number of active bits `W`.
    pub width: usize,
    /// Total number of bits `N`.
    pub total_bits: usize,
    /// Lower bound of the domain.
    pub min_value: f64,
    /// Upper bound of the domain (exclusive for periodic encoders).
    pub max_value: f64,
    /// Informational radius. `N` is authoritative, see [`ScalarEncoder::radius`].
    #[serde(default)]
    pub radius: Option<f64>,
    /// Wrap the domain into a circle.
    #[serde(default)]
    pub periodic: bool,
    /// Clamp (or wrap, if periodic) out-of-range inputs instead of failing.
    #[serde(default)]
    pub clip_input: bool,
    /// Start position inside a composite encoder. Assigned by the composite.
    #[serde(default)]
    pub offset: usize,
}

impl ScalarEncoderConfig {
    /// Create a non-periodic, non-clipping configuration.
    #[must_use]
    pub fn new(width: usize, total_bits: usize, min_value: f64, max_value: f64) -> Self {
        Self {
            name: "scalar".to_string(),
            width,
            total_bits,
            min_value,
            max_value,
            radius: None,
            periodic: false,
            clip_input: false,
            offset: 0,
        }
    }

    /// Set the encoder name.
    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the periodic flag.
    #[must_use]
    pub const fn periodic(mut self, periodic: bool) -> Self {
        self.periodic = periodic;
        self
    }

    /// Set the clip flag.
    #[must_use]
    pub const fn clip_input(mut self, clip: bool) -> Self {
        self.clip_input = clip;
        self
    }

    /// Record a radius. Non-positive values clear it.
    #[must_use]
    pub fn radius(mut self, radius: f64) -> Self {
        self.radius = (radius > 0.0).then_some(radius);
        self
    }

    /// Override the width `W`.
    #[must_use]
    pub const fn width(mut self, width: usize) -> Self {
        self.width = width;
        self
    }

    fn validate(&self) -> Result<()> {
        if self.total_bits == 0 {
            return Err(Error::Configuration(format!(
                "encoder '{}': total bits N must be > 0",
                self.name
            )));
        }
        if self.width == 0 || self.width > self.total_bits {
            return Err(Error::Configuration(format!(
                "encoder '{}': width W={} must satisfy 0 < W <= N={}",
                self.name, self.width, self.total_bits
            )));
        }
        if !self.min_value.is_finite() || !self.max_value.is_finite() {
            return Err(Error::Configuration(format!(
                "encoder '{}': bounds must be finite",
                self.name
            )));
        }
        if self.min_value >= self.max_value {
            return Err(Error::Configuration(format!(
                "encoder '{}': MinValue {} must be below MaxValue {}",
                self.name, self.min_value, self.max_value
            )));
        }
        Ok(())
    }
}

/// Range-based encoder over `f64` inputs.
#[derive(Debug, Clone, PartialEq)]
pub struct ScalarEncoder {
    config: ScalarEncoderConfig,
}

impl ScalarEncoder {
    /// Validate the configuration and build the encoder.
    ///
    /// # Errors
    ///
    /// Returns `Error::Configuration` if `N == 0`, `W` is not in `1..=N`, or
    /// the bounds are not finite with `min < max`.
    pub fn new(config: ScalarEncoderConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// The validated configuration.
    #[must_use]
    pub const fn config(&self) -> &ScalarEncoderConfig {
        &self.config
    }

    /// Output width `N`.
    #[must_use]
    pub const fn total_bits(&self) -> usize {
        self.config.total_bits
    }

    /// Number of active bits `W`.
    #[must_use]
    pub const fn width(&self) -> usize {
        self.config.width
    }

    fn range(&self) -> f64 {
        self.config.max_value - self.config.min_value
    }

    /// Input distance covered by one bucket step.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn resolution(&self) -> f64 {
        let steps = if self.config.periodic {
            self.config.total_bits
        } else {
            self.config.total_bits - self.config.width
        };
        if steps == 0 {
            self.range()
        } else {
            self.range() / steps as f64
        }
    }

    /// Effective radius: two inputs this far apart share no active bits.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn radius(&self) -> f64 {
        self.config.width as f64 * self.resolution()
    }

    /// Map an input into the encoder domain, applying the clip policy.
    fn normalize(&self, input: f64) -> Result<f64> {
        let ScalarEncoderConfig {
            min_value,
            max_value,
            periodic,
            clip_input,
            ..
        } = self.config;

        if input.is_nan() {
            return Err(Error::InputValidation(format!(
                "encoder '{}': input is NaN",
                self.config.name
            )));
        }

        let in_range = if periodic {
            input >= min_value && input < max_value
        } else {
            input >= min_value && input <= max_value
        };
        if in_range {
            return Ok(input);
        }
        if !clip_input || (periodic && input.is_infinite()) {
            return Err(Error::InputValidation(format!(
                "encoder '{}': input {input} outside [{min_value}, {max_value}{}",
                self.config.name,
                if periodic { ")" } else { "]" }
            )));
        }

        if periodic {
            Ok(min_value + (input - min_value).rem_euclid(self.range()))
        } else {
            Ok(input.clamp(min_value, max_value))
        }
    }

    /// Index of the first active bit for a normalized input.
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_possible_wrap,
        clippy::cast_precision_loss,
        clippy::cast_sign_loss
    )]
    fn first_bit(&self, value: f64) -> i64 {
        let n = self.config.total_bits;
        let w = self.config.width;
        let position = (value - self.config.min_value) / self.range();

        if self.config.periodic {
            let center = ((position * n as f64).floor() as i64).rem_euclid(n as i64);
            center - (w / 2) as i64
        } else {
            let slots = (n - w) as f64;
            let first = (position * slots + 0.5).floor() as i64;
            first.clamp(0, (n - w) as i64)
        }
    }

    /// Encode a value.
    ///
    /// # Errors
    ///
    /// Returns `Error::InputValidation` if the input is NaN, or outside the
    /// domain while `clip_input` is off.
    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap, clippy::cast_sign_loss)]
    pub fn encode(&self, input: f64) -> Result<SparseVector> {
        let value = self.normalize(input)?;
        let n = self.config.total_bits as i64;
        let first = self.first_bit(value);

        Ok(SparseVector::with_active(
            self.config.total_bits,
            (0..self.config.width as i64).map(|i| (first + i).rem_euclid(n) as usize),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoder(w: usize, n: usize, min: f64, max: f64) -> ScalarEncoder {
        ScalarEncoder::new(ScalarEncoderConfig::new(w, n, min, max)).unwrap()
    }

    #[test]
    fn test_bounds_map_to_first_and_last_run() {
        let e = encoder(3, 12, 0.0, 9.0);
        assert_eq!(e.encode(0.0).unwrap().active_indices(), vec![0, 1, 2]);
        assert_eq!(e.encode(9.0).unwrap().active_indices(), vec![9, 10, 11]);
    }

    #[test]
    fn test_adjacent_values_overlap() {
        let e = encoder(21, 100, 0.0, 100.0);
        let a = e.encode(50.0).unwrap();
        let b = e.encode(51.0).unwrap();
        assert!(a.overlap(&b) >= 19);
    }

    #[test]
    fn test_out_of_range_without_clip() {
        let e = encoder(3, 12, 0.0, 9.0);
        assert!(matches!(e.encode(9.5), Err(Error::InputValidation(_))));
        assert!(matches!(e.encode(-0.1), Err(Error::InputValidation(_))));
        assert!(matches!(e.encode(f64::NAN), Err(Error::InputValidation(_))));
    }

    #[test]
    fn test_clip_clamps() {
        let e = ScalarEncoder::new(ScalarEncoderConfig::new(3, 12, 0.0, 9.0).clip_input(true))
            .unwrap();
        assert_eq!(e.encode(100.0).unwrap(), e.encode(9.0).unwrap());
        assert_eq!(e.encode(-5.0).unwrap(), e.encode(0.0).unwrap());
    }

    #[test]
    fn test_periodic_wraps_run() {
        let e = ScalarEncoder::new(ScalarEncoderConfig::new(3, 12, 0.0, 12.0).periodic(true))
            .unwrap();
        // center bin 0 -> run starts one bit before the origin
        assert_eq!(e.encode(0.0).unwrap().active_indices(), vec![0, 1, 11]);
        assert_eq!(e.encode(6.0).unwrap().active_indices(), vec![5, 6, 7]);
        assert!(matches!(e.encode(12.0), Err(Error::InputValidation(_))));
    }

    #[test]
    fn test_periodic_clip_wraps_cyclically() {
        let e = ScalarEncoder::new(
            ScalarEncoderConfig::new(3, 12, 0.0, 12.0)
                .periodic(true)
                .clip_input(true),
        )
        .unwrap();
        assert_eq!(e.encode(13.0).unwrap(), e.encode(1.0).unwrap());
        assert_eq!(e.encode(-1.0).unwrap(), e.encode(11.0).unwrap());
    }

    #[test]
    fn test_full_width_encoder() {
        let e = encoder(4, 4, 0.0, 1.0);
        assert_eq!(e.encode(0.3).unwrap().active_count(), 4);
    }

    #[test]
    fn test_invalid_geometry() {
        for config in [
            ScalarEncoderConfig::new(0, 10, 0.0, 1.0),
            ScalarEncoderConfig::new(11, 10, 0.0, 1.0),
            ScalarEncoderConfig::new(3, 0, 0.0, 1.0),
            ScalarEncoderConfig::new(3, 10, 1.0, 1.0),
            ScalarEncoderConfig::new(3, 10, 0.0, f64::INFINITY),
        ] {
            assert!(matches!(
                ScalarEncoder::new(config),
                Err(Error::Configuration(_))
            ));
        }
    }

    #[test]
    fn test_resolution_and_radius() {
        let e = encoder(21, 100, 0.0, 79.0);
        assert!((e.resolution() - 1.0).abs() < 1e-12);
        assert!((e.radius() - 21.0).abs() < 1e-12);
    }
}
