//! Geospatial encoder - scalar range mapping over a coordinate axis

use super::{ScalarEncoder, ScalarEncoderConfig, SparseVector};
use crate::{Error, Result};

/// Smallest coordinate accepted for either axis (longitude lower bound).
pub const COORDINATE_MIN: f64 = -180.0;

/// Largest coordinate accepted for either axis (longitude upper bound).
pub const COORDINATE_MAX: f64 = 180.0;

/// Encodes a latitude or longitude band into a sparse vector.
///
/// Behaves exactly like a non-periodic [`ScalarEncoder`] but refuses bounds
/// outside the coordinate domain.
#[derive(Debug, Clone, PartialEq)]
pub struct GeoSpatialEncoder {
    inner: ScalarEncoder,
}

impl GeoSpatialEncoder {
    /// Validate the configuration and build the encoder.
    ///
    /// # Errors
    ///
    /// Returns `Error::Configuration` for periodic configs, bounds outside
    /// `[-180, 180]`, or any geometry rejected by [`ScalarEncoder::new`].
    pub fn new(config: ScalarEncoderConfig) -> Result<Self> {
        if config.periodic {
            return Err(Error::Configuration(format!(
                "geospatial encoder '{}' cannot be periodic",
                config.name
            )));
        }
        let in_domain = |v: f64| (COORDINATE_MIN..=COORDINATE_MAX).contains(&v);
        if !in_domain(config.min_value) || !in_domain(config.max_value) {
            return Err(Error::Configuration(format!(
                "geospatial encoder '{}': bounds [{}, {}] outside [{COORDINATE_MIN}, {COORDINATE_MAX}]",
                config.name, config.min_value, config.max_value
            )));
        }
        Ok(Self {
            inner: ScalarEncoder::new(config)?,
        })
    }

    /// Band used by the experiment pipeline: latitude 48.75 to 51.86, `W=21`, `N=40`.
    ///
    /// # Errors
    ///
    /// Never fails for the built-in parameters; the `Result` mirrors [`Self::new`].
    pub fn latitude_band() -> Result<Self> {
        Self::new(
            ScalarEncoderConfig::new(21, 40, 48.75, 51.86)
                .named("GeoSpatialEncoder")
                .radius(1.5)
                .clip_input(true),
        )
    }

    /// Output width `N`.
    #[must_use]
    pub const fn total_bits(&self) -> usize {
        self.inner.total_bits()
    }

    /// The underlying configuration.
    #[must_use]
    pub const fn config(&self) -> &ScalarEncoderConfig {
        self.inner.config()
    }

    /// Encode a coordinate.
    ///
    /// # Errors
    ///
    /// Same as [`ScalarEncoder::encode`].
    pub fn encode(&self, coordinate: f64) -> Result<SparseVector> {
        self.inner.encode(coordinate)
    }
}
