//! Encoder pipeline - typed inputs to fixed-width sparse vectors
//!
//! Every encoder is a pure function of its validated configuration and one
//! input. Encoders hold no state between calls and are cheap to build, so a
//! fresh set is constructed per request.
//!
//! ## Variants
//!
//! | Variant | Input | Output |
//! |---|---|---|
//! | [`BinaryEncoder`] | numeric string | base-2 digits, `N` bits |
//! | [`ScalarEncoder`] | `f64` | `W` contiguous active bits among `N` |
//! | [`GeoSpatialEncoder`] | coordinate | as scalar, coordinate domain |
//! | [`DateTimeEncoder`] | timestamp | concatenated calendar sub-encoders |
//!
//! ## Usage
//!
//! ```rust
//! use sdr_bitmap::encoder::{Encoder, EncoderInput, ScalarEncoder, ScalarEncoderConfig};
//!
//! let scalar = ScalarEncoder::new(ScalarEncoderConfig::new(21, 100, 0.0, 500.0))?;
//! let encoder = Encoder::Scalar(scalar);
//!
//! let sdr = encoder.encode(&EncoderInput::Number(42.0))?;
//! assert_eq!(sdr.len(), 100);
//! assert_eq!(sdr.active_count(), 21);
//! # Ok::<(), sdr_bitmap::Error>(())
//! ```

mod binary;
mod datetime;
mod geospatial;
mod scalar;
mod sdr;

pub use binary::BinaryEncoder;
pub use datetime::{
    parse_timestamp, DateTimeEncoder, DateTimeEncoderConfig, DateTimePart, PartLayout, Precision,
};
pub use geospatial::{GeoSpatialEncoder, COORDINATE_MAX, COORDINATE_MIN};
pub use scalar::{ScalarEncoder, ScalarEncoderConfig};
pub use sdr::SparseVector;

use chrono::{DateTime, FixedOffset};

use crate::{Error, Result};

/// Input accepted by [`Encoder::encode`].
#[derive(Debug, Clone, PartialEq)]
pub enum EncoderInput<'a> {
    /// Free text (numeric string for binary, timestamp string for datetime)
    Text(&'a str),
    /// Real number
    Number(f64),
    /// Parsed timestamp
    Timestamp(DateTime<FixedOffset>),
}

/// Closed set of encoder variants.
#[derive(Debug, Clone, PartialEq)]
pub enum Encoder {
    /// Base-2 encoder
    Binary(BinaryEncoder),
    /// Range encoder
    Scalar(ScalarEncoder),
    /// Calendar composite
    DateTime(DateTimeEncoder),
    /// Coordinate range encoder
    GeoSpatial(GeoSpatialEncoder),
}

impl Encoder {
    /// Short variant name.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Binary(_) => "binary",
            Self::Scalar(_) => "scalar",
            Self::DateTime(_) => "datetime",
            Self::GeoSpatial(_) => "geospatial",
        }
    }

    /// Length of every vector this encoder produces.
    #[must_use]
    pub fn width(&self) -> usize {
        match self {
            Self::Binary(e) => e.total_bits(),
            Self::Scalar(e) => e.total_bits(),
            Self::DateTime(e) => e.total_bits(),
            Self::GeoSpatial(e) => e.total_bits(),
        }
    }

    /// Encode an input.
    ///
    /// Numeric encoders accept `Text` that parses as a number; the datetime
    /// encoder accepts `Text` that parses as a timestamp.
    ///
    /// # Errors
    ///
    /// - `Error::InputValidation` if the input kind does not fit the variant or
    ///   the value is outside the encoder domain
    /// - `Error::Configuration` for binary overflow
    pub fn encode(&self, input: &EncoderInput<'_>) -> Result<SparseVector> {
        match (self, input) {
            (Self::Binary(e), EncoderInput::Text(s)) => e.encode(s),
            (Self::Binary(e), EncoderInput::Number(v)) => e.encode(&v.to_string()),
            (Self::Scalar(e), _) => e.encode(numeric(input, self.kind())?),
            (Self::GeoSpatial(e), _) => e.encode(numeric(input, self.kind())?),
            (Self::DateTime(e), EncoderInput::Timestamp(ts)) => e.encode(ts),
            (Self::DateTime(e), EncoderInput::Text(s)) => e.encode_str(s),
            (encoder, other) => Err(Error::InputValidation(format!(
                "{} encoder cannot encode {other:?}",
                encoder.kind()
            ))),
        }
    }
}

fn numeric(input: &EncoderInput<'_>, kind: &str) -> Result<f64> {
    match input {
        EncoderInput::Number(v) => Ok(*v),
        EncoderInput::Text(s) => s.trim().parse().map_err(|_| {
            Error::InputValidation(format!("{kind} encoder: '{s}' is not a number"))
        }),
        EncoderInput::Timestamp(_) => Err(Error::InputValidation(format!(
            "{kind} encoder cannot encode a timestamp"
        ))),
    }
}
