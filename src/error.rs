//! Error types for sdr-bitmap
//!
//! Every failure maps to one taxonomy bucket so that the runner can decide
//! per stage and the listener per message what to do with it.

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// sdr-bitmap error types
#[derive(Error, Debug)]
pub enum Error {
    /// Encoder input could not be parsed or lies outside the encoder domain
    #[error("Invalid encoder input: {0}")]
    InputValidation(String),

    /// Encoder or render geometry is invalid (odd composite, binary overflow, ...)
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// Vector cannot be reshaped into the requested grid
    #[error("Shape mismatch: {0}")]
    Shape(String),

    /// Named input artifact (or queue receipt) does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Batch input file or message does not match the expected schema
    #[error("Schema error: {0}")]
    Schema(String),

    /// Network or storage failure that may succeed on redelivery
    #[error("Transient IO failure: {0}\nThe message will be redelivered after its visibility timeout")]
    TransientIo(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// PNG encoding error
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Whether retrying the same operation could plausibly succeed.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::TransientIo(_) | Self::Io(_))
    }

    /// Short, stable name of the taxonomy bucket (used in stage reports).
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::InputValidation(_) => "input_validation",
            Self::Configuration(_) => "configuration",
            Self::Shape(_) => "shape",
            Self::NotFound(_) => "not_found",
            Self::Schema(_) => "schema",
            Self::TransientIo(_) | Self::Io(_) => "transient_io",
            Self::Json(_) => "json",
            Self::Image(_) => "image",
            Self::Other(_) => "other",
        }
    }
}
