//! DateTime encoder - composite of calendar sub-encoders
//!
//! The composite output is the ordered concatenation of each configured
//! sub-encoder, ordered by [`DateTimePart`]:
//!
//! ```text
//! | DateTime (N=1024) | DayOfWeek (N=66) | Season (N=12) | Weekend (N=42) |
//! ```
//!
//! The composite length must be even so the vector can be reshaped into a 2D
//! grid; this is checked when the encoder is built, before anything is encoded
//! or rendered.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Datelike, FixedOffset, Months, NaiveDate, NaiveDateTime, Utc, Weekday};
use serde::{Deserialize, Serialize};

use super::{ScalarEncoder, ScalarEncoderConfig, SparseVector};
use crate::{Error, Result};

/// Calendar aspect encoded by one sub-encoder.
///
/// The derived `Ord` is the stable concatenation order of the composite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DateTimePart {
    /// Elapsed time since the range origin, in [`Precision`] units.
    DateTime,
    /// Days since Sunday (0..=6).
    DayOfWeek,
    /// Day of the year (1..=366).
    Season,
    /// 1 on Saturday and Sunday, 0 otherwise.
    Weekend,
}

impl DateTimePart {
    /// Stable encoder name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::DateTime => "DateTimeEncoder",
            Self::DayOfWeek => "DayOfWeekEncoder",
            Self::Season => "SeasonEncoder",
            Self::Weekend => "WeekendEncoder",
        }
    }
}

impl fmt::Display for DateTimePart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Granularity of the `DateTime` sub-encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Precision {
    /// Whole days (default)
    #[default]
    Days,
    /// Whole hours
    Hours,
    /// Whole minutes
    Minutes,
    /// Whole seconds
    Seconds,
}

impl Precision {
    /// Seconds per unit.
    #[must_use]
    pub const fn seconds(&self) -> i64 {
        match self {
            Self::Days => 86_400,
            Self::Hours => 3_600,
            Self::Minutes => 60,
            Self::Seconds => 1,
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn units_between(self, from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
        (to - from).num_seconds().div_euclid(self.seconds()) as f64
    }
}

/// Typed configuration of a [`DateTimeEncoder`].
///
/// The `DateTime` part's bounds are expressed in [`Precision`] units relative
/// to `origin`; use [`DateTimeEncoderConfig::date_range`] to set them from
/// timestamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DateTimeEncoderConfig {
    /// Sub-encoder configurations.
    pub parts: BTreeMap<DateTimePart, ScalarEncoderConfig>,
    /// Start of the `DateTime` range.
    pub origin: DateTime<Utc>,
    /// Unit of the `DateTime` range.
    pub precision: Precision,
}

impl DateTimeEncoderConfig {
    /// Empty configuration anchored at `origin`.
    #[must_use]
    pub const fn new(origin: DateTime<Utc>, precision: Precision) -> Self {
        Self {
            parts: BTreeMap::new(),
            origin,
            precision,
        }
    }

    /// The four-part layout used by the experiment pipeline.
    ///
    /// The `DateTime` range spans four years before `now` to one year after.
    #[must_use]
    pub fn full(now: DateTime<Utc>) -> Self {
        let start = now.checked_sub_months(Months::new(48)).unwrap_or(now);
        let end = now.checked_add_months(Months::new(12)).unwrap_or(now);

        Self::new(start, Precision::Days)
            .with_part(
                DateTimePart::Season,
                ScalarEncoderConfig::new(3, 12, 1.0, 367.0)
                    .periodic(true)
                    .clip_input(true),
            )
            .with_part(
                DateTimePart::DayOfWeek,
                ScalarEncoderConfig::new(21, 66, 0.0, 7.0).clip_input(true),
            )
            .with_part(
                DateTimePart::Weekend,
                ScalarEncoderConfig::new(21, 42, 0.0, 1.0).clip_input(true),
            )
            .date_range(21, 1024, start, end)
    }

    /// Add or replace a sub-encoder.
    #[must_use]
    pub fn with_part(mut self, part: DateTimePart, config: ScalarEncoderConfig) -> Self {
        self.parts.insert(part, config.named(part.as_str()));
        self
    }

    /// Configure the `DateTime` part over `[start, end]`, clipping outside inputs.
    #[must_use]
    pub fn date_range(
        mut self,
        width: usize,
        total_bits: usize,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Self {
        self.origin = start;
        let span = self.precision.units_between(start, end);
        self.with_part(
            DateTimePart::DateTime,
            ScalarEncoderConfig::new(width, total_bits, 0.0, span).clip_input(true),
        )
    }

    /// Override the active width `W` of one part; no-op if the part is absent.
    #[must_use]
    pub fn with_part_width(mut self, part: DateTimePart, width: usize) -> Self {
        if let Some(config) = self.parts.get_mut(&part) {
            config.width = width;
        }
        self
    }

    /// Record a radius on one part; no-op if the part is absent.
    #[must_use]
    pub fn with_part_radius(mut self, part: DateTimePart, radius: f64) -> Self {
        if let Some(config) = self.parts.remove(&part) {
            self.parts.insert(part, config.radius(radius));
        }
        self
    }

    /// Sum of the configured sub-encoder widths `N`.
    #[must_use]
    pub fn total_bits(&self) -> usize {
        self.parts.values().map(|c| c.total_bits).sum()
    }
}

/// Position of one sub-encoder inside the composite vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PartLayout {
    /// Sub-encoder
    pub part: DateTimePart,
    /// First bit of this part in the composite
    pub offset: usize,
    /// Number of bits contributed
    pub total_bits: usize,
}

/// Composite calendar encoder.
#[derive(Debug, Clone, PartialEq)]
pub struct DateTimeEncoder {
    parts: Vec<(DateTimePart, ScalarEncoder)>,
    origin: DateTime<Utc>,
    precision: Precision,
}

impl DateTimeEncoder {
    /// Validate every sub-encoder and the composite geometry.
    ///
    /// # Errors
    ///
    /// Returns `Error::Configuration` if no part is configured, a part has
    /// invalid geometry, or the composite length is odd.
    pub fn new(config: DateTimeEncoderConfig) -> Result<Self> {
        if config.parts.is_empty() {
            return Err(Error::Configuration(
                "datetime encoder needs at least one sub-encoder".to_string(),
            ));
        }

        let total = config.total_bits();
        if total % 2 != 0 {
            return Err(Error::Configuration(format!(
                "composite datetime length {total} is odd; 2D rendering needs an even bit count"
            )));
        }

        let mut offset = 0;
        let mut parts = Vec::with_capacity(config.parts.len());
        for (part, mut sub) in config.parts {
            sub.offset = offset;
            offset += sub.total_bits;
            parts.push((part, ScalarEncoder::new(sub)?));
        }

        Ok(Self {
            parts,
            origin: config.origin,
            precision: config.precision,
        })
    }

    /// Composite output length.
    #[must_use]
    pub fn total_bits(&self) -> usize {
        self.parts.iter().map(|(_, e)| e.total_bits()).sum()
    }

    /// Offsets and widths of each part, in concatenation order.
    #[must_use]
    pub fn layout(&self) -> Vec<PartLayout> {
        self.parts
            .iter()
            .map(|(part, e)| PartLayout {
                part: *part,
                offset: e.config().offset,
                total_bits: e.total_bits(),
            })
            .collect()
    }

    fn part_value(&self, part: DateTimePart, input: &DateTime<FixedOffset>) -> f64 {
        match part {
            DateTimePart::DateTime => self
                .precision
                .units_between(self.origin, input.with_timezone(&Utc)),
            DateTimePart::DayOfWeek => f64::from(input.weekday().num_days_from_sunday()),
            DateTimePart::Season => f64::from(input.ordinal()),
            DateTimePart::Weekend => {
                if matches!(input.weekday(), Weekday::Sat | Weekday::Sun) {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }

    /// Encode a timestamp.
    ///
    /// # Errors
    ///
    /// Propagates `Error::InputValidation` from a sub-encoder that does not clip.
    pub fn encode(&self, input: &DateTime<FixedOffset>) -> Result<SparseVector> {
        let encoded = self
            .parts
            .iter()
            .map(|(part, encoder)| encoder.encode(self.part_value(*part, input)))
            .collect::<Result<Vec<_>>>()?;
        Ok(SparseVector::concat(&encoded))
    }

    /// Parse and encode a timestamp string, see [`parse_timestamp`].
    ///
    /// # Errors
    ///
    /// Returns `Error::InputValidation` if the string is not a recognised timestamp.
    pub fn encode_str(&self, input: &str) -> Result<SparseVector> {
        self.encode(&parse_timestamp(input)?)
    }
}

/// Parse a timestamp: RFC 3339, or a naive date/time treated as UTC.
///
/// Accepted naive forms: `YYYY-MM-DD`, `YYYY-MM-DD HH:MM:SS`,
/// `YYYY-MM-DDTHH:MM:SS`, `MM/DD/YYYY`, `MM/DD/YYYY HH:MM:SS`.
///
/// # Errors
///
/// Returns `Error::InputValidation` if no form matches.
pub fn parse_timestamp(input: &str) -> Result<DateTime<FixedOffset>> {
    let trimmed = input.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(ts);
    }

    let utc = FixedOffset::east_opt(0).ok_or_else(|| Error::Other("UTC offset".to_string()))?;
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%m/%d/%Y %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(naive.and_utc().with_timezone(&utc));
        }
    }
    for format in ["%Y-%m-%d", "%m/%d/%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return Ok(date.and_time(chrono::NaiveTime::MIN).and_utc().with_timezone(&utc));
        }
    }

    Err(Error::InputValidation(format!(
        "'{input}' is not a recognised timestamp"
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_full_layout_is_ordered_and_even() {
        let encoder = DateTimeEncoder::new(DateTimeEncoderConfig::full(now())).unwrap();
        let layout = encoder.layout();
        let parts: Vec<_> = layout.iter().map(|l| l.part).collect();
        assert_eq!(
            parts,
            vec![
                DateTimePart::DateTime,
                DateTimePart::DayOfWeek,
                DateTimePart::Season,
                DateTimePart::Weekend
            ]
        );
        assert_eq!(layout[1].offset, 1024);
        assert_eq!(layout[3].offset, 1024 + 66 + 12);
        assert_eq!(encoder.total_bits(), 1144);
    }

    #[test]
    fn test_encode_active_bits() {
        let encoder = DateTimeEncoder::new(DateTimeEncoderConfig::full(now())).unwrap();
        let v = encoder.encode_str("2024-06-01 12:00:00").unwrap();
        assert_eq!(v.len(), 1144);
        assert_eq!(v.active_count(), 21 + 21 + 3 + 21);
    }

    #[test]
    fn test_weekend_bit_region() {
        let config = DateTimeEncoderConfig::new(now(), Precision::Days).with_part(
            DateTimePart::Weekend,
            ScalarEncoderConfig::new(1, 2, 0.0, 1.0),
        );
        let encoder = DateTimeEncoder::new(config).unwrap();
        // 2024-06-01 is a Saturday, 2024-06-03 a Monday
        assert_eq!(encoder.encode_str("2024-06-01").unwrap().to_bit_string(), "01");
        assert_eq!(encoder.encode_str("2024-06-03").unwrap().to_bit_string(), "10");
    }

    #[test]
    fn test_odd_composite_rejected() {
        let config = DateTimeEncoderConfig::new(now(), Precision::Days).with_part(
            DateTimePart::Season,
            ScalarEncoderConfig::new(3, 13, 1.0, 367.0).periodic(true),
        );
        assert!(matches!(
            DateTimeEncoder::new(config),
            Err(Error::Configuration(_))
        ));
    }

    #[test]
    fn test_empty_config_rejected() {
        let config = DateTimeEncoderConfig::new(now(), Precision::Days);
        assert!(matches!(
            DateTimeEncoder::new(config),
            Err(Error::Configuration(_))
        ));
    }

    #[test]
    fn test_parse_timestamp_forms() {
        assert!(parse_timestamp("2024-06-01T10:00:00+02:00").is_ok());
        assert!(parse_timestamp("2024-06-01 10:00:00").is_ok());
        assert!(parse_timestamp("06/01/2024").is_ok());
        assert!(matches!(
            parse_timestamp("yesterday"),
            Err(Error::InputValidation(_))
        ));
    }

    #[test]
    fn test_part_width_override() {
        let config = DateTimeEncoderConfig::full(now()).with_part_width(DateTimePart::DateTime, 11);
        let encoder = DateTimeEncoder::new(config).unwrap();
        let v = encoder.encode_str("2023-01-01").unwrap();
        assert_eq!(v.active_count(), 11 + 21 + 3 + 21);
    }
}
