//! Encoder pipeline tests
//!
//! Covers the four encoder variants through their public constructors and
//! through the `Encoder` tagged union.

use chrono::{TimeZone, Utc};
use sdr_bitmap::encoder::{
    BinaryEncoder, DateTimeEncoder, DateTimeEncoderConfig, DateTimePart, Encoder, EncoderInput,
    GeoSpatialEncoder, Precision, ScalarEncoder, ScalarEncoderConfig,
};
use sdr_bitmap::Error;

// =============================================================================
// BinaryEncoder
// =============================================================================

#[test]
fn test_binary_encodes_primary_value() {
    let encoder = BinaryEncoder::new(156).unwrap();
    let sdr = encoder.encode("40148").unwrap();

    assert_eq!(sdr.len(), 156);
    // 40148 = 0b1001110011010100
    assert!(sdr.to_bit_string().ends_with("1001110011010100"));
    assert_eq!(sdr.active_count(), 8);
}

#[test]
fn test_binary_truncates_fraction() {
    let encoder = BinaryEncoder::new(8).unwrap();
    assert_eq!(encoder.encode("5.9").unwrap().to_bit_string(), "00000101");
    assert_eq!(encoder.encode(" 1e1 ").unwrap().to_bit_string(), "00001010");
}

#[test]
fn test_binary_rejects_non_numeric() {
    let encoder = BinaryEncoder::new(8).unwrap();
    assert!(matches!(encoder.encode("abc"), Err(Error::InputValidation(_))));
    assert!(matches!(encoder.encode(""), Err(Error::InputValidation(_))));
    assert!(matches!(encoder.encode("-3"), Err(Error::InputValidation(_))));
}

#[test]
fn test_binary_overflow_is_configuration_error() {
    let encoder = BinaryEncoder::new(4).unwrap();
    assert!(encoder.encode("15").is_ok());
    assert!(matches!(encoder.encode("16"), Err(Error::Configuration(_))));
    assert!(matches!(BinaryEncoder::new(0), Err(Error::Configuration(_))));
}

// =============================================================================
// ScalarEncoder
// =============================================================================

#[test]
fn test_scalar_rejects_invalid_geometry() {
    for config in [
        ScalarEncoderConfig::new(0, 10, 0.0, 1.0),
        ScalarEncoderConfig::new(11, 10, 0.0, 1.0),
        ScalarEncoderConfig::new(3, 0, 0.0, 1.0),
        ScalarEncoderConfig::new(3, 10, 1.0, 1.0),
        ScalarEncoderConfig::new(3, 10, f64::NEG_INFINITY, 1.0),
    ] {
        assert!(matches!(ScalarEncoder::new(config), Err(Error::Configuration(_))));
    }
}

#[test]
fn test_scalar_aqi_bounds() {
    let encoder = ScalarEncoder::new(ScalarEncoderConfig::new(21, 100, 0.0, 500.0)).unwrap();

    let low = encoder.encode(0.0).unwrap();
    let high = encoder.encode(500.0).unwrap();

    assert_eq!(low.active_indices(), (0..21).collect::<Vec<_>>());
    assert_eq!(high.active_indices(), (79..100).collect::<Vec<_>>());
    assert!(matches!(encoder.encode(501.0), Err(Error::InputValidation(_))));
}

#[test]
fn test_scalar_locality() {
    let encoder = ScalarEncoder::new(ScalarEncoderConfig::new(21, 100, 0.0, 100.0)).unwrap();
    let base = encoder.encode(40.0).unwrap();

    let near = base.overlap(&encoder.encode(41.0).unwrap());
    let far = base.overlap(&encoder.encode(90.0).unwrap());

    assert!(near > far);
    assert_eq!(far, 0);
}

#[test]
fn test_scalar_resolution_and_radius() {
    let encoder = ScalarEncoder::new(ScalarEncoderConfig::new(21, 100, 0.0, 79.0)).unwrap();
    assert!((encoder.resolution() - 1.0).abs() < 1e-12);
    assert!((encoder.radius() - 21.0).abs() < 1e-12);
}

// =============================================================================
// GeoSpatialEncoder
// =============================================================================

#[test]
fn test_geospatial_band_edges() {
    let encoder = GeoSpatialEncoder::latitude_band().unwrap();

    let south = encoder.encode(48.75).unwrap();
    let north = encoder.encode(51.86).unwrap();

    assert_eq!(south.active_indices(), (0..21).collect::<Vec<_>>());
    assert_eq!(north.active_indices(), (19..40).collect::<Vec<_>>());
    // clipped
    assert_eq!(encoder.encode(60.0).unwrap(), north);
}

#[test]
fn test_geospatial_rejects_periodic() {
    let config = ScalarEncoderConfig::new(3, 10, -90.0, 90.0).periodic(true);
    assert!(matches!(GeoSpatialEncoder::new(config), Err(Error::Configuration(_))));
}

// =============================================================================
// DateTimeEncoder
// =============================================================================

#[test]
fn test_datetime_full_layout() {
    let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
    let encoder = DateTimeEncoder::new(DateTimeEncoderConfig::full(now)).unwrap();

    assert_eq!(encoder.total_bits(), 1024 + 66 + 12 + 42);

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
    assert_eq!(layout[0].offset, 0);
    assert_eq!(layout[1].offset, 1024);
    assert_eq!(layout[3].offset, 1024 + 66 + 12);
}

#[test]
fn test_datetime_weekend_part() {
    let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
    let encoder = DateTimeEncoder::new(DateTimeEncoderConfig::full(now)).unwrap();
    let weekend_offset = 1024 + 66 + 12;

    // 2024-06-01 is a Saturday, 2024-06-03 a Monday
    let saturday = encoder.encode_str("2024-06-01").unwrap();
    let monday = encoder.encode_str("2024-06-03 08:30:00").unwrap();

    let tail = |v: &sdr_bitmap::encoder::SparseVector| v.bits()[weekend_offset..].to_vec();
    assert_eq!(tail(&saturday).iter().filter(|&&b| b == 1).count(), 21);
    assert_eq!(&tail(&saturday)[21..], &[1u8; 21]);
    assert_eq!(&tail(&monday)[..21], &[1u8; 21]);
}

#[test]
fn test_datetime_odd_total_fails_before_encoding() {
    let now = Utc::now();
    let config = DateTimeEncoderConfig::new(now, Precision::Days)
        .with_part(DateTimePart::Weekend, ScalarEncoderConfig::new(3, 11, 0.0, 1.0));
    assert!(matches!(DateTimeEncoder::new(config), Err(Error::Configuration(_))));
}

#[test]
fn test_datetime_needs_a_part() {
    let config = DateTimeEncoderConfig::new(Utc::now(), Precision::Hours);
    assert!(matches!(DateTimeEncoder::new(config), Err(Error::Configuration(_))));
}

#[test]
fn test_datetime_width_override_changes_active_bits() {
    let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
    let encoder = DateTimeEncoder::new(
        DateTimeEncoderConfig::full(now).with_part_width(DateTimePart::DateTime, 11),
    )
    .unwrap();

    let sdr = encoder.encode_str("2024-01-15T10:00:00Z").unwrap();

    let datetime_active = sdr.bits()[..1024].iter().filter(|&&b| b == 1).count();
    assert_eq!(datetime_active, 11);
}

#[test]
fn test_datetime_rejects_garbage() {
    let encoder = DateTimeEncoder::new(DateTimeEncoderConfig::full(Utc::now())).unwrap();
    assert!(matches!(encoder.encode_str("yesterday"), Err(Error::InputValidation(_))));
}

// =============================================================================
// Encoder union
// =============================================================================

#[test]
fn test_encoder_union_dispatch() {
    let binary = Encoder::Binary(BinaryEncoder::new(16).unwrap());
    let scalar = Encoder::Scalar(
        ScalarEncoder::new(ScalarEncoderConfig::new(3, 12, 0.0, 9.0)).unwrap(),
    );

    assert_eq!(binary.width(), 16);
    assert_eq!(binary.kind(), "binary");
    assert_eq!(
        binary.encode(&EncoderInput::Text("3")).unwrap().active_indices(),
        vec![14, 15]
    );
    assert_eq!(
        scalar.encode(&EncoderInput::Text("0")).unwrap(),
        scalar.encode(&EncoderInput::Number(0.0)).unwrap()
    );
}

#[test]
fn test_encoder_union_rejects_mismatched_input() {
    let scalar = Encoder::Scalar(
        ScalarEncoder::new(ScalarEncoderConfig::new(3, 12, 0.0, 9.0)).unwrap(),
    );
    let ts = chrono::DateTime::parse_from_rfc3339("2024-06-01T00:00:00Z").unwrap();
    assert!(matches!(
        scalar.encode(&EncoderInput::Timestamp(ts)),
        Err(Error::InputValidation(_))
    ));
}
