//! Batch input files for the DateTime and scalar AQI stages

use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Top-level key of the DateTime batch file.
pub const DATE_TIME_KEY: &str = "DateTimeDataRow";
/// Top-level key of the scalar AQI batch file.
pub const SCALAR_AQI_KEY: &str = "ScalarEncoderDataWithAQI";

/// One DateTime row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DateTimeDataRow {
    /// Active bits of the DateTime part
    #[serde(rename = "W")]
    pub w: usize,
    /// Radius of the DateTime part
    #[serde(rename = "R")]
    pub r: f64,
    /// Timestamp text
    pub input: String,
    /// Expected encoding, compared and logged only
    #[serde(default)]
    pub expected_output: Vec<i32>,
}

/// One scalar AQI row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ScalarAqiRow {
    /// Values to encode, one image each
    pub inputs: Vec<i64>,
    /// Lower bound of the encoder
    pub min_value: f64,
    /// Upper bound of the encoder
    pub max_value: f64,
}

fn parse_keyed<T: DeserializeOwned>(text: &str, key: &str) -> Result<Vec<T>> {
    let mut document: HashMap<String, serde_json::Value> = serde_json::from_str(text)
        .map_err(|e| Error::Schema(format!("batch file is not a JSON object: {e}")))?;
    let rows = document
        .remove(key)
        .ok_or_else(|| Error::Schema(format!("batch file has no \"{key}\" key")))?;
    serde_json::from_value(rows).map_err(|e| Error::Schema(format!("invalid \"{key}\" rows: {e}")))
}

/// Parse a DateTime batch file.
///
/// # Errors
///
/// Returns `Error::Schema` if the text is not an object with a
/// `DateTimeDataRow` array of well-formed rows.
pub fn parse_date_time_rows(text: &str) -> Result<Vec<DateTimeDataRow>> {
    parse_keyed(text, DATE_TIME_KEY)
}

/// Parse a scalar AQI batch file.
///
/// # Errors
///
/// Returns `Error::Schema` if the text is not an object with a
/// `ScalarEncoderDataWithAQI` array of well-formed rows.
pub fn parse_scalar_aqi_rows(text: &str) -> Result<Vec<ScalarAqiRow>> {
    parse_keyed(text, SCALAR_AQI_KEY)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date_time_rows() {
        let text = r#"{"DateTimeDataRow":[
            {"W":21,"R":1.5,"Input":"2024-06-01 10:00:00","ExpectedOutput":[0,1]},
            {"W":11,"R":0,"Input":"2024-06-02"}
        ]}"#;
        let rows = parse_date_time_rows(text).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].w, 21);
        assert_eq!(rows[0].expected_output, vec![0, 1]);
        assert!(rows[1].expected_output.is_empty());
    }

    #[test]
    fn test_parse_scalar_rows() {
        let text = r#"{"ScalarEncoderDataWithAQI":[{"Inputs":[10,55],"MinValue":0,"MaxValue":300}]}"#;
        let rows = parse_scalar_aqi_rows(text).unwrap();
        assert_eq!(rows[0].inputs, vec![10, 55]);
        assert!((rows[0].max_value - 300.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_missing_key_is_schema_error() {
        let err = parse_scalar_aqi_rows(r#"{"Rows":[]}"#).unwrap_err();
        assert!(matches!(err, Error::Schema(ref m) if m.contains("ScalarEncoderDataWithAQI")));
        assert!(matches!(parse_date_time_rows("[]"), Err(Error::Schema(_))));
    }

    #[test]
    fn test_malformed_row_is_schema_error() {
        let text = r#"{"DateTimeDataRow":[{"W":"wide","R":1,"Input":"x"}]}"#;
        assert!(matches!(parse_date_time_rows(text), Err(Error::Schema(_))));
    }
}
