//! Experiment Request - the queue message body

use serde::{Deserialize, Deserializer, Serialize};

use crate::{Error, Result};

/// Accept `"40148"`, `40148`, or `null` for a string field.
fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Loose {
        Text(String),
        Number(serde_json::Number),
        Null,
    }
    Ok(match Option::<Loose>::deserialize(deserializer)? {
        Some(Loose::Text(text)) => text,
        Some(Loose::Number(number)) => number.to_string(),
        Some(Loose::Null) | None => String::new(),
    })
}

/// Experiment request decoded from a queue message.
///
/// Field names follow the PascalCase wire format. Only `ExperimentId` is
/// required on the wire; everything else defaults to empty or absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct ExperimentRequest {
    /// Caller-assigned experiment id
    pub experiment_id: String,
    /// Name of the primary input file
    #[serde(default)]
    pub input_file: String,
    /// Display name
    #[serde(default)]
    pub name: String,
    /// Free-text description
    #[serde(default)]
    pub description: String,
    /// Name of the DateTime batch file
    #[serde(default)]
    pub date_time_data_row: String,
    /// Name of the scalar AQI batch file
    #[serde(default, rename = "ScalarEncoderAQI")]
    pub scalar_encoder_aqi: String,
    /// Primary value, a numeric string
    #[serde(default, deserialize_with = "string_or_number")]
    pub value1: String,
    /// Secondary value, carried into the test data only
    #[serde(default, deserialize_with = "string_or_number")]
    pub value2: String,
    /// Latitude for the geospatial stage
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value3: Option<f64>,
}

impl ExperimentRequest {
    /// Create a request with only the experiment id set.
    #[must_use]
    pub fn new(experiment_id: impl Into<String>) -> Self {
        Self {
            experiment_id: experiment_id.into(),
            ..Self::default()
        }
    }

    /// Decode a queue message body.
    ///
    /// # Errors
    ///
    /// Returns `Error::Schema` if the body is not a JSON object matching the
    /// request layout.
    pub fn from_json(body: &str) -> Result<Self> {
        serde_json::from_str(body)
            .map_err(|e| Error::Schema(format!("invalid experiment request: {e}")))
    }

    /// Encode as a queue message body.
    ///
    /// # Errors
    ///
    /// Returns `Error::Json` if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Set the primary input file name.
    #[must_use]
    pub fn input_file(mut self, name: impl Into<String>) -> Self {
        self.input_file = name.into();
        self
    }

    /// Set name and description.
    #[must_use]
    pub fn named(mut self, name: impl Into<String>, description: impl Into<String>) -> Self {
        self.name = name.into();
        self.description = description.into();
        self
    }

    /// Set the DateTime batch file name.
    #[must_use]
    pub fn date_time_file(mut self, name: impl Into<String>) -> Self {
        self.date_time_data_row = name.into();
        self
    }

    /// Set the scalar AQI batch file name.
    #[must_use]
    pub fn aqi_file(mut self, name: impl Into<String>) -> Self {
        self.scalar_encoder_aqi = name.into();
        self
    }

    /// Set the primary value.
    #[must_use]
    pub fn value(mut self, value: impl Into<String>) -> Self {
        self.value1 = value.into();
        self
    }

    /// Set the latitude for the geospatial stage.
    #[must_use]
    pub const fn latitude(mut self, value: f64) -> Self {
        self.value3 = Some(value);
        self
    }
}
