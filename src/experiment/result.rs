//! Experiment Result - the record persisted to the results table

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::StageReport;

/// Name recorded for every run of this worker.
pub const TEST_NAME: &str = "SDR to Bitmap";

/// Accuracy reported once the stage loop completes. No real metric exists yet.
pub const PLACEHOLDER_ACCURACY: f64 = 100.0;

/// Experiment Result is the row written to the results table.
///
/// The persisted columns are the PascalCase fields. Stage reports travel
/// with the value in memory and are embedded in `TestData` as JSON.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct ExperimentResult {
    partition_key: String,
    row_key: String,
    experiment_id: String,
    name: String,
    description: String,
    start_time_utc: DateTime<Utc>,
    end_time_utc: DateTime<Utc>,
    test_name: String,
    test_data: String,
    accuracy: f64,
    #[serde(skip)]
    stages: Vec<StageReport>,
}

impl ExperimentResult {
    /// Start a new result with fresh table keys.
    ///
    /// # Returns
    ///
    /// A new `ExperimentResult` whose start and end times are both now.
    #[must_use]
    pub fn new(experiment_id: impl Into<String>) -> Self {
        Self::builder(experiment_id).build()
    }

    /// Create a builder for constructing a result with optional fields.
    #[must_use]
    pub fn builder(experiment_id: impl Into<String>) -> ExperimentResultBuilder {
        ExperimentResultBuilder::new(experiment_id)
    }

    /// Get the partition key.
    #[must_use]
    pub fn partition_key(&self) -> &str {
        &self.partition_key
    }

    /// Get the row key.
    #[must_use]
    pub fn row_key(&self) -> &str {
        &self.row_key
    }

    /// Get the experiment ID.
    #[must_use]
    pub fn experiment_id(&self) -> &str {
        &self.experiment_id
    }

    /// Get the experiment name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Get the start timestamp.
    #[must_use]
    pub const fn start_time_utc(&self) -> DateTime<Utc> {
        self.start_time_utc
    }

    /// Get the end timestamp.
    #[must_use]
    pub const fn end_time_utc(&self) -> DateTime<Utc> {
        self.end_time_utc
    }

    /// Get the test name.
    #[must_use]
    pub fn test_name(&self) -> &str {
        &self.test_name
    }

    /// Get the serialized test data.
    #[must_use]
    pub fn test_data(&self) -> &str {
        &self.test_data
    }

    /// Get the accuracy.
    #[must_use]
    pub const fn accuracy(&self) -> f64 {
        self.accuracy
    }

    /// Get the stage reports. Empty after deserialization.
    #[must_use]
    pub fn stages(&self) -> &[StageReport] {
        &self.stages
    }

    /// Close the result: store stage reports and test data, stamp the end time.
    pub(crate) fn finish(&mut self, stages: Vec<StageReport>, test_data: String, accuracy: f64) {
        self.stages = stages;
        self.test_data = test_data;
        self.accuracy = accuracy;
        self.end_time_utc = Utc::now().max(self.start_time_utc);
    }
}

/// Builder for `ExperimentResult`.
#[derive(Debug)]
pub struct ExperimentResultBuilder {
    partition_key: String,
    row_key: String,
    experiment_id: String,
    name: String,
    description: String,
    start_time_utc: DateTime<Utc>,
}

impl ExperimentResultBuilder {
    /// Create a new builder; keys are generated here.
    #[must_use]
    pub fn new(experiment_id: impl Into<String>) -> Self {
        Self {
            partition_key: format!("sdr-bitmap-{}", Uuid::new_v4()),
            row_key: Uuid::new_v4().to_string(),
            experiment_id: experiment_id.into(),
            name: String::new(),
            description: String::new(),
            start_time_utc: Utc::now(),
        }
    }

    /// Set name and description.
    #[must_use]
    pub fn named(mut self, name: impl Into<String>, description: impl Into<String>) -> Self {
        self.name = name.into();
        self.description = description.into();
        self
    }

    /// Set a custom start timestamp (useful for testing).
    #[must_use]
    pub const fn start_time_utc(mut self, start: DateTime<Utc>) -> Self {
        self.start_time_utc = start;
        self
    }

    /// Build the `ExperimentResult`.
    #[must_use]
    pub fn build(self) -> ExperimentResult {
        ExperimentResult {
            partition_key: self.partition_key,
            row_key: self.row_key,
            experiment_id: self.experiment_id,
            name: self.name,
            description: self.description,
            start_time_utc: self.start_time_utc,
            end_time_utc: self.start_time_utc,
            test_name: TEST_NAME.to_string(),
            test_data: String::new(),
            accuracy: 0.0,
            stages: Vec::new(),
        }
    }
}
