//! Stage reports - explicit per-stage success/failure values

use std::fmt;

use serde::{Deserialize, Serialize};

use super::ArtifactRecord;
use crate::Error;

/// One unit of the experiment pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Binary encode of the primary value, grid + strip render
    Primary,
    /// One DateTime encode per row of the DateTime data file
    #[serde(rename = "datetime")]
    DateTime,
    /// One scalar encode per input of the AQI data file
    ScalarAqi,
    /// Latitude encode
    #[serde(rename = "geospatial")]
    GeoSpatial,
}

impl Stage {
    /// Stable stage name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::DateTime => "datetime",
            Self::ScalarAqi => "scalar_aqi",
            Self::GeoSpatial => "geospatial",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a stage ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StageOutcome {
    /// Every artifact was produced and uploaded
    Succeeded,
    /// The stage had no input to work on
    Skipped {
        /// Why nothing ran
        reason: String,
    },
    /// The stage failed; files it uploaded before failing are listed in the detail
    Failed {
        /// Error taxonomy bucket, see [`Error::kind`]
        kind: String,
        /// Error message
        reason: String,
    },
}

/// Result payload of a successful stage.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StageOutput {
    /// Uploaded files
    pub artifacts: Vec<ArtifactRecord>,
    /// Stage-specific details (row summaries, match flags)
    pub detail: Option<serde_json::Value>,
}

/// Report of one stage, collected into the experiment result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageReport {
    stage: Stage,
    #[serde(flatten)]
    outcome: StageOutcome,
    artifacts: Vec<ArtifactRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    detail: Option<serde_json::Value>,
}

impl StageReport {
    /// Report for a stage that did not run.
    #[must_use]
    pub fn skipped(stage: Stage, reason: impl Into<String>) -> Self {
        Self {
            stage,
            outcome: StageOutcome::Skipped {
                reason: reason.into(),
            },
            artifacts: Vec::new(),
            detail: None,
        }
    }

    /// Report built from a stage's result. Failures drop the output.
    #[must_use]
    pub fn from_result(stage: Stage, result: crate::Result<StageOutput>) -> Self {
        match result {
            Ok(output) => Self {
                stage,
                outcome: StageOutcome::Succeeded,
                artifacts: output.artifacts,
                detail: output.detail,
            },
            Err(err) => Self::failed(stage, &err),
        }
    }

    /// Report for a failed stage.
    #[must_use]
    pub fn failed(stage: Stage, err: &Error) -> Self {
        Self {
            stage,
            outcome: StageOutcome::Failed {
                kind: err.kind().to_string(),
                reason: err.to_string(),
            },
            artifacts: Vec::new(),
            detail: None,
        }
    }

    /// Attach stage details.
    #[must_use]
    pub fn with_detail(mut self, detail: serde_json::Value) -> Self {
        self.detail = Some(detail);
        self
    }

    /// Get the stage.
    #[must_use]
    pub const fn stage(&self) -> Stage {
        self.stage
    }

    /// Get the outcome.
    #[must_use]
    pub const fn outcome(&self) -> &StageOutcome {
        &self.outcome
    }

    /// True if the stage succeeded.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self.outcome, StageOutcome::Succeeded)
    }

    /// True if the stage failed.
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        matches!(self.outcome, StageOutcome::Failed { .. })
    }

    /// Get the uploaded artifacts.
    #[must_use]
    pub fn artifacts(&self) -> &[ArtifactRecord] {
        &self.artifacts
    }

    /// Get the stage details, if any.
    #[must_use]
    pub const fn detail(&self) -> Option<&serde_json::Value> {
        self.detail.as_ref()
    }
}
