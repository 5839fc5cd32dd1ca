//! Artifact Record - one uploaded image of a stage

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Stage;

/// Artifact Record describes one file a stage uploaded to the result container.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactRecord {
    stage: Stage,
    file_name: String,
    size_bytes: u64,
    created_at: DateTime<Utc>,
}

impl ArtifactRecord {
    /// Create a new artifact record.
    ///
    /// # Arguments
    ///
    /// * `stage` - Stage that produced the artifact
    /// * `file_name` - Name under which the bytes were uploaded
    /// * `size_bytes` - Size of the uploaded buffer
    ///
    /// # Returns
    ///
    /// A new `ArtifactRecord` with the current timestamp.
    #[must_use]
    pub fn new(stage: Stage, file_name: impl Into<String>, size_bytes: u64) -> Self {
        Self {
            stage,
            file_name: file_name.into(),
            size_bytes,
            created_at: Utc::now(),
        }
    }

    /// Get the producing stage.
    #[must_use]
    pub const fn stage(&self) -> Stage {
        self.stage
    }

    /// Get the uploaded file name.
    #[must_use]
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Get the artifact size in bytes.
    #[must_use]
    pub const fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    /// Get the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
