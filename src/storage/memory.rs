//! In-memory storage gateway using `DashMap`.
//!
//! Everything is lost on process restart.

use std::sync::atomic::{AtomicBool, Ordering};

use dashmap::DashMap;
use tracing::{debug, warn};

use super::StorageGateway;
use crate::experiment::ExperimentResult;
use crate::{Error, Result};

/// In-memory storage gateway.
///
/// Inputs are seeded with [`put_input`](Self::put_input); uploads and result
/// rows can be inspected after a run.
pub struct MemoryStorageGateway {
    inputs: DashMap<String, String>,
    artifacts: DashMap<String, Vec<u8>>,
    results: DashMap<(String, String), ExperimentResult>,
    fail_uploads: AtomicBool,
}

impl MemoryStorageGateway {
    /// Create an empty gateway.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inputs: DashMap::new(),
            artifacts: DashMap::new(),
            results: DashMap::new(),
            fail_uploads: AtomicBool::new(false),
        }
    }

    /// Seed an input file.
    pub fn put_input(&self, name: impl Into<String>, text: impl Into<String>) {
        self.inputs.insert(name.into(), text.into());
    }

    /// Make every following upload fail with `Error::TransientIo`.
    pub fn fail_uploads(&self, fail: bool) {
        self.fail_uploads.store(fail, Ordering::SeqCst);
    }

    /// Get an uploaded artifact.
    #[must_use]
    pub fn artifact(&self, name: &str) -> Option<Vec<u8>> {
        self.artifacts.get(name).map(|v| v.value().clone())
    }

    /// Names of all uploaded artifacts, sorted.
    #[must_use]
    pub fn artifact_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.artifacts.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    /// Number of uploaded artifacts.
    #[must_use]
    pub fn artifact_count(&self) -> usize {
        self.artifacts.len()
    }

    /// Get a stored result row.
    #[must_use]
    pub fn result(&self, partition_key: &str, row_key: &str) -> Option<ExperimentResult> {
        self.results
            .get(&(partition_key.to_string(), row_key.to_string()))
            .map(|v| v.value().clone())
    }

    /// Number of stored result rows.
    #[must_use]
    pub fn result_count(&self) -> usize {
        self.results.len()
    }

    fn check_uploads(&self, what: &str) -> Result<()> {
        if self.fail_uploads.load(Ordering::SeqCst) {
            return Err(Error::TransientIo(format!("simulated upload failure for {what}")));
        }
        Ok(())
    }
}

impl Default for MemoryStorageGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl StorageGateway for MemoryStorageGateway {
    async fn download_input_file(&self, name: &str) -> Result<String> {
        self.inputs
            .get(name)
            .map(|v| v.value().clone())
            .ok_or_else(|| Error::NotFound(format!("input file \"{name}\"")))
    }

    async fn upload_result_file(&self, name: &str, data: Vec<u8>) -> Result<()> {
        self.check_uploads(name)?;
        debug!(file = name, bytes = data.len(), "Uploaded result file");
        self.artifacts.insert(name.to_string(), data);
        Ok(())
    }

    async fn upload_experiment_result(&self, result: &ExperimentResult) {
        if let Err(e) = self.check_uploads(result.row_key()) {
            warn!(error = %e, "Failed to upload experiment result");
            return;
        }
        self.results.insert(
            (result.partition_key().to_string(), result.row_key().to_string()),
            result.clone(),
        );
    }
}
