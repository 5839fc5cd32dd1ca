//! Filesystem storage gateway.
//!
//! Layout under the storage root:
//!
//! ```text
//! <root>/<input_dir>/<name>                      downloads
//! <root>/<result_dir>/<name>                     uploaded artifacts
//! <root>/<result_table>/<partition>__<row>.json  result records
//! ```

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use tracing::{debug, warn};

use super::StorageGateway;
use crate::experiment::ExperimentResult;
use crate::{Error, Result};

/// Storage gateway over a local directory tree.
#[derive(Debug, Clone)]
pub struct FsStorageGateway {
    input_dir: PathBuf,
    result_dir: PathBuf,
    table_dir: PathBuf,
}

impl FsStorageGateway {
    /// Create a gateway rooted at `root`.
    ///
    /// Directories are created lazily on first upload.
    #[must_use]
    pub fn new(
        root: impl AsRef<Path>,
        input_dir: impl AsRef<Path>,
        result_dir: impl AsRef<Path>,
        result_table: impl AsRef<Path>,
    ) -> Self {
        let root = root.as_ref();
        Self {
            input_dir: root.join(input_dir),
            result_dir: root.join(result_dir),
            table_dir: root.join(result_table),
        }
    }

    /// Gateway with the default sub-directories (`input`, `results`, `results-table`).
    #[must_use]
    pub fn with_defaults(root: impl AsRef<Path>) -> Self {
        Self::new(root, "input", "results", "results-table")
    }

    /// Directory downloads are read from.
    #[must_use]
    pub fn input_dir(&self) -> &Path {
        &self.input_dir
    }

    /// Directory artifacts are written to.
    #[must_use]
    pub fn result_dir(&self) -> &Path {
        &self.result_dir
    }

    /// Path of the record for a result's keys.
    #[must_use]
    pub fn record_path(&self, partition_key: &str, row_key: &str) -> PathBuf {
        self.table_dir.join(format!("{partition_key}__{row_key}.json"))
    }

    /// Read back a stored result record.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` if no record exists for the keys, or
    /// `Error::Json` if the record cannot be decoded.
    pub async fn read_result(&self, partition_key: &str, row_key: &str) -> Result<ExperimentResult> {
        let path = self.record_path(partition_key, row_key);
        let text = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| map_read_error(e, &path))?;
        Ok(serde_json::from_str(&text)?)
    }

    async fn write_result(&self, result: &ExperimentResult) -> Result<()> {
        tokio::fs::create_dir_all(&self.table_dir).await?;
        let json = serde_json::to_vec_pretty(result)?;
        let path = self.record_path(result.partition_key(), result.row_key());
        tokio::fs::write(&path, json).await?;
        debug!(path = %path.display(), "Stored experiment result");
        Ok(())
    }
}

/// Reject names that would escape their directory.
fn plain_name(name: &str) -> Result<&Path> {
    let path = Path::new(name);
    let mut components = path.components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(path),
        _ => Err(Error::InputValidation(format!(
            "\"{name}\" is not a plain file name"
        ))),
    }
}

fn map_read_error(err: std::io::Error, path: &Path) -> Error {
    if err.kind() == ErrorKind::NotFound {
        Error::NotFound(path.display().to_string())
    } else {
        Error::TransientIo(format!("{}: {err}", path.display()))
    }
}

impl StorageGateway for FsStorageGateway {
    async fn download_input_file(&self, name: &str) -> Result<String> {
        let path = self.input_dir.join(plain_name(name)?);
        tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| map_read_error(e, &path))
    }

    async fn upload_result_file(&self, name: &str, data: Vec<u8>) -> Result<()> {
        let path = self.result_dir.join(plain_name(name)?);
        tokio::fs::create_dir_all(&self.result_dir).await?;
        tokio::fs::write(&path, &data)
            .await
            .map_err(|e| Error::TransientIo(format!("{}: {e}", path.display())))?;
        debug!(path = %path.display(), bytes = data.len(), "Uploaded result file");
        Ok(())
    }

    async fn upload_experiment_result(&self, result: &ExperimentResult) {
        if let Err(e) = self.write_result(result).await {
            warn!(
                partition_key = result.partition_key(),
                row_key = result.row_key(),
                error = %e,
                "Failed to upload experiment result"
            );
        }
    }
}
