//! Storage gateway - input downloads, artifact uploads, result records
//!
//! The runner talks to storage only through [`StorageGateway`]. Two
//! backends ship with the crate:
//! - [`MemoryStorageGateway`]: `DashMap`-backed, for tests and dry runs
//! - [`FsStorageGateway`]: directory tree under a storage root
//!
//! # Example
//!
//! ```rust
//! use sdr_bitmap::storage::{MemoryStorageGateway, StorageGateway};
//!
//! # async fn example() -> sdr_bitmap::Result<()> {
//! let storage = MemoryStorageGateway::new();
//! storage.put_input("rows.json", r#"{"DateTimeDataRow": []}"#);
//!
//! let text = storage.download_input_file("rows.json").await?;
//! assert!(text.contains("DateTimeDataRow"));
//!
//! storage.upload_result_files("Batch", vec![vec![1], vec![2]]).await?;
//! assert!(storage.artifact("Batch_2.png").is_some());
//! # Ok(())
//! # }
//! ```

mod fs;
mod memory;

pub use fs::FsStorageGateway;
pub use memory::MemoryStorageGateway;

use crate::experiment::ExperimentResult;
use crate::Result;
use std::future::Future;

/// File name of item `index` (0-based) of a multi-file upload.
#[must_use]
pub fn indexed_file_name(base_name: &str, index: usize) -> String {
    format!("{base_name}_{}.png", index + 1)
}

/// Blob and table access used by the experiment runner.
pub trait StorageGateway: Send + Sync {
    /// Download a named input file as text.
    ///
    /// Fails with `Error::NotFound` if the file does not exist.
    fn download_input_file(&self, name: &str) -> impl Future<Output = Result<String>> + Send;

    /// Upload one artifact, overwriting any file of the same name.
    fn upload_result_file(&self, name: &str, data: Vec<u8>)
        -> impl Future<Output = Result<()>> + Send;

    /// Upload several artifacts as `{base_name}_{index + 1}.png`.
    ///
    /// Stops at the first failing upload.
    fn upload_result_files(
        &self,
        base_name: &str,
        items: Vec<Vec<u8>>,
    ) -> impl Future<Output = Result<()>> + Send {
        async move {
            for (index, data) in items.into_iter().enumerate() {
                self.upload_result_file(&indexed_file_name(base_name, index), data)
                    .await?;
            }
            Ok(())
        }
    }

    /// Upsert the result record.
    ///
    /// Failures are logged by the gateway and never reach the caller.
    fn upload_experiment_result(&self, result: &ExperimentResult)
        -> impl Future<Output = ()> + Send;
}
