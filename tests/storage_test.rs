//! Storage gateway tests
//!
//! Filesystem gateway behaviour on a temporary directory tree, plus the
//! shared multi-file upload naming.

use sdr_bitmap::experiment::{ExperimentResult, ExperimentResultBuilder};
use sdr_bitmap::storage::{indexed_file_name, FsStorageGateway, MemoryStorageGateway, StorageGateway};
use sdr_bitmap::Error;
use tempfile::TempDir;

fn gateway() -> (TempDir, FsStorageGateway) {
    let root = TempDir::new().unwrap();
    let gateway = FsStorageGateway::with_defaults(root.path());
    (root, gateway)
}

// =============================================================================
// Downloads
// =============================================================================

#[tokio::test]
async fn test_download_reads_input_dir() {
    let (_root, storage) = gateway();
    std::fs::create_dir_all(storage.input_dir()).unwrap();
    std::fs::write(storage.input_dir().join("rows.json"), r#"{"DateTimeDataRow":[]}"#).unwrap();

    let text = storage.download_input_file("rows.json").await.unwrap();

    assert!(text.contains("DateTimeDataRow"));
}

#[tokio::test]
async fn test_download_missing_is_not_found() {
    let (_root, storage) = gateway();
    let err = storage.download_input_file("absent.json").await.unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

#[tokio::test]
async fn test_names_cannot_escape_their_directory() {
    let (_root, storage) = gateway();

    for name in ["../secret", "/etc/passwd", "a/b.png", ""] {
        assert!(matches!(
            storage.download_input_file(name).await,
            Err(Error::InputValidation(_))
        ));
        assert!(matches!(
            storage.upload_result_file(name, vec![1]).await,
            Err(Error::InputValidation(_))
        ));
    }
}

// =============================================================================
// Uploads
// =============================================================================

#[tokio::test]
async fn test_upload_creates_directory_and_overwrites() {
    let (_root, storage) = gateway();

    storage.upload_result_file("a.png", vec![1, 2, 3]).await.unwrap();
    storage.upload_result_file("a.png", vec![9]).await.unwrap();

    assert_eq!(std::fs::read(storage.result_dir().join("a.png")).unwrap(), vec![9]);
}

#[tokio::test]
async fn test_upload_result_files_numbers_from_one() {
    let (_root, storage) = gateway();

    storage
        .upload_result_files("ScalarAQIBitmap_x_1", vec![vec![1], vec![2], vec![3]])
        .await
        .unwrap();

    for (index, expected) in [1u8, 2, 3].into_iter().enumerate() {
        let path = storage
            .result_dir()
            .join(indexed_file_name("ScalarAQIBitmap_x_1", index));
        assert_eq!(std::fs::read(path).unwrap(), vec![expected]);
    }
    assert!(storage.result_dir().join("ScalarAQIBitmap_x_1_3.png").exists());
}

#[tokio::test]
async fn test_upload_result_files_stops_at_first_failure() {
    let storage = MemoryStorageGateway::new();
    storage.fail_uploads(true);

    let err = storage
        .upload_result_files("Batch", vec![vec![1], vec![2]])
        .await
        .unwrap_err();

    assert!(err.is_transient());
    assert_eq!(storage.artifact_count(), 0);
}

// =============================================================================
// Result records
// =============================================================================

#[tokio::test]
async fn test_result_record_round_trips_through_table_dir() {
    let (_root, storage) = gateway();
    let result = ExperimentResultBuilder::new("exp-fs")
        .named("fs", "filesystem gateway")
        .build();

    storage.upload_experiment_result(&result).await;

    let path = storage.record_path(result.partition_key(), result.row_key());
    assert!(path.exists());
    let stored = storage
        .read_result(result.partition_key(), result.row_key())
        .await
        .unwrap();
    assert_eq!(stored, result);
}

#[tokio::test]
async fn test_result_upsert_keeps_one_record_per_key() {
    let (root, storage) = gateway();
    let result = ExperimentResult::new("exp-upsert");

    storage.upload_experiment_result(&result).await;
    storage.upload_experiment_result(&result).await;

    let count = std::fs::read_dir(root.path().join("results-table")).unwrap().count();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn test_read_missing_result_is_not_found() {
    let (_root, storage) = gateway();
    let err = storage.read_result("pk", "rk").await.unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

#[tokio::test]
async fn test_result_upload_failure_is_swallowed() {
    let root = TempDir::new().unwrap();
    // a file where the table directory should be
    std::fs::write(root.path().join("results-table"), b"blocker").unwrap();
    let storage = FsStorageGateway::with_defaults(root.path());

    storage
        .upload_experiment_result(&ExperimentResult::new("exp-blocked"))
        .await;

    assert!(root.path().join("results-table").is_file());
}
