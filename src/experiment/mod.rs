//! Experiment orchestration - request in, result record out
//!
//! ## Model
//!
//! ```text
//! ExperimentRequest ──> ExperimentRunner ──> ExperimentResult
//!                            │                    │
//!                            │                    └──< StageReport (4)
//!                            │                             └──< ArtifactRecord (N)
//!                            └── StorageGateway (download inputs, upload PNGs + record)
//! ```
//!
//! Stages run in order: `primary`, `datetime`, `scalar_aqi`, `geospatial`.
//! The two batch stages are skipped when the request names no input file.
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use sdr_bitmap::experiment::{ExperimentRequest, ExperimentRunner, Stage};
//! use sdr_bitmap::storage::MemoryStorageGateway;
//!
//! # async fn example() -> sdr_bitmap::Result<()> {
//! let request = ExperimentRequest::from_json(r#"{"ExperimentId":"exp-1","InputFile":"runccproject"}"#)?;
//!
//! let runner = ExperimentRunner::new(Arc::new(MemoryStorageGateway::new()));
//! let result = runner.run(&request).await?;
//!
//! assert!(result.stages().iter().any(|s| s.stage() == Stage::GeoSpatial && s.is_success()));
//! assert!(result.end_time_utc() >= result.start_time_utc());
//! # Ok(())
//! # }
//! ```

mod artifact_record;
mod batch;
mod request;
mod result;
mod runner;
mod stage;

pub use artifact_record::ArtifactRecord;
pub use batch::{
    parse_date_time_rows, parse_scalar_aqi_rows, DateTimeDataRow, ScalarAqiRow, DATE_TIME_KEY,
    SCALAR_AQI_KEY,
};
pub use request::ExperimentRequest;
pub use result::{ExperimentResult, ExperimentResultBuilder, PLACEHOLDER_ACCURACY, TEST_NAME};
pub use runner::{ExperimentRunner, RunnerSettings, AQI_TOTAL_BITS, AQI_WIDTH};
pub use stage::{Stage, StageOutcome, StageOutput, StageReport};
