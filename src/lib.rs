//! # sdr-bitmap: Queue-Driven SDR Encoding and Bitmap Rendering
//!
//! **Version**: 0.1.0
//!
//! sdr-bitmap consumes experiment requests from a message queue, encodes
//! scalar, temporal, and geospatial inputs into sparse distributed
//! representations (SDRs), renders them as PNG diagnostic images, and
//! persists the images plus a result record through a storage gateway.
//!
//! ## Pipeline
//!
//! ```text
//! MessageQueue ──> QueueListener ──> ExperimentRunner ──> encoder ──> render
//!      ^                                    │                           │
//!      └──────── delete on completion ──────┤                           v
//!                                           └────── StorageGateway <── PNG bytes
//! ```
//!
//! - [`encoder`]: binary, scalar, geospatial, and composite DateTime encoders
//! - [`render`]: grid, strip, batch, and heatmap renderers
//! - [`experiment`]: request/result model and the stage runner
//! - [`storage`]: storage gateway trait with memory and filesystem backends
//! - [`queue`]: queue trait, memory and spool-directory queues, the listener
//! - [`config`]: worker configuration
//!
//! ## Example Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use sdr_bitmap::experiment::{ExperimentRequest, ExperimentRunner};
//! use sdr_bitmap::queue::{MemoryQueue, PollOutcome, MessageDisposition, QueueListener};
//! use sdr_bitmap::storage::MemoryStorageGateway;
//!
//! # async fn example() -> sdr_bitmap::Result<()> {
//! let storage = Arc::new(MemoryStorageGateway::new());
//! let queue = MemoryQueue::new(Duration::from_secs(30));
//! queue.push(ExperimentRequest::new("exp-1").input_file("runccproject").to_json()?);
//!
//! let listener = QueueListener::new(queue, ExperimentRunner::new(Arc::clone(&storage)), Duration::from_millis(500));
//! let outcome = listener.poll_once().await;
//!
//! assert_eq!(outcome, PollOutcome::Handled(MessageDisposition::Acknowledged));
//! assert_eq!(storage.result_count(), 1);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod config;
pub mod encoder;
pub mod error;
pub mod experiment;
pub mod queue;
pub mod render;
pub mod storage;

pub use config::WorkerConfig;
pub use error::{Error, Result};
