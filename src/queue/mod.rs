//! Message queue consumption
//!
//! [`QueueListener`] polls a [`MessageQueue`] one message at a time, hands
//! each decoded request to the [`ExperimentRunner`](crate::experiment::ExperimentRunner),
//! and deletes the message only after the run completed.
//!
//! Messages that are not deleted reappear once their visibility lease
//! expires. There is no retry limit and no dead-letter queue; the receive
//! count is surfaced on [`QueueMessage::dequeue_count`] and logged.
//!
//! # Example
//!
//! ```rust
//! use sdr_bitmap::queue::{MemoryQueue, MessageQueue};
//! use std::time::Duration;
//!
//! # async fn example() -> sdr_bitmap::Result<()> {
//! let queue = MemoryQueue::new(Duration::from_secs(30));
//! queue.push(r#"{"ExperimentId":"exp-1"}"#);
//!
//! let message = queue.receive().await?.expect("one message");
//! assert_eq!(message.dequeue_count, 1);
//! assert!(queue.receive().await?.is_none()); // leased
//!
//! queue.delete(&message).await?;
//! assert!(queue.is_empty());
//! # Ok(())
//! # }
//! ```

mod dir;
mod listener;
mod memory;

pub use dir::DirQueue;
pub use listener::{ListenerStats, MessageDisposition, PollOutcome, QueueListener, ShutdownSignal};
pub use memory::MemoryQueue;

use crate::Result;
use std::future::Future;

/// A received message together with the receipt needed to delete it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueMessage {
    /// Stable message id
    pub id: String,
    /// Receipt of this delivery; changes on every receive
    pub receipt: String,
    /// UTF-8 message body
    pub body: String,
    /// Number of times the message has been received, this delivery included
    pub dequeue_count: u32,
}

/// Queue with receive/delete and visibility-timeout redelivery.
pub trait MessageQueue: Send + Sync {
    /// Receive at most one visible message and hide it for the visibility timeout.
    ///
    /// Returns `None` when no message is visible.
    fn receive(&self) -> impl Future<Output = Result<Option<QueueMessage>>> + Send;

    /// Delete a received message.
    ///
    /// Fails with `Error::NotFound` if the message is gone or the receipt is
    /// no longer current.
    fn delete(&self, message: &QueueMessage) -> impl Future<Output = Result<()>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_receive_empty() {
        let queue = MemoryQueue::new(Duration::from_secs(1));
        assert!(queue.receive().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_fifo_order() {
        let queue = MemoryQueue::new(Duration::from_secs(30));
        queue.push("a");
        queue.push("b");

        let first = queue.receive().await.unwrap().unwrap();
        let second = queue.receive().await.unwrap().unwrap();

        assert_eq!(first.body, "a");
        assert_eq!(second.body, "b");
        assert_ne!(first.id, second.id);
    }
}
