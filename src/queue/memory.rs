//! In-memory FIFO queue with visibility leases.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use uuid::Uuid;

use super::{MessageQueue, QueueMessage};
use crate::{Error, Result};

struct Entry {
    id: String,
    body: String,
    receipt: Option<String>,
    visible_at: Instant,
    dequeue_count: u32,
}

/// In-memory queue.
///
/// A received message stays in the queue but is invisible until its lease
/// expires; deleting it needs the receipt of the current delivery.
pub struct MemoryQueue {
    entries: Mutex<VecDeque<Entry>>,
    visibility_timeout: Duration,
    next_id: AtomicU64,
}

impl MemoryQueue {
    /// Create an empty queue.
    #[must_use]
    pub fn new(visibility_timeout: Duration) -> Self {
        Self {
            entries: Mutex::new(VecDeque::new()),
            visibility_timeout,
            next_id: AtomicU64::new(1),
        }
    }

    fn entries(&self) -> MutexGuard<'_, VecDeque<Entry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append a message; returns its id.
    pub fn push(&self, body: impl Into<String>) -> String {
        let id = format!("msg-{}", self.next_id.fetch_add(1, Ordering::Relaxed));
        self.entries().push_back(Entry {
            id: id.clone(),
            body: body.into(),
            receipt: None,
            visible_at: Instant::now(),
            dequeue_count: 0,
        });
        id
    }

    /// Number of undeleted messages, leased ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries().len()
    }

    /// True when every message was deleted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    /// Number of messages currently hidden by a lease.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        let now = Instant::now();
        self.entries()
            .iter()
            .filter(|e| e.receipt.is_some() && e.visible_at > now)
            .count()
    }

    /// Visibility timeout applied on receive.
    #[must_use]
    pub const fn visibility_timeout(&self) -> Duration {
        self.visibility_timeout
    }
}

impl Default for MemoryQueue {
    fn default() -> Self {
        Self::new(Duration::from_secs(30))
    }
}

impl MessageQueue for MemoryQueue {
    async fn receive(&self) -> Result<Option<QueueMessage>> {
        let now = Instant::now();
        let mut entries = self.entries();
        let Some(entry) = entries.iter_mut().find(|e| e.visible_at <= now) else {
            return Ok(None);
        };

        let receipt = Uuid::new_v4().to_string();
        entry.receipt = Some(receipt.clone());
        entry.visible_at = now + self.visibility_timeout;
        entry.dequeue_count += 1;

        Ok(Some(QueueMessage {
            id: entry.id.clone(),
            receipt,
            body: entry.body.clone(),
            dequeue_count: entry.dequeue_count,
        }))
    }

    async fn delete(&self, message: &QueueMessage) -> Result<()> {
        let mut entries = self.entries();
        let position = entries
            .iter()
            .position(|e| e.id == message.id && e.receipt.as_deref() == Some(message.receipt.as_str()))
            .ok_or_else(|| {
                Error::NotFound(format!(
                    "message {} with receipt {}",
                    message.id, message.receipt
                ))
            })?;
        entries.remove(position);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_lease_hides_message() {
        let queue = MemoryQueue::new(Duration::from_secs(30));
        queue.push("a");

        let message = queue.receive().await.unwrap().unwrap();

        assert!(queue.receive().await.unwrap().is_none());
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.in_flight(), 1);
        queue.delete(&message).await.unwrap();
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn test_redelivery_after_timeout() {
        let queue = MemoryQueue::new(Duration::from_millis(20));
        queue.push("a");

        let first = queue.receive().await.unwrap().unwrap();
        tokio::time::sleep(Duration::from_millis(40)).await;
        let second = queue.receive().await.unwrap().unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.dequeue_count, 2);
        assert_ne!(first.receipt, second.receipt);
    }

    #[tokio::test]
    async fn test_stale_receipt_is_rejected() {
        let queue = MemoryQueue::new(Duration::from_millis(10));
        queue.push("a");

        let stale = queue.receive().await.unwrap().unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;
        let current = queue.receive().await.unwrap().unwrap();

        assert!(matches!(queue.delete(&stale).await, Err(Error::NotFound(_))));
        queue.delete(&current).await.unwrap();
        assert!(queue.is_empty());
    }
}
