//! Spool-directory queue: every `*.json` file is one message.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use chrono::Utc;
use tracing::debug;
use uuid::Uuid;

use super::{MessageQueue, QueueMessage};
use crate::{Error, Result};

#[derive(Debug, Default)]
struct Lease {
    receipt: Option<String>,
    visible_at: Option<Instant>,
    dequeue_count: u32,
}

/// Queue backed by a directory of JSON files.
///
/// The message id is the file stem; files are received in name order.
/// Leases live in memory, so a restarted worker sees every file again.
pub struct DirQueue {
    dir: PathBuf,
    visibility_timeout: Duration,
    leases: Mutex<HashMap<String, Lease>>,
}

impl DirQueue {
    /// Queue over `dir`. The directory may not exist yet.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>, visibility_timeout: Duration) -> Self {
        Self {
            dir: dir.into(),
            visibility_timeout,
            leases: Mutex::new(HashMap::new()),
        }
    }

    /// Spool directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn leases(&self) -> MutexGuard<'_, HashMap<String, Lease>> {
        self.leases.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn path_of(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{id}.json"))
    }

    /// Write a message file; returns its id.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if the directory or file cannot be written.
    pub async fn enqueue(&self, body: &str) -> Result<String> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let id = format!("{}-{}", Utc::now().format("%Y%m%d%H%M%S%3f"), Uuid::new_v4());
        tokio::fs::write(self.path_of(&id), body).await?;
        Ok(id)
    }

    /// Ids of all message files, sorted.
    ///
    /// # Errors
    ///
    /// Returns `Error::TransientIo` if the directory cannot be listed.
    pub async fn pending(&self) -> Result<Vec<String>> {
        let mut reader = match tokio::fs::read_dir(&self.dir).await {
            Ok(reader) => reader,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(Error::TransientIo(format!("{}: {e}", self.dir.display()))),
        };

        let mut ids = Vec::new();
        while let Some(entry) = reader
            .next_entry()
            .await
            .map_err(|e| Error::TransientIo(format!("{}: {e}", self.dir.display())))?
        {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    ids.push(stem.to_string());
                }
            }
        }
        ids.sort();
        Ok(ids)
    }

    /// Take a lease on `id` if it is visible; returns receipt and dequeue count.
    fn lease(&self, id: &str, now: Instant) -> Option<(String, u32)> {
        let mut leases = self.leases();
        let lease = leases.entry(id.to_string()).or_default();
        if lease.visible_at.is_some_and(|at| at > now) {
            return None;
        }
        let receipt = Uuid::new_v4().to_string();
        lease.receipt = Some(receipt.clone());
        lease.visible_at = Some(now + self.visibility_timeout);
        lease.dequeue_count += 1;
        Some((receipt, lease.dequeue_count))
    }
}

impl MessageQueue for DirQueue {
    async fn receive(&self) -> Result<Option<QueueMessage>> {
        let now = Instant::now();
        for id in self.pending().await? {
            let Some((receipt, dequeue_count)) = self.lease(&id, now) else {
                continue;
            };
            match tokio::fs::read_to_string(self.path_of(&id)).await {
                Ok(body) => {
                    return Ok(Some(QueueMessage {
                        id,
                        receipt,
                        body,
                        dequeue_count,
                    }))
                }
                // deleted by another consumer since listing
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    self.leases().remove(&id);
                }
                Err(e) => return Err(Error::TransientIo(format!("message {id}: {e}"))),
            }
        }
        Ok(None)
    }

    async fn delete(&self, message: &QueueMessage) -> Result<()> {
        {
            let leases = self.leases();
            let current = leases
                .get(&message.id)
                .and_then(|l| l.receipt.as_deref())
                .is_some_and(|r| r == message.receipt);
            if !current {
                return Err(Error::NotFound(format!(
                    "message {} with receipt {}",
                    message.id, message.receipt
                )));
            }
        }

        match tokio::fs::remove_file(self.path_of(&message.id)).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(Error::NotFound(format!("message {}", message.id)));
            }
            Err(e) => return Err(Error::TransientIo(format!("message {}: {e}", message.id))),
        }
        self.leases().remove(&message.id);
        debug!(message_id = %message.id, "Deleted message file");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_dir_is_empty() {
        let queue = DirQueue::new("/nonexistent/sdr-bitmap-queue", Duration::from_secs(1));
        assert!(queue.receive().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_receive_and_delete() {
        let dir = tempfile::tempdir().unwrap();
        let queue = DirQueue::new(dir.path(), Duration::from_secs(30));
        let id = queue.enqueue(r#"{"ExperimentId":"a"}"#).await.unwrap();

        let message = queue.receive().await.unwrap().unwrap();
        assert_eq!(message.id, id);
        assert!(queue.receive().await.unwrap().is_none());

        queue.delete(&message).await.unwrap();
        assert!(queue.pending().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_ignores_non_json_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("notes.txt"), "x").unwrap();
        let queue = DirQueue::new(dir.path(), Duration::from_secs(30));
        assert!(queue.receive().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_stale_receipt_keeps_file() {
        let dir = tempfile::tempdir().unwrap();
        let queue = DirQueue::new(dir.path(), Duration::from_millis(10));
        queue.enqueue("{}").await.unwrap();

        let stale = queue.receive().await.unwrap().unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;
        let current = queue.receive().await.unwrap().unwrap();

        assert_eq!(current.dequeue_count, 2);
        assert!(matches!(queue.delete(&stale).await, Err(Error::NotFound(_))));
        assert_eq!(queue.pending().await.unwrap().len(), 1);
    }
}
