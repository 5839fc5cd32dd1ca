//! Cooperative poll loop over a [`MessageQueue`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, trace, warn};

use super::{MessageQueue, QueueMessage};
use crate::experiment::{ExperimentRequest, ExperimentRunner};
use crate::storage::StorageGateway;

/// Cloneable cancellation flag, checked once per loop iteration.
#[derive(Debug, Clone, Default)]
pub struct ShutdownSignal(Arc<AtomicBool>);

impl ShutdownSignal {
    /// New, not yet cancelled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request the loop to stop after the current iteration.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// True once [`cancel`](Self::cancel) was called on any clone.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// What happened to a received message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageDisposition {
    /// Processed and deleted
    Acknowledged,
    /// Left in the queue for redelivery
    Retained {
        /// Why the message was not deleted
        reason: String,
    },
}

/// Outcome of one poll iteration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// No visible message; the loop backed off
    Empty,
    /// One message was handled
    Handled(MessageDisposition),
    /// The receive call failed; the loop backed off
    ReceiveFailed(String),
}

/// Counters returned when the loop exits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListenerStats {
    /// Loop iterations
    pub polls: u64,
    /// Messages processed and deleted
    pub processed: u64,
    /// Messages left for redelivery
    pub failed: u64,
    /// Iterations without a message (receive failures included)
    pub empty_polls: u64,
}

impl ListenerStats {
    fn record(&mut self, outcome: &PollOutcome) {
        self.polls += 1;
        match outcome {
            PollOutcome::Empty | PollOutcome::ReceiveFailed(_) => self.empty_polls += 1,
            PollOutcome::Handled(MessageDisposition::Acknowledged) => self.processed += 1,
            PollOutcome::Handled(MessageDisposition::Retained { .. }) => self.failed += 1,
        }
    }
}

/// Single-worker queue listener.
///
/// Exactly one message is received, processed, and acknowledged before the
/// next receive. Cancellation is only observed between iterations, so an
/// in-flight message always runs to completion.
pub struct QueueListener<Q, S> {
    queue: Q,
    runner: ExperimentRunner<S>,
    poll_backoff: Duration,
}

impl<Q: MessageQueue, S: StorageGateway> QueueListener<Q, S> {
    /// Create a listener.
    #[must_use]
    pub const fn new(queue: Q, runner: ExperimentRunner<S>, poll_backoff: Duration) -> Self {
        Self {
            queue,
            runner,
            poll_backoff,
        }
    }

    /// Get the queue.
    #[must_use]
    pub const fn queue(&self) -> &Q {
        &self.queue
    }

    /// Get the runner.
    #[must_use]
    pub const fn runner(&self) -> &ExperimentRunner<S> {
        &self.runner
    }

    /// Get the empty-queue backoff.
    #[must_use]
    pub const fn poll_backoff(&self) -> Duration {
        self.poll_backoff
    }

    /// Poll until `shutdown` is cancelled.
    pub async fn run(&self, shutdown: &ShutdownSignal) -> ListenerStats {
        let mut stats = ListenerStats::default();
        info!(backoff = ?self.poll_backoff, "Queue listener started");

        while !shutdown.is_cancelled() {
            let outcome = self.poll_once().await;
            stats.record(&outcome);
        }

        info!(
            polls = stats.polls,
            processed = stats.processed,
            failed = stats.failed,
            "Cancel requested. Exiting the listener loop"
        );
        stats
    }

    /// One loop iteration: receive at most one message, handle it or back off.
    pub async fn poll_once(&self) -> PollOutcome {
        match self.queue.receive().await {
            Ok(Some(message)) => PollOutcome::Handled(self.handle(&message).await),
            Ok(None) => {
                trace!("Queue empty");
                tokio::time::sleep(self.poll_backoff).await;
                PollOutcome::Empty
            }
            Err(e) => {
                error!(error = %e, "Failed to receive from queue");
                tokio::time::sleep(self.poll_backoff).await;
                PollOutcome::ReceiveFailed(e.to_string())
            }
        }
    }

    /// Decode, run, and acknowledge one message.
    ///
    /// Decode errors, storage failures during the run, and delete errors leave
    /// the message in the queue.
    pub async fn handle(&self, message: &QueueMessage) -> MessageDisposition {
        info!(message_id = %message.id, dequeue_count = message.dequeue_count, "Received message");
        if message.dequeue_count > 1 {
            warn!(
                message_id = %message.id,
                dequeue_count = message.dequeue_count,
                "Message is being redelivered"
            );
        }

        let request = match ExperimentRequest::from_json(&message.body) {
            Ok(request) => request,
            Err(e) => {
                error!(message_id = %message.id, error = %e, "Failed to decode message");
                return MessageDisposition::Retained {
                    reason: e.to_string(),
                };
            }
        };

        let result = match self.runner.run(&request).await {
            Ok(result) => result,
            Err(e) => {
                error!(message_id = %message.id, error = %e, "Experiment did not complete");
                return MessageDisposition::Retained {
                    reason: e.to_string(),
                };
            }
        };
        info!(
            message_id = %message.id,
            experiment_id = result.experiment_id(),
            row_key = result.row_key(),
            "Experiment completed"
        );

        match self.queue.delete(message).await {
            Ok(()) => MessageDisposition::Acknowledged,
            Err(e) => {
                error!(message_id = %message.id, error = %e, "Failed to delete message");
                MessageDisposition::Retained {
                    reason: e.to_string(),
                }
            }
        }
    }
}
