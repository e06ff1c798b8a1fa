//! Scoped handle to an active subscription.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use super::InboundMessage;

/// How long [`Subscription::close`] waits for the transport task to finish.
const CLOSE_TIMEOUT: Duration = Duration::from_secs(2);

/// Shared slot holding the most recent transport error.
pub(crate) type ErrorSlot = Arc<Mutex<Option<String>>>;

/// An active subscription to one topic.
///
/// Messages are buffered in an in-order channel fed by the transport and
/// drained with [`Subscription::poll`]. The subscription is released when
/// [`Subscription::close`] is awaited; dropping the handle signals the same
/// release without waiting for it to complete.
#[derive(Debug)]
pub struct Subscription {
    topic: String,
    description: String,
    receiver: mpsc::Receiver<InboundMessage>,
    last_error: ErrorSlot,
    cancel: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl Subscription {
    pub(crate) fn new(
        topic: &str,
        description: &str,
        receiver: mpsc::Receiver<InboundMessage>,
        last_error: ErrorSlot,
    ) -> Self {
        Self {
            topic: topic.to_string(),
            description: description.to_string(),
            receiver,
            last_error,
            cancel: None,
            task: None,
        }
    }

    /// Attach the background task feeding this subscription and its cancel signal.
    pub(crate) fn with_task(mut self, cancel: oneshot::Sender<()>, task: JoinHandle<()>) -> Self {
        self.cancel = Some(cancel);
        self.task = Some(task);
        self
    }

    /// Take the next message, if one is buffered. Never blocks.
    pub fn poll(&mut self) -> Option<InboundMessage> {
        match self.receiver.try_recv() {
            Ok(message) => Some(message),
            Err(mpsc::error::TryRecvError::Empty) => None,
            Err(mpsc::error::TryRecvError::Disconnected) => {
                let mut slot = self.last_error.lock();
                if slot.is_none() {
                    *slot = Some("Source disconnected".to_string());
                }
                None
            }
        }
    }

    /// True once the transport has stopped and no buffered messages remain.
    pub fn is_finished(&self) -> bool {
        self.receiver.is_closed() && self.receiver.is_empty()
    }

    /// The topic this subscription was requested for.
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Returns a human-readable description of where messages come from.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// The most recent transport error, if any.
    pub fn last_error(&self) -> Option<String> {
        self.last_error.lock().clone()
    }

    /// Release the subscription and wait for the transport to shut down.
    pub async fn close(mut self) {
        if let Some(cancel) = self.cancel.take() {
            let _ = cancel.send(());
        }
        if let Some(task) = self.task.take() {
            if tokio::time::timeout(CLOSE_TIMEOUT, task).await.is_err() {
                tracing::warn!("Timed out releasing subscription to {}", self.topic);
            }
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            let _ = cancel.send(());
        }
    }
}
