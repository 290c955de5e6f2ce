//! Process-local queue gateway.
//!
//! Test double for the broker, compiled for this crate's tests and behind the
//! `testing` feature. It counts every call, keeps the sent payloads, and can
//! simulate an outage or a slow broker.

use crate::codec::QueueMessage;
use crate::queue::{QueueError, QueueErrorKind, QueueGateway};
use async_trait::async_trait;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// An in-memory queue implementing [`QueueGateway`].
pub struct InMemoryQueue {
    name: String,
    /// `None` until the queue is created.
    messages: Mutex<Option<Vec<String>>>,
    ensure_calls: AtomicUsize,
    send_calls: AtomicUsize,
    creations: AtomicUsize,
    outage: Mutex<Option<QueueErrorKind>>,
    send_outage: Mutex<Option<QueueErrorKind>>,
    latency: Mutex<Option<Duration>>,
}

impl InMemoryQueue {
    /// Create a gateway for a queue that does not exist yet.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            messages: Mutex::new(None),
            ensure_calls: AtomicUsize::new(0),
            send_calls: AtomicUsize::new(0),
            creations: AtomicUsize::new(0),
            outage: Mutex::new(None),
            send_outage: Mutex::new(None),
            latency: Mutex::new(None),
        }
    }

    /// Make every following call fail with the given error class.
    /// `None` restores normal operation.
    pub fn fail_with(&self, kind: Option<QueueErrorKind>) {
        *lock(&self.outage) = kind;
    }

    /// Make only `send` fail, leaving `ensure_queue` healthy.
    pub fn fail_sends_with(&self, kind: Option<QueueErrorKind>) {
        *lock(&self.send_outage) = kind;
    }

    /// Delay every following call by `latency`.
    pub fn set_latency(&self, latency: Option<Duration>) {
        *lock(&self.latency) = latency;
    }

    /// Drop the queue and its messages, as if deleted by an operator.
    pub fn delete_queue(&self) {
        *lock(&self.messages) = None;
    }

    pub fn ensure_calls(&self) -> usize {
        self.ensure_calls.load(Ordering::SeqCst)
    }

    pub fn send_calls(&self) -> usize {
        self.send_calls.load(Ordering::SeqCst)
    }

    /// How many times the queue was actually created.
    pub fn creations(&self) -> usize {
        self.creations.load(Ordering::SeqCst)
    }

    /// Payloads accepted so far, oldest first.
    pub fn messages(&self) -> Vec<String> {
        lock(&self.messages).clone().unwrap_or_default()
    }

    async fn simulate_broker(&self, sending: bool) -> Result<(), QueueError> {
        let latency = *lock(&self.latency);
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        let send_outage = if sending { *lock(&self.send_outage) } else { None };
        let outage = lock(&self.outage).or(send_outage);
        match outage {
            Some(kind) => Err(QueueError::new(kind, "simulated broker outage").with_code("Simulated")),
            None => Ok(()),
        }
    }
}

/// Lock a mutex, recovering the data if a panicking test poisoned it.
fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl QueueGateway for InMemoryQueue {
    fn queue_name(&self) -> &str {
        &self.name
    }

    async fn ensure_queue(&self) -> Result<(), QueueError> {
        self.ensure_calls.fetch_add(1, Ordering::SeqCst);
        self.simulate_broker(false).await?;

        let mut messages = lock(&self.messages);
        if messages.is_none() {
            *messages = Some(Vec::new());
            self.creations.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }

    async fn send(&self, message: QueueMessage) -> Result<(), QueueError> {
        self.send_calls.fetch_add(1, Ordering::SeqCst);
        self.simulate_broker(true).await?;

        match lock(&self.messages).as_mut() {
            Some(messages) => {
                messages.push(message.into_payload());
                Ok(())
            }
            None => Err(QueueError::new(
                QueueErrorKind::Rejected,
                format!("queue {} does not exist", self.name),
            )
            .with_code("QueueNotFound")),
        }
    }
}
