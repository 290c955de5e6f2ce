//! Queue Gateway.
//!
//! [`QueueGateway`] is the seam between the submission path and the message
//! broker. The process holds exactly one gateway per queue, shared by every
//! concurrent submission behind an `Arc`.

mod azure;
#[cfg(any(test, feature = "testing"))]
mod memory;

pub use azure::{AzureQueueClient, ConnectionString, MAX_MESSAGE_BYTES, validate_queue_name};
#[cfg(any(test, feature = "testing"))]
pub use memory::InMemoryQueue;

use crate::codec::QueueMessage;
use async_trait::async_trait;
use std::fmt;
use thiserror::Error;

/// Operations the submission path needs from a durable queue.
#[async_trait]
pub trait QueueGateway: Send + Sync {
    /// Name of the queue this gateway writes to.
    fn queue_name(&self) -> &str;

    /// Create the queue if it does not exist yet.
    ///
    /// Idempotent: an already existing queue is a success, also when several
    /// callers race to create it.
    async fn ensure_queue(&self) -> Result<(), QueueError>;

    /// Hand one message to the broker.
    ///
    /// `Ok` means the broker accepted the message, not that it was consumed.
    async fn send(&self, message: QueueMessage) -> Result<(), QueueError>;
}

/// Class of a queue failure, safe to show to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueueErrorKind {
    /// The broker could not be reached.
    Connectivity,
    /// The broker refused the credentials.
    Authorization,
    /// The broker is throttling or temporarily failing.
    Transient,
    /// The operation did not finish within its deadline.
    Timeout,
    /// The broker rejected the request itself (e.g. message too large).
    Rejected,
    /// The gateway could not be constructed from its configuration.
    Configuration,
}

impl fmt::Display for QueueErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            QueueErrorKind::Connectivity => "Connectivity",
            QueueErrorKind::Authorization => "Authorization",
            QueueErrorKind::Transient => "Transient",
            QueueErrorKind::Timeout => "Timeout",
            QueueErrorKind::Rejected => "Rejected",
            QueueErrorKind::Configuration => "Configuration",
        };
        f.write_str(name)
    }
}

/// A failed queue operation.
///
/// `Display` renders the full diagnostic detail for logs. [`summary`] renders
/// the sanitized form returned to callers. Neither contains credentials:
/// errors are built without request URLs or connection strings.
///
/// [`summary`]: QueueError::summary
#[derive(Debug, Error)]
#[error("{kind} queue error{}: {detail}", code_suffix(.code))]
pub struct QueueError {
    kind: QueueErrorKind,
    /// Broker error code, e.g. `ServerBusy` or `AuthenticationFailed`.
    code: Option<String>,
    detail: String,
    #[source]
    source: Option<reqwest::Error>,
}

fn code_suffix(code: &Option<String>) -> String {
    code.as_ref().map(|c| format!(" ({c})")).unwrap_or_default()
}

impl QueueError {
    pub fn new(kind: QueueErrorKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            code: None,
            detail: detail.into(),
            source: None,
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Attach a transport error, stripped of its URL.
    pub fn with_source(mut self, source: reqwest::Error) -> Self {
        self.source = Some(source.without_url());
        self
    }

    pub fn timeout(detail: impl Into<String>) -> Self {
        Self::new(QueueErrorKind::Timeout, detail)
    }

    pub fn configuration(detail: impl Into<String>) -> Self {
        Self::new(QueueErrorKind::Configuration, detail)
    }

    pub fn kind(&self) -> QueueErrorKind {
        self.kind
    }

    pub fn code(&self) -> Option<&str> {
        self.code.as_deref()
    }

    /// Caller-safe description: error class plus broker error code.
    pub fn summary(&self) -> String {
        format!("Queue {} error{}", self.kind, code_suffix(&self.code))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_hides_detail() {
        let error = QueueError::new(QueueErrorKind::Transient, "HTTP 503 from broker")
            .with_code("ServerBusy");
        assert_eq!(error.summary(), "Queue Transient error (ServerBusy)");
        assert_eq!(
            error.to_string(),
            "Transient queue error (ServerBusy): HTTP 503 from broker"
        );
        assert_eq!(error.kind(), QueueErrorKind::Transient);

        let error = QueueError::timeout("send did not complete within 10s");
        assert_eq!(error.summary(), "Queue Timeout error");
    }
}
