//! Submission Service.
//!
//! Drives one purchase request through the intake pipeline:
//!
//! ```text
//! Received ─► Validated ─► Encoded ─► QueueEnsured ─► Sent ─► Acknowledged
//!    │            │            │            │
//!    ▼            └────────────┴────────────┴──► Failed
//! Rejected
//! ```
//!
//! Every failure is reported twice from the same value: in full to the
//! tracing log, and as a sanitized [`SubmissionFailure::summary`] to the
//! caller.

use crate::codec::{EncodingError, encode};
use crate::queue::{QueueError, QueueGateway};
use crate::ticket::{RawTicketRequest, TicketRequest, ValidationError, validate};
use kanau::processor::Processor;
use std::convert::Infallible;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tickethub_sdk::objects::ConcertId;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Default deadline for each broker call.
pub const DEFAULT_QUEUE_TIMEOUT: Duration = Duration::from_secs(10);

/// Last stage a submission completed before it failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionStage {
    /// Encoding failed.
    Validated,
    /// Ensuring the queue failed.
    Encoded,
    /// Sending the message failed.
    QueueEnsured,
}

/// A server-side failure after the request passed validation.
#[derive(Debug, Error)]
pub enum SubmissionFailure {
    #[error(transparent)]
    Encoding(#[from] EncodingError),
    #[error(transparent)]
    Queue(#[from] QueueError),
}

impl SubmissionFailure {
    /// Caller-safe description of the failure.
    pub fn summary(&self) -> String {
        match self {
            SubmissionFailure::Encoding(_) => "Ticket could not be encoded".to_string(),
            SubmissionFailure::Queue(e) => e.summary(),
        }
    }
}

/// Terminal state of one submission.
#[derive(Debug)]
pub enum SubmissionOutcome {
    /// The broker accepted the message.
    Acknowledged { concert_id: ConcertId },
    /// The request failed validation; the queue was not touched.
    Rejected(ValidationError),
    /// The request was valid but could not be queued.
    Failed {
        /// Last stage reached before the failure.
        stage: SubmissionStage,
        error: SubmissionFailure,
    },
}

/// Validates ticket requests and hands them to the queue.
///
/// Holds the process-wide queue gateway; no per-request state is shared.
pub struct SubmissionService {
    gateway: Arc<dyn QueueGateway>,
    queue_timeout: Duration,
}

impl SubmissionService {
    pub fn new(gateway: Arc<dyn QueueGateway>, queue_timeout: Duration) -> Self {
        Self {
            gateway,
            queue_timeout,
        }
    }

    /// Run a broker call under the configured deadline.
    async fn bounded<F>(&self, operation: &str, call: F) -> Result<(), QueueError>
    where
        F: Future<Output = Result<(), QueueError>>,
    {
        match tokio::time::timeout(self.queue_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(QueueError::timeout(format!(
                "{operation} did not complete within {:?}",
                self.queue_timeout
            ))),
        }
    }

    async fn enqueue(&self, raw: RawTicketRequest) -> SubmissionOutcome {
        let ticket = match validate(&raw.0) {
            Ok(ticket) => ticket,
            Err(e) => {
                warn!(errors = %e, "Invalid ticket purchase request rejected");
                return SubmissionOutcome::Rejected(e);
            }
        };

        let message = match encode(&ticket) {
            Ok(message) => message,
            Err(e) => return failed(SubmissionStage::Validated, &ticket, e.into()),
        };

        if let Err(e) = self.bounded("ensure queue", self.gateway.ensure_queue()).await {
            return failed(SubmissionStage::Encoded, &ticket, e.into());
        }

        if let Err(e) = self.bounded("send", self.gateway.send(message)).await {
            return failed(SubmissionStage::QueueEnsured, &ticket, e.into());
        }

        info!(
            concert_id = %ticket.concert_id(),
            queue = self.gateway.queue_name(),
            "Ticket purchase for concert {} queued successfully",
            ticket.concert_id()
        );
        SubmissionOutcome::Acknowledged {
            concert_id: ticket.concert_id().clone(),
        }
    }
}

fn failed(
    stage: SubmissionStage,
    ticket: &TicketRequest,
    error: SubmissionFailure,
) -> SubmissionOutcome {
    error!(
        ?stage,
        concert_id = %ticket.concert_id(),
        email = ticket.email(),
        summary = %error.summary(),
        error = %error,
        "Failed to queue ticket purchase"
    );
    SubmissionOutcome::Failed { stage, error }
}

impl Processor<RawTicketRequest> for SubmissionService {
    type Output = SubmissionOutcome;
    type Error = Infallible;

    #[tracing::instrument(skip_all, name = "Submission", fields(submission_id = %Uuid::new_v4()))]
    async fn process(&self, raw: RawTicketRequest) -> Result<SubmissionOutcome, Infallible> {
        Ok(self.enqueue(raw).await)
    }
}
