//! Application state shared across all request handlers.

use std::sync::Arc;
use tickethub_core::submission::SubmissionService;

/// Application state that is shared across all request handlers.
///
/// This is cloneable and cheap to pass around (everything is behind Arc).
/// Nothing in it is mutated by requests.
#[derive(Clone)]
pub struct AppState {
    /// Submission pipeline holding the process-wide queue gateway.
    pub submission: Arc<SubmissionService>,
}

impl AppState {
    /// Create a new AppState around the submission service.
    pub fn new(submission: SubmissionService) -> Self {
        Self {
            submission: Arc::new(submission),
        }
    }
}
