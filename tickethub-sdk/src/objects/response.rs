//! Response bodies of the tickets API.
//!
//! Field names are PascalCase on the wire.

use crate::objects::ConcertId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Message returned with a successful submission.
pub const QUEUED_MESSAGE: &str = "Ticket purchase received and queued for processing";

/// Message returned with a validation failure.
pub const VALIDATION_MESSAGE: &str = "One or more validation errors occurred.";

/// Message returned when the purchase could not be queued.
pub const FAILED_MESSAGE: &str = "Internal server error occurred while processing your request";

/// Body text of the status endpoint.
pub const STATUS_MESSAGE: &str = "Tickets API is running";

/// `200 OK` body for `POST /api/tickets`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TicketQueued {
    pub message: String,
    pub concert_id: ConcertId,
}

impl TicketQueued {
    pub fn new(concert_id: ConcertId) -> Self {
        Self {
            message: QUEUED_MESSAGE.to_string(),
            concert_id,
        }
    }
}

/// `400 Bad Request` body for `POST /api/tickets`.
///
/// `errors` maps each failing field to every message recorded for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ValidationProblem {
    pub message: String,
    pub errors: BTreeMap<String, Vec<String>>,
}

impl ValidationProblem {
    pub fn new(errors: BTreeMap<String, Vec<String>>) -> Self {
        Self {
            message: VALIDATION_MESSAGE.to_string(),
            errors,
        }
    }
}

/// `500 Internal Server Error` body for `POST /api/tickets`.
///
/// `error_details` is a sanitized summary (error class and broker error
/// code); it never carries credentials or endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SubmissionFailed {
    pub message: String,
    pub error_details: String,
}

impl SubmissionFailed {
    pub fn new(error_details: impl Into<String>) -> Self {
        Self {
            message: FAILED_MESSAGE.to_string(),
            error_details: error_details.into(),
        }
    }
}
