//! Encoding of validated tickets into queue messages.
//!
//! The payload format is defined by [`tickethub_sdk::codec`].

use crate::ticket::TicketRequest;
use thiserror::Error;
use tickethub_sdk::codec::{CodecError, encode_payload};

/// A transport-safe message ready to hand to the broker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueMessage {
    payload: String,
}

impl QueueMessage {
    /// The base64 message body.
    pub fn payload(&self) -> &str {
        &self.payload
    }

    pub fn into_payload(self) -> String {
        self.payload
    }
}

/// The ticket could not be represented in the payload format.
#[derive(Debug, Error)]
#[error("failed to encode ticket: {0}")]
pub struct EncodingError(#[from] CodecError);

/// Encode a validated ticket into its queue message.
pub fn encode(ticket: &TicketRequest) -> Result<QueueMessage, EncodingError> {
    let payload = encode_payload(&ticket.to_message())?;
    Ok(QueueMessage { payload })
}
