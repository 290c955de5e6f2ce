//! Queue message codec.
//!
//! This is the wire contract between the intake service and every consumer
//! of the ticket queue. A message body is produced in two steps:
//!
//! 1. The [`TicketMessage`] is serialized to compact JSON:
//!
//!    ```text
//!    {"ConcertId":42,"Email":"a@b.com","Quantity":2}
//!    ```
//!
//!    `ConcertId` is a JSON number or string, `Email` a string, and any other
//!    purchase attributes follow in lexicographic key order.
//!
//! 2. The UTF-8 bytes of that JSON are encoded with standard, padded base64
//!    (RFC 4648 section 4), so the payload only contains printable ASCII.
//!
//! Consumers reverse the steps with [`decode_payload`].

use crate::objects::TicketMessage;
use thiserror::Error;

/// Errors produced while encoding or decoding a queue payload.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid base64 encoding")]
    InvalidBase64,
    #[error("payload is not valid utf-8")]
    InvalidUtf8,
}

/// Encode a ticket message into its base64 queue payload.
pub fn encode_payload(message: &TicketMessage) -> Result<String, CodecError> {
    let json = serde_json::to_vec(message)?;
    Ok(fast32::base64::RFC4648.encode(&json))
}

/// Decode a base64 queue payload back into a ticket message.
pub fn decode_payload(payload: &str) -> Result<TicketMessage, CodecError> {
    let bytes = fast32::base64::RFC4648
        .decode_str(payload)
        .map_err(|_| CodecError::InvalidBase64)?;
    let json = String::from_utf8(bytes).map_err(|_| CodecError::InvalidUtf8)?;
    Ok(serde_json::from_str(&json)?)
}
