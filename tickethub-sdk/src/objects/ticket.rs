use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identifier of the concert a ticket is bought for.
///
/// Callers may send either a positive integer or a string. The value is
/// echoed back and forwarded in exactly the shape it was received.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConcertId {
    Number(u64),
    Text(String),
}

impl fmt::Display for ConcertId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConcertId::Number(n) => write!(f, "{n}"),
            ConcertId::Text(s) => f.write_str(s),
        }
    }
}

/// The structured body of one queued ticket purchase.
///
/// Serialized as a flat JSON object: `ConcertId` and `Email` first, then every
/// pass-through purchase attribute in lexicographic key order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TicketMessage {
    pub concert_id: ConcertId,
    pub email: String,
    /// Purchase attributes (quantity, seat class, payment fields, ...) that
    /// the intake service forwards without interpreting.
    #[serde(flatten)]
    pub attributes: serde_json::Map<String, serde_json::Value>,
}
