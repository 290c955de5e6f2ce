//! TicketHub SDK
//!
//! Shared wire contract between the ticket intake API, its HTTP callers and
//! the downstream consumers of the `tickethub` queue.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![forbid(unsafe_code)]

pub mod codec;
pub mod objects;

#[cfg(feature = "client")]
pub mod client;
