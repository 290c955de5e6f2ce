pub mod response;
pub mod ticket;

pub use response::{SubmissionFailed, TicketQueued, ValidationProblem};
pub use ticket::{ConcertId, TicketMessage};
