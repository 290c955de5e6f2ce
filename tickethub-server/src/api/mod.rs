//! HTTP API.
//!
//! # Endpoints
//!
//! - `GET  /api/tickets` – liveness probe
//! - `POST /api/tickets` – submit a ticket purchase for queued processing

use axum::Router;

use crate::state::AppState;

mod tickets;

/// Build the API router, mounted under `/api`.
pub fn router() -> Router<AppState> {
    Router::new().merge(tickets::router())
}
