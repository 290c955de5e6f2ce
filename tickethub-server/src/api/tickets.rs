//! Tickets API handlers.

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use kanau::processor::Processor;
use tickethub_core::submission::{SubmissionFailure, SubmissionOutcome};
use tickethub_core::ticket::{RawTicketRequest, ValidationError};
use tickethub_sdk::objects::response::STATUS_MESSAGE;
use tickethub_sdk::objects::{SubmissionFailed, TicketQueued, ValidationProblem};

use crate::state::AppState;

/// Build the tickets router.
pub(super) fn router() -> Router<AppState> {
    Router::new().route("/tickets", get(get_status).post(submit_ticket))
}

/// `GET /api/tickets` — liveness probe.
async fn get_status() -> &'static str {
    tracing::info!("GET request received for tickets API");
    STATUS_MESSAGE
}

/// `POST /api/tickets` — validate a purchase and queue it for processing.
///
/// The body is taken as untyped JSON so that every field problem can be
/// reported at once instead of failing on the first deserialization error.
async fn submit_ticket(
    State(state): State<AppState>,
    body: Result<Json<serde_json::Value>, JsonRejection>,
) -> Result<Json<TicketQueued>, TicketsApiError> {
    let Json(body) = body.map_err(|rejection| {
        tracing::warn!(error = %rejection.body_text(), "Unreadable ticket purchase body");
        TicketsApiError::Invalid(ValidationError::malformed_body(rejection.body_text()))
    })?;

    let Ok(outcome) = state.submission.process(RawTicketRequest(body)).await;
    match outcome {
        SubmissionOutcome::Acknowledged { concert_id } => Ok(Json(TicketQueued::new(concert_id))),
        SubmissionOutcome::Rejected(e) => Err(TicketsApiError::Invalid(e)),
        SubmissionOutcome::Failed { error, .. } => Err(TicketsApiError::Failed(error)),
    }
}

/// Errors that can occur in tickets API handlers.
#[derive(Debug)]
enum TicketsApiError {
    /// The request failed validation. Reported in full.
    Invalid(ValidationError),
    /// The purchase could not be queued. Only the summary leaves the server.
    Failed(SubmissionFailure),
}

impl IntoResponse for TicketsApiError {
    fn into_response(self) -> Response {
        match self {
            TicketsApiError::Invalid(e) => (
                StatusCode::BAD_REQUEST,
                Json(ValidationProblem::new(e.into_errors())),
            )
                .into_response(),
            TicketsApiError::Failed(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(SubmissionFailed::new(e.summary())),
            )
                .into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::server::build_router;
    use crate::state::AppState;
    use axum::{
        Router,
        body::Body,
        http::{Request, StatusCode, header},
    };
    use std::sync::Arc;
    use std::time::Duration;
    use tickethub_core::queue::{InMemoryQueue, QueueErrorKind};
    use tickethub_core::submission::SubmissionService;
    use tickethub_sdk::codec::decode_payload;
    use tickethub_sdk::objects::{
        ConcertId, SubmissionFailed, TicketQueued, ValidationProblem,
    };
    use tower::ServiceExt;

    fn app() -> (Arc<InMemoryQueue>, Router) {
        let queue = Arc::new(InMemoryQueue::new("tickethub"));
        let service = SubmissionService::new(queue.clone(), Duration::from_secs(5));
        (queue, build_router(AppState::new(service)))
    }

    fn post(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/tickets")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_owned()))
            .unwrap()
    }

    async fn read_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
        let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_status_endpoint() {
        let (queue, app) = app();
        let request = Request::builder()
            .uri("/api/tickets")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        assert_eq!(&bytes[..], b"Tickets API is running");
        assert_eq!(queue.ensure_calls(), 0);
    }

    #[tokio::test]
    async fn test_valid_purchase_is_queued() {
        let (queue, app) = app();

        let response = app
            .oneshot(post(r#"{"ConcertId": 42, "Email": "a@b.com"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body: serde_json::Value = read_json(response).await;
        assert_eq!(
            body,
            serde_json::json!({
                "Message": "Ticket purchase received and queued for processing",
                "ConcertId": 42
            })
        );
        let queued: TicketQueued = serde_json::from_value(body).unwrap();
        assert_eq!(queued.concert_id, ConcertId::Number(42));

        assert_eq!(queue.send_calls(), 1);
        let messages = queue.messages();
        assert_eq!(messages.len(), 1);
        let decoded = decode_payload(&messages[0]).unwrap();
        assert_eq!(
            serde_json::to_value(&decoded).unwrap(),
            serde_json::json!({"ConcertId": 42, "Email": "a@b.com"})
        );
    }

    #[tokio::test]
    async fn test_empty_body_lists_every_missing_field() {
        let (queue, app) = app();

        let response = app.oneshot(post("{}")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let problem: ValidationProblem = read_json(response).await;
        assert_eq!(problem.message, "One or more validation errors occurred.");
        assert_eq!(
            problem.errors.keys().collect::<Vec<_>>(),
            vec!["ConcertId", "Email"]
        );
        assert_eq!(queue.ensure_calls(), 0);
        assert_eq!(queue.send_calls(), 0);
    }

    #[tokio::test]
    async fn test_malformed_json_is_a_validation_error() {
        let (queue, app) = app();

        let response = app.oneshot(post("{\"ConcertId\": ")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let problem: ValidationProblem = read_json(response).await;
        assert!(problem.errors.contains_key("$"));
        assert_eq!(queue.send_calls(), 0);
    }

    #[tokio::test]
    async fn test_broker_outage_returns_sanitized_error() {
        let (queue, app) = app();
        queue.fail_sends_with(Some(QueueErrorKind::Connectivity));

        let response = app
            .oneshot(post(r#"{"ConcertId": "summer-fest", "Email": "a@b.com"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let failed: SubmissionFailed = read_json(response).await;
        assert_eq!(
            failed.message,
            "Internal server error occurred while processing your request"
        );
        assert_eq!(failed.error_details, "Queue Connectivity error (Simulated)");
        for secret in ["AccountKey", "SharedAccessSignature", "DefaultEndpointsProtocol", "simulated broker outage"] {
            assert!(!failed.error_details.contains(secret));
        }
    }
}
