use reqwest::{Client, StatusCode};
use serde::Serialize;
use url::Url;

use super::ClientError;
use crate::objects::{SubmissionFailed, TicketQueued, ValidationProblem};

const TICKETS_PATH: &str = "/api/tickets";

/// Typed HTTP client for the TicketHub **tickets API**.
#[derive(Debug, Clone)]
pub struct TicketsClient {
    http: Client,
    base_url: Url,
}

/// Every documented outcome of `POST /api/tickets`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    /// `200` – the purchase was queued.
    Queued(TicketQueued),
    /// `400` – the body failed validation; nothing was queued.
    Invalid(ValidationProblem),
    /// `500` – the purchase could not be queued; resubmit later.
    Failed(SubmissionFailed),
}

impl TicketsClient {
    /// Create a new `TicketsClient`.
    ///
    /// * `base_url` – root URL of the intake server (e.g. `https://tickets.example.com`).
    pub fn new(base_url: Url) -> Self {
        Self {
            http: Client::new(),
            base_url,
        }
    }

    /// Replace the default `reqwest::Client` with a custom one (e.g. to
    /// configure timeouts or a proxy).
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.http = client;
        self
    }

    /// `GET /api/tickets` – liveness probe. Returns the status text.
    pub async fn status(&self) -> Result<String, ClientError> {
        let url = self.base_url.join(TICKETS_PATH)?;
        let resp = self.http.get(url).send().await?;
        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            return Err(ClientError::Api { status, body });
        }
        Ok(body)
    }

    /// `POST /api/tickets` – submit a purchase.
    ///
    /// `purchase` may be any serializable shape; the server validates it.
    /// The client never retries; on [`Submission::Failed`] the caller decides
    /// whether to resubmit.
    pub async fn submit<T: Serialize + ?Sized>(
        &self,
        purchase: &T,
    ) -> Result<Submission, ClientError> {
        let url = self.base_url.join(TICKETS_PATH)?;
        let resp = self.http.post(url).json(purchase).send().await?;

        let status = resp.status();
        let bytes = resp.bytes().await?;
        match status {
            StatusCode::OK => Ok(Submission::Queued(serde_json::from_slice(&bytes)?)),
            StatusCode::BAD_REQUEST => Ok(Submission::Invalid(serde_json::from_slice(&bytes)?)),
            StatusCode::INTERNAL_SERVER_ERROR => {
                Ok(Submission::Failed(serde_json::from_slice(&bytes)?))
            }
            status => Err(ClientError::Api {
                status,
                body: String::from_utf8_lossy(&bytes).into_owned(),
            }),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::client::ClientError;
    use crate::objects::ConcertId;
    use crate::objects::response::STATUS_MESSAGE;
    use axum::{
        Json, Router,
        extract::State,
        http::{StatusCode as AxumStatus, header},
        response::IntoResponse,
        routing::get,
    };
    use serde_json::{Value, json};
    use std::collections::BTreeMap;
    use std::sync::{Arc, Mutex};
    use tokio::net::TcpListener;

    /// Tickets API stand-in that answers every POST with one canned response.
    #[derive(Clone)]
    struct FakeApi {
        status: AxumStatus,
        body: String,
        received: Arc<Mutex<Vec<Value>>>,
    }

    async fn get_status() -> &'static str {
        STATUS_MESSAGE
    }

    async fn post_ticket(State(api): State<FakeApi>, Json(body): Json<Value>) -> impl IntoResponse {
        api.received.lock().unwrap().push(body);
        (
            api.status,
            [(header::CONTENT_TYPE, "application/json")],
            api.body.clone(),
        )
    }

    async fn spawn_api(status: u16, body: &str) -> (FakeApi, TicketsClient) {
        let api = FakeApi {
            status: AxumStatus::from_u16(status).unwrap(),
            body: body.to_string(),
            received: Arc::default(),
        };
        let app = Router::new()
            .route(TICKETS_PATH, get(get_status).post(post_ticket))
            .with_state(api.clone());
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        let client = TicketsClient::new(Url::parse(&format!("http://{addr}")).unwrap());
        (api, client)
    }

    #[tokio::test]
    async fn test_status_returns_text() {
        let (_, client) = spawn_api(200, "{}").await;
        assert_eq!(client.status().await.unwrap(), STATUS_MESSAGE);
    }

    #[tokio::test]
    async fn test_submit_queued() {
        let body = json!({"Message": "Ticket purchase received and queued for processing", "ConcertId": 42});
        let (api, client) = spawn_api(200, &body.to_string()).await;

        let outcome = client
            .submit(&json!({"ConcertId": 42, "Email": "a@b.com"}))
            .await
            .unwrap();
        assert_eq!(
            outcome,
            Submission::Queued(TicketQueued::new(ConcertId::Number(42)))
        );
        assert_eq!(
            *api.received.lock().unwrap(),
            vec![json!({"ConcertId": 42, "Email": "a@b.com"})]
        );
    }

    #[tokio::test]
    async fn test_submit_invalid() {
        let body = json!({
            "Message": "One or more validation errors occurred.",
            "Errors": {"Email": ["The Email field is required."]}
        });
        let (_, client) = spawn_api(400, &body.to_string()).await;

        let outcome = client.submit(&json!({"ConcertId": 42})).await.unwrap();
        let errors = BTreeMap::from([(
            "Email".to_string(),
            vec!["The Email field is required.".to_string()],
        )]);
        assert_eq!(outcome, Submission::Invalid(ValidationProblem::new(errors)));
    }

    #[tokio::test]
    async fn test_submit_failed() {
        let body = json!({
            "Message": "Internal server error occurred while processing your request",
            "ErrorDetails": "Queue Connectivity error"
        });
        let (_, client) = spawn_api(500, &body.to_string()).await;

        let outcome = client
            .submit(&json!({"ConcertId": 1, "Email": "a@b.com"}))
            .await
            .unwrap();
        assert_eq!(
            outcome,
            Submission::Failed(SubmissionFailed::new("Queue Connectivity error"))
        );
    }

    #[tokio::test]
    async fn test_undocumented_status_is_api_error() {
        let (_, client) = spawn_api(503, "busy").await;

        let error = client
            .submit(&json!({"ConcertId": 1, "Email": "a@b.com"}))
            .await
            .unwrap_err();
        let ClientError::Api { status, body } = error else {
            unreachable!("503 is not a documented outcome")
        };
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body, "busy");
    }

    #[tokio::test]
    async fn test_unexpected_body_is_json_error() {
        let (_, client) = spawn_api(200, "not json").await;

        let error = client
            .submit(&json!({"ConcertId": 1, "Email": "a@b.com"}))
            .await
            .unwrap_err();
        assert!(matches!(error, ClientError::Json(_)));
    }
}
