//! Azure Queue Storage gateway.
//!
//! Talks to the queue service REST API directly:
//!
//! - `PUT  {endpoint}/{queue}`          – create queue (201 created, 204 already there)
//! - `POST {endpoint}/{queue}/messages` – put message (201 accepted)

mod connection;
mod shared_key;

pub use connection::ConnectionString;

use crate::codec::QueueMessage;
use crate::queue::{QueueError, QueueErrorKind, QueueGateway};
use async_trait::async_trait;
use connection::Credential;
use reqwest::{Method, RequestBuilder, Response, StatusCode, header};
use shared_key::{SignableRequest, authorization};
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

/// Largest message body the queue service accepts.
pub const MAX_MESSAGE_BYTES: usize = 64 * 1024;

const API_VERSION: &str = "2021-12-02";
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const XML_CONTENT_TYPE: &str = "application/xml";
const ERROR_CODE_HEADER: &str = "x-ms-error-code";

const RFC1123: &[time::format_description::BorrowedFormatItem<'static>] = time::macros::format_description!(
    "[weekday repr:short], [day] [month repr:short] [year] [hour]:[minute]:[second] GMT"
);

/// Gateway to one named queue in an Azure Storage account.
///
/// Cheap to share: the inner `reqwest::Client` pools connections and is
/// internally synchronized, and nothing else changes after construction.
pub struct AzureQueueClient {
    http: reqwest::Client,
    queue_name: String,
    queue_url: Url,
    messages_url: Url,
    credential: Credential,
}

impl AzureQueueClient {
    /// Build a gateway from a raw connection string.
    pub fn from_connection_string(
        connection_string: &str,
        queue_name: impl Into<String>,
    ) -> Result<Self, QueueError> {
        Self::new(ConnectionString::parse(connection_string)?, queue_name)
    }

    /// Build a gateway from a parsed connection string.
    pub fn new(connection: ConnectionString, queue_name: impl Into<String>) -> Result<Self, QueueError> {
        let queue_name = queue_name.into();
        validate_queue_name(&queue_name)?;
        let base = connection.endpoint.as_str().trim_end_matches('/');
        let queue_url = Url::parse(&format!("{base}/{queue_name}"))
            .map_err(|_| QueueError::configuration("queue name does not form a valid URL"))?;
        let messages_url = Url::parse(&format!("{base}/{queue_name}/messages"))
            .map_err(|_| QueueError::configuration("queue name does not form a valid URL"))?;

        let http = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| {
                QueueError::configuration("failed to build HTTP client").with_source(e)
            })?;

        Ok(Self {
            http,
            queue_name,
            queue_url,
            messages_url,
            credential: connection.credential,
        })
    }

    /// Prepare an authorized request.
    fn request(
        &self,
        method: Method,
        url: &Url,
        body: Vec<u8>,
        content_type: Option<&str>,
    ) -> Result<RequestBuilder, QueueError> {
        let date = time::OffsetDateTime::now_utc()
            .format(RFC1123)
            .map_err(|_| QueueError::new(QueueErrorKind::Rejected, "failed to format request date"))?;

        let mut url = url.clone();
        let authorization = match &self.credential {
            Credential::SharedKey { account, key } => {
                let signable = SignableRequest {
                    method: method.as_str(),
                    content_length: body.len(),
                    content_type,
                    ms_headers: &[("x-ms-date", date.as_str()), ("x-ms-version", API_VERSION)],
                    canonical_resource: format!("/{account}{}", url.path()),
                };
                Some(authorization(account, key, &signable.string_to_sign()))
            }
            Credential::Sas(token) => {
                url.set_query(Some(token));
                None
            }
        };

        let mut builder = self
            .http
            .request(method, url)
            .header("x-ms-date", date)
            .header("x-ms-version", API_VERSION);
        if let Some(content_type) = content_type {
            builder = builder.header(header::CONTENT_TYPE, content_type);
        }
        if let Some(authorization) = authorization {
            builder = builder.header(header::AUTHORIZATION, authorization);
        }
        Ok(builder.body(body))
    }
}

#[async_trait]
impl QueueGateway for AzureQueueClient {
    fn queue_name(&self) -> &str {
        &self.queue_name
    }

    #[tracing::instrument(skip_all, err, name = "Queue:EnsureQueue", fields(queue = %self.queue_name))]
    async fn ensure_queue(&self) -> Result<(), QueueError> {
        let resp = self
            .request(Method::PUT, &self.queue_url, Vec::new(), None)?
            .send()
            .await
            .map_err(|e| transport_error("create queue", e))?;

        match resp.status() {
            StatusCode::CREATED => {
                info!(queue = %self.queue_name, "Queue created");
                Ok(())
            }
            StatusCode::NO_CONTENT => {
                debug!(queue = %self.queue_name, "Queue already exists");
                Ok(())
            }
            // Exists with different metadata; still usable.
            StatusCode::CONFLICT if error_code(&resp) == Some("QueueAlreadyExists") => Ok(()),
            _ => Err(status_error("create queue", resp).await),
        }
    }

    #[tracing::instrument(skip_all, err, name = "Queue:Send", fields(queue = %self.queue_name))]
    async fn send(&self, message: QueueMessage) -> Result<(), QueueError> {
        let size = message.payload().len();
        if size > MAX_MESSAGE_BYTES {
            return Err(QueueError::new(
                QueueErrorKind::Rejected,
                format!("message of {size} bytes exceeds the {MAX_MESSAGE_BYTES} byte limit"),
            )
            .with_code("MessageTooLarge"));
        }

        let body = format!(
            "<?xml version=\"1.0\" encoding=\"utf-8\"?><QueueMessage><MessageText>{}</MessageText></QueueMessage>",
            message.payload()
        );
        let resp = self
            .request(
                Method::POST,
                &self.messages_url,
                body.into_bytes(),
                Some(XML_CONTENT_TYPE),
            )?
            .send()
            .await
            .map_err(|e| transport_error("put message", e))?;

        match resp.status() {
            StatusCode::CREATED => Ok(()),
            _ => Err(status_error("put message", resp).await),
        }
    }
}

/// Check a queue name against the service's naming rules: 3 to 63
/// characters of lowercase letters, digits and single hyphens, starting and
/// ending with a letter or digit.
pub fn validate_queue_name(name: &str) -> Result<(), QueueError> {
    let invalid = |reason: &str| {
        Err(QueueError::configuration(format!(
            "invalid queue name {name:?}: {reason}"
        )))
    };
    if !(3..=63).contains(&name.len()) {
        return invalid("must be 3 to 63 characters long");
    }
    if !name
        .bytes()
        .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
    {
        return invalid("only lowercase letters, digits and hyphens are allowed");
    }
    if name.starts_with('-') || name.ends_with('-') {
        return invalid("must start and end with a letter or digit");
    }
    if name.contains("--") {
        return invalid("consecutive hyphens are not allowed");
    }
    Ok(())
}

fn error_code(resp: &Response) -> Option<&str> {
    resp.headers()
        .get(ERROR_CODE_HEADER)
        .and_then(|v| v.to_str().ok())
}

/// Classify a broker response status.
fn kind_for_status(status: StatusCode) -> QueueErrorKind {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => QueueErrorKind::Authorization,
        StatusCode::REQUEST_TIMEOUT | StatusCode::TOO_MANY_REQUESTS => QueueErrorKind::Transient,
        s if s.is_server_error() => QueueErrorKind::Transient,
        _ => QueueErrorKind::Rejected,
    }
}

/// Classify a failure to get any response at all.
fn kind_for_transport(error: &reqwest::Error) -> QueueErrorKind {
    if error.is_timeout() {
        QueueErrorKind::Timeout
    } else {
        QueueErrorKind::Connectivity
    }
}

fn transport_error(operation: &str, error: reqwest::Error) -> QueueError {
    QueueError::new(
        kind_for_transport(&error),
        format!("{operation} request failed"),
    )
    .with_source(error)
}

async fn status_error(operation: &str, resp: Response) -> QueueError {
    let status = resp.status();
    let code = error_code(&resp).map(str::to_owned);
    let body = resp.text().await.unwrap_or_default();
    let mut error = QueueError::new(
        kind_for_status(status),
        format!(
            "{operation} returned HTTP {status}: {}",
            broker_message(&body).unwrap_or("no error message")
        ),
    );
    if let Some(code) = code {
        error = error.with_code(code);
    }
    error
}

/// Extract `<Message>` from a storage error body.
fn broker_message(body: &str) -> Option<&str> {
    let start = body.find("<Message>")? + "<Message>".len();
    let end = body[start..].find("</Message>")? + start;
    Some(body[start..end].trim())
}
