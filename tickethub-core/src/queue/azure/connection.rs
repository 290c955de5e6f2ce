//! Azure Storage connection strings.
//!
//! ```text
//! DefaultEndpointsProtocol=https;AccountName=acct;AccountKey=base64==;EndpointSuffix=core.windows.net
//! QueueEndpoint=https://acct.queue.core.windows.net;SharedAccessSignature=sv=...&sig=...
//! UseDevelopmentStorage=true
//! ```
//!
//! Errors never echo segment values, since any of them may be a secret.

use crate::queue::QueueError;
use std::fmt;
use url::Url;

/// Account name of the local storage emulator.
pub const DEV_ACCOUNT_NAME: &str = "devstoreaccount1";

/// Well-known, public account key of the local storage emulator.
pub const DEV_ACCOUNT_KEY: &str =
    "Eby8vdM02xNOcqFlqUwJPLlmEtlCDXJ1OUzFT50uSRZ6IFsuFq2UVErCz4I6tq/K1SZFPTOtr/KBHBeksoGMGw==";

const DEV_QUEUE_ENDPOINT: &str = "http://127.0.0.1:10001/devstoreaccount1";
const DEFAULT_ENDPOINT_SUFFIX: &str = "core.windows.net";

/// How requests to the queue service are authorized.
#[derive(Clone)]
pub(crate) enum Credential {
    /// Requests are signed with the account key.
    SharedKey { account: String, key: Box<[u8]> },
    /// A pre-signed token is appended to every request URL.
    Sas(String),
}

/// A parsed connection string: where the queue service lives and how to
/// authorize against it.
#[derive(Clone)]
pub struct ConnectionString {
    pub(crate) endpoint: Url,
    pub(crate) credential: Credential,
}

impl fmt::Debug for ConnectionString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let credential = match &self.credential {
            Credential::SharedKey { account, .. } => format!("SharedKey({account})"),
            Credential::Sas(_) => "Sas".to_string(),
        };
        f.debug_struct("ConnectionString")
            .field("endpoint", &self.endpoint.as_str())
            .field("credential", &credential)
            .finish()
    }
}

#[derive(Default)]
struct Segments<'a> {
    protocol: Option<&'a str>,
    account_name: Option<&'a str>,
    account_key: Option<&'a str>,
    endpoint_suffix: Option<&'a str>,
    queue_endpoint: Option<&'a str>,
    sas: Option<&'a str>,
    development: bool,
}

impl ConnectionString {
    /// Parse a connection string.
    pub fn parse(value: &str) -> Result<Self, QueueError> {
        let segments = split_segments(value)?;

        if segments.development {
            return Ok(Self {
                endpoint: parse_endpoint(DEV_QUEUE_ENDPOINT)?,
                credential: Credential::SharedKey {
                    account: DEV_ACCOUNT_NAME.to_string(),
                    key: decode_key(DEV_ACCOUNT_KEY)?,
                },
            });
        }

        let endpoint = match (segments.queue_endpoint, segments.account_name) {
            (Some(endpoint), _) => parse_endpoint(endpoint)?,
            (None, Some(account)) => parse_endpoint(&format!(
                "{}://{account}.queue.{}",
                segments.protocol.unwrap_or("https"),
                segments.endpoint_suffix.unwrap_or(DEFAULT_ENDPOINT_SUFFIX),
            ))?,
            (None, None) => {
                return Err(QueueError::configuration(
                    "connection string has neither QueueEndpoint nor AccountName",
                ));
            }
        };

        let credential = match (segments.sas, segments.account_name, segments.account_key) {
            (Some(sas), _, _) => Credential::Sas(sas.trim_start_matches('?').to_string()),
            (None, Some(account), Some(key)) => Credential::SharedKey {
                account: account.to_string(),
                key: decode_key(key)?,
            },
            _ => {
                return Err(QueueError::configuration(
                    "connection string has neither AccountName/AccountKey nor SharedAccessSignature",
                ));
            }
        };

        Ok(Self {
            endpoint,
            credential,
        })
    }

    /// The queue service endpoint.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// The storage account name, when requests are signed with a key.
    pub fn account_name(&self) -> Option<&str> {
        match &self.credential {
            Credential::SharedKey { account, .. } => Some(account),
            Credential::Sas(_) => None,
        }
    }
}

fn split_segments(value: &str) -> Result<Segments<'_>, QueueError> {
    let mut segments = Segments::default();
    for segment in value.split(';').map(str::trim).filter(|s| !s.is_empty()) {
        let Some((key, value)) = segment.split_once('=') else {
            return Err(QueueError::configuration(
                "connection string contains a segment without '='",
            ));
        };
        let value = value.trim();
        match key.trim() {
            k if k.eq_ignore_ascii_case("DefaultEndpointsProtocol") => {
                segments.protocol = Some(value)
            }
            k if k.eq_ignore_ascii_case("AccountName") => segments.account_name = Some(value),
            k if k.eq_ignore_ascii_case("AccountKey") => segments.account_key = Some(value),
            k if k.eq_ignore_ascii_case("EndpointSuffix") => {
                segments.endpoint_suffix = Some(value)
            }
            k if k.eq_ignore_ascii_case("QueueEndpoint") => segments.queue_endpoint = Some(value),
            k if k.eq_ignore_ascii_case("SharedAccessSignature") => segments.sas = Some(value),
            k if k.eq_ignore_ascii_case("UseDevelopmentStorage") => {
                segments.development = value.eq_ignore_ascii_case("true")
            }
            // Blob/table/file endpoints and the like do not concern the queue service.
            _ => {}
        }
    }
    Ok(segments)
}

fn parse_endpoint(value: &str) -> Result<Url, QueueError> {
    let url = Url::parse(value.trim_end_matches('/'))
        .map_err(|_| QueueError::configuration("queue endpoint is not a valid URL"))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        _ => Err(QueueError::configuration(
            "queue endpoint must use http or https",
        )),
    }
}

fn decode_key(value: &str) -> Result<Box<[u8]>, QueueError> {
    fast32::base64::RFC4648
        .decode_str(value)
        .map(Vec::into_boxed_slice)
        .map_err(|_| QueueError::configuration("AccountKey is not valid base64"))
}
