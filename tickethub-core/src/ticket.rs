//! Ticket Request Model.
//!
//! Turns a raw, untrusted request body into a [`TicketRequest`]. Only
//! presence and shape are checked; the purchase attributes beyond
//! `ConcertId` and `Email` are carried through untouched.

use std::collections::BTreeMap;
use std::fmt;
use tickethub_sdk::objects::{ConcertId, TicketMessage};

const CONCERT_ID: &str = "ConcertId";
const EMAIL: &str = "Email";
const ROOT: &str = "$";

/// A request body as it arrived, before validation.
#[derive(Debug, Clone, PartialEq)]
pub struct RawTicketRequest(pub serde_json::Value);

impl From<serde_json::Value> for RawTicketRequest {
    fn from(value: serde_json::Value) -> Self {
        Self(value)
    }
}

/// A validated ticket purchase.
///
/// Only [`validate`] constructs one, so holding a `TicketRequest` means every
/// declared constraint passed.
#[derive(Debug, Clone, PartialEq)]
pub struct TicketRequest {
    concert_id: ConcertId,
    email: String,
    attributes: serde_json::Map<String, serde_json::Value>,
}

impl TicketRequest {
    pub fn concert_id(&self) -> &ConcertId {
        &self.concert_id
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    /// Pass-through purchase attributes, keyed as the client sent them.
    pub fn attributes(&self) -> &serde_json::Map<String, serde_json::Value> {
        &self.attributes
    }

    /// Build the wire shape consumed by the codec.
    pub fn to_message(&self) -> TicketMessage {
        TicketMessage {
            concert_id: self.concert_id.clone(),
            email: self.email.clone(),
            attributes: self.attributes.clone(),
        }
    }
}

/// Every field-level problem found in a request body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationError {
    errors: BTreeMap<String, Vec<String>>,
}

impl ValidationError {
    fn push(&mut self, field: &str, message: String) {
        self.errors
            .entry(field.to_string())
            .or_default()
            .push(message);
    }

    fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Failing field names mapped to their messages.
    pub fn errors(&self) -> &BTreeMap<String, Vec<String>> {
        &self.errors
    }

    pub fn into_errors(self) -> BTreeMap<String, Vec<String>> {
        self.errors
    }

    /// An error for a body that could not be parsed at all.
    pub fn malformed_body(reason: impl fmt::Display) -> Self {
        let mut error = Self::default();
        error.push(ROOT, format!("The request body is not valid JSON: {reason}"));
        error
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.errors.contains_key(field)
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.errors {
            for message in messages {
                if !first {
                    f.write_str("; ")?;
                }
                write!(f, "{field}: {message}")?;
                first = false;
            }
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

/// Validate a raw request body.
///
/// Field names are matched case-insensitively. All failures are collected
/// before returning, so the caller can fix every issue in one round trip.
pub fn validate(raw: &serde_json::Value) -> Result<TicketRequest, ValidationError> {
    let mut error = ValidationError::default();

    let Some(object) = raw.as_object() else {
        error.push(ROOT, "The request body must be a JSON object.".to_string());
        return Err(error);
    };

    let mut concert_id = Vec::new();
    let mut email = Vec::new();
    let mut attributes = serde_json::Map::new();
    for (key, value) in object {
        if key.eq_ignore_ascii_case(CONCERT_ID) {
            concert_id.push(value);
        } else if key.eq_ignore_ascii_case(EMAIL) {
            email.push(value);
        } else {
            attributes.insert(key.clone(), value.clone());
        }
    }

    let concert_id = single(CONCERT_ID, &concert_id, &mut error).and_then(|value| {
        parse_concert_id(value).map_err(|message| error.push(CONCERT_ID, message)).ok()
    });
    let email = single(EMAIL, &email, &mut error)
        .and_then(|value| parse_email(value).map_err(|message| error.push(EMAIL, message)).ok());

    match (concert_id, email) {
        (Some(concert_id), Some(email)) if error.is_empty() => Ok(TicketRequest {
            concert_id,
            email,
            attributes,
        }),
        _ => Err(error),
    }
}

/// Pick the one value supplied for a required field, recording an error for
/// absent, null or duplicated fields.
fn single<'a>(
    field: &str,
    values: &[&'a serde_json::Value],
    error: &mut ValidationError,
) -> Option<&'a serde_json::Value> {
    match values {
        [] | [serde_json::Value::Null] => {
            error.push(field, required(field));
            None
        }
        [value] => Some(*value),
        _ => {
            error.push(
                field,
                format!("The {field} field was supplied more than once."),
            );
            None
        }
    }
}

fn required(field: &str) -> String {
    format!("The {field} field is required.")
}

fn parse_concert_id(value: &serde_json::Value) -> Result<ConcertId, String> {
    match value {
        serde_json::Value::Number(n) => match n.as_u64() {
            Some(id) if id > 0 => Ok(ConcertId::Number(id)),
            _ => Err(concert_id_shape()),
        },
        serde_json::Value::String(s) if s.trim().is_empty() => Err(required(CONCERT_ID)),
        serde_json::Value::String(s) => Ok(ConcertId::Text(s.clone())),
        _ => Err(concert_id_shape()),
    }
}

fn concert_id_shape() -> String {
    format!("The {CONCERT_ID} field must be a positive integer or a non-empty string.")
}

fn parse_email(value: &serde_json::Value) -> Result<String, String> {
    let serde_json::Value::String(s) = value else {
        return Err(format!("The {EMAIL} field must be a string."));
    };
    if s.trim().is_empty() {
        return Err(required(EMAIL));
    }
    if !is_plausible_email(s) {
        return Err(format!("The {EMAIL} field is not a valid e-mail address."));
    }
    Ok(s.clone())
}

/// Exactly one `@`, with something on both sides of it.
fn is_plausible_email(s: &str) -> bool {
    let mut parts = s.split('@');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) => !local.is_empty() && !domain.is_empty(),
        _ => false,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_valid_request() {
        let ticket = validate(&json!({
            "ConcertId": 42,
            "Email": "a@b.com",
            "Quantity": 2,
            "SeatClass": "floor"
        }))
        .unwrap();
        assert_eq!(ticket.concert_id(), &ConcertId::Number(42));
        assert_eq!(ticket.email(), "a@b.com");
        assert_eq!(ticket.attributes().len(), 2);
        assert_eq!(ticket.attributes()["Quantity"], json!(2));
    }

    #[test]
    fn test_field_names_are_case_insensitive() {
        let ticket = validate(&json!({"concertId": "abc", "EMAIL": "x@y.org"})).unwrap();
        assert_eq!(ticket.concert_id(), &ConcertId::Text("abc".to_string()));
        assert_eq!(ticket.email(), "x@y.org");
        assert!(ticket.attributes().is_empty());
    }

    #[test]
    fn test_empty_body_lists_every_required_field() {
        let error = validate(&json!({})).unwrap_err();
        assert_eq!(error.errors().len(), 2);
        assert_eq!(
            error.errors()["ConcertId"],
            vec!["The ConcertId field is required.".to_string()]
        );
        assert_eq!(
            error.errors()["Email"],
            vec!["The Email field is required.".to_string()]
        );
    }

    #[test]
    fn test_null_and_blank_count_as_missing() {
        let error = validate(&json!({"ConcertId": null, "Email": "  "})).unwrap_err();
        assert!(error.has_field("ConcertId"));
        assert_eq!(
            error.errors()["Email"],
            vec!["The Email field is required.".to_string()]
        );
    }

    #[test]
    fn test_shape_errors() {
        for bad in [json!(0), json!(-3), json!(1.5), json!(true), json!([1]), json!({})] {
            let error = validate(&json!({"ConcertId": bad, "Email": "a@b.com"})).unwrap_err();
            assert_eq!(error.errors().len(), 1);
            assert!(error.has_field("ConcertId"));
        }

        let error = validate(&json!({"ConcertId": 1, "Email": 5})).unwrap_err();
        assert_eq!(
            error.errors()["Email"],
            vec!["The Email field must be a string.".to_string()]
        );
    }

    #[test]
    fn test_email_format() {
        for bad in ["plain", "@b.com", "a@", "a@b@c"] {
            let error = validate(&json!({"ConcertId": 1, "Email": bad})).unwrap_err();
            assert!(error.has_field("Email"), "{bad} should be rejected");
        }
    }

    #[test]
    fn test_duplicate_casing_is_rejected() {
        let error = validate(&json!({"ConcertId": 1, "concertid": 2, "Email": "a@b.com"}))
            .unwrap_err();
        assert_eq!(
            error.errors()["ConcertId"],
            vec!["The ConcertId field was supplied more than once.".to_string()]
        );
    }

    #[test]
    fn test_non_object_body() {
        let error = validate(&json!([1, 2])).unwrap_err();
        assert!(error.has_field("$"));
        assert_eq!(error.to_string(), "$: The request body must be a JSON object.");
    }
}
