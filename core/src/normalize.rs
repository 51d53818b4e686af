//! Turns a non-2xx `HttpResponse` into an `ApiError`.
//!
//! Backends answer failures in whatever shape they like. The usual one is a
//! JSON object with an optional `message` and an optional `error`, but plain
//! text bodies, HTML error pages, and empty bodies all show up too. The
//! normalizer tries, in order:
//!
//! 1. a JSON content type with a body matching `ErrorResponse`,
//! 2. the raw body text (non-JSON content type, or JSON that failed to parse),
//! 3. a generic message.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ApiError;
use crate::http::{HttpResponse, APPLICATION_JSON};

/// The error body shape most portal endpoints return.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ErrorResponse {
    /// `message` if it is non-blank, else `error` if it is non-blank.
    pub fn text(&self) -> Option<&str> {
        non_blank(self.message.as_deref()).or_else(|| non_blank(self.error.as_deref()))
    }
}

/// What the normalizer could make of an error body.
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorBody {
    /// JSON matching `ErrorResponse` with a usable `message` or `error`.
    Structured { response: ErrorResponse, payload: Value },
    /// Body text, used verbatim (trimmed) as the message.
    RawText(String),
    /// Nothing displayable. Keeps the parsed JSON if there was any.
    Empty { payload: Option<Value> },
}

impl ErrorBody {
    pub fn message(&self) -> Option<&str> {
        match self {
            ErrorBody::Structured { response, .. } => response.text(),
            ErrorBody::RawText(text) => Some(text),
            ErrorBody::Empty { .. } => None,
        }
    }

    pub fn payload(&self) -> Option<&Value> {
        match self {
            ErrorBody::Structured { payload, .. } => Some(payload),
            ErrorBody::Empty { payload } => payload.as_ref(),
            ErrorBody::RawText(_) => None,
        }
    }
}

/// Build the `ApiError` for a response that was not a success.
pub fn normalize(response: &HttpResponse) -> ApiError {
    ApiError::rejected(response.status, classify(response))
}

/// Classify an error body without attaching a status.
pub fn classify(response: &HttpResponse) -> ErrorBody {
    if !is_json(response.content_type()) {
        return raw_text(&response.body);
    }
    match serde_json::from_str::<Value>(&response.body) {
        Ok(payload) => structured(payload),
        Err(_) => raw_text(&response.body),
    }
}

fn structured(payload: Value) -> ErrorBody {
    if !payload.is_object() {
        return ErrorBody::Empty {
            payload: Some(payload),
        };
    }
    match ErrorResponse::deserialize(&payload) {
        Ok(response) if response.text().is_some() => ErrorBody::Structured { response, payload },
        _ => ErrorBody::Empty {
            payload: Some(payload),
        },
    }
}

fn raw_text(body: &str) -> ErrorBody {
    match non_blank(Some(body)) {
        Some(text) => ErrorBody::RawText(text.to_string()),
        None => ErrorBody::Empty { payload: None },
    }
}

fn non_blank(text: Option<&str>) -> Option<&str> {
    text.map(str::trim).filter(|t| !t.is_empty())
}

/// `application/json` or any `+json` structured suffix, ignoring case and
/// media type parameters.
fn is_json(content_type: Option<&str>) -> bool {
    let Some(content_type) = content_type else {
        return false;
    };
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    essence == APPLICATION_JSON || essence.ends_with("+json")
}
