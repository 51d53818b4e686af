//! Error types for the portal API client.
//!
//! # Design
//! Every failed call produces exactly one `ApiError`: a status, a message
//! that is always non-empty and fit to show an end user, and an `ErrorKind`
//! carrying whatever the failure left behind (the transport error, the
//! normalized response body, or the serde error).
//!
//! Status `0` means no response was obtained, either because the transport
//! failed or because the request was rejected locally before sending (an
//! unencodable body or an invalid header). Anything above `0` is the status
//! of a response the server actually sent; for a `Decode` error that status is
//! a 2xx whose body did not match the requested type. Branch on `kind()` or
//! the `is_*` helpers, not on the status value alone.

use serde_json::Value;
use thiserror::Error;

use crate::normalize::ErrorBody;

pub const NETWORK_ERROR_MESSAGE: &str = "Network error";
pub const GENERIC_ERROR_MESSAGE: &str = "An error occurred";
pub const ENCODE_ERROR_MESSAGE: &str = "Invalid request payload";
pub const DECODE_ERROR_MESSAGE: &str = "Unexpected response from server";
pub const INVALID_HEADER_MESSAGE: &str = "Invalid request header";

/// Status used when no response was received.
pub const NO_RESPONSE: u16 = 0;

/// Failure raised by a `Transport` before any response was obtained.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct TransportError(Box<dyn std::error::Error + Send + Sync>);

impl TransportError {
    pub fn new(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self(err.into())
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        Self::new(err)
    }
}

/// What went wrong, with the original payload attached.
#[derive(Debug, Error)]
pub enum ErrorKind {
    /// No response: connection refused, DNS failure, body read aborted.
    #[error("transport failure")]
    Transport(#[source] TransportError),

    /// The request body could not be serialized, so nothing was sent.
    /// Status is `0` but this is not a network failure.
    #[error("request body could not be encoded")]
    Encode(#[source] serde_json::Error),

    /// A header name or value is not valid HTTP, so nothing was sent.
    /// Status is `0` but this is not a network failure.
    #[error("invalid header '{0}'")]
    InvalidHeader(String),

    /// The server answered with a non-2xx status.
    #[error("server rejected the request")]
    Rejected(ErrorBody),

    /// A 2xx body did not parse into the requested type. The status is the
    /// successful one the server sent.
    #[error("response body could not be decoded")]
    Decode(#[source] serde_json::Error),
}

/// The single error type returned by `ApiClient` calls.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ApiError {
    status: u16,
    message: String,
    #[source]
    kind: ErrorKind,
}

impl ApiError {
    pub fn transport(err: TransportError) -> Self {
        Self {
            status: NO_RESPONSE,
            message: NETWORK_ERROR_MESSAGE.to_string(),
            kind: ErrorKind::Transport(err),
        }
    }

    pub fn encode(err: serde_json::Error) -> Self {
        Self {
            status: NO_RESPONSE,
            message: ENCODE_ERROR_MESSAGE.to_string(),
            kind: ErrorKind::Encode(err),
        }
    }

    pub fn invalid_header(name: &str) -> Self {
        Self {
            status: NO_RESPONSE,
            message: INVALID_HEADER_MESSAGE.to_string(),
            kind: ErrorKind::InvalidHeader(name.to_string()),
        }
    }

    pub fn decode(status: u16, err: serde_json::Error) -> Self {
        Self {
            status,
            message: DECODE_ERROR_MESSAGE.to_string(),
            kind: ErrorKind::Decode(err),
        }
    }

    /// A rejected response. The message comes from the body when it has one.
    pub fn rejected(status: u16, body: ErrorBody) -> Self {
        let message = body
            .message()
            .unwrap_or(GENERIC_ERROR_MESSAGE)
            .to_string();
        Self {
            status,
            message,
            kind: ErrorKind::Rejected(body),
        }
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    /// The parsed JSON error body, when the server sent one.
    pub fn payload(&self) -> Option<&Value> {
        match &self.kind {
            ErrorKind::Rejected(body) => body.payload(),
            _ => None,
        }
    }

    /// The transport failed before any response arrived.
    pub fn is_network(&self) -> bool {
        matches!(self.kind, ErrorKind::Transport(_))
    }

    /// The request never left the client: bad body or bad header.
    pub fn is_local(&self) -> bool {
        matches!(self.kind, ErrorKind::Encode(_) | ErrorKind::InvalidHeader(_))
    }

    /// The server answered with a non-2xx status.
    pub fn is_rejected(&self) -> bool {
        matches!(self.kind, ErrorKind::Rejected(_))
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status == 401
    }
}
