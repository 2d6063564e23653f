//! Error types for the request pipeline.
//!
//! # Design
//! Construction problems (blank URL, unknown method, unencodable body) are
//! reported before anything is sent. Everything that goes wrong after the
//! request leaves the builder becomes a `RequestError`, which always carries
//! a redacted copy of the configuration that produced it.

use std::time::Duration;

use crate::config::RequestConfig;
use crate::response::Response;

/// Errors returned by `Client` and the request builder.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The resolved URL template (after joining `base_url`) was empty.
    #[error("URL cannot be blank")]
    BlankUrl,

    /// The route or configuration named a method this library does not send.
    #[error("unsupported HTTP method `{0}`")]
    UnsupportedMethod(String),

    /// The remaining parameters could not be serialized to a JSON body.
    #[error("serialization failed: {0}")]
    SerializationError(String),

    /// A response body could not be deserialized into the requested type.
    #[error("deserialization failed: {0}")]
    DeserializationError(String),

    /// The transport failed or the server answered with an error status.
    #[error(transparent)]
    Request(Box<RequestError>),
}

impl Error {
    /// The wrapped `RequestError`, if this is a transport or HTTP failure.
    pub fn as_request_error(&self) -> Option<&RequestError> {
        match self {
            Error::Request(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RequestError> for Error {
    fn from(err: RequestError) -> Self {
        Error::Request(Box::new(err))
    }
}

const REDACTED: &str = "[REDACTED]";

/// A failed request: network failure, 304, or any status >= 400.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct RequestError {
    pub message: String,
    pub status: u16,
    /// Copy of the request configuration with credentials redacted.
    pub config: RequestConfig,
    pub response: Option<Response>,
}

impl RequestError {
    pub const NAME: &'static str = "ClienteleRequestError";

    pub fn new(
        message: impl Into<String>,
        status: u16,
        config: RequestConfig,
        response: Option<Response>,
    ) -> Self {
        Self {
            message: message.into(),
            status,
            config: redact(config),
            response,
        }
    }

    pub fn name(&self) -> &'static str {
        Self::NAME
    }
}

/// Keep the auth scheme of an `authorization` header, drop the credential.
fn redact(mut config: RequestConfig) -> RequestConfig {
    if let Some(Some(value)) = config.headers.get_mut("authorization") {
        *value = match value.split_once(char::is_whitespace) {
            Some((scheme, _)) => format!("{scheme} {REDACTED}"),
            None => REDACTED.to_string(),
        };
    }
    config
}

/// Failure reported by a `Transport`.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("request aborted")]
    Aborted,

    #[error("request timed out after {0:?}")]
    TimedOut(Duration),

    #[error("network error: {0}")]
    Network(String),

    /// Already normalized; passed through without another wrapping layer.
    #[error(transparent)]
    Request(Box<RequestError>),
}

impl From<RequestError> for TransportError {
    fn from(err: RequestError) -> Self {
        TransportError::Request(Box::new(err))
    }
}
