//! HTTP transport types exchanged with the transport primitive.
//!
//! # Design
//! These types describe an outbound request and the raw inbound response as
//! plain data. The request builder produces an `HttpRequest`, a `Transport`
//! turns it into an `HttpResponse`, and the response normalizer consumes that.
//! Only the transport ever touches the network.

use std::any::Any;
use std::fmt;
use std::io::Read;
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;
use tokio_util::sync::CancellationToken;

use crate::error::Error;

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Head,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Head => "HEAD",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }

    /// GET and HEAD route leftover parameters to the query string; every
    /// other method carries them in the body.
    pub fn can_have_body(self) -> bool {
        !matches!(self, HttpMethod::Get | HttpMethod::Head)
    }
}

impl FromStr for HttpMethod {
    type Err = Error;

    /// Case-insensitive, so `"post"` and `"POST"` parse the same.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(HttpMethod::Get),
            "HEAD" => Ok(HttpMethod::Head),
            "POST" => Ok(HttpMethod::Post),
            "PUT" => Ok(HttpMethod::Put),
            "PATCH" => Ok(HttpMethod::Patch),
            "DELETE" => Ok(HttpMethod::Delete),
            _ => Err(Error::UnsupportedMethod(s.to_string())),
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Take-once streaming request body.
///
/// Clones share the same underlying reader; the first transport to call
/// `take` consumes it and later callers see `None`.
#[derive(Clone)]
pub struct BodyStream(Arc<Mutex<Option<Box<dyn Read + Send>>>>);

impl BodyStream {
    pub fn new(reader: impl Read + Send + 'static) -> Self {
        Self(Arc::new(Mutex::new(Some(Box::new(reader)))))
    }

    pub fn take(&self) -> Option<Box<dyn Read + Send>> {
        match self.0.lock() {
            Ok(mut slot) => slot.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        }
    }
}

impl fmt::Debug for BodyStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BodyStream(..)")
    }
}

/// A request body handed verbatim to the transport.
#[derive(Debug, Clone)]
pub enum Body {
    Text(String),
    Binary(Bytes),
    Stream(BodyStream),
}

impl Body {
    /// The body as text, when it is not a stream and is valid UTF-8.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Body::Text(s) => Some(s),
            Body::Binary(b) => std::str::from_utf8(b).ok(),
            Body::Stream(_) => None,
        }
    }
}

impl From<String> for Body {
    fn from(s: String) -> Self {
        Body::Text(s)
    }
}

impl From<&str> for Body {
    fn from(s: &str) -> Self {
        Body::Text(s.to_string())
    }
}

impl From<Vec<u8>> for Body {
    fn from(b: Vec<u8>) -> Self {
        Body::Binary(Bytes::from(b))
    }
}

impl From<Bytes> for Body {
    fn from(b: Bytes) -> Self {
        Body::Binary(b)
    }
}

/// Opaque, transport-specific connection option.
pub type Agent = Arc<dyn Any + Send + Sync>;

/// A transport-ready request: absolute URL, method, headers, optional body
/// and the pass-through options the transport may honor.
#[derive(Clone)]
pub struct HttpRequest {
    pub url: String,
    pub method: HttpMethod,
    pub headers: Vec<(String, String)>,
    pub body: Option<Body>,
    pub signal: Option<CancellationToken>,
    pub timeout: Option<Duration>,
    pub agent: Option<Agent>,
}

impl HttpRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

impl fmt::Debug for HttpRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpRequest")
            .field("url", &self.url)
            .field("method", &self.method)
            .field("headers", &self.headers)
            .field("body", &self.body)
            .field("signal", &self.signal)
            .field("timeout", &self.timeout)
            .field("agent", &self.agent.as_ref().map(|_| ".."))
            .finish()
    }
}

/// Raw response as returned by the transport, before content classification.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// Final URL after any redirects the transport followed.
    pub url: String,
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}
