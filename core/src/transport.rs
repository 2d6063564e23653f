//! The transport primitive and its default implementation.
//!
//! # Design
//! The transport is the only component that performs I/O. It is injected
//! into `Client` at construction and can be replaced per call through
//! `RequestOptions::fetch`. Any async closure taking an `HttpRequest` is a
//! transport, which keeps test doubles to a few lines.
//!
//! `UreqTransport` runs a blocking ureq call on tokio's blocking pool and
//! races it against the request's cancellation token.

use std::future::Future;
use std::io::{Cursor, Read};
use std::time::Duration;

use futures::future::BoxFuture;
use tokio_util::sync::CancellationToken;
use ureq::{AsSendBody, ResponseExt, SendBody};

use crate::error::TransportError;
use crate::http::{Body, HttpRequest, HttpResponse};

pub type TransportResult = Result<HttpResponse, TransportError>;

/// Performs one HTTP round-trip.
pub trait Transport: Send + Sync {
    fn fetch(&self, request: HttpRequest) -> BoxFuture<'static, TransportResult>;
}

impl<F, Fut> Transport for F
where
    F: Fn(HttpRequest) -> Fut + Send + Sync,
    Fut: Future<Output = TransportResult> + Send + 'static,
{
    fn fetch(&self, request: HttpRequest) -> BoxFuture<'static, TransportResult> {
        Box::pin(self(request))
    }
}

/// Run the transport, enforcing `request.timeout` by racing a timer.
///
/// On expiry the transport's cancellation token is cancelled so it can stop
/// work; the caller's own token is only ever a parent and is left alone.
pub(crate) async fn dispatch(
    transport: &dyn Transport,
    mut request: HttpRequest,
) -> TransportResult {
    let Some(timeout) = request.timeout else {
        return transport.fetch(request).await;
    };
    let token = match &request.signal {
        Some(parent) => parent.child_token(),
        None => CancellationToken::new(),
    };
    request.signal = Some(token.clone());
    match tokio::time::timeout(timeout, transport.fetch(request)).await {
        Ok(result) => result,
        Err(_) => {
            token.cancel();
            Err(TransportError::TimedOut(timeout))
        }
    }
}

/// Default transport backed by `ureq`.
///
/// Cancelling the signal stops the wait, not the request: the blocking call
/// already in flight runs to completion in the background.
#[derive(Debug, Clone, Copy, Default)]
pub struct UreqTransport;

impl Transport for UreqTransport {
    fn fetch(&self, request: HttpRequest) -> BoxFuture<'static, TransportResult> {
        Box::pin(async move {
            let signal = request.signal.clone();
            if signal.as_ref().is_some_and(CancellationToken::is_cancelled) {
                return Err(TransportError::Aborted);
            }
            let call = tokio::task::spawn_blocking(move || execute(request));
            let joined = match signal {
                Some(signal) => tokio::select! {
                    _ = signal.cancelled() => return Err(TransportError::Aborted),
                    joined = call => joined,
                },
                None => call.await,
            };
            joined.unwrap_or_else(|e| Err(TransportError::Network(e.to_string())))
        })
    }
}

fn agent_for(request: &HttpRequest) -> ureq::Agent {
    let custom = request
        .agent
        .as_ref()
        .and_then(|agent| agent.downcast_ref::<ureq::Agent>());
    match custom {
        Some(agent) => agent.clone(),
        None => ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(request.timeout)
            .build()
            .new_agent(),
    }
}

/// Blocking round-trip. Runs on the blocking pool.
fn execute(request: HttpRequest) -> TransportResult {
    let agent = agent_for(&request);
    let timeout = request.timeout.unwrap_or_default();
    let mut builder = ureq::http::Request::builder()
        .method(request.method.as_str())
        .uri(&request.url);
    for (name, value) in &request.headers {
        builder = builder.header(name, value);
    }
    match request.body {
        None => run(&agent, builder, (), timeout),
        Some(Body::Text(text)) => run(&agent, builder, text.into_bytes(), timeout),
        Some(Body::Binary(bytes)) => run(&agent, builder, bytes.to_vec(), timeout),
        Some(Body::Stream(stream)) => {
            let mut reader: Box<dyn Read + Send> = match stream.take() {
                Some(reader) => reader,
                None => Box::new(Cursor::new(Vec::new())),
            };
            run(&agent, builder, SendBody::from_reader(&mut reader), timeout)
        }
    }
}

fn run(
    agent: &ureq::Agent,
    builder: ureq::http::request::Builder,
    body: impl AsSendBody,
    timeout: Duration,
) -> TransportResult {
    let request = builder
        .body(body)
        .map_err(|e| TransportError::Network(e.to_string()))?;
    // Caller-supplied agents default to failing on >= 400; statuses are
    // classified by the response normalizer instead.
    let request = agent
        .configure_request(request)
        .http_status_as_error(false)
        .build();
    let mut response = agent.run(request).map_err(|e| match e {
        ureq::Error::Timeout(_) => TransportError::TimedOut(timeout),
        other => TransportError::Network(other.to_string()),
    })?;

    let url = response.get_uri().to_string();
    let status = response.status().as_u16();
    let headers = response
        .headers()
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_string(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            )
        })
        .collect();
    let body = response
        .body_mut()
        .read_to_vec()
        .map_err(|e| TransportError::Network(e.to_string()))?;

    Ok(HttpResponse {
        url,
        status,
        headers,
        body: body.into(),
    })
}
