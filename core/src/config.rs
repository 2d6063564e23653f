//! Layered request configuration.
//!
//! # Design
//! A configuration is a partially specified record. Layers stack as library
//! defaults, then instance defaults (`Client::create`), then the per-call
//! override; `Merge` folds them with later layers winning. Every layer is
//! normalized (lowercase header names, absent header values dropped) before
//! it is merged.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::http::{Agent, Body, HttpMethod};
use crate::merge::{merge_nested, replace, Merge};
use crate::transport::Transport;

/// Header name to value. `None` marks a header explicitly left unset.
pub type Headers = BTreeMap<String, Option<String>>;

/// Transport-specific options passed through to the transport primitive.
#[derive(Clone, Default)]
pub struct RequestOptions {
    /// Cancellation token forwarded verbatim to the transport.
    pub signal: Option<CancellationToken>,
    /// Abort the transport call when it runs longer than this.
    pub timeout: Option<Duration>,
    /// Opaque connection option; `UreqTransport` recognizes a `ureq::Agent`.
    pub agent: Option<Agent>,
    /// Transport used instead of the client's own.
    pub fetch: Option<Arc<dyn Transport>>,
    /// Raw body sent as is, bypassing parameter serialization.
    pub data: Option<Body>,
}

impl Merge for RequestOptions {
    fn merge(&self, over: &Self) -> Self {
        Self {
            signal: replace(&self.signal, &over.signal),
            timeout: replace(&self.timeout, &over.timeout),
            agent: replace(&self.agent, &over.agent),
            fetch: replace(&self.fetch, &over.fetch),
            data: replace(&self.data, &over.data),
        }
    }
}

impl fmt::Debug for RequestOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestOptions")
            .field("signal", &self.signal)
            .field("timeout", &self.timeout)
            .field("agent", &self.agent.as_ref().map(|_| ".."))
            .field("fetch", &self.fetch.as_ref().map(|_| ".."))
            .field("data", &self.data)
            .finish()
    }
}

/// One configuration layer. Every field is optional.
#[derive(Debug, Clone, Default)]
pub struct RequestConfig {
    pub url: Option<String>,
    pub base_url: Option<String>,
    pub method: Option<HttpMethod>,
    pub headers: Headers,
    pub request: Option<RequestOptions>,
}

impl Merge for RequestConfig {
    fn merge(&self, over: &Self) -> Self {
        Self {
            url: replace(&self.url, &over.url),
            base_url: replace(&self.base_url, &over.base_url),
            method: replace(&self.method, &over.method),
            headers: self.headers.merge(&over.headers),
            request: merge_nested(&self.request, &over.request),
        }
    }
}

impl RequestConfig {
    /// Built-in defaults every `Client` starts from.
    pub fn library_defaults() -> Self {
        Self::default()
            .with_header(
                "user-agent",
                concat!("clientele-core.rs/", env!("CARGO_PKG_VERSION")),
            )
            .with_header("content-type", "application/json; charset=utf-8")
    }

    /// Lowercase header names and drop headers without a value.
    ///
    /// Idempotent. `method` is already canonical once parsed.
    pub fn normalize(self) -> Self {
        let mut normalized = self.lowercase_headers();
        normalized.headers = normalized
            .headers
            .into_iter()
            .filter(|(_, value)| value.is_some())
            .collect();
        normalized
    }

    /// Lowercase header names but keep unset markers, so this layer can
    /// still remove an inherited header when merged over it.
    pub(crate) fn lowercase_headers(mut self) -> Self {
        self.headers = self
            .headers
            .into_iter()
            .map(|(name, value)| (name.to_ascii_lowercase(), value))
            .collect();
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_method(mut self, method: HttpMethod) -> Self {
        self.method = Some(method);
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), Some(value.into()));
        self
    }

    /// Remove a header inherited from the defaults for this layer.
    pub fn without_header(mut self, name: impl Into<String>) -> Self {
        self.headers.insert(name.into(), None);
        self
    }

    pub fn with_signal(mut self, signal: CancellationToken) -> Self {
        self.options_mut().signal = Some(signal);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.options_mut().timeout = Some(timeout);
        self
    }

    pub fn with_agent(mut self, agent: Agent) -> Self {
        self.options_mut().agent = Some(agent);
        self
    }

    pub fn with_fetch(mut self, fetch: Arc<dyn Transport>) -> Self {
        self.options_mut().fetch = Some(fetch);
        self
    }

    pub fn with_data(mut self, data: impl Into<Body>) -> Self {
        self.options_mut().data = Some(data.into());
        self
    }

    fn options_mut(&mut self) -> &mut RequestOptions {
        self.request.get_or_insert_with(RequestOptions::default)
    }

    /// Header value after normalization, if set.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.as_deref())
    }

    /// Headers with a value, in name order.
    pub(crate) fn header_pairs(&self) -> Vec<(String, String)> {
        self.headers
            .iter()
            .filter_map(|(k, v)| v.as_ref().map(|v| (k.clone(), v.clone())))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_lowercases_and_drops_absent_headers() {
        let config = RequestConfig::default()
            .with_header("Content-Type", "text/plain")
            .without_header("X-Unset")
            .normalize();
        assert_eq!(config.header("content-type"), Some("text/plain"));
        assert!(!config.headers.contains_key("x-unset"));
        assert!(!config.headers.contains_key("Content-Type"));
    }

    #[test]
    fn normalize_is_idempotent() {
        let once = RequestConfig::default()
            .with_header("Accept", "application/json")
            .with_header("X-Trace", "1")
            .without_header("If-None-Match")
            .normalize();
        let twice = once.clone().normalize();
        assert_eq!(once.headers, twice.headers);
    }

    #[test]
    fn unset_marker_removes_inherited_header() {
        let defaults = RequestConfig::library_defaults().normalize();
        let call = RequestConfig::default().without_header("User-Agent");
        let merged = defaults.merge(&call.lowercase_headers()).normalize();
        assert_eq!(merged.header("user-agent"), None);
        assert!(merged.header("content-type").is_some());
    }

    #[test]
    fn later_layer_wins_per_header_key() {
        let defaults = RequestConfig::library_defaults();
        let call = RequestConfig::default()
            .with_header("content-type", "text/plain")
            .with_header("accept", "application/vnd.test+json");
        let merged = defaults.merge(&call);
        assert_eq!(merged.header("content-type"), Some("text/plain"));
        assert_eq!(merged.header("accept"), Some("application/vnd.test+json"));
        assert!(merged.header("user-agent").unwrap().starts_with("clientele-core.rs/"));
    }

    #[test]
    fn scalars_replace_and_missing_fields_inherit() {
        let base = RequestConfig::default()
            .with_base_url("https://a.test")
            .with_method(HttpMethod::Post);
        let over = RequestConfig::default().with_base_url("https://b.test");
        let merged = base.merge(&over);
        assert_eq!(merged.base_url.as_deref(), Some("https://b.test"));
        assert_eq!(merged.method, Some(HttpMethod::Post));
    }

    #[test]
    fn request_options_merge_field_by_field() {
        let base = RequestConfig::default().with_timeout(Duration::from_secs(5));
        let over = RequestConfig::default().with_data("raw");
        let merged = base.merge(&over);
        let options = merged.request.unwrap();
        assert_eq!(options.timeout, Some(Duration::from_secs(5)));
        assert_eq!(options.data.as_ref().and_then(Body::as_text), Some("raw"));
    }

    #[test]
    fn merge_is_stable_under_repeated_override() {
        let x = RequestConfig::library_defaults().with_base_url("https://x.test");
        let y = RequestConfig::default()
            .with_header("accept", "text/html")
            .with_timeout(Duration::from_millis(250));
        let once = x.merge(&y);
        let twice = once.merge(&y);
        assert_eq!(once.headers, twice.headers);
        assert_eq!(once.base_url, twice.base_url);
        assert_eq!(
            once.request.as_ref().and_then(|r| r.timeout),
            twice.request.as_ref().and_then(|r| r.timeout)
        );
    }

    #[test]
    fn merge_does_not_mutate_inputs() {
        let x = RequestConfig::default().with_header("a", "1");
        let y = RequestConfig::default().with_header("b", "2");
        let _ = x.merge(&y);
        assert_eq!(x.headers.len(), 1);
        assert_eq!(y.headers.len(), 1);
    }
}
