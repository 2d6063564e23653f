//! The request function and its derived instances.
//!
//! # Design
//! `Client` holds read-only `defaults` and the transport it was constructed
//! with. Each call merges its own configuration over the defaults, builds a
//! fresh `HttpRequest`, awaits the transport once and normalizes the
//! response. Nothing is shared mutably between calls, so one `Client` can
//! serve any number of concurrent requests.

use std::sync::Arc;

use log::{debug, warn};
use serde::Serialize;

use crate::builder::{build, Route};
use crate::config::RequestConfig;
use crate::error::{Error, RequestError, TransportError};
use crate::http::HttpRequest;
use crate::merge::Merge;
use crate::params::{to_params, Params};
use crate::response::{normalize, Response};
use crate::transport::{dispatch, Transport, UreqTransport};

/// Status attached to errors raised before any HTTP status was received.
const INTERNAL_ERROR: u16 = 500;

/// Configured request function.
#[derive(Clone)]
pub struct Client {
    defaults: Arc<RequestConfig>,
    transport: Arc<dyn Transport>,
}

impl Default for Client {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("defaults", &self.defaults)
            .finish_non_exhaustive()
    }
}

impl Client {
    /// Library defaults over the ureq transport.
    pub fn new() -> Self {
        Self::with_transport(Arc::new(UreqTransport))
    }

    pub fn with_transport(transport: Arc<dyn Transport>) -> Self {
        Self {
            defaults: Arc::new(RequestConfig::library_defaults().normalize()),
            transport,
        }
    }

    /// Derive a client whose defaults are these defaults with `config`
    /// merged on top. The transport is shared.
    pub fn create(&self, config: RequestConfig) -> Self {
        Self {
            defaults: Arc::new(self.defaults.merge(&config.lowercase_headers()).normalize()),
            transport: Arc::clone(&self.transport),
        }
    }

    pub fn defaults(&self) -> &RequestConfig {
        &self.defaults
    }

    /// Send `route` (`"METHOD URL"` or `"URL"`) with `params`.
    ///
    /// `params` may be any value serializing to a map, or `()` for none.
    pub async fn request(
        &self,
        route: &str,
        params: impl Serialize,
        config: RequestConfig,
    ) -> Result<Response, Error> {
        let route = Route::parse(route)?;
        self.send(route, to_params(&params)?, config).await
    }

    /// Send to the URL preconfigured in `config.url` or the defaults,
    /// falling back to `base_url` alone.
    pub async fn call(&self, params: impl Serialize, config: RequestConfig) -> Result<Response, Error> {
        let url = config
            .url
            .clone()
            .or_else(|| self.defaults.url.clone())
            .unwrap_or_default();
        let route = Route { method: None, url };
        self.send(route, to_params(&params)?, config).await
    }

    /// Resolve configuration layers and build the request without sending it.
    pub fn prepare(
        &self,
        route: &str,
        params: impl Serialize,
        config: RequestConfig,
    ) -> Result<HttpRequest, Error> {
        let route = Route::parse(route)?;
        let (request, _) = self.resolve(&route, &to_params(&params)?, config)?;
        Ok(request)
    }

    /// Per-call method, then the route's, then the inherited one.
    fn resolve(
        &self,
        route: &Route,
        params: &Params,
        config: RequestConfig,
    ) -> Result<(HttpRequest, RequestConfig), Error> {
        let call = config.lowercase_headers();
        let mut merged = self.defaults.merge(&call).normalize();
        merged.method = call.method.or(route.method).or(self.defaults.method);
        merged.url = Some(route.url.clone());
        let request = build(route, params, &merged)?;
        merged.method = Some(request.method);
        Ok((request, merged))
    }

    async fn send(&self, route: Route, params: Params, config: RequestConfig) -> Result<Response, Error> {
        let (request, config) = self.resolve(&route, &params, config)?;
        let transport = config
            .request
            .as_ref()
            .and_then(|options| options.fetch.clone())
            .unwrap_or_else(|| Arc::clone(&self.transport));
        let method = request.method;

        debug!("{} {}", method, request.url);
        let raw = match dispatch(transport.as_ref(), request).await {
            Ok(raw) => raw,
            Err(TransportError::Request(err)) => return Err(Error::Request(err)),
            Err(err) => {
                warn!("{} {} failed: {}", method, route.url, err);
                return Err(RequestError::new(err.to_string(), INTERNAL_ERROR, config, None).into());
            }
        };
        debug!("{} {} -> {}", method, raw.url, raw.status);
        normalize(raw, method, &config)
    }
}
