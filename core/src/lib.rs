//! Route-template HTTP requests with layered configuration.
//!
//! # Overview
//! A request is described by a route (`"POST /repos/{owner}/{repo}/issues"`),
//! a parameter map and configuration layered over instance defaults. The
//! pipeline merges the configuration, expands the URI template, routes the
//! leftover parameters to the query string or a JSON body, hands the result
//! to a pluggable transport, and classifies the response into a typed
//! `Response` or a `RequestError`.
//!
//! # Design
//! - `Client` is cheap to clone and holds read-only defaults; `create`
//!   derives a new client with merged defaults.
//! - The transport is an injected `Transport` (default `UreqTransport`), and
//!   every other stage is pure, so request building is testable without I/O.
//! - Errors raised after the request is built carry a redacted copy of the
//!   configuration.
//!
//! ```no_run
//! use clientele_core::{Client, RequestConfig};
//! use serde_json::json;
//!
//! # async fn run() -> Result<(), clientele_core::Error> {
//! let github = Client::new().create(RequestConfig::default().with_base_url("https://api.github.com"));
//! let res = github
//!     .request("GET /repos/{owner}/{repo}", json!({"owner": "rust-lang", "repo": "rust"}), RequestConfig::default())
//!     .await?;
//! println!("{}", res.status);
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod merge;
pub mod params;
pub mod plugin;
pub mod response;
pub mod template;
pub mod transport;

pub use builder::Route;
pub use client::Client;
pub use config::{Headers, RequestConfig, RequestOptions};
pub use error::{Error, RequestError, TransportError};
pub use http::{Body, BodyStream, HttpMethod, HttpRequest, HttpResponse};
pub use merge::Merge;
pub use params::{to_params, Params};
pub use plugin::{Core, CoreBuilder, Plugin, PluginFactory};
pub use response::{Response, ResponseData};
pub use template::{extract_expressions, Template};
pub use transport::{Transport, TransportResult, UreqTransport};
