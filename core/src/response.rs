//! Turning a raw transport response into a typed result.

use std::collections::BTreeMap;

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::config::RequestConfig;
use crate::error::{Error, RequestError};
use crate::http::{HttpMethod, HttpResponse};

/// Response body, classified by content type.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseData {
    Json(Value),
    Text(String),
    Binary(Bytes),
}

/// A normalized response.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    /// URL after redirects.
    pub url: String,
    pub status: u16,
    /// Lowercased header names.
    pub headers: BTreeMap<String, String>,
    /// `None` for 204/205 and successful HEAD requests.
    pub data: Option<ResponseData>,
}

impl Response {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    /// Deserialize the body into `T`. JSON bodies are converted directly,
    /// text bodies are parsed as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, Error> {
        let result = match &self.data {
            Some(ResponseData::Json(value)) => serde_json::from_value(value.clone()),
            Some(ResponseData::Text(text)) => serde_json::from_str(text),
            Some(ResponseData::Binary(bytes)) => serde_json::from_slice(bytes),
            None => serde_json::from_value(Value::Null),
        };
        result.map_err(|e| Error::DeserializationError(e.to_string()))
    }

    pub fn text(&self) -> Option<&str> {
        match &self.data {
            Some(ResponseData::Text(text)) => Some(text),
            _ => None,
        }
    }
}

fn is_json(content_type: &str) -> bool {
    let essence = media_type(content_type);
    essence == "application/json" || essence.ends_with("+json")
}

fn is_text(content_type: &str) -> bool {
    let essence = media_type(content_type);
    essence.starts_with("text/")
        || essence == "application/xml"
        || essence.ends_with("+xml")
        || content_type.to_ascii_lowercase().contains("charset=")
}

fn media_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

fn collect_headers(raw: &[(String, String)]) -> BTreeMap<String, String> {
    let mut headers: BTreeMap<String, String> = BTreeMap::new();
    for (name, value) in raw {
        headers
            .entry(name.to_ascii_lowercase())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(value);
            })
            .or_insert_with(|| value.clone());
    }
    headers
}

fn classify_body(
    status: u16,
    method: HttpMethod,
    headers: &BTreeMap<String, String>,
    body: Bytes,
) -> Option<ResponseData> {
    if status == 204 || status == 205 || (method == HttpMethod::Head && status < 400) {
        return None;
    }
    let content_type = headers.get("content-type").map(String::as_str).unwrap_or_default();
    if is_json(content_type) {
        return Some(match serde_json::from_slice(&body) {
            Ok(value) => ResponseData::Json(value),
            Err(_) => ResponseData::Text(String::from_utf8_lossy(&body).into_owned()),
        });
    }
    if is_text(content_type) {
        return Some(ResponseData::Text(String::from_utf8_lossy(&body).into_owned()));
    }
    Some(ResponseData::Binary(body))
}

fn reason(status: u16) -> String {
    ureq::http::StatusCode::from_u16(status)
        .ok()
        .and_then(|code| code.canonical_reason())
        .map(str::to_string)
        .unwrap_or_else(|| format!("HTTP {status}"))
}

/// Message for an error response, taken from its body when possible.
fn error_message(status: u16, data: &Option<ResponseData>) -> String {
    match data {
        Some(ResponseData::Text(text)) if !text.is_empty() => text.clone(),
        Some(ResponseData::Json(Value::String(s))) => s.clone(),
        Some(ResponseData::Json(value)) => match value.get("message").and_then(Value::as_str) {
            Some(message) => message.to_string(),
            None => value.to_string(),
        },
        _ => reason(status),
    }
}

/// Classify the body and map failure statuses to a `RequestError`.
///
/// 304 is always a failure, as is any status >= 400.
pub fn normalize(
    raw: HttpResponse,
    method: HttpMethod,
    config: &RequestConfig,
) -> Result<Response, Error> {
    let headers = collect_headers(&raw.headers);
    let data = classify_body(raw.status, method, &headers, raw.body);
    let response = Response {
        url: raw.url,
        status: raw.status,
        headers,
        data,
    };
    check_status(response, config)
}

fn check_status(response: Response, config: &RequestConfig) -> Result<Response, Error> {
    let status = response.status;
    if status == 304 {
        let message = reason(status);
        return Err(RequestError::new(message, status, config.clone(), Some(response)).into());
    }
    if status >= 400 {
        let message = error_message(status, &response.data);
        return Err(RequestError::new(message, status, config.clone(), Some(response)).into());
    }
    Ok(response)
}
