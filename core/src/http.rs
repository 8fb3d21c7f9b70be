//! HTTP transport types for the host-does-IO pattern.
//!
//! # Design
//! These types describe HTTP requests and responses as plain data. The client
//! builds `HttpRequest` values and interprets `HttpResponse` values; a
//! `Transport` (or the caller, when using the `build_*` methods directly)
//! performs the network call in between.
//!
//! Query parameters and headers are kept in ordered maps so the same logical
//! request always produces the same descriptor.

use std::collections::BTreeMap;
use std::fmt;

use serde_json::Value;

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload attached to a request.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum RequestBody {
    #[default]
    Empty,
    /// Structured body, sent JSON-encoded.
    Json(Value),
    /// Binary body, sent as-is.
    Raw(Vec<u8>),
}

impl RequestBody {
    pub fn is_empty(&self) -> bool {
        matches!(self, RequestBody::Empty)
    }
}

/// An HTTP request described as plain data.
///
/// Built by `CachetClient::build_*` methods. `form` is only populated when at
/// least one form field exists; such a request is form-encoded and its `body`
/// is ignored by the transport.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub query: BTreeMap<String, String>,
    pub headers: BTreeMap<String, String>,
    pub body: RequestBody,
    pub form: Option<BTreeMap<String, String>>,
}

impl HttpRequest {
    pub fn new(method: HttpMethod, url: String) -> Self {
        Self {
            method,
            url,
            query: BTreeMap::new(),
            headers: BTreeMap::new(),
            body: RequestBody::Empty,
            form: None,
        }
    }

    /// Attach form fields. An empty mapping leaves the request JSON-shaped.
    pub fn with_form(mut self, form: BTreeMap<String, String>) -> Self {
        self.form = if form.is_empty() { None } else { Some(form) };
        self
    }
}

/// Set `name` to `value`, replacing any entry whose name differs only in case.
pub fn insert_header(headers: &mut BTreeMap<String, String>, name: &str, value: &str) {
    headers.retain(|key, _| !key.eq_ignore_ascii_case(name));
    headers.insert(name.to_string(), value.to_string());
}

/// An HTTP response described as plain data.
///
/// Produced by a `Transport` after executing an `HttpRequest`, then passed to
/// `interpret_response` for status routing and body decoding.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    /// First header value matching `name`, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }
}
