//! Status routing and body decoding for API responses.

use serde_json::Value;

use crate::error::ApiError;
use crate::http::HttpResponse;

/// Decoded response payload.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    Json(Value),
    /// Non-JSON content, or JSON that failed to decode.
    Text(String),
}

/// Outcome of a completed HTTP exchange.
///
/// `body` is `None` for 204 responses.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Option<ResponseBody>,
}

impl ApiResponse {
    pub fn json(&self) -> Option<&Value> {
        match &self.body {
            Some(ResponseBody::Json(value)) => Some(value),
            _ => None,
        }
    }

    /// The `data` member of a Cachet response envelope.
    pub fn data(&self) -> Option<&Value> {
        self.json().and_then(|value| value.get("data"))
    }

    pub fn text(&self) -> Option<&str> {
        match &self.body {
            Some(ResponseBody::Text(text)) => Some(text),
            _ => None,
        }
    }
}

/// Whether a content type denotes a JSON document: `application/json` or
/// any `application/*+json` subtype. Parameters such as `charset` are ignored.
pub fn is_json_content_type(content_type: &str) -> bool {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    mime.starts_with("application/") && (mime == "application/json" || mime.ends_with("+json"))
}

/// Route a raw response by status.
///
/// 204 resolves without a body, any other 2xx resolves with the decoded body,
/// everything else becomes `ApiError::Http`.
pub fn interpret_response(response: HttpResponse) -> Result<ApiResponse, ApiError> {
    tracing::debug!(status = response.status, "interpreting response");

    if response.status == 204 {
        return Ok(ApiResponse {
            status: response.status,
            headers: response.headers,
            body: None,
        });
    }

    let body = decode_body(&response);
    let outcome = ApiResponse {
        status: response.status,
        headers: response.headers,
        body: Some(body),
    };

    if (200..=299).contains(&outcome.status) {
        Ok(outcome)
    } else {
        Err(ApiError::Http(outcome))
    }
}

fn decode_body(response: &HttpResponse) -> ResponseBody {
    let is_json = response.content_type().is_some_and(is_json_content_type);
    if is_json {
        match serde_json::from_str(&response.body) {
            Ok(value) => return ResponseBody::Json(value),
            Err(e) => tracing::trace!(error = %e, "keeping undecodable JSON body as text"),
        }
    }
    ResponseBody::Text(response.body.clone())
}
