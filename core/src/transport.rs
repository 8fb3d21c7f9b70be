//! Network execution of `HttpRequest` values.
//!
//! `CachetClient` is generic over `Transport`, so tests can substitute a
//! recording fake. `UreqTransport` is the default implementation.

use std::io::Read;

use async_trait::async_trait;
use ureq::typestate::WithoutBody;
use ureq::{Agent, RequestBuilder};

use crate::error::BoxError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse, RequestBody};

/// Executes one request and returns the response, whatever its status.
///
/// An `Err` means no response was received.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, BoxError>;
}

/// Response bodies longer than this are truncated rather than failing the call.
pub const DEFAULT_BODY_LIMIT: u64 = 64 * 1024 * 1024;

/// Blocking `ureq` agent driven from a Tokio blocking thread.
///
/// Non-2xx statuses are returned as data rather than errors so status
/// interpretation stays with the client. Response bodies are decoded as
/// UTF-8 with invalid sequences replaced, so a received response is never
/// turned into a transport error because of its payload.
///
/// `execute` hands the blocking call to `tokio::task::spawn_blocking`, so
/// the returned future must be polled inside a Tokio runtime. Polling it from
/// another executor panics.
#[derive(Debug, Clone)]
pub struct UreqTransport {
    agent: Agent,
    body_limit: u64,
}

impl UreqTransport {
    pub fn new() -> Self {
        let agent = Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .new_agent();
        Self::with_agent(agent)
    }

    /// Use a caller-configured agent. Keep `http_status_as_error(false)` on
    /// it, or non-2xx responses surface as transport errors.
    pub fn with_agent(agent: Agent) -> Self {
        Self {
            agent,
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }

    /// Cap the number of body bytes kept from each response.
    pub fn with_body_limit(mut self, limit: u64) -> Self {
        self.body_limit = limit;
        self
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for UreqTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, BoxError> {
        let agent = self.agent.clone();
        let limit = self.body_limit;
        tokio::task::spawn_blocking(move || execute_blocking(&agent, request, limit)).await?
    }
}

fn decorate<B>(mut builder: RequestBuilder<B>, request: &HttpRequest) -> RequestBuilder<B> {
    for (name, value) in &request.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    for (name, value) in &request.query {
        builder = builder.query(name.as_str(), value.as_str());
    }
    builder
}

fn execute_blocking(
    agent: &Agent,
    request: HttpRequest,
    limit: u64,
) -> Result<HttpResponse, BoxError> {
    let url = request.url.as_str();
    let bodiless = |builder: RequestBuilder<WithoutBody>| decorate(builder, &request).call();

    let result = match request.method {
        HttpMethod::Get => bodiless(agent.get(url)),
        HttpMethod::Delete => bodiless(agent.delete(url)),
        HttpMethod::Post | HttpMethod::Put => {
            let builder = match request.method {
                HttpMethod::Post => agent.post(url),
                _ => agent.put(url),
            };
            let builder = decorate(builder, &request);
            match (&request.form, &request.body) {
                (Some(form), _) => {
                    builder.send_form(form.iter().map(|(k, v)| (k.as_str(), v.as_str())))
                }
                (None, RequestBody::Json(value)) => builder
                    .content_type("application/json")
                    .send(serde_json::to_vec(value)?.as_slice()),
                (None, RequestBody::Raw(bytes)) => builder
                    .content_type("application/octet-stream")
                    .send(bytes.as_slice()),
                (None, RequestBody::Empty) => builder.send_empty(),
            }
        }
    };

    let mut response = result?;
    let status = response.status().as_u16();
    let headers = response
        .headers()
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|value| (name.as_str().to_string(), value.to_string()))
        })
        .collect();
    let mut bytes = Vec::new();
    response
        .body_mut()
        .with_config()
        .limit(u64::MAX)
        .reader()
        .take(limit.saturating_add(1))
        .read_to_end(&mut bytes)?;
    if bytes.len() as u64 > limit {
        tracing::warn!(limit, url = %request.url, "response body truncated");
        bytes.truncate(limit as usize);
    }
    let body = String::from_utf8_lossy(&bytes).into_owned();

    Ok(HttpResponse {
        status,
        headers,
        body,
    })
}
