//! Error types for the Cachet API client.
//!
//! # Design
//! Failures before the network call (`Configuration`, `MissingParameter`,
//! `Serialization`) never reach the transport. `Transport` means no response
//! was received at all, while `Http` carries the full response metadata and
//! body. Callers tell the last two apart via `ApiError::response()`.

use thiserror::Error;

use crate::response::ApiResponse;

/// Boxed error produced by a `Transport` implementation.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors returned by `CachetClient` operations.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The client could not be constructed from the given configuration.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A required path parameter or body was absent. Nothing was sent.
    #[error("missing required parameter `{0}`")]
    MissingParameter(&'static str),

    /// A typed request body could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The network call did not complete.
    #[error("transport error: {0}")]
    Transport(#[source] BoxError),

    /// The server answered with a status outside 200..=299.
    #[error("HTTP {}", .0.status)]
    Http(ApiResponse),
}

impl ApiError {
    /// Response metadata, present only for HTTP-level failures.
    pub fn response(&self) -> Option<&ApiResponse> {
        match self {
            ApiError::Http(response) => Some(response),
            _ => None,
        }
    }

    pub fn status(&self) -> Option<u16> {
        self.response().map(|response| response.status)
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}
