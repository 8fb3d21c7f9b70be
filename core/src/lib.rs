//! Async API client for the Cachet status-page REST API.
//!
//! # Overview
//! One method per endpoint (components, component groups, incidents,
//! incident updates, metrics and metric points, plus `ping`/`version`). Each
//! method builds an `HttpRequest`, sends it through a `Transport`, and
//! resolves to an `ApiResponse` or an `ApiError`.
//!
//! # Design
//! - `build_*` methods are pure and usable on their own (host-does-IO), so
//!   callers can execute requests with any HTTP stack.
//! - Operation inputs are typed parameter structs; required path values and
//!   bodies are checked once at build time.
//! - No retries, caching, pagination traversal or body validation: the client
//!   is a uniform pass-through.

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod params;
pub mod response;
pub mod transport;

pub use auth::{ApiKeyCredential, BasicAuthCredential, Credentials, KeyPlacement};
pub use client::{merge_query_parameters, substitute_path, CachetClient};
pub use config::{ClientConfig, TOKEN_HEADER};
pub use error::{ApiError, BoxError};
pub use http::{insert_header, HttpMethod, HttpRequest, HttpResponse, RequestBody};
pub use params::{
    BasicParams, ComponentGroupListParams, ComponentGroupParams, ComponentListParams,
    ComponentParams, CreateParams, IncidentListParams, IncidentParams, IncidentUpdateParams,
    MetricParams, MetricPointParams, PageParams, Paging, QueryBag,
};
pub use response::{interpret_response, is_json_content_type, ApiResponse, ResponseBody};
pub use transport::{Transport, UreqTransport, DEFAULT_BODY_LIMIT};
