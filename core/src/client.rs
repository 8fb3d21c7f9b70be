//! Request builders and async operations for the Cachet status-page API.
//!
//! # Design
//! Each endpoint is split in two. `build_*` is pure: it substitutes path
//! parameters, computes query parameters and headers, and fails fast with
//! `ApiError::MissingParameter` when a required path value or body is absent.
//! The async method of the same name builds the request and hands it to the
//! client's `Transport`, so a build failure never touches the network.
//!
//! Query parameters are assembled in a fixed order: operation parameters
//! (with `sort`/`order` defaults), then a query-placed API key, then the
//! caller's `extra_query` bag, which always wins.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::auth::{ApiKeyCredential, BasicAuthCredential, KeyPlacement};
use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::{insert_header, HttpMethod, HttpRequest, RequestBody};
use crate::params::{
    BasicParams, ComponentGroupListParams, ComponentGroupParams, ComponentListParams,
    ComponentParams, CreateParams, IncidentListParams, IncidentParams, IncidentUpdateParams,
    MetricParams, MetricPointParams, PageParams, QueryBag,
};
use crate::response::{interpret_response, ApiResponse};
use crate::transport::{Transport, UreqTransport};

/// Substitute `{name}` placeholders in `template` with percent-encoded values.
///
/// The first absent value aborts with `ApiError::MissingParameter(name)`.
pub fn substitute_path(
    template: &str,
    values: &[(&'static str, Option<&str>)],
) -> Result<String, ApiError> {
    let mut path = template.to_string();
    for &(name, value) in values {
        let value = value.ok_or(ApiError::MissingParameter(name))?;
        path = path.replace(&format!("{{{name}}}"), &urlencoding::encode(value));
    }
    Ok(path)
}

/// Copy every entry of `extra` into `query`, overwriting same-named keys.
pub fn merge_query_parameters(query: &mut BTreeMap<String, String>, extra: &QueryBag) {
    for (name, value) in extra {
        query.insert(name.clone(), value.clone());
    }
}

fn require_body(body: &Option<Value>) -> Result<RequestBody, ApiError> {
    body.clone()
        .map(RequestBody::Json)
        .ok_or(ApiError::MissingParameter("body"))
}

/// Client for one Cachet installation.
///
/// Credentials are read on every request; the setters take `&mut self`, so
/// they cannot run while a call borrowing the client is in flight.
#[derive(Debug, Clone)]
pub struct CachetClient<T = UreqTransport> {
    config: ClientConfig,
    transport: T,
}

impl CachetClient<UreqTransport> {
    /// Build a client over the default `ureq` transport.
    ///
    /// Accepts a bare base address or a full `ClientConfig`.
    pub fn new(config: impl Into<ClientConfig>) -> Result<Self, ApiError> {
        Self::with_transport(config, UreqTransport::new())
    }
}

impl<T> CachetClient<T> {
    pub fn with_transport(config: impl Into<ClientConfig>, transport: T) -> Result<Self, ApiError> {
        let config = config.into().validated()?;
        Ok(Self { config, transport })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    pub fn set_api_key(
        &mut self,
        value: impl Into<String>,
        carrier: impl Into<String>,
        placement: KeyPlacement,
    ) {
        self.config.credentials.api_key = Some(ApiKeyCredential {
            value: value.into(),
            carrier: carrier.into(),
            placement,
        });
    }

    pub fn set_basic_auth(&mut self, username: impl Into<String>, password: impl Into<String>) {
        self.config.credentials.basic = Some(BasicAuthCredential {
            username: username.into(),
            password: password.into(),
        });
    }

    pub fn compose_auth_headers(
        &self,
        existing: BTreeMap<String, String>,
    ) -> BTreeMap<String, String> {
        self.config.credentials.compose_auth_headers(existing)
    }

    fn request(&self, method: HttpMethod, path: &str) -> HttpRequest {
        let mut request = HttpRequest::new(method, format!("{}{}", self.config.base_url, path));
        request.headers = self.compose_auth_headers(BTreeMap::new());
        insert_header(&mut request.headers, "Accept", "application/json");
        request
    }

    fn finish(&self, mut request: HttpRequest, query: QueryBag, extra: &QueryBag) -> HttpRequest {
        request.query = query;
        self.config.credentials.apply_query_key(&mut request.query);
        merge_query_parameters(&mut request.query, extra);
        request
    }

    // -----------------------------------------------------------------------
    // General
    // -----------------------------------------------------------------------

    pub fn build_ping(&self, params: &BasicParams) -> Result<HttpRequest, ApiError> {
        let request = self.request(HttpMethod::Get, "/ping");
        Ok(self.finish(request, QueryBag::new(), &params.extra_query))
    }

    pub fn build_version(&self, params: &BasicParams) -> Result<HttpRequest, ApiError> {
        let request = self.request(HttpMethod::Get, "/version");
        Ok(self.finish(request, QueryBag::new(), &params.extra_query))
    }

    // -----------------------------------------------------------------------
    // Components
    // -----------------------------------------------------------------------

    pub fn build_get_components(
        &self,
        params: &ComponentListParams,
    ) -> Result<HttpRequest, ApiError> {
        let request = self.request(HttpMethod::Get, "/components");
        Ok(self.finish(request, params.to_query(), &params.extra_query))
    }

    pub fn build_create_component(&self, params: &CreateParams) -> Result<HttpRequest, ApiError> {
        let mut request = self.request(HttpMethod::Post, "/components");
        request.body = require_body(&params.body)?;
        Ok(self.finish(request, QueryBag::new(), &params.extra_query))
    }

    pub fn build_get_component_by_id(
        &self,
        params: &ComponentParams,
    ) -> Result<HttpRequest, ApiError> {
        let path = substitute_path(
            "/components/{component}",
            &[("component", params.component.as_deref())],
        )?;
        let request = self.request(HttpMethod::Get, &path);
        Ok(self.finish(request, QueryBag::new(), &params.extra_query))
    }

    pub fn build_update_component_by_id(
        &self,
        params: &ComponentParams,
    ) -> Result<HttpRequest, ApiError> {
        let path = substitute_path(
            "/components/{component}",
            &[("component", params.component.as_deref())],
        )?;
        let mut request = self.request(HttpMethod::Put, &path);
        request.body = require_body(&params.body)?;
        Ok(self.finish(request, QueryBag::new(), &params.extra_query))
    }

    pub fn build_delete_component_by_id(
        &self,
        params: &ComponentParams,
    ) -> Result<HttpRequest, ApiError> {
        let path = substitute_path(
            "/components/{component}",
            &[("component", params.component.as_deref())],
        )?;
        let request = self.request(HttpMethod::Delete, &path);
        Ok(self.finish(request, QueryBag::new(), &params.extra_query))
    }

    // -----------------------------------------------------------------------
    // Component groups
    // -----------------------------------------------------------------------

    pub fn build_get_component_groups(
        &self,
        params: &ComponentGroupListParams,
    ) -> Result<HttpRequest, ApiError> {
        let request = self.request(HttpMethod::Get, "/components/groups");
        Ok(self.finish(request, params.to_query(), &params.extra_query))
    }

    pub fn build_create_component_group(
        &self,
        params: &CreateParams,
    ) -> Result<HttpRequest, ApiError> {
        let mut request = self.request(HttpMethod::Post, "/components/groups");
        request.body = require_body(&params.body)?;
        Ok(self.finish(request, QueryBag::new(), &params.extra_query))
    }

    pub fn build_get_component_group_by_id(
        &self,
        params: &ComponentGroupParams,
    ) -> Result<HttpRequest, ApiError> {
        let path = substitute_path(
            "/components/groups/{group}",
            &[("group", params.group.as_deref())],
        )?;
        let request = self.request(HttpMethod::Get, &path);
        Ok(self.finish(request, QueryBag::new(), &params.extra_query))
    }

    pub fn build_update_component_group_by_id(
        &self,
        params: &ComponentGroupParams,
    ) -> Result<HttpRequest, ApiError> {
        let path = substitute_path(
            "/components/groups/{group}",
            &[("group", params.group.as_deref())],
        )?;
        let mut request = self.request(HttpMethod::Put, &path);
        request.body = require_body(&params.body)?;
        Ok(self.finish(request, QueryBag::new(), &params.extra_query))
    }

    pub fn build_delete_component_group_by_id(
        &self,
        params: &ComponentGroupParams,
    ) -> Result<HttpRequest, ApiError> {
        let path = substitute_path(
            "/components/groups/{group}",
            &[("group", params.group.as_deref())],
        )?;
        let request = self.request(HttpMethod::Delete, &path);
        Ok(self.finish(request, QueryBag::new(), &params.extra_query))
    }

    // -----------------------------------------------------------------------
    // Incidents
    // -----------------------------------------------------------------------

    pub fn build_get_incidents(
        &self,
        params: &IncidentListParams,
    ) -> Result<HttpRequest, ApiError> {
        let request = self.request(HttpMethod::Get, "/incidents");
        Ok(self.finish(request, params.to_query(), &params.extra_query))
    }

    pub fn build_create_incident(&self, params: &CreateParams) -> Result<HttpRequest, ApiError> {
        let mut request = self.request(HttpMethod::Post, "/incidents");
        request.body = require_body(&params.body)?;
        Ok(self.finish(request, QueryBag::new(), &params.extra_query))
    }

    pub fn build_get_incident_by_id(&self, params: &IncidentParams) -> Result<HttpRequest, ApiError> {
        let path = substitute_path(
            "/incidents/{incident}",
            &[("incident", params.incident.as_deref())],
        )?;
        let request = self.request(HttpMethod::Get, &path);
        Ok(self.finish(request, QueryBag::new(), &params.extra_query))
    }

    pub fn build_update_incident_by_id(
        &self,
        params: &IncidentParams,
    ) -> Result<HttpRequest, ApiError> {
        let path = substitute_path(
            "/incidents/{incident}",
            &[("incident", params.incident.as_deref())],
        )?;
        let mut request = self.request(HttpMethod::Put, &path);
        request.body = require_body(&params.body)?;
        Ok(self.finish(request, QueryBag::new(), &params.extra_query))
    }

    pub fn build_delete_incident_by_id(
        &self,
        params: &IncidentParams,
    ) -> Result<HttpRequest, ApiError> {
        let path = substitute_path(
            "/incidents/{incident}",
            &[("incident", params.incident.as_deref())],
        )?;
        let request = self.request(HttpMethod::Delete, &path);
        Ok(self.finish(request, QueryBag::new(), &params.extra_query))
    }

    // -----------------------------------------------------------------------
    // Incident updates
    // -----------------------------------------------------------------------

    pub fn build_get_incident_updates_by_id(
        &self,
        params: &IncidentParams,
    ) -> Result<HttpRequest, ApiError> {
        let path = substitute_path(
            "/incidents/{incident}/updates",
            &[("incident", params.incident.as_deref())],
        )?;
        let request = self.request(HttpMethod::Get, &path);
        let mut query = QueryBag::new();
        params.paging.write(&mut query);
        Ok(self.finish(request, query, &params.extra_query))
    }

    pub fn build_create_incident_update(
        &self,
        params: &IncidentParams,
    ) -> Result<HttpRequest, ApiError> {
        let path = substitute_path(
            "/incidents/{incident}/updates",
            &[("incident", params.incident.as_deref())],
        )?;
        let mut request = self.request(HttpMethod::Post, &path);
        request.body = require_body(&params.body)?;
        Ok(self.finish(request, QueryBag::new(), &params.extra_query))
    }

    pub fn build_get_incident_update_by_id(
        &self,
        params: &IncidentUpdateParams,
    ) -> Result<HttpRequest, ApiError> {
        let path = substitute_path(
            "/incidents/{incident}/updates/{update}",
            &[
                ("incident", params.incident.as_deref()),
                ("update", params.update.as_deref()),
            ],
        )?;
        let request = self.request(HttpMethod::Get, &path);
        Ok(self.finish(request, QueryBag::new(), &params.extra_query))
    }

    /// Cachet takes the new `status` and `message` as query parameters here.
    pub fn build_put_incident_update_by_id(
        &self,
        params: &IncidentUpdateParams,
    ) -> Result<HttpRequest, ApiError> {
        let path = substitute_path(
            "/incidents/{incident}/updates/{update}",
            &[
                ("incident", params.incident.as_deref()),
                ("update", params.update.as_deref()),
            ],
        )?;
        let request = self.request(HttpMethod::Put, &path);
        Ok(self.finish(request, params.to_query(), &params.extra_query))
    }

    pub fn build_delete_incident_update_by_id(
        &self,
        params: &IncidentUpdateParams,
    ) -> Result<HttpRequest, ApiError> {
        let path = substitute_path(
            "/incidents/{incident}/updates/{update}",
            &[
                ("incident", params.incident.as_deref()),
                ("update", params.update.as_deref()),
            ],
        )?;
        let request = self.request(HttpMethod::Delete, &path);
        Ok(self.finish(request, QueryBag::new(), &params.extra_query))
    }

    // -----------------------------------------------------------------------
    // Metrics and points
    // -----------------------------------------------------------------------

    pub fn build_get_metrics(&self, params: &PageParams) -> Result<HttpRequest, ApiError> {
        let request = self.request(HttpMethod::Get, "/metrics");
        let mut query = QueryBag::new();
        params.paging.write(&mut query);
        Ok(self.finish(request, query, &params.extra_query))
    }

    pub fn build_create_metric(&self, params: &CreateParams) -> Result<HttpRequest, ApiError> {
        let mut request = self.request(HttpMethod::Post, "/metrics");
        request.body = require_body(&params.body)?;
        Ok(self.finish(request, QueryBag::new(), &params.extra_query))
    }

    pub fn build_get_metric_by_id(&self, params: &MetricParams) -> Result<HttpRequest, ApiError> {
        let path = substitute_path("/metrics/{metric}", &[("metric", params.metric.as_deref())])?;
        let request = self.request(HttpMethod::Get, &path);
        Ok(self.finish(request, QueryBag::new(), &params.extra_query))
    }

    pub fn build_delete_metric_by_id(&self, params: &MetricParams) -> Result<HttpRequest, ApiError> {
        let path = substitute_path("/metrics/{metric}", &[("metric", params.metric.as_deref())])?;
        let request = self.request(HttpMethod::Delete, &path);
        Ok(self.finish(request, QueryBag::new(), &params.extra_query))
    }

    pub fn build_get_metric_points_by_id(
        &self,
        params: &MetricParams,
    ) -> Result<HttpRequest, ApiError> {
        let path = substitute_path(
            "/metrics/{metric}/points",
            &[("metric", params.metric.as_deref())],
        )?;
        let request = self.request(HttpMethod::Get, &path);
        let mut query = QueryBag::new();
        params.paging.write(&mut query);
        Ok(self.finish(request, query, &params.extra_query))
    }

    pub fn build_create_metric_point_by_id(
        &self,
        params: &MetricParams,
    ) -> Result<HttpRequest, ApiError> {
        let path = substitute_path(
            "/metrics/{metric}/points",
            &[("metric", params.metric.as_deref())],
        )?;
        let mut request = self.request(HttpMethod::Post, &path);
        request.body = require_body(&params.body)?;
        Ok(self.finish(request, QueryBag::new(), &params.extra_query))
    }

    pub fn build_delete_metric_point_by_id(
        &self,
        params: &MetricPointParams,
    ) -> Result<HttpRequest, ApiError> {
        let path = substitute_path(
            "/metrics/{metric}/points/{point}",
            &[
                ("metric", params.metric.as_deref()),
                ("point", params.point.as_deref()),
            ],
        )?;
        let request = self.request(HttpMethod::Delete, &path);
        Ok(self.finish(request, QueryBag::new(), &params.extra_query))
    }
}

impl<T: Transport> CachetClient<T> {
    /// Send a built request and route the response by status.
    pub async fn dispatch(&self, request: HttpRequest) -> Result<ApiResponse, ApiError> {
        tracing::debug!(
            method = %request.method,
            url = %request.url,
            query_params = request.query.len(),
            "dispatching request"
        );
        let response = self
            .transport
            .execute(request)
            .await
            .map_err(ApiError::Transport)?;
        interpret_response(response)
    }

    pub async fn ping(&self, params: &BasicParams) -> Result<ApiResponse, ApiError> {
        self.dispatch(self.build_ping(params)?).await
    }

    pub async fn version(&self, params: &BasicParams) -> Result<ApiResponse, ApiError> {
        self.dispatch(self.build_version(params)?).await
    }

    pub async fn get_components(
        &self,
        params: &ComponentListParams,
    ) -> Result<ApiResponse, ApiError> {
        self.dispatch(self.build_get_components(params)?).await
    }

    pub async fn create_component(&self, params: &CreateParams) -> Result<ApiResponse, ApiError> {
        self.dispatch(self.build_create_component(params)?).await
    }

    pub async fn get_component_by_id(
        &self,
        params: &ComponentParams,
    ) -> Result<ApiResponse, ApiError> {
        self.dispatch(self.build_get_component_by_id(params)?).await
    }

    pub async fn update_component_by_id(
        &self,
        params: &ComponentParams,
    ) -> Result<ApiResponse, ApiError> {
        self.dispatch(self.build_update_component_by_id(params)?).await
    }

    pub async fn delete_component_by_id(
        &self,
        params: &ComponentParams,
    ) -> Result<ApiResponse, ApiError> {
        self.dispatch(self.build_delete_component_by_id(params)?).await
    }

    pub async fn get_component_groups(
        &self,
        params: &ComponentGroupListParams,
    ) -> Result<ApiResponse, ApiError> {
        self.dispatch(self.build_get_component_groups(params)?).await
    }

    pub async fn create_component_group(
        &self,
        params: &CreateParams,
    ) -> Result<ApiResponse, ApiError> {
        self.dispatch(self.build_create_component_group(params)?).await
    }

    pub async fn get_component_group_by_id(
        &self,
        params: &ComponentGroupParams,
    ) -> Result<ApiResponse, ApiError> {
        self.dispatch(self.build_get_component_group_by_id(params)?).await
    }

    pub async fn update_component_group_by_id(
        &self,
        params: &ComponentGroupParams,
    ) -> Result<ApiResponse, ApiError> {
        self.dispatch(self.build_update_component_group_by_id(params)?).await
    }

    pub async fn delete_component_group_by_id(
        &self,
        params: &ComponentGroupParams,
    ) -> Result<ApiResponse, ApiError> {
        self.dispatch(self.build_delete_component_group_by_id(params)?).await
    }

    pub async fn get_incidents(&self, params: &IncidentListParams) -> Result<ApiResponse, ApiError> {
        self.dispatch(self.build_get_incidents(params)?).await
    }

    pub async fn create_incident(&self, params: &CreateParams) -> Result<ApiResponse, ApiError> {
        self.dispatch(self.build_create_incident(params)?).await
    }

    pub async fn get_incident_by_id(&self, params: &IncidentParams) -> Result<ApiResponse, ApiError> {
        self.dispatch(self.build_get_incident_by_id(params)?).await
    }

    pub async fn update_incident_by_id(
        &self,
        params: &IncidentParams,
    ) -> Result<ApiResponse, ApiError> {
        self.dispatch(self.build_update_incident_by_id(params)?).await
    }

    pub async fn delete_incident_by_id(
        &self,
        params: &IncidentParams,
    ) -> Result<ApiResponse, ApiError> {
        self.dispatch(self.build_delete_incident_by_id(params)?).await
    }

    pub async fn get_incident_updates_by_id(
        &self,
        params: &IncidentParams,
    ) -> Result<ApiResponse, ApiError> {
        self.dispatch(self.build_get_incident_updates_by_id(params)?).await
    }

    pub async fn create_incident_update(
        &self,
        params: &IncidentParams,
    ) -> Result<ApiResponse, ApiError> {
        self.dispatch(self.build_create_incident_update(params)?).await
    }

    pub async fn get_incident_update_by_id(
        &self,
        params: &IncidentUpdateParams,
    ) -> Result<ApiResponse, ApiError> {
        self.dispatch(self.build_get_incident_update_by_id(params)?).await
    }

    pub async fn put_incident_update_by_id(
        &self,
        params: &IncidentUpdateParams,
    ) -> Result<ApiResponse, ApiError> {
        self.dispatch(self.build_put_incident_update_by_id(params)?).await
    }

    pub async fn delete_incident_update_by_id(
        &self,
        params: &IncidentUpdateParams,
    ) -> Result<ApiResponse, ApiError> {
        self.dispatch(self.build_delete_incident_update_by_id(params)?).await
    }

    pub async fn get_metrics(&self, params: &PageParams) -> Result<ApiResponse, ApiError> {
        self.dispatch(self.build_get_metrics(params)?).await
    }

    pub async fn create_metric(&self, params: &CreateParams) -> Result<ApiResponse, ApiError> {
        self.dispatch(self.build_create_metric(params)?).await
    }

    pub async fn get_metric_by_id(&self, params: &MetricParams) -> Result<ApiResponse, ApiError> {
        self.dispatch(self.build_get_metric_by_id(params)?).await
    }

    pub async fn delete_metric_by_id(&self, params: &MetricParams) -> Result<ApiResponse, ApiError> {
        self.dispatch(self.build_delete_metric_by_id(params)?).await
    }

    pub async fn get_metric_points_by_id(
        &self,
        params: &MetricParams,
    ) -> Result<ApiResponse, ApiError> {
        self.dispatch(self.build_get_metric_points_by_id(params)?).await
    }

    pub async fn create_metric_point_by_id(
        &self,
        params: &MetricParams,
    ) -> Result<ApiResponse, ApiError> {
        self.dispatch(self.build_create_metric_point_by_id(params)?).await
    }

    pub async fn delete_metric_point_by_id(
        &self,
        params: &MetricPointParams,
    ) -> Result<ApiResponse, ApiError> {
        self.dispatch(self.build_delete_metric_point_by_id(params)?).await
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn client() -> CachetClient<()> {
        CachetClient::with_transport("http://localhost:8000/api/v1", ()).unwrap()
    }

    #[test]
    fn construction_rejects_empty_base_url() {
        let err = CachetClient::with_transport("", ()).unwrap_err();
        assert!(matches!(err, ApiError::Configuration(_)));
    }

    #[test]
    fn substitute_path_encodes_values() {
        let path = substitute_path("/components/{component}", &[("component", Some("a b/c"))]).unwrap();
        assert_eq!(path, "/components/a%20b%2Fc");
    }

    #[test]
    fn substitute_path_reports_first_missing_parameter() {
        let err = substitute_path(
            "/incidents/{incident}/updates/{update}",
            &[("incident", Some("1")), ("update", None)],
        )
        .unwrap_err();
        assert!(matches!(err, ApiError::MissingParameter("update")));
    }

    #[test]
    fn merge_overrides_existing_keys() {
        let mut query = BTreeMap::new();
        query.insert("foo".to_string(), "default".to_string());
        query.insert("sort".to_string(), "id".to_string());
        let mut extra = QueryBag::new();
        extra.insert("foo".to_string(), "bar".to_string());
        merge_query_parameters(&mut query, &extra);
        assert_eq!(query["foo"], "bar");
        assert_eq!(query["sort"], "id");
    }

    #[test]
    fn every_request_accepts_json() {
        let req = client().build_ping(&BasicParams::default()).unwrap();
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.url, "http://localhost:8000/api/v1/ping");
        assert_eq!(req.headers["Accept"], "application/json");
        assert!(req.query.is_empty());
        assert!(req.body.is_empty());
    }

    #[test]
    fn get_components_applies_defaults() {
        let req = client().build_get_components(&ComponentListParams::default()).unwrap();
        assert_eq!(req.query["sort"], "id");
        assert_eq!(req.query["order"], "asc");
        assert_eq!(req.query.len(), 2);
    }

    #[test]
    fn create_requires_body() {
        let err = client().build_create_incident(&CreateParams::default()).unwrap_err();
        assert!(matches!(err, ApiError::MissingParameter("body")));
    }

    #[test]
    fn path_is_checked_before_body() {
        let err = client()
            .build_update_component_by_id(&ComponentParams::default())
            .unwrap_err();
        assert!(matches!(err, ApiError::MissingParameter("component")));
    }

    #[test]
    fn body_is_passed_through() {
        let params = ComponentParams {
            body: Some(json!({"status": 2})),
            ..ComponentParams::new(42)
        };
        let req = client().build_update_component_by_id(&params).unwrap();
        assert_eq!(req.method, HttpMethod::Put);
        assert_eq!(req.url, "http://localhost:8000/api/v1/components/42");
        assert_eq!(req.body, RequestBody::Json(json!({"status": 2})));
        assert!(req.form.is_none());
    }

    #[test]
    fn put_incident_update_sends_query_not_body() {
        let params = IncidentUpdateParams {
            status: Some(4),
            message: Some("Resolved".to_string()),
            ..IncidentUpdateParams::new(1, 9)
        };
        let req = client().build_put_incident_update_by_id(&params).unwrap();
        assert_eq!(req.url, "http://localhost:8000/api/v1/incidents/1/updates/9");
        assert_eq!(req.query["status"], "4");
        assert_eq!(req.query["message"], "Resolved");
        assert!(req.body.is_empty());
    }

    #[test]
    fn query_key_is_added_and_bag_still_wins() {
        let mut client = client();
        client.set_api_key("abc", "api_key", KeyPlacement::Query);
        let req = client.build_get_metrics(&PageParams::default()).unwrap();
        assert_eq!(req.query["api_key"], "abc");
        assert!(!req.headers.contains_key("api_key"));

        let mut params = PageParams::default();
        params.extra_query.insert("api_key".to_string(), "override".to_string());
        let req = client.build_get_metrics(&params).unwrap();
        assert_eq!(req.query["api_key"], "override");
    }

    #[test]
    fn carrier_named_accept_does_not_duplicate_the_header() {
        let mut client = client();
        client.set_api_key("abc", "accept", KeyPlacement::Header);
        let req = client.build_ping(&BasicParams::default()).unwrap();
        let accepts: Vec<_> = req
            .headers
            .keys()
            .filter(|name| name.eq_ignore_ascii_case("accept"))
            .collect();
        assert_eq!(accepts, ["Accept"]);
        assert_eq!(req.headers["Accept"], "application/json");
    }

    #[test]
    fn setters_affect_later_requests() {
        let mut client = client();
        let before = client.build_version(&BasicParams::default()).unwrap();
        assert!(!before.headers.contains_key("Authorization"));

        client.set_basic_auth("u", "p");
        client.set_api_key("abc", "X-Cachet-Token", KeyPlacement::Header);
        let after = client.build_version(&BasicParams::default()).unwrap();
        assert_eq!(after.headers["Authorization"], "Basic dTpw");
        assert_eq!(after.headers["X-Cachet-Token"], "abc");
        assert_eq!(after.headers["Accept"], "application/json");
    }
}
