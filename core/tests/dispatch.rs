//! Dispatch behaviour verified against a recording transport.
//!
//! # Design
//! `SpyTransport` stores every request it receives and answers with a canned
//! response (or a canned transport failure). Tests assert both on what was
//! sent and on how the client resolved the outcome.

use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::json;

use cachet_core::{
    ApiError, BasicParams, BoxError, CachetClient, ClientConfig, ComponentGroupParams,
    ComponentListParams, ComponentParams, CreateParams, HttpMethod, HttpRequest, HttpResponse,
    IncidentParams, IncidentUpdateParams, KeyPlacement, MetricParams, MetricPointParams,
    PageParams, Paging, RequestBody, ResponseBody, Transport,
};

const BASE_URL: &str = "http://status.local/api/v1";

#[derive(Debug, Default)]
struct SpyTransport {
    requests: Mutex<Vec<HttpRequest>>,
    reply: Option<HttpResponse>,
}

impl SpyTransport {
    fn replying(status: u16, content_type: &str, body: &str) -> Self {
        Self {
            requests: Mutex::new(Vec::new()),
            reply: Some(HttpResponse {
                status,
                headers: vec![("Content-Type".to_string(), content_type.to_string())],
                body: body.to_string(),
            }),
        }
    }

    fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    fn last(&self) -> HttpRequest {
        self.requests.lock().unwrap().last().cloned().expect("no request recorded")
    }
}

#[async_trait]
impl Transport for SpyTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, BoxError> {
        self.requests.lock().unwrap().push(request);
        self.reply.clone().ok_or_else(|| "connection refused".into())
    }
}

fn client_with(transport: SpyTransport) -> CachetClient<SpyTransport> {
    CachetClient::with_transport(BASE_URL, transport).unwrap()
}

fn ok_client() -> CachetClient<SpyTransport> {
    client_with(SpyTransport::replying(200, "application/json", r#"{"data":[]}"#))
}

fn assert_missing(result: Result<cachet_core::ApiResponse, ApiError>, name: &str) {
    match result {
        Err(ApiError::MissingParameter(missing)) => assert_eq!(missing, name),
        other => panic!("expected MissingParameter({name}), got {other:?}"),
    }
}

// ---------------------------------------------------------------------------
// Fail-fast validation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn missing_path_parameters_never_reach_the_transport() {
    let c = ok_client();

    assert_missing(c.get_component_by_id(&ComponentParams::default()).await, "component");
    assert_missing(c.delete_component_by_id(&ComponentParams::default()).await, "component");
    assert_missing(
        c.get_component_group_by_id(&ComponentGroupParams::default()).await,
        "group",
    );
    assert_missing(
        c.delete_component_group_by_id(&ComponentGroupParams::default()).await,
        "group",
    );
    assert_missing(c.get_incident_by_id(&IncidentParams::default()).await, "incident");
    assert_missing(c.delete_incident_by_id(&IncidentParams::default()).await, "incident");
    assert_missing(
        c.get_incident_updates_by_id(&IncidentParams::default()).await,
        "incident",
    );
    assert_missing(
        c.get_incident_update_by_id(&IncidentUpdateParams::default()).await,
        "incident",
    );
    let only_incident = IncidentUpdateParams {
        incident: Some("1".to_string()),
        ..IncidentUpdateParams::default()
    };
    assert_missing(c.get_incident_update_by_id(&only_incident).await, "update");
    assert_missing(c.put_incident_update_by_id(&only_incident).await, "update");
    assert_missing(c.delete_incident_update_by_id(&only_incident).await, "update");
    assert_missing(c.get_metric_by_id(&MetricParams::default()).await, "metric");
    assert_missing(c.delete_metric_by_id(&MetricParams::default()).await, "metric");
    assert_missing(c.get_metric_points_by_id(&MetricParams::default()).await, "metric");
    let only_metric = MetricPointParams {
        metric: Some("1".to_string()),
        ..MetricPointParams::default()
    };
    assert_missing(c.delete_metric_point_by_id(&only_metric).await, "point");

    // Writes with a body still fail on the absent path value.
    let body = Some(json!({"status": 1}));
    let component = ComponentParams {
        body: body.clone(),
        ..ComponentParams::default()
    };
    assert_missing(c.update_component_by_id(&component).await, "component");
    let group = ComponentGroupParams {
        body: body.clone(),
        ..ComponentGroupParams::default()
    };
    assert_missing(c.update_component_group_by_id(&group).await, "group");
    let incident = IncidentParams {
        body: body.clone(),
        ..IncidentParams::default()
    };
    assert_missing(c.update_incident_by_id(&incident).await, "incident");
    assert_missing(c.create_incident_update(&incident).await, "incident");
    let metric = MetricParams {
        body,
        ..MetricParams::default()
    };
    assert_missing(c.create_metric_point_by_id(&metric).await, "metric");

    // The parent segment is checked even when the child is present.
    let only_update = IncidentUpdateParams {
        update: Some("1".to_string()),
        ..IncidentUpdateParams::default()
    };
    assert_missing(c.put_incident_update_by_id(&only_update).await, "incident");
    assert_missing(c.delete_incident_update_by_id(&only_update).await, "incident");
    let only_point = MetricPointParams {
        point: Some("1".to_string()),
        ..MetricPointParams::default()
    };
    assert_missing(c.delete_metric_point_by_id(&only_point).await, "metric");

    assert_eq!(c.transport().calls(), 0);
}

#[tokio::test]
async fn missing_bodies_never_reach_the_transport() {
    let c = ok_client();

    assert_missing(c.create_component(&CreateParams::default()).await, "body");
    assert_missing(c.update_component_by_id(&ComponentParams::new(1)).await, "body");
    assert_missing(c.create_component_group(&CreateParams::default()).await, "body");
    assert_missing(
        c.update_component_group_by_id(&ComponentGroupParams::new(1)).await,
        "body",
    );
    assert_missing(c.create_incident(&CreateParams::default()).await, "body");
    assert_missing(c.update_incident_by_id(&IncidentParams::new(1)).await, "body");
    assert_missing(c.create_incident_update(&IncidentParams::new(1)).await, "body");
    assert_missing(c.create_metric(&CreateParams::default()).await, "body");
    assert_missing(c.create_metric_point_by_id(&MetricParams::new(1)).await, "body");

    assert_eq!(c.transport().calls(), 0);
}

// ---------------------------------------------------------------------------
// Request shape
// ---------------------------------------------------------------------------

#[tokio::test]
async fn path_parameter_is_substituted() {
    let c = ok_client();
    c.get_component_by_id(&ComponentParams::new(42)).await.unwrap();

    let req = c.transport().last();
    assert_eq!(req.method, HttpMethod::Get);
    assert_eq!(req.url, format!("{BASE_URL}/components/42"));
    assert_eq!(req.headers["Accept"], "application/json");
}

#[tokio::test]
async fn nested_paths_are_substituted() {
    let c = ok_client();

    c.delete_incident_update_by_id(&IncidentUpdateParams::new(3, 8)).await.unwrap();
    let req = c.transport().last();
    assert_eq!(req.method, HttpMethod::Delete);
    assert_eq!(req.url, format!("{BASE_URL}/incidents/3/updates/8"));

    c.delete_metric_point_by_id(&MetricPointParams::new(5, 11)).await.unwrap();
    let req = c.transport().last();
    assert_eq!(req.url, format!("{BASE_URL}/metrics/5/points/11"));
}

#[tokio::test]
async fn list_defaults_and_overrides() {
    let c = ok_client();

    c.get_components(&ComponentListParams::default()).await.unwrap();
    let req = c.transport().last();
    assert_eq!(req.query["sort"], "id");
    assert_eq!(req.query["order"], "asc");

    let params = ComponentListParams {
        paging: Paging::default().sort("name"),
        ..ComponentListParams::default()
    };
    c.get_components(&params).await.unwrap();
    let req = c.transport().last();
    assert_eq!(req.query["sort"], "name");
    assert_eq!(req.query["order"], "asc");
}

#[tokio::test]
async fn paging_uses_wire_names() {
    let c = ok_client();
    let params = MetricParams {
        paging: Paging::default().order("desc").per_page(50).page(2),
        ..MetricParams::new(7)
    };
    c.get_metric_points_by_id(&params).await.unwrap();

    let req = c.transport().last();
    assert_eq!(req.url, format!("{BASE_URL}/metrics/7/points"));
    assert_eq!(req.query["order"], "desc");
    assert_eq!(req.query["per_page"], "50");
    assert_eq!(req.query["page"], "2");
}

#[tokio::test]
async fn extra_query_is_merged_last() {
    let c = ok_client();
    let mut params = PageParams::default();
    params.extra_query.insert("foo".to_string(), "bar".to_string());
    params.extra_query.insert("sort".to_string(), "created_at".to_string());
    c.get_metrics(&params).await.unwrap();

    let req = c.transport().last();
    assert_eq!(req.query["foo"], "bar");
    assert_eq!(req.query["sort"], "created_at");
    assert_eq!(req.query["order"], "asc");
}

#[tokio::test]
async fn body_is_sent_verbatim() {
    let c = ok_client();
    let body = json!({"name": "API", "status": 1, "unknown_field": [1, 2]});
    c.create_component(&CreateParams::new(body.clone())).await.unwrap();

    let req = c.transport().last();
    assert_eq!(req.method, HttpMethod::Post);
    assert_eq!(req.url, format!("{BASE_URL}/components"));
    assert_eq!(req.body, RequestBody::Json(body));
    assert!(req.form.is_none());
}

#[tokio::test]
async fn credentials_are_attached() {
    let config = ClientConfig::new(BASE_URL)
        .with_api_key("abc", "X-Cachet-Token", KeyPlacement::Header)
        .with_basic_auth("u", "p");
    let c = CachetClient::with_transport(
        config,
        SpyTransport::replying(200, "application/json", r#"{"data":"Pong!"}"#),
    )
    .unwrap();
    c.ping(&BasicParams::default()).await.unwrap();

    let req = c.transport().last();
    assert_eq!(req.headers["X-Cachet-Token"], "abc");
    assert_eq!(req.headers["Authorization"], "Basic dTpw");
}

// ---------------------------------------------------------------------------
// Outcome routing
// ---------------------------------------------------------------------------

#[tokio::test]
async fn no_content_resolves_without_body() {
    let c = client_with(SpyTransport::replying(204, "application/json", ""));
    let outcome = c.delete_component_by_id(&ComponentParams::new(1)).await.unwrap();
    assert_eq!(outcome.status, 204);
    assert!(outcome.body.is_none());
}

#[tokio::test]
async fn created_resolves_with_parsed_json() {
    let c = client_with(SpyTransport::replying(201, "application/json", r#"{"data":{"id":1}}"#));
    let outcome = c.create_metric(&CreateParams::new(json!({"name": "Latency"}))).await.unwrap();
    assert_eq!(outcome.status, 201);
    assert_eq!(outcome.body, Some(ResponseBody::Json(json!({"data": {"id": 1}}))));
}

#[tokio::test]
async fn not_found_rejects_with_response() {
    let c = client_with(SpyTransport::replying(
        404,
        "application/json",
        r#"{"errors":[{"status":404,"title":"Not Found"}]}"#,
    ));
    let err = c.get_incident_by_id(&IncidentParams::new(99)).await.unwrap_err();
    assert!(err.is_not_found());
    let response = err.response().unwrap();
    assert_eq!(response.json().unwrap()["errors"][0]["title"], "Not Found");
    assert_eq!(c.transport().calls(), 1);
}

#[tokio::test]
async fn server_error_keeps_raw_body() {
    let c = client_with(SpyTransport::replying(500, "text/html", "<h1>oops</h1>"));
    let err = c.version(&BasicParams::default()).await.unwrap_err();
    assert_eq!(err.status(), Some(500));
    assert_eq!(err.response().unwrap().text(), Some("<h1>oops</h1>"));
}

#[tokio::test]
async fn transport_failure_has_no_response() {
    let c = client_with(SpyTransport::default());
    let err = c.ping(&BasicParams::default()).await.unwrap_err();
    assert!(matches!(err, ApiError::Transport(_)));
    assert!(err.response().is_none());
    assert_eq!(c.transport().calls(), 1);
}

#[test]
fn construction_fails_without_base_url() {
    let err = CachetClient::with_transport(ClientConfig::default(), SpyTransport::default())
        .unwrap_err();
    match err {
        ApiError::Configuration(msg) => {
            assert_eq!(msg, "Domain parameter must be specified as a string.")
        }
        other => panic!("unexpected error: {other}"),
    }
}
