//! In-memory Cachet API used by integration tests and local development.
//!
//! Every resource lives in a `Table` of JSON objects keyed by id. Nested
//! resources (incident updates, metric points) record their parent id in a
//! field and are filtered by it. Responses use Cachet's `{"data": ...}`
//! envelope; failures use `{"errors": [...]}`.

use std::{
    cmp::Ordering,
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

use axum::{
    extract::{Path, Query, Request, State},
    http::{Method, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{delete, get},
    Json, Router,
};
use serde_json::{json, Map, Value};
use tokio::{net::TcpListener, sync::RwLock};

pub const TOKEN_HEADER: &str = "X-Cachet-Token";
pub const VERSION: &str = "2.4.0";

const DEFAULT_PER_PAGE: usize = 20;

/// One resource collection with its own id sequence.
#[derive(Debug, Default)]
pub struct Table {
    next_id: u64,
    rows: BTreeMap<u64, Value>,
}

impl Table {
    fn insert(&mut self, mut attrs: Map<String, Value>) -> Value {
        self.next_id += 1;
        attrs.insert("id".to_string(), json!(self.next_id));
        let row = Value::Object(attrs);
        self.rows.insert(self.next_id, row.clone());
        row
    }

    fn update(&mut self, id: u64, patch: Map<String, Value>) -> Option<Value> {
        let row = self.rows.get_mut(&id)?.as_object_mut()?;
        for (key, value) in patch {
            if key != "id" {
                row.insert(key, value);
            }
        }
        Some(Value::Object(row.clone()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Component,
    Group,
    Incident,
    Update,
    Metric,
    Point,
}

impl Kind {
    /// Attribute every created row of this kind must carry.
    fn required_field(self) -> &'static str {
        match self {
            Kind::Update => "message",
            Kind::Point => "value",
            _ => "name",
        }
    }

    /// Parent kind and the field linking a nested row to it.
    fn parent(self) -> Option<(Kind, &'static str)> {
        match self {
            Kind::Update => Some((Kind::Incident, "incident_id")),
            Kind::Point => Some((Kind::Metric, "metric_id")),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
pub struct Store {
    components: Table,
    groups: Table,
    incidents: Table,
    updates: Table,
    metrics: Table,
    points: Table,
}

impl Store {
    fn table(&self, kind: Kind) -> &Table {
        match kind {
            Kind::Component => &self.components,
            Kind::Group => &self.groups,
            Kind::Incident => &self.incidents,
            Kind::Update => &self.updates,
            Kind::Metric => &self.metrics,
            Kind::Point => &self.points,
        }
    }

    fn table_mut(&mut self, kind: Kind) -> &mut Table {
        match kind {
            Kind::Component => &mut self.components,
            Kind::Group => &mut self.groups,
            Kind::Incident => &mut self.incidents,
            Kind::Update => &mut self.updates,
            Kind::Metric => &mut self.metrics,
            Kind::Point => &mut self.points,
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    store: Arc<RwLock<Store>>,
    token: Option<String>,
}

/// Error response in Cachet's `errors` envelope.
#[derive(Debug)]
pub struct Failure(StatusCode);

impl IntoResponse for Failure {
    fn into_response(self) -> Response {
        let status = self.0;
        let title = status.canonical_reason().unwrap_or("Error");
        let body = json!({"errors": [{"status": status.as_u16(), "title": title}]});
        (status, Json(body)).into_response()
    }
}

type Reply = Result<(StatusCode, Json<Value>), Failure>;
type Params = HashMap<String, String>;
type Shared = State<AppState>;

pub fn app() -> Router {
    app_with_token(None)
}

/// Router whose write operations require `X-Cachet-Token: <token>` when a
/// token is given.
pub fn app_with_token(token: Option<String>) -> Router {
    let state = AppState {
        store: Arc::new(RwLock::new(Store::default())),
        token,
    };

    Router::new()
        .route("/ping", get(|| async { Json(json!({"data": "Pong!"})) }))
        .route(
            "/version",
            get(|| async { Json(json!({"meta": {"on_latest": true}, "data": VERSION})) }),
        )
        .route(
            "/components",
            get(|s: Shared, q: Query<Params>| list(s, Kind::Component, None, q))
                .post(|s: Shared, b: Json<Value>| create(s, Kind::Component, None, b)),
        )
        .route(
            "/components/groups",
            get(|s: Shared, q: Query<Params>| list(s, Kind::Group, None, q))
                .post(|s: Shared, b: Json<Value>| create(s, Kind::Group, None, b)),
        )
        .route(
            "/components/{id}",
            get(|s: Shared, p: Path<u64>| show(s, Kind::Component, p))
                .put(|s: Shared, p: Path<u64>, b: Json<Value>| update(s, Kind::Component, p, b))
                .delete(|s: Shared, p: Path<u64>| destroy(s, Kind::Component, p)),
        )
        .route(
            "/components/groups/{id}",
            get(|s: Shared, p: Path<u64>| show(s, Kind::Group, p))
                .put(|s: Shared, p: Path<u64>, b: Json<Value>| update(s, Kind::Group, p, b))
                .delete(|s: Shared, p: Path<u64>| destroy(s, Kind::Group, p)),
        )
        .route(
            "/incidents",
            get(|s: Shared, q: Query<Params>| list(s, Kind::Incident, None, q))
                .post(|s: Shared, b: Json<Value>| create(s, Kind::Incident, None, b)),
        )
        .route(
            "/incidents/{id}",
            get(|s: Shared, p: Path<u64>| show(s, Kind::Incident, p))
                .put(|s: Shared, p: Path<u64>, b: Json<Value>| update(s, Kind::Incident, p, b))
                .delete(|s: Shared, p: Path<u64>| destroy(s, Kind::Incident, p)),
        )
        .route(
            "/incidents/{id}/updates",
            get(|s: Shared, Path(parent): Path<u64>, q: Query<Params>| {
                list(s, Kind::Update, Some(parent), q)
            })
            .post(|s: Shared, Path(parent): Path<u64>, b: Json<Value>| {
                create(s, Kind::Update, Some(parent), b)
            }),
        )
        .route(
            "/incidents/{id}/updates/{update}",
            get(|s: Shared, Path(ids): Path<(u64, u64)>| show_nested(s, Kind::Update, ids))
                .put(put_incident_update)
                .delete(|s: Shared, Path(ids): Path<(u64, u64)>| {
                    destroy_nested(s, Kind::Update, ids)
                }),
        )
        .route(
            "/metrics",
            get(|s: Shared, q: Query<Params>| list(s, Kind::Metric, None, q))
                .post(|s: Shared, b: Json<Value>| create(s, Kind::Metric, None, b)),
        )
        .route(
            "/metrics/{id}",
            get(|s: Shared, p: Path<u64>| show(s, Kind::Metric, p))
                .delete(|s: Shared, p: Path<u64>| destroy(s, Kind::Metric, p)),
        )
        .route(
            "/metrics/{id}/points",
            get(|s: Shared, Path(parent): Path<u64>, q: Query<Params>| {
                list(s, Kind::Point, Some(parent), q)
            })
            .post(|s: Shared, Path(parent): Path<u64>, b: Json<Value>| {
                create(s, Kind::Point, Some(parent), b)
            }),
        )
        .route(
            "/metrics/{id}/points/{point}",
            delete(|s: Shared, Path(ids): Path<(u64, u64)>| destroy_nested(s, Kind::Point, ids)),
        )
        .layer(middleware::from_fn_with_state(state.clone(), require_token))
        .with_state(state)
}

pub async fn run(listener: TcpListener, token: Option<String>) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with_token(token)).await
}

async fn require_token(State(state): State<AppState>, request: Request, next: Next) -> Response {
    if request.method() != Method::GET {
        if let Some(expected) = &state.token {
            let presented = request
                .headers()
                .get(TOKEN_HEADER)
                .and_then(|value| value.to_str().ok());
            if presented != Some(expected.as_str()) {
                tracing::debug!(
                    method = %request.method(),
                    uri = %request.uri(),
                    "rejecting unauthenticated write"
                );
                return Failure(StatusCode::UNAUTHORIZED).into_response();
            }
        }
    }
    next.run(request).await
}

/// Loose equality between a stored value and a query-string value.
fn matches_filter(value: &Value, wanted: &str) -> bool {
    match value {
        Value::String(s) => s == wanted,
        Value::Bool(b) => {
            let flag = if *b { "1" } else { "0" };
            wanted == flag || wanted == b.to_string()
        }
        Value::Null => wanted.is_empty(),
        other => other.to_string() == wanted,
    }
}

fn compare(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            let (x, y) = (x.as_f64().unwrap_or_default(), y.as_f64().unwrap_or_default());
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        _ => Ordering::Equal,
    }
}

async fn list(
    State(state): State<AppState>,
    kind: Kind,
    parent: Option<u64>,
    Query(params): Query<Params>,
) -> Reply {
    let store = state.store.read().await;
    if let (Some((parent_kind, _)), Some(parent_id)) = (kind.parent(), parent) {
        if !store.table(parent_kind).rows.contains_key(&parent_id) {
            return Err(Failure(StatusCode::NOT_FOUND));
        }
    }

    let link = kind.parent().map(|(_, field)| field);
    let mut rows: Vec<Value> = store
        .table(kind)
        .rows
        .values()
        .filter(|row| match (link, parent) {
            (Some(field), Some(id)) => row[field] == json!(id),
            _ => true,
        })
        .filter(|row| {
            params.iter().all(|(key, wanted)| match row.get(key) {
                Some(value) if !matches!(key.as_str(), "sort" | "order" | "per_page" | "page") => {
                    matches_filter(value, wanted)
                }
                _ => true,
            })
        })
        .cloned()
        .collect();

    let sort = params.get("sort").map(String::as_str).unwrap_or("id");
    rows.sort_by(|a, b| compare(&a[sort], &b[sort]));
    if params.get("order").is_some_and(|order| order.eq_ignore_ascii_case("desc")) {
        rows.reverse();
    }

    let per_page = params
        .get("per_page")
        .and_then(|v| v.parse::<usize>().ok())
        .filter(|n| *n > 0)
        .unwrap_or(DEFAULT_PER_PAGE);
    let page = params
        .get("page")
        .and_then(|v| v.parse::<usize>().ok())
        .filter(|n| *n > 0)
        .unwrap_or(1);
    let total = rows.len();
    let data: Vec<Value> = rows
        .into_iter()
        .skip((page - 1).saturating_mul(per_page))
        .take(per_page)
        .collect();

    let meta = json!({
        "pagination": {
            "total": total,
            "count": data.len(),
            "per_page": per_page,
            "current_page": page,
            "total_pages": total.div_ceil(per_page),
        }
    });
    Ok((StatusCode::OK, Json(json!({"meta": meta, "data": data}))))
}

async fn create(
    State(state): State<AppState>,
    kind: Kind,
    parent: Option<u64>,
    Json(body): Json<Value>,
) -> Reply {
    let Value::Object(mut attrs) = body else {
        return Err(Failure(StatusCode::BAD_REQUEST));
    };
    if !attrs.contains_key(kind.required_field()) {
        return Err(Failure(StatusCode::BAD_REQUEST));
    }

    let mut store = state.store.write().await;
    if let (Some((parent_kind, field)), Some(parent_id)) = (kind.parent(), parent) {
        if !store.table(parent_kind).rows.contains_key(&parent_id) {
            return Err(Failure(StatusCode::NOT_FOUND));
        }
        attrs.insert(field.to_string(), json!(parent_id));
    }
    let row = store.table_mut(kind).insert(attrs);
    Ok((StatusCode::CREATED, Json(json!({"data": row}))))
}

async fn show(State(state): State<AppState>, kind: Kind, Path(id): Path<u64>) -> Reply {
    let store = state.store.read().await;
    let row = store.table(kind).rows.get(&id).cloned();
    row.map(|row| (StatusCode::OK, Json(json!({"data": row}))))
        .ok_or(Failure(StatusCode::NOT_FOUND))
}

async fn update(
    State(state): State<AppState>,
    kind: Kind,
    Path(id): Path<u64>,
    Json(body): Json<Value>,
) -> Reply {
    let Value::Object(patch) = body else {
        return Err(Failure(StatusCode::BAD_REQUEST));
    };
    let mut store = state.store.write().await;
    let row = store.table_mut(kind).update(id, patch);
    row.map(|row| (StatusCode::OK, Json(json!({"data": row}))))
        .ok_or(Failure(StatusCode::NOT_FOUND))
}

async fn destroy(
    State(state): State<AppState>,
    kind: Kind,
    Path(id): Path<u64>,
) -> Result<StatusCode, Failure> {
    let mut store = state.store.write().await;
    store
        .table_mut(kind)
        .rows
        .remove(&id)
        .map(|_| StatusCode::NO_CONTENT)
        .ok_or(Failure(StatusCode::NOT_FOUND))
}

fn belongs_to(row: &Value, kind: Kind, parent: u64) -> bool {
    kind.parent()
        .is_some_and(|(_, field)| row[field] == json!(parent))
}

async fn show_nested(State(state): State<AppState>, kind: Kind, (parent, id): (u64, u64)) -> Reply {
    let store = state.store.read().await;
    let row = store
        .table(kind)
        .rows
        .get(&id)
        .filter(|row| belongs_to(row, kind, parent))
        .cloned();
    row.map(|row| (StatusCode::OK, Json(json!({"data": row}))))
        .ok_or(Failure(StatusCode::NOT_FOUND))
}

async fn destroy_nested(
    State(state): State<AppState>,
    kind: Kind,
    (parent, id): (u64, u64),
) -> Result<StatusCode, Failure> {
    let mut store = state.store.write().await;
    let table = store.table_mut(kind);
    let owned = table.rows.get(&id).is_some_and(|row| belongs_to(row, kind, parent));
    if !owned {
        return Err(Failure(StatusCode::NOT_FOUND));
    }
    table.rows.remove(&id);
    Ok(StatusCode::NO_CONTENT)
}

/// Incident updates are edited through the query string (`status`, `message`).
async fn put_incident_update(
    State(state): State<AppState>,
    Path((parent, id)): Path<(u64, u64)>,
    Query(params): Query<Params>,
) -> Reply {
    let mut patch = Map::new();
    if let Some(status) = params.get("status") {
        let status = status.parse::<u64>().map_err(|_| Failure(StatusCode::BAD_REQUEST))?;
        patch.insert("status".to_string(), json!(status));
    }
    if let Some(message) = params.get("message") {
        patch.insert("message".to_string(), json!(message));
    }

    let mut store = state.store.write().await;
    let table = store.table_mut(Kind::Update);
    let owned = table.rows.get(&id).is_some_and(|row| belongs_to(row, Kind::Update, parent));
    if !owned {
        return Err(Failure(StatusCode::NOT_FOUND));
    }
    let row = table.update(id, patch).ok_or(Failure(StatusCode::NOT_FOUND))?;
    Ok((StatusCode::OK, Json(json!({"data": row}))))
}
