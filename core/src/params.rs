//! Typed parameters for each API operation.
//!
//! # Design
//! Every struct derives `Default`, so an operation can be called with any
//! field absent. Required path identifiers and bodies are `Option`s checked
//! once when the request is built, yielding `ApiError::MissingParameter`
//! instead of a network call. Each struct carries an `extra_query` bag which
//! is merged into the query string last and may override computed values.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use crate::error::ApiError;

/// Free-form query parameters, applied after everything else.
pub type QueryBag = BTreeMap<String, String>;

const DEFAULT_SORT: &str = "id";
const DEFAULT_ORDER: &str = "asc";

fn put(query: &mut QueryBag, wire_name: &str, value: Option<impl ToString>) {
    if let Some(value) = value {
        query.insert(wire_name.to_string(), value.to_string());
    }
}

fn put_flag(query: &mut QueryBag, wire_name: &str, value: Option<bool>) {
    put(query, wire_name, value.map(u8::from));
}

/// Sorting and pagination shared by every list endpoint.
///
/// `sort` and `order` fall back to `id` and `asc` when unset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Paging {
    pub sort: Option<String>,
    pub order: Option<String>,
    pub per_page: Option<u32>,
    pub page: Option<u32>,
}

impl Paging {
    pub fn sort(mut self, sort: impl Into<String>) -> Self {
        self.sort = Some(sort.into());
        self
    }

    pub fn order(mut self, order: impl Into<String>) -> Self {
        self.order = Some(order.into());
        self
    }

    pub fn per_page(mut self, per_page: u32) -> Self {
        self.per_page = Some(per_page);
        self
    }

    pub fn page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    pub(crate) fn write(&self, query: &mut QueryBag) {
        put(query, "sort", Some(self.sort.as_deref().unwrap_or(DEFAULT_SORT)));
        put(query, "order", Some(self.order.as_deref().unwrap_or(DEFAULT_ORDER)));
        put(query, "per_page", self.per_page);
        put(query, "page", self.page);
    }
}

fn to_body<T: Serialize>(body: &T) -> Result<Option<Value>, ApiError> {
    Ok(Some(serde_json::to_value(body)?))
}

/// Parameters for operations without inputs (`ping`, `version`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BasicParams {
    pub extra_query: QueryBag,
}

/// Parameters for collection-level creates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CreateParams {
    pub body: Option<Value>,
    pub extra_query: QueryBag,
}

impl CreateParams {
    pub fn new(body: Value) -> Self {
        Self {
            body: Some(body),
            ..Self::default()
        }
    }

    pub fn with_body<T: Serialize>(mut self, body: &T) -> Result<Self, ApiError> {
        self.body = to_body(body)?;
        Ok(self)
    }
}

/// Filters for `GET /components`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComponentListParams {
    pub id: Option<u64>,
    pub name: Option<String>,
    pub status: Option<u8>,
    pub group_id: Option<u64>,
    pub enabled: Option<bool>,
    pub paging: Paging,
    pub extra_query: QueryBag,
}

impl ComponentListParams {
    pub(crate) fn to_query(&self) -> QueryBag {
        let mut query = QueryBag::new();
        self.paging.write(&mut query);
        put(&mut query, "id", self.id);
        put(&mut query, "name", self.name.as_deref());
        put(&mut query, "status", self.status);
        put(&mut query, "group_id", self.group_id);
        put_flag(&mut query, "enabled", self.enabled);
        query
    }
}

/// Filters for `GET /components/groups`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComponentGroupListParams {
    pub id: Option<u64>,
    pub name: Option<String>,
    pub collapsed: Option<u8>,
    pub paging: Paging,
    pub extra_query: QueryBag,
}

impl ComponentGroupListParams {
    pub(crate) fn to_query(&self) -> QueryBag {
        let mut query = QueryBag::new();
        put(&mut query, "id", self.id);
        put(&mut query, "name", self.name.as_deref());
        put(&mut query, "collapsed", self.collapsed);
        self.paging.write(&mut query);
        query
    }
}

/// Filters for `GET /incidents`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IncidentListParams {
    pub id: Option<u64>,
    pub component_id: Option<u64>,
    pub name: Option<String>,
    pub status: Option<u8>,
    pub visible: Option<bool>,
    pub paging: Paging,
    pub extra_query: QueryBag,
}

impl IncidentListParams {
    pub(crate) fn to_query(&self) -> QueryBag {
        let mut query = QueryBag::new();
        put(&mut query, "id", self.id);
        put(&mut query, "component_id", self.component_id);
        put(&mut query, "name", self.name.as_deref());
        put(&mut query, "status", self.status);
        put_flag(&mut query, "visible", self.visible);
        self.paging.write(&mut query);
        query
    }
}

/// Paging-only list parameters (`GET /metrics`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageParams {
    pub paging: Paging,
    pub extra_query: QueryBag,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComponentParams {
    pub component: Option<String>,
    pub body: Option<Value>,
    pub extra_query: QueryBag,
}

impl ComponentParams {
    pub fn new(component: impl ToString) -> Self {
        Self {
            component: Some(component.to_string()),
            ..Self::default()
        }
    }

    pub fn with_body<T: Serialize>(mut self, body: &T) -> Result<Self, ApiError> {
        self.body = to_body(body)?;
        Ok(self)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComponentGroupParams {
    pub group: Option<String>,
    pub body: Option<Value>,
    pub extra_query: QueryBag,
}

impl ComponentGroupParams {
    pub fn new(group: impl ToString) -> Self {
        Self {
            group: Some(group.to_string()),
            ..Self::default()
        }
    }

    pub fn with_body<T: Serialize>(mut self, body: &T) -> Result<Self, ApiError> {
        self.body = to_body(body)?;
        Ok(self)
    }
}

/// Addresses one incident. Also used to list and create its updates, where
/// `paging` and `body` apply respectively.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IncidentParams {
    pub incident: Option<String>,
    pub body: Option<Value>,
    pub paging: Paging,
    pub extra_query: QueryBag,
}

impl IncidentParams {
    pub fn new(incident: impl ToString) -> Self {
        Self {
            incident: Some(incident.to_string()),
            ..Self::default()
        }
    }

    pub fn with_body<T: Serialize>(mut self, body: &T) -> Result<Self, ApiError> {
        self.body = to_body(body)?;
        Ok(self)
    }
}

/// Addresses one update of one incident. `status` and `message` are only
/// sent by the PUT operation, as query parameters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IncidentUpdateParams {
    pub incident: Option<String>,
    pub update: Option<String>,
    pub status: Option<u8>,
    pub message: Option<String>,
    pub extra_query: QueryBag,
}

impl IncidentUpdateParams {
    pub fn new(incident: impl ToString, update: impl ToString) -> Self {
        Self {
            incident: Some(incident.to_string()),
            update: Some(update.to_string()),
            ..Self::default()
        }
    }

    pub(crate) fn to_query(&self) -> QueryBag {
        let mut query = QueryBag::new();
        put(&mut query, "status", self.status);
        put(&mut query, "message", self.message.as_deref());
        query
    }
}

/// Addresses one metric. Also used to list and create its points.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricParams {
    pub metric: Option<String>,
    pub body: Option<Value>,
    pub paging: Paging,
    pub extra_query: QueryBag,
}

impl MetricParams {
    pub fn new(metric: impl ToString) -> Self {
        Self {
            metric: Some(metric.to_string()),
            ..Self::default()
        }
    }

    pub fn with_body<T: Serialize>(mut self, body: &T) -> Result<Self, ApiError> {
        self.body = to_body(body)?;
        Ok(self)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricPointParams {
    pub metric: Option<String>,
    pub point: Option<String>,
    pub extra_query: QueryBag,
}

impl MetricPointParams {
    pub fn new(metric: impl ToString, point: impl ToString) -> Self {
        Self {
            metric: Some(metric.to_string()),
            point: Some(point.to_string()),
            ..Self::default()
        }
    }
}
