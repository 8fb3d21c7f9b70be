//! Credentials and authentication header composition.
//!
//! An API key travels either as a header or as a query parameter under a
//! caller-chosen carrier name. HTTP Basic credentials always travel in the
//! `Authorization` header. Both may be configured at once.

use std::collections::BTreeMap;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use crate::http::insert_header;

/// Where an API key is transmitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyPlacement {
    #[default]
    Header,
    Query,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiKeyCredential {
    pub value: String,
    /// Header name or query parameter name.
    pub carrier: String,
    pub placement: KeyPlacement,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicAuthCredential {
    pub username: String,
    pub password: String,
}

impl BasicAuthCredential {
    fn is_complete(&self) -> bool {
        !self.username.is_empty() && !self.password.is_empty()
    }

    fn header_value(&self) -> String {
        let token = STANDARD.encode(format!("{}:{}", self.username, self.password));
        format!("Basic {token}")
    }
}

/// Credentials attached to every request a client sends.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub api_key: Option<ApiKeyCredential>,
    pub basic: Option<BasicAuthCredential>,
}

impl Credentials {
    /// Return `existing` with the authentication headers added.
    ///
    /// A header-placed API key with a carrier name sets `headers[carrier]`;
    /// complete basic credentials set `Authorization`. The two rules are
    /// independent.
    pub fn compose_auth_headers(
        &self,
        existing: BTreeMap<String, String>,
    ) -> BTreeMap<String, String> {
        let mut headers = existing;
        if let Some(key) = &self.api_key {
            if key.placement == KeyPlacement::Header && !key.carrier.is_empty() {
                insert_header(&mut headers, &key.carrier, &key.value);
            }
        }
        if let Some(basic) = self.basic.as_ref().filter(|b| b.is_complete()) {
            insert_header(&mut headers, "Authorization", &basic.header_value());
        }
        headers
    }

    /// Insert a query-placed API key into `query`.
    pub fn apply_query_key(&self, query: &mut BTreeMap<String, String>) {
        if let Some(key) = &self.api_key {
            if key.placement == KeyPlacement::Query && !key.carrier.is_empty() {
                query.insert(key.carrier.clone(), key.value.clone());
            }
        }
    }
}
