//! Client configuration: base address plus credentials.

use crate::auth::{ApiKeyCredential, BasicAuthCredential, Credentials, KeyPlacement};
use crate::error::ApiError;

/// Header Cachet reads its API token from.
pub const TOKEN_HEADER: &str = "X-Cachet-Token";

const MISSING_BASE_URL: &str = "Domain parameter must be specified as a string.";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    pub credentials: Credentials,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            credentials: Credentials::default(),
        }
    }

    pub fn with_api_key(
        mut self,
        value: impl Into<String>,
        carrier: impl Into<String>,
        placement: KeyPlacement,
    ) -> Self {
        self.credentials.api_key = Some(ApiKeyCredential {
            value: value.into(),
            carrier: carrier.into(),
            placement,
        });
        self
    }

    pub fn with_basic_auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.credentials.basic = Some(BasicAuthCredential {
            username: username.into(),
            password: password.into(),
        });
        self
    }

    /// Read `CACHET_URL` and, if set, `CACHET_TOKEN` (sent as `X-Cachet-Token`).
    pub fn from_env() -> Result<Self, ApiError> {
        let base_url = std::env::var("CACHET_URL")
            .map_err(|_| ApiError::Configuration(MISSING_BASE_URL.to_string()))?;
        let mut config = ClientConfig::new(base_url);
        if let Ok(token) = std::env::var("CACHET_TOKEN") {
            config = config.with_api_key(token, TOKEN_HEADER, KeyPlacement::Header);
        }
        config.validated()
    }

    /// Reject an empty base address and strip trailing slashes.
    pub(crate) fn validated(mut self) -> Result<Self, ApiError> {
        let trimmed = self.base_url.trim().trim_end_matches('/');
        if trimmed.is_empty() {
            return Err(ApiError::Configuration(MISSING_BASE_URL.to_string()));
        }
        self.base_url = trimmed.to_string();
        Ok(self)
    }
}

impl From<&str> for ClientConfig {
    fn from(base_url: &str) -> Self {
        ClientConfig::new(base_url)
    }
}

impl From<String> for ClientConfig {
    fn from(base_url: String) -> Self {
        ClientConfig::new(base_url)
    }
}
