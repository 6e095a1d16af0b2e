use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::header::CONTENT_TYPE;
pub use reqwest::StatusCode;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::error::Result;

/// Identity record held by the identity-mapping service: a mapping of brand
/// key -> brand-local id plus the canonical `timeshift` id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    pub timeshift: Option<String>,
    #[serde(flatten)]
    pub brands: HashMap<String, Value>,
}

impl Identity {
    /// The canonical id, if present and non-empty. A record without one is
    /// unusable downstream even when the lookup nominally succeeded.
    pub fn usable_timeshift(&self) -> Option<&str> {
        self.timeshift.as_deref().filter(|id| !id.is_empty())
    }
}

/// Body of an identity creation call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateIdentityRequest {
    pub timeshift: String,
    #[serde(flatten)]
    pub brands: HashMap<String, String>,
}

impl CreateIdentityRequest {
    /// `{[brand]: localId, timeshift: canonicalId}`
    pub fn brand(brand: &str, local_id: &str, timeshift: &str) -> Self {
        Self {
            timeshift: timeshift.to_string(),
            brands: HashMap::from([(brand.to_string(), local_id.to_string())]),
        }
    }

    /// `{timeshift: canonicalId}` — no brand mapping is stored.
    pub fn canonical(timeshift: &str) -> Self {
        Self {
            timeshift: timeshift.to_string(),
            brands: HashMap::new(),
        }
    }
}

/// Classified result of an identity lookup. 5xx, 429 and every other
/// unexpected status land in `Unavailable`; what to do about `NotFound`
/// depends on the caller's intent.
#[derive(Debug, Clone)]
pub enum Lookup {
    Found(Identity),
    NotFound,
    Unavailable(StatusCode),
}

#[async_trait]
pub trait Provider: Send + Sync {
    async fn lookup(&self, token: &str, endpoint: &str) -> Result<Lookup>;
    async fn create(
        &self,
        token: &str,
        endpoint: &str,
        req: &CreateIdentityRequest,
    ) -> Result<StatusCode>;
}

pub fn brand_endpoint(api_host: &str, brand: &str, user_id: &str) -> String {
    format!("{api_host}/user/v1/identity/{brand}/{user_id}")
}

/// Brand-less lookup used by the cross-brand stage, where the record's user
/// id already is the canonical id.
pub fn canonical_endpoint(api_host: &str, user_id: &str) -> String {
    format!("{api_host}/user/v1/identity/timeshift/{user_id}")
}

pub fn create_endpoint(api_host: &str) -> String {
    format!("{api_host}/user/v1/identity")
}

pub struct Identities {
    http: reqwest::Client,
}

impl Identities {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl Provider for Identities {
    async fn lookup(&self, token: &str, endpoint: &str) -> Result<Lookup> {
        let response = self
            .http
            .get(endpoint)
            .header(AUTHORIZATION, format!("Bearer {token}"))
            .header(CONTENT_TYPE, "application/json")
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(Lookup::NotFound);
        }
        if !status.is_success() {
            return Ok(Lookup::Unavailable(status));
        }

        Ok(Lookup::Found(response.json().await?))
    }

    async fn create(
        &self,
        token: &str,
        endpoint: &str,
        req: &CreateIdentityRequest,
    ) -> Result<StatusCode> {
        let response = self
            .http
            .post(endpoint)
            .header(AUTHORIZATION, format!("Bearer {token}"))
            .header(CONTENT_TYPE, "application/json")
            .json(req)
            .send()
            .await?;

        debug!("identity create returned {}", response.status());
        Ok(response.status())
    }
}
