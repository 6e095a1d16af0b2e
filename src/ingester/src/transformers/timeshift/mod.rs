use std::sync::Arc;
use std::time::Duration;

use chrono::DateTime;
use chrono::TimeZone;
use chrono::Utc;
use identity::cache::Cache;
use identity::generator;
use identity::identities::Identity;
use identity::identities::Lookup;
use identity::identities::Provider;
use serde_json::Value;
use tracing::debug;

use crate::error::IngesterError;
use crate::error::Result;

pub mod identify;
pub mod track;

const CACHE_TTL: Duration = Duration::from_secs(60);
const NOT_FOUND_BACKOFF: Duration = Duration::from_secs(2);
/// A user created within this window may simply not have propagated to the
/// identity service yet.
const RECENT_CREATION_WINDOW_MS: i64 = 5 * 60 * 1000;

/// How a not-found lookup resolves, by handler intent.
#[derive(Clone, Copy)]
pub enum NotFoundPolicy<'a> {
    /// Wait once and look the identity up again if the user was created
    /// moments ago; otherwise the identity is permanently absent.
    RetryIfRecent { created_at: Option<&'a Value> },
    /// First-touch signup: derive the canonical id from the email instead of
    /// waiting for the identity service to catch up.
    Synthesize {
        brand: &'a str,
        local_user_id: &'a str,
        email: Option<&'a str>,
    },
    Drop,
}

/// Cache-backed identity lookup shared by the destination-stage transforms.
/// Concurrent invocations resolving the same endpoint share one underlying
/// call; failures are classified, never cached.
pub struct Resolver {
    provider: Arc<dyn Provider>,
    cache: Arc<Cache<Identity>>,
    ttl: Duration,
    backoff: Duration,
}

impl Resolver {
    pub fn new(provider: Arc<dyn Provider>, cache: Arc<Cache<Identity>>) -> Self {
        Self {
            provider,
            cache,
            ttl: CACHE_TTL,
            backoff: NOT_FOUND_BACKOFF,
        }
    }

    pub async fn resolve(
        &self,
        token: &str,
        endpoint: &str,
        policy: NotFoundPolicy<'_>,
    ) -> Result<Identity> {
        self.cache
            .load(endpoint, self.ttl, || self.lookup(token, endpoint, policy))
            .await
    }

    async fn lookup(
        &self,
        token: &str,
        endpoint: &str,
        policy: NotFoundPolicy<'_>,
    ) -> Result<Identity> {
        match self.provider.lookup(token, endpoint).await? {
            Lookup::Found(identity) => Ok(identity),
            Lookup::Unavailable(status) => Err(IngesterError::Retry(format!(
                "identity lookup failed with {status}"
            ))),
            Lookup::NotFound => self.not_found(token, endpoint, policy).await,
        }
    }

    async fn not_found(
        &self,
        token: &str,
        endpoint: &str,
        policy: NotFoundPolicy<'_>,
    ) -> Result<Identity> {
        match policy {
            NotFoundPolicy::Drop => Err(IngesterError::Drop("identity not found".to_string())),
            NotFoundPolicy::Synthesize {
                brand,
                local_user_id,
                email,
            } => match email {
                Some(email) => {
                    let timeshift = generator::generate_user_id(email);
                    Ok(Identity {
                        timeshift: Some(timeshift),
                        brands: [(brand.to_string(), Value::String(local_user_id.to_string()))]
                            .into_iter()
                            .collect(),
                    })
                }
                None => Err(IngesterError::Drop("identity not found".to_string())),
            },
            NotFoundPolicy::RetryIfRecent { created_at } => {
                if !is_recent(created_at) {
                    return Err(IngesterError::Drop(
                        "identity not found and created_at not recent".to_string(),
                    ));
                }

                debug!("identity not found but created_at is recent, retrying after backoff");
                tokio::time::sleep(self.backoff).await;
                match self.provider.lookup(token, endpoint).await? {
                    Lookup::Found(identity) => Ok(identity),
                    Lookup::NotFound => Err(IngesterError::Drop(
                        "identity not found after retry".to_string(),
                    )),
                    Lookup::Unavailable(status) => Err(IngesterError::Retry(format!(
                        "identity lookup failed with {status}"
                    ))),
                }
            }
        }
    }
}

/// Every identify/track handler requires a usable canonical id once an
/// identity record is in hand, however it was obtained.
pub(crate) fn require_timeshift(identity: &Identity) -> Result<String> {
    identity
        .usable_timeshift()
        .map(str::to_string)
        .ok_or_else(|| IngesterError::Drop("identity has no timeshift user id".to_string()))
}

fn is_recent(created_at: Option<&Value>) -> bool {
    let Some(value) = created_at else {
        return false;
    };
    let Some(created_at) = parse_timestamp(value) else {
        return false;
    };
    Utc::now()
        .signed_duration_since(created_at)
        .num_milliseconds()
        < RECENT_CREATION_WINDOW_MS
}

fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(text) => dateparser::parse(text).ok(),
        Value::Number(number) => number
            .as_i64()
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single()),
        _ => None,
    }
}
