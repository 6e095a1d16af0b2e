use std::sync::Arc;

use async_trait::async_trait;
use common::types::Settings;
use identity::identities;
use serde_json::Map;
use serde_json::Value;

use crate::error::Result;
use crate::event::Identify;
use crate::transformer::Transformer;
use crate::transformers::timeshift::require_timeshift;
use crate::transformers::timeshift::NotFoundPolicy;
use crate::transformers::timeshift::Resolver;

/// Destination-stage identify transform: swap the brand-local user id for
/// the canonical timeshift id, keeping the local id around as the
/// `customerId` trait. A user created moments ago gets one delayed re-lookup
/// before the record is dropped.
pub struct Timeshift {
    resolver: Arc<Resolver>,
}

impl Timeshift {
    pub fn new(resolver: Arc<Resolver>) -> Self {
        Self { resolver }
    }
}

#[async_trait]
impl Transformer<Identify> for Timeshift {
    async fn process(&self, settings: &Settings, mut event: Identify) -> Result<Identify> {
        let endpoint =
            identities::brand_endpoint(&settings.api_host, &settings.brand, &event.user_id);
        let identity = self
            .resolver
            .resolve(
                &settings.timeshift_api_bearer_token,
                &endpoint,
                NotFoundPolicy::RetryIfRecent {
                    created_at: event
                        .traits
                        .as_ref()
                        .and_then(|traits| traits.get("created_at")),
                },
            )
            .await?;
        let timeshift = require_timeshift(&identity)?;

        // keep the brand-local id inside the traits before the overwrite so
        // it survives brand nesting as customerId
        let traits = event.traits.get_or_insert_with(Map::new);
        traits.remove("userId");
        traits.insert(
            "customerId".to_string(),
            Value::String(event.user_id.clone()),
        );
        event.user_id = timeshift;
        Ok(event)
    }
}
