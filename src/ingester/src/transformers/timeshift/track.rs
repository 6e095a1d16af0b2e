use std::sync::Arc;

use async_trait::async_trait;
use common::types::Settings;
use common::types::EVENT_ACCOUNT_CREATED;
use identity::identities;
use serde_json::Value;

use crate::error::IngesterError;
use crate::error::Result;
use crate::event::Track;
use crate::transformer::Transformer;
use crate::transformers::timeshift::require_timeshift;
use crate::transformers::timeshift::NotFoundPolicy;
use crate::transformers::timeshift::Resolver;
use crate::transformers::traits::camel_to_title_with_spaces;

/// Destination-stage track transform: swap the brand-local user id for the
/// canonical timeshift id and attach the display brand name. Signup events
/// may synthesize the id from their email, everything else waits for the
/// identity service.
pub struct Timeshift {
    resolver: Arc<Resolver>,
}

impl Timeshift {
    pub fn new(resolver: Arc<Resolver>) -> Self {
        Self { resolver }
    }
}

#[async_trait]
impl Transformer<Track> for Timeshift {
    async fn process(&self, settings: &Settings, mut event: Track) -> Result<Track> {
        if event.user_id.is_empty() {
            return Err(IngesterError::Drop("userId not provided".to_string()));
        }

        let endpoint =
            identities::brand_endpoint(&settings.api_host, &settings.brand, &event.user_id);
        let email = if event.event == EVENT_ACCOUNT_CREATED {
            event.properties.get("email").and_then(Value::as_str)
        } else {
            None
        };
        let identity = self
            .resolver
            .resolve(
                &settings.timeshift_api_bearer_token,
                &endpoint,
                NotFoundPolicy::Synthesize {
                    brand: &settings.brand,
                    local_user_id: &event.user_id,
                    email,
                },
            )
            .await?;

        event.user_id = require_timeshift(&identity)?;
        event.properties.insert(
            "brand".to_string(),
            Value::String(camel_to_title_with_spaces(&settings.brand)),
        );
        Ok(event)
    }
}
