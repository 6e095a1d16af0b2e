use async_trait::async_trait;
use common::types::Settings;
use serde_json::Value;

use crate::error::IngesterError;
use crate::error::Result;
use crate::event::Track;
use crate::transformer::Transformer;
use crate::transformers::brand::BrandPolicy;

/// Track-side brand property handling. Source deployments backfill a default
/// brand until the collector sends one; strict destination deployments drop
/// records that arrive without it.
pub struct Brand {
    policy: BrandPolicy,
}

impl Brand {
    pub fn new(policy: BrandPolicy) -> Self {
        Self { policy }
    }
}

fn has_brand(event: &Track) -> bool {
    match event.properties.get("brand") {
        None | Some(Value::Null) => false,
        Some(Value::String(brand)) => !brand.is_empty(),
        Some(_) => true,
    }
}

#[async_trait]
impl Transformer<Track> for Brand {
    async fn process(&self, _settings: &Settings, mut event: Track) -> Result<Track> {
        match &self.policy {
            BrandPolicy::Default(default_brand) => {
                if !has_brand(&event) {
                    event
                        .properties
                        .insert("brand".to_string(), Value::String(default_brand.clone()));
                }
            }
            BrandPolicy::Require => {
                if event.user_id.is_empty() {
                    return Err(IngesterError::Drop("userId not provided".to_string()));
                }
                if !has_brand(&event) {
                    return Err(IngesterError::Drop(
                        "brand property not provided".to_string(),
                    ));
                }
            }
        }
        Ok(event)
    }
}
