use async_trait::async_trait;
use common::types::Settings;

use crate::error::Result;
use crate::event::Identify;
use crate::transformer::Transformer;
use crate::transformers::traits::normalize_traits;
use crate::transformers::traits::Nesting;

/// Nest identify traits under the deployment's brand shape. Events without
/// traits pass through unchanged.
pub struct Normalize {
    nesting: Nesting,
}

impl Normalize {
    pub fn new(nesting: Nesting) -> Self {
        Self { nesting }
    }
}

#[async_trait]
impl Transformer<Identify> for Normalize {
    async fn process(&self, settings: &Settings, mut event: Identify) -> Result<Identify> {
        if let Some(traits) = event.traits.take() {
            event.traits = Some(normalize_traits(traits, &settings.brand, self.nesting));
        }
        Ok(event)
    }
}
