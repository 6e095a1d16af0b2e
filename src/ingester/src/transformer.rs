use async_trait::async_trait;
use common::types::Settings;

use crate::error::Result;

#[async_trait]
pub trait Transformer<T>: Send + Sync {
    async fn process(&self, settings: &Settings, event: T) -> Result<T>;
}
