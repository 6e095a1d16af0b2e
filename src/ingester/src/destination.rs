use async_trait::async_trait;
use common::types::Settings;

use crate::error::Result;

#[async_trait]
pub trait Destination<T>: Send + Sync {
    async fn send(&self, settings: &Settings, event: T) -> Result<()>;
}
