use std::fmt::Debug;

use async_trait::async_trait;
use common::types::Settings;

use crate::destination::Destination;
use crate::error::Result;

pub struct DebugSink {}

impl DebugSink {
    pub fn new() -> Self {
        Self {}
    }
}

impl Default for DebugSink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<T: Debug + Send + 'static> Destination<T> for DebugSink {
    async fn send(&self, _settings: &Settings, event: T) -> Result<()> {
        println!("forward: {:?}", event);
        Ok(())
    }
}
