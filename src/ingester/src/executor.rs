use std::sync::Arc;

use common::types::Settings;
use tracing::debug;

use crate::destination::Destination;
use crate::error::IngesterError;
use crate::error::Result;
use crate::event::Event;
use crate::event::Identify;
use crate::event::Track;
use crate::transformer::Transformer;

/// Terminal outcome of one dispatched event. The host applies its own
/// redelivery policy: `Retry` means redeliver later, `Drop` and `Reject` are
/// final.
#[derive(Debug, PartialEq)]
pub enum Outcome {
    Forward(Event),
    Drop(String),
    Retry(String),
    Reject(String),
}

impl From<IngesterError> for Outcome {
    fn from(err: IngesterError) -> Self {
        match err {
            IngesterError::Drop(reason) => Outcome::Drop(reason),
            IngesterError::Retry(reason) => Outcome::Retry(reason),
            IngesterError::Unsupported(reason) => Outcome::Reject(reason),
            // unexpected faults are redeliverable, identity calls are
            // idempotent
            other => Outcome::Retry(other.to_string()),
        }
    }
}

/// What to do with event types no transformer chain is registered for.
/// Deployments with a narrow contract reject them, the rest pass them along
/// untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnhandledPolicy {
    Reject,
    Forward,
}

pub struct Executor<T> {
    transformers: Vec<Arc<dyn Transformer<T>>>,
    destinations: Vec<Arc<dyn Destination<T>>>,
}

impl<T: Clone + Send + Sync> Executor<T> {
    pub fn new(
        transformers: Vec<Arc<dyn Transformer<T>>>,
        destinations: Vec<Arc<dyn Destination<T>>>,
    ) -> Self {
        Self {
            transformers,
            destinations,
        }
    }

    pub async fn execute(&self, settings: &Settings, mut event: T) -> Result<T> {
        for transformer in &self.transformers {
            event = transformer.process(settings, event).await?;
        }

        for destination in &self.destinations {
            destination.send(settings, event.clone()).await?;
        }

        Ok(event)
    }
}

pub struct Dispatcher {
    track: Executor<Track>,
    identify: Executor<Identify>,
    unhandled: UnhandledPolicy,
}

impl Dispatcher {
    pub fn new(
        track: Executor<Track>,
        identify: Executor<Identify>,
        unhandled: UnhandledPolicy,
    ) -> Self {
        Self {
            track,
            identify,
            unhandled,
        }
    }

    pub async fn dispatch(&self, settings: &Settings, event: Event) -> Outcome {
        let result = match event {
            Event::Track(track) => self
                .track
                .execute(settings, track)
                .await
                .map(Event::Track),
            Event::Identify(identify) => self
                .identify
                .execute(settings, identify)
                .await
                .map(Event::Identify),
            other => return self.unhandled(other),
        };

        match result {
            Ok(event) => Outcome::Forward(event),
            Err(err) => {
                debug!("{} not forwarded: {err}", err_type(&err));
                err.into()
            }
        }
    }

    fn unhandled(&self, event: Event) -> Outcome {
        match self.unhandled {
            UnhandledPolicy::Forward => Outcome::Forward(event),
            UnhandledPolicy::Reject => {
                Outcome::Reject(format!("{} is not supported", event.type_name()))
            }
        }
    }
}

fn err_type(err: &IngesterError) -> &'static str {
    match err {
        IngesterError::Drop(_) => "drop",
        IngesterError::Retry(_) => "retry",
        IngesterError::Unsupported(_) => "unsupported",
        _ => "error",
    }
}
