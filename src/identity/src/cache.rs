use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use tokio::time::Instant;

/// TTL cache with a single-flight guarantee: for any key, at most one loader
/// runs at a time, and callers that arrive while it runs observe the value it
/// stores. Failed loads are never stored, so the next caller loads again.
/// Expiry is the only invalidation.
pub struct Cache<T> {
    slots: Mutex<HashMap<String, Arc<Slot<T>>>>,
}

struct Slot<T> {
    state: tokio::sync::Mutex<Option<(Instant, T)>>,
}

impl<T: Clone> Cache<T> {
    pub fn new() -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Return the cached value for `key` if it is younger than `ttl`,
    /// otherwise run `loader` and store its result.
    pub async fn load<E, F, Fut>(&self, key: &str, ttl: Duration, loader: F) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let slot = {
            let mut slots = self.slots.lock().unwrap();
            slots
                .entry(key.to_string())
                .or_insert_with(|| {
                    Arc::new(Slot {
                        state: tokio::sync::Mutex::new(None),
                    })
                })
                .clone()
        };

        let mut state = slot.state.lock().await;
        if let Some((loaded_at, value)) = state.as_ref() {
            if loaded_at.elapsed() < ttl {
                return Ok(value.clone());
            }
        }

        let value = loader().await?;
        *state = Some((Instant::now(), value.clone()));
        Ok(value)
    }
}

impl<T: Clone> Default for Cache<T> {
    fn default() -> Self {
        Self::new()
    }
}
