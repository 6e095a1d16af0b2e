use std::result;

use identity::error::IdentityError;
use thiserror::Error;

pub type Result<T> = result::Result<T, IngesterError>;

#[derive(Error, Debug)]
pub enum IngesterError {
    /// The event is unusable or its identity is permanently absent. The host
    /// discards it without redelivery.
    #[error("drop: {0}")]
    Drop(String),
    /// Transient upstream failure. The host redelivers the event later.
    #[error("retry: {0}")]
    Retry(String),
    /// Event type outside the contract. Never redelivered.
    #[error("unsupported: {0}")]
    Unsupported(String),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("serde: {0:?}")]
    Serde(#[from] serde_json::Error),
}

impl From<IdentityError> for IngesterError {
    fn from(err: IdentityError) -> Self {
        // connection and parse faults are redeliverable, every identity
        // service call is idempotent
        IngesterError::Retry(err.to_string())
    }
}
