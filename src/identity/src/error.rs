use std::result;

use thiserror::Error;

pub type Result<T> = result::Result<T, IdentityError>;

#[derive(Error, Debug)]
pub enum IdentityError {
    #[error("http: {0:?}")]
    Http(#[from] reqwest::Error),
    #[error("serde: {0:?}")]
    Serde(#[from] serde_json::Error),
    #[error("internal: {0:?}")]
    Internal(String),
}
