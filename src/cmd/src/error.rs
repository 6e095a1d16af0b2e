use std::result;

use thiserror::Error;

pub type Result<T> = result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("ingester: {0:?}")]
    Ingester(#[from] ingester::error::IngesterError),
}
