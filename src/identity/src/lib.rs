pub mod cache;
pub mod error;
pub mod generator;
pub mod identities;

pub use error::Result;
