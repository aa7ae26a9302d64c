use crate::config::ConfigError;
use crate::models::UnknownVariant;
use crate::storage::StoreError;

/// Application-level error.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("storage error: {0}")]
    Store(#[from] StoreError),
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl From<UnknownVariant> for Error {
    fn from(err: UnknownVariant) -> Self {
        Error::InvalidInput(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Store(StoreError::Serialization(err))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
