use shorten_core::{MappingId, StoreError};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ServiceError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("short token already exists: {0}")]
    DuplicateToken(String),
    #[error("mapping id already exists: {0}")]
    DuplicateId(MappingId),
    #[error("mapping not found: {0}")]
    NotFound(MappingId),
    #[error("storage error: {0}")]
    Storage(#[source] StoreError),
}

impl From<StoreError> for ServiceError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::InvalidArgument(message) => Self::InvalidArgument(message),
            StoreError::DuplicateToken(token) => Self::DuplicateToken(token),
            StoreError::DuplicateId(id) => Self::DuplicateId(id),
            StoreError::NotFound(id) => Self::NotFound(id),
            other => Self::Storage(other),
        }
    }
}
