use crate::mapping::MappingId;
use thiserror::Error;

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors raised by a [`MappingStore`](crate::MappingStore).
///
/// The first four variants are record-level and caller-correctable. The
/// remaining ones describe a failing persistence backend and are fatal to
/// the current operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("short token already exists: {0}")]
    DuplicateToken(String),
    #[error("mapping id already exists: {0}")]
    DuplicateId(MappingId),
    #[error("mapping not found: {0}")]
    NotFound(MappingId),
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),
    #[error("storage operation timed out: {0}")]
    Timeout(String),
    #[error("storage query failed: {0}")]
    Query(String),
    #[error("stored data is invalid: {0}")]
    InvalidData(String),
}

impl StoreError {
    /// Returns `true` for errors that originate in the persistence backend
    /// rather than in the request itself.
    pub fn is_backend(&self) -> bool {
        matches!(
            self,
            StoreError::Unavailable(_)
                | StoreError::Timeout(_)
                | StoreError::Query(_)
                | StoreError::InvalidData(_)
        )
    }
}
