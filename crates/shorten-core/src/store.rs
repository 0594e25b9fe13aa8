use crate::error::Result;
use crate::mapping::{MappingId, MappingUpdate, NewMapping, UrlMapping};
use async_trait::async_trait;

/// A read-only view of a mapping store.
///
/// This trait provides only the read operations from [`MappingStore`],
/// allowing collaborators such as a redirect resolver to have read-only access.
#[async_trait]
pub trait ReadStore: Send + Sync + 'static {
    /// Retrieves the mapping with the given id.
    /// Returns `Err(NotFound)` if no live mapping has that id.
    async fn get_by_id(&self, id: MappingId) -> Result<UrlMapping>;

    /// Returns a snapshot of all live mappings in insertion order.
    async fn get_all(&self) -> Result<Vec<UrlMapping>>;

    /// Retrieves the mapping that owns a short token, if any.
    async fn get_by_token(&self, token: &str) -> Result<Option<UrlMapping>>;

    /// Checks whether a short token is held by a live mapping.
    async fn exists_by_token(&self, token: &str) -> Result<bool>;
}

/// Durable storage of [`UrlMapping`] records.
///
/// Implementations must make every uniqueness check atomic with the write
/// that depends on it: two concurrent calls can never both claim the same
/// token or id.
#[async_trait]
pub trait MappingStore: ReadStore {
    /// Inserts a new mapping, assigning an id when the candidate has none.
    ///
    /// Fails with `InvalidArgument` for empty fields, `DuplicateToken` if the
    /// token is taken, and `DuplicateId` if the provided id is taken.
    async fn add(&self, mapping: NewMapping) -> Result<UrlMapping>;

    /// Applies new values to an existing mapping and returns the result.
    ///
    /// Fails with `NotFound` if the id is absent and `DuplicateToken` if the
    /// new token belongs to a different mapping.
    async fn update(&self, id: MappingId, update: MappingUpdate) -> Result<UrlMapping>;

    /// Removes a mapping, freeing its id and token for reuse.
    async fn remove(&self, id: MappingId) -> Result<()>;
}
