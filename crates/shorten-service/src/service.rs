use crate::error::{Result, ServiceError};
use crate::outcome::Outcome;
use shorten_core::{MappingId, MappingStore, NewMapping, UrlMapping};
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// The mapping use cases, independent of any transport.
///
/// This service wraps a [`MappingStore`] and handles:
/// - Validation of candidates before anything reaches the store
/// - Existence checks ahead of edits and deletes
/// - Translating store errors into [`ServiceError`]
///
/// It holds no state of its own; clones share the same store.
#[derive(Debug)]
pub struct MappingService<S> {
    store: Arc<S>,
}

impl<S> Clone for MappingService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: MappingStore> MappingService<S> {
    pub fn new(store: S) -> Self {
        Self {
            store: Arc::new(store),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Lists every live mapping in creation order.
    pub async fn list_all(&self) -> Result<Outcome<Vec<UrlMapping>>> {
        let mappings = self.store.get_all().await?;
        trace!(count = mappings.len(), "listed mappings");
        Ok(Outcome::View(mappings))
    }

    /// Fetches one mapping.
    pub async fn get_details(&self, id: MappingId) -> Result<Outcome<UrlMapping>> {
        let mapping = self.store.get_by_id(id).await?;
        Ok(Outcome::View(mapping))
    }

    /// Stores a new mapping; the token must not be in use.
    pub async fn create_mapping(&self, candidate: NewMapping) -> Result<Outcome<UrlMapping>> {
        if let Err(err) = candidate.validate() {
            warn!(token = %candidate.shortened_url, error = %err, "rejected mapping candidate");
            return Err(err.into());
        }

        let created = self.store.add(candidate).await?;
        debug!(id = %created.id, token = %created.shortened_url, "created mapping");
        Ok(Outcome::RedirectToList(created))
    }

    /// Replaces the URL and token of an existing mapping.
    ///
    /// A candidate that names a different id than `id` is treated as
    /// pointing at nothing and fails with `NotFound`.
    pub async fn edit_mapping(
        &self,
        id: MappingId,
        candidate: NewMapping,
    ) -> Result<Outcome<UrlMapping>> {
        if candidate.id.is_some_and(|candidate_id| candidate_id != id) {
            warn!(id = %id, candidate_id = ?candidate.id, "edit candidate targets another mapping");
            return Err(ServiceError::NotFound(id));
        }

        if let Err(err) = candidate.validate() {
            warn!(id = %id, error = %err, "rejected mapping edit");
            return Err(err.into());
        }

        self.store.get_by_id(id).await?;

        let updated = self.store.update(id, candidate.into()).await?;
        debug!(id = %id, token = %updated.shortened_url, "edited mapping");
        Ok(Outcome::RedirectToList(updated))
    }

    /// Deletes an existing mapping.
    pub async fn delete_mapping(&self, id: MappingId) -> Result<Outcome<()>> {
        self.store.get_by_id(id).await?;
        self.store.remove(id).await?;
        debug!(id = %id, "deleted mapping");
        Ok(Outcome::RedirectToList(()))
    }

    /// Resolves a short token to its mapping.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(mapping))` - the live mapping that owns the token
    /// * `Ok(None)` - no mapping uses the token
    /// * `Err(e)` - the store could not be read
    pub async fn resolve(&self, token: &str) -> Result<Option<UrlMapping>> {
        trace!(token = %token, "resolving short token");
        Ok(self.store.get_by_token(token).await?)
    }
}
