use async_trait::async_trait;
use parking_lot::RwLock;
use shorten_core::{
    MappingId, MappingStore, MappingUpdate, NewMapping, ReadStore, Result, StoreError, UrlMapping,
};
use std::collections::HashMap;
use tracing::trace;

/// In-memory storage entry for a URL mapping.
#[derive(Debug, Clone)]
struct Entry {
    /// Position in insertion order.
    seq: u64,
    mapping: UrlMapping,
}

#[derive(Debug)]
struct Entries {
    by_id: HashMap<MappingId, Entry>,
    by_token: HashMap<String, MappingId>,
    next_seq: u64,
    /// `None` once an id at the top of the range has been seen.
    next_id: Option<MappingId>,
}

impl Entries {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            by_id: HashMap::with_capacity(capacity),
            by_token: HashMap::with_capacity(capacity),
            next_seq: 0,
            next_id: Some(MappingId::new(1)),
        }
    }
}

/// In-memory implementation of [`MappingStore`].
///
/// The id index and the token index sit behind a single `RwLock` so that
/// a uniqueness check and the write depending on it happen under one
/// exclusive guard. Readers share the lock and always see whole mutations.
#[derive(Debug)]
pub struct InMemoryStore {
    entries: RwLock<Entries>,
}

impl InMemoryStore {
    /// Creates a new in-memory store.
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates a new in-memory store with the specified capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: RwLock::new(Entries::with_capacity(capacity)),
        }
    }

    /// Number of live mappings.
    pub fn len(&self) -> usize {
        self.entries.read().by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReadStore for InMemoryStore {
    async fn get_by_id(&self, id: MappingId) -> Result<UrlMapping> {
        self.entries
            .read()
            .by_id
            .get(&id)
            .map(|entry| entry.mapping.clone())
            .ok_or(StoreError::NotFound(id))
    }

    async fn get_all(&self) -> Result<Vec<UrlMapping>> {
        let entries = self.entries.read();
        let mut live: Vec<&Entry> = entries.by_id.values().collect();
        live.sort_unstable_by_key(|entry| entry.seq);
        Ok(live.into_iter().map(|entry| entry.mapping.clone()).collect())
    }

    async fn get_by_token(&self, token: &str) -> Result<Option<UrlMapping>> {
        let entries = self.entries.read();
        let mapping = entries
            .by_token
            .get(token)
            .and_then(|id| entries.by_id.get(id))
            .map(|entry| entry.mapping.clone());
        Ok(mapping)
    }

    async fn exists_by_token(&self, token: &str) -> Result<bool> {
        Ok(self.entries.read().by_token.contains_key(token))
    }
}

#[async_trait]
impl MappingStore for InMemoryStore {
    async fn add(&self, mapping: NewMapping) -> Result<UrlMapping> {
        mapping.validate()?;

        let mut entries = self.entries.write();

        if entries.by_token.contains_key(&mapping.shortened_url) {
            return Err(StoreError::DuplicateToken(mapping.shortened_url));
        }

        let id = match mapping.id {
            Some(id) if entries.by_id.contains_key(&id) => {
                return Err(StoreError::DuplicateId(id));
            }
            Some(id) => id,
            None => entries.next_id.ok_or_else(|| {
                StoreError::InvalidArgument("no mapping id left to assign".to_string())
            })?,
        };

        // Assigned ids stay ahead of everything seen so far, caller-supplied ones included.
        entries.next_id = entries
            .next_id
            .and_then(|next| id.next().map(|after| next.max(after)));
        let seq = entries.next_seq;
        entries.next_seq += 1;

        let record = mapping.into_mapping(id);
        entries.by_token.insert(record.shortened_url.clone(), id);
        entries.by_id.insert(
            id,
            Entry {
                seq,
                mapping: record.clone(),
            },
        );

        trace!(id = %id, token = %record.shortened_url, "inserted mapping");
        Ok(record)
    }

    async fn update(&self, id: MappingId, update: MappingUpdate) -> Result<UrlMapping> {
        update.validate()?;

        let mut guard = self.entries.write();
        let entries = &mut *guard;

        let Some(entry) = entries.by_id.get_mut(&id) else {
            return Err(StoreError::NotFound(id));
        };

        if let Some(token) = &update.shortened_url {
            if entries.by_token.get(token).is_some_and(|owner| *owner != id) {
                return Err(StoreError::DuplicateToken(token.clone()));
            }
        }

        let previous_token = entry.mapping.shortened_url.clone();
        update.apply_to(&mut entry.mapping);

        if entry.mapping.shortened_url != previous_token {
            entries.by_token.remove(&previous_token);
            entries
                .by_token
                .insert(entry.mapping.shortened_url.clone(), id);
        }

        trace!(id = %id, "updated mapping");
        Ok(entry.mapping.clone())
    }

    async fn remove(&self, id: MappingId) -> Result<()> {
        let mut entries = self.entries.write();

        let Some(entry) = entries.by_id.remove(&id) else {
            return Err(StoreError::NotFound(id));
        };
        entries.by_token.remove(&entry.mapping.shortened_url);

        trace!(id = %id, "removed mapping");
        Ok(())
    }
}
