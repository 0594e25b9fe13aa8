//! Storage backends for URL mappings.
//!
//! Both backends implement [`MappingStore`] and keep the short-token
//! uniqueness check atomic with the write that depends on it.

pub mod memory;
pub mod sqlite;

pub use memory::InMemoryStore;
pub use shorten_core::{MappingStore, ReadStore, Result, StoreError};
pub use sqlite::{SqliteStore, SqliteStoreConfig};
