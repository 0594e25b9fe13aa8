//! Core types and traits for the Shorten URL mapping service.
//!
//! This crate provides the mapping entity, the store contract and the
//! error taxonomy shared by the storage backends and the mapping service.

pub mod error;
pub mod mapping;
pub mod store;

pub use error::{Result, StoreError};
pub use mapping::{MappingId, MappingUpdate, NewMapping, UrlMapping};
pub use store::{MappingStore, ReadStore};
