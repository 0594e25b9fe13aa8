//! URL mapping service.
//!
//! This crate provides [`MappingService`], the transport-agnostic use-case
//! layer over a [`MappingStore`](shorten_core::MappingStore). Core types are
//! re-exported from `shorten_core`.

pub mod error;
pub mod outcome;
pub mod service;

pub use error::ServiceError;
pub use outcome::Outcome;
pub use service::MappingService;
pub use shorten_core::{MappingId, MappingUpdate, NewMapping, UrlMapping};
