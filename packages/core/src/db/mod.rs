//! Document Store Layer
//!
//! This module defines the keyed document store the draft/published layer is built on:
//!
//! - `DocumentStore` - async trait every backend implements
//! - `InMemoryDocumentStore` - reference backend used for tests and embedding
//! - Domain events emitted by the store services
//!
//! # Architecture
//!
//! Documents are keyed by their full `Location` (identity plus revision), so the
//! draft and published revisions of one logical node are two independent documents.
//! The store offers no multi-document transactions; callers rely on fail-on-duplicate
//! inserts and idempotent removes instead.

mod document_store;
mod error;
pub mod events;
mod memory_store;

pub use document_store::DocumentStore;
pub use error::{StoreError, StoreResult};
pub use events::{DomainEvent, EventBus};
pub use memory_store::InMemoryDocumentStore;
