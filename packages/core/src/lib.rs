//! DraftTree Core
//!
//! A content-tree store that keeps two revisions of every draftable node side by
//! side: the published revision learners see and the draft revision authors edit.
//!
//! # Architecture
//!
//! - **Document Store Boundary**: all persistence goes through the `DocumentStore` trait
//! - **Logical Identity**: children reference revision-less locations; the read path
//!   picks the revision
//! - **Direct-Only Categories**: structural nodes (course, chapter, sequential, ...)
//!   exist only in the published revision
//! - **Explicit Branch Mode**: every `DraftStore` handle carries its own branch mode
//!
//! # Modules
//!
//! - [`models`] - Locations, nodes, revision enums, and queries
//! - [`db`] - Document store trait, in-memory store, and domain events
//! - [`services`] - Read path, write path, subtree mutations, and classification
//! - [`config`] - Store configuration from JSON and environment
//! - [`utils`] - Logging setup

pub mod config;
pub mod db;
pub mod models;
pub mod services;
pub mod utils;

// Re-export commonly used types
pub use config::{ConfigError, DraftStoreConfig};
pub use db::{DocumentStore, DomainEvent, InMemoryDocumentStore, StoreError};
pub use models::*;
pub use services::*;
