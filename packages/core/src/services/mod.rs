//! Business Services
//!
//! This module contains the draft/published revision logic:
//!
//! - `DraftStore` - public surface binding every component to a branch mode
//! - `DraftReadPath` - draft-preferring reads and parent/child resolution
//! - `DraftWritePath` - create and update under the drafting policy
//! - `SubtreeMutationEngine` - convert, publish, unpublish, and delete subtrees
//! - `PublishStateClassifier` - publish state and pending-change detection
//! - `MetadataInheritanceCache` - per-course inherited settings
//!
//! Each component holds the shared `DocumentStore` directly; none of them wraps
//! another store behind dynamic dispatch.

pub mod draft_store;
pub mod error;
pub mod metadata_cache;
pub mod mutation_engine;
pub mod read_path;
pub mod revision_resolver;
pub mod state_classifier;
pub mod write_path;

pub use draft_store::DraftStore;
pub use error::DraftStoreError;
pub use metadata_cache::{CacheStats, InheritanceTree, MetadataInheritanceCache};
pub use mutation_engine::{ConvertOptions, SubtreeMutationEngine};
pub use read_path::DraftReadPath;
pub use revision_resolver::RevisionResolver;
pub use state_classifier::PublishStateClassifier;
pub use write_path::{DraftWritePath, UpdateOptions};
