//! Data Models
//!
//! This module contains the core data structures of the draft/published tree:
//!
//! - `Location` / `CourseKey` - Node identity, keyed by revision
//! - `Revision`, `BranchMode`, `RevisionFilter`, `DeleteScope` - Revision model
//! - `Node` - Stored node document
//! - `NodeQuery` - Predicates evaluated by document stores
//! - `CategoryRegistry` - Direct-only category lookup

mod category;
mod location;
mod node;
mod query;
mod revision;

pub use category::{CategoryRegistry, DEFAULT_DIRECT_ONLY_CATEGORIES};
pub use location::{CourseKey, Location};
pub use node::{Node, ValidationError};
pub use query::{FieldFilter, FieldMatcher, NodeQuery};
pub use revision::{
    BranchMode, DeleteScope, ParentRevision, PublishState, Revision, RevisionFilter,
};
