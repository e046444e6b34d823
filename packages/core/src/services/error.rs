//! Service Layer Error Types
//!
//! This module defines the errors surfaced by the draft/published layer. None of
//! them is retried here; retrying transient storage failures is the document store's
//! concern, and every subtree operation is safe to re-run from outside.

use crate::db::StoreError;
use crate::models::Location;
use thiserror::Error;

/// Draft store operation errors
#[derive(Error, Debug)]
pub enum DraftStoreError {
    /// Requested identity/revision is absent
    #[error("Node not found: {location}")]
    NotFound { location: Location },

    /// A document already exists where a new one was to be inserted
    #[error("Node already exists: {location}")]
    DuplicateExists { location: Location },

    /// Operation not applicable to this node or branch mode
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// Operation requires a store policy that is not active
    #[error("Precondition failed: {0}")]
    PreconditionFailed(String),

    /// A children list references a document that does not exist
    #[error("Broken tree: {parent} references missing child {child}")]
    BrokenTree { parent: Location, child: Location },

    /// Underlying document store failed
    #[error("Document store error: {0}")]
    Storage(#[from] StoreError),
}

impl DraftStoreError {
    /// Create a not found error
    pub fn not_found(location: &Location) -> Self {
        Self::NotFound {
            location: location.clone(),
        }
    }

    /// Create a duplicate error
    pub fn duplicate_exists(location: &Location) -> Self {
        Self::DuplicateExists {
            location: location.clone(),
        }
    }

    /// Create an invalid operation error
    pub fn invalid_operation(msg: impl Into<String>) -> Self {
        Self::InvalidOperation(msg.into())
    }

    /// Create a precondition failed error
    pub fn precondition_failed(msg: impl Into<String>) -> Self {
        Self::PreconditionFailed(msg.into())
    }

    /// Create a broken tree error
    pub fn broken_tree(parent: &Location, child: &Location) -> Self {
        Self::BrokenTree {
            parent: parent.clone(),
            child: child.clone(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Node or one of its descendants is missing
    pub fn is_missing(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::BrokenTree { .. })
    }
}
