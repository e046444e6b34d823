//! Document Store Error Types
//!
//! This module defines errors raised by [`DocumentStore`](super::DocumentStore)
//! implementations. Duplicate keys are a distinct variant because the subtree
//! algorithms rely on fail-on-duplicate inserts for concurrency safety.

use crate::models::Location;
use thiserror::Error;

/// Document store operation errors
#[derive(Error, Debug)]
pub enum StoreError {
    /// Insert attempted on a key that already holds a document
    #[error("Duplicate key: {key}")]
    DuplicateKey { key: Location },

    /// Stored document could not be encoded or decoded
    #[error("Document serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Backend-specific failure (connection, I/O, ...)
    #[error("Document store backend failed: {0}")]
    Backend(String),
}

impl StoreError {
    /// Create a duplicate key error
    pub fn duplicate_key(key: Location) -> Self {
        Self::DuplicateKey { key }
    }

    /// Create a backend error
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }

    pub fn is_duplicate_key(&self) -> bool {
        matches!(self, Self::DuplicateKey { .. })
    }
}

/// Result type used by document stores
pub type StoreResult<T> = Result<T, StoreError>;
