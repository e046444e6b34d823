//! DocumentStore Trait - Storage Abstraction Layer
//!
//! This module defines the `DocumentStore` trait that abstracts the flat keyed
//! document collection underneath the draft/published layer. Every component of the
//! layer holds an `Arc<dyn DocumentStore>` and calls it directly.
//!
//! # Design Decisions
//!
//! 1. **Async-First**: All methods are async so network-backed stores fit the trait
//! 2. **Ownership Semantics**: Writes take ownership of the document
//! 3. **Typed Errors**: `StoreError::DuplicateKey` is distinguishable from backend
//!    failures, because `insert` doubles as the concurrency guard
//! 4. **No Transactions**: Each method is a single round trip
//!
//! # Examples
//!
//! ```rust
//! use drafttree_core::db::{DocumentStore, InMemoryDocumentStore};
//! use drafttree_core::models::{CourseKey, Location, Node};
//! use serde_json::json;
//!
//! # #[tokio::main]
//! # async fn main() -> anyhow::Result<()> {
//! let store = InMemoryDocumentStore::new();
//! let key = Location::new(CourseKey::new("edX", "demo", "2024"), "html", "intro");
//!
//! store.insert(Node::new(key.clone(), json!({}))).await?;
//! assert!(store.insert(Node::new(key.clone(), json!({}))).await.is_err());
//! assert!(store.exists(&key).await?);
//! # Ok(())
//! # }
//! ```

use super::error::StoreResult;
use crate::models::{CourseKey, Location, Node, NodeQuery, Revision};
use async_trait::async_trait;

/// Keyed, queryable document collection
///
/// Documents are keyed by `node.location` including its revision tag.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`; one store is shared by every session.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Get the document stored at `key`
    ///
    /// # Returns
    ///
    /// - `Ok(Some(node))` if a document exists (location carries its revision)
    /// - `Ok(None)` if the key is empty (not an error)
    async fn get(&self, key: &Location) -> StoreResult<Option<Node>>;

    /// Find the documents of one course and revision matching `query`
    async fn find(
        &self,
        course: &CourseKey,
        revision: Revision,
        query: &NodeQuery,
    ) -> StoreResult<Vec<Node>>;

    /// Insert a new document
    ///
    /// # Errors
    ///
    /// Returns `StoreError::DuplicateKey` if a document already exists at the key.
    async fn insert(&self, node: Node) -> StoreResult<()>;

    /// Insert or overwrite the document at `node.location`
    async fn save(&self, node: Node) -> StoreResult<()>;

    /// Remove the document at `key`
    ///
    /// Idempotent: removing an empty key succeeds and returns `false`.
    async fn remove(&self, key: &Location) -> StoreResult<bool>;

    /// Documents (any revision) in the child's course whose children list references
    /// the child's logical identity
    async fn find_parents(&self, child: &Location) -> StoreResult<Vec<Node>>;

    /// Whether a document exists at `key`
    async fn exists(&self, key: &Location) -> StoreResult<bool> {
        Ok(self.get(key).await?.is_some())
    }
}
