//! In-memory DocumentStore
//!
//! Reference backend holding JSON-encoded documents in an ordered map. Documents are
//! encoded on write and decoded on read, so callers never share mutable state with
//! the store, exactly as with an external document database.
//!
//! A write budget can be injected to simulate a crash partway through a multi-document
//! operation: once the budget is spent every write fails with `StoreError::Backend`.

use super::document_store::DocumentStore;
use super::error::{StoreError, StoreResult};
use crate::models::{CourseKey, Location, Node, NodeQuery, Revision};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, Ordering};
use tokio::sync::RwLock;

const UNLIMITED_WRITES: i64 = -1;

/// Document store keeping every document in memory
pub struct InMemoryDocumentStore {
    documents: RwLock<BTreeMap<Location, Value>>,
    /// Remaining successful writes before failures start (-1 = unlimited)
    write_budget: AtomicI64,
}

impl Default for InMemoryDocumentStore {
    fn default() -> Self {
        Self {
            documents: RwLock::new(BTreeMap::new()),
            write_budget: AtomicI64::new(UNLIMITED_WRITES),
        }
    }
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored documents across all courses and revisions
    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.documents.read().await.is_empty()
    }

    /// Every stored key, in key order
    pub async fn keys(&self) -> Vec<Location> {
        self.documents.read().await.keys().cloned().collect()
    }

    /// Let `writes` more writes succeed, then fail every write until cleared
    pub fn fail_writes_after(&self, writes: u32) {
        self.write_budget.store(i64::from(writes), Ordering::SeqCst);
    }

    pub fn clear_write_failures(&self) {
        self.write_budget.store(UNLIMITED_WRITES, Ordering::SeqCst);
    }

    fn consume_write(&self) -> StoreResult<()> {
        let outcome = self
            .write_budget
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |budget| match budget {
                UNLIMITED_WRITES => Some(UNLIMITED_WRITES),
                0 => None,
                n => Some(n - 1),
            });
        match outcome {
            Ok(_) => Ok(()),
            Err(_) => Err(StoreError::backend("injected write failure")),
        }
    }

    fn decode(value: &Value) -> StoreResult<Node> {
        Ok(serde_json::from_value(value.clone())?)
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn get(&self, key: &Location) -> StoreResult<Option<Node>> {
        let documents = self.documents.read().await;
        documents.get(key).map(Self::decode).transpose()
    }

    async fn find(
        &self,
        course: &CourseKey,
        revision: Revision,
        query: &NodeQuery,
    ) -> StoreResult<Vec<Node>> {
        let documents = self.documents.read().await;
        let mut found = Vec::new();
        for (key, value) in documents.iter() {
            if key.course != *course || key.revision != revision {
                continue;
            }
            let node = Self::decode(value)?;
            if query.matches(&node) {
                found.push(node);
            }
        }
        Ok(found)
    }

    async fn insert(&self, node: Node) -> StoreResult<()> {
        let key = node.location.clone();
        let value = serde_json::to_value(&node)?;

        let mut documents = self.documents.write().await;
        if documents.contains_key(&key) {
            return Err(StoreError::duplicate_key(key));
        }
        self.consume_write()?;
        documents.insert(key, value);
        Ok(())
    }

    async fn save(&self, node: Node) -> StoreResult<()> {
        let key = node.location.clone();
        let value = serde_json::to_value(&node)?;

        let mut documents = self.documents.write().await;
        self.consume_write()?;
        documents.insert(key, value);
        Ok(())
    }

    async fn remove(&self, key: &Location) -> StoreResult<bool> {
        let mut documents = self.documents.write().await;
        if !documents.contains_key(key) {
            return Ok(false);
        }
        self.consume_write()?;
        Ok(documents.remove(key).is_some())
    }

    async fn find_parents(&self, child: &Location) -> StoreResult<Vec<Node>> {
        let documents = self.documents.read().await;
        let mut parents = Vec::new();
        for (key, value) in documents.iter() {
            if key.course != child.course {
                continue;
            }
            let node = Self::decode(value)?;
            if node.has_child(child) {
                parents.push(node);
            }
        }
        Ok(parents)
    }
}
