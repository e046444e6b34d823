//! Draft Store
//!
//! `DraftStore` is the public surface of the crate. It wires the read path, write
//! path, subtree mutation engine, and state classifier around one shared
//! `DocumentStore`, and carries the session's branch mode.
//!
//! # Branch Mode
//!
//! The branch mode is a value on the store handle, not shared mutable state.
//! `with_branch` returns a cheap clone bound to another mode, so concurrent callers
//! working in different modes never interfere:
//!
//! ```
//! # use drafttree_core::config::DraftStoreConfig;
//! # use drafttree_core::db::InMemoryDocumentStore;
//! # use drafttree_core::models::BranchMode;
//! # use drafttree_core::services::DraftStore;
//! # use std::sync::Arc;
//! let store = DraftStore::new(Arc::new(InMemoryDocumentStore::new()), DraftStoreConfig::default());
//! let authoring = store.with_branch(BranchMode::Draft);
//!
//! assert_eq!(store.branch(), BranchMode::Published);
//! assert_eq!(authoring.branch(), BranchMode::Draft);
//! ```

use super::error::DraftStoreError;
use super::metadata_cache::MetadataInheritanceCache;
use super::mutation_engine::{ConvertOptions, SubtreeMutationEngine};
use super::read_path::DraftReadPath;
use super::revision_resolver::RevisionResolver;
use super::state_classifier::PublishStateClassifier;
use super::write_path::{DraftWritePath, UpdateOptions};
use crate::config::DraftStoreConfig;
use crate::db::{DocumentStore, DomainEvent, EventBus};
use crate::models::{
    BranchMode, CourseKey, DeleteScope, Location, Node, NodeQuery, PublishState, RevisionFilter,
};
use serde_json::{Map, Value};
use std::sync::Arc;
use tokio::sync::broadcast;

#[derive(Clone)]
pub struct DraftStore {
    store: Arc<dyn DocumentStore>,
    config: Arc<DraftStoreConfig>,
    read: DraftReadPath,
    engine: SubtreeMutationEngine,
    writer: DraftWritePath,
    classifier: PublishStateClassifier,
    cache: Arc<MetadataInheritanceCache>,
    events: EventBus,
    branch: BranchMode,
}

impl DraftStore {
    /// Build a store over `store`, starting in `config.default_branch`
    pub fn new(store: Arc<dyn DocumentStore>, config: DraftStoreConfig) -> Self {
        let resolver = RevisionResolver::new(config.category_registry());
        let events = EventBus::new(config.event_channel_capacity);
        let cache = Arc::new(MetadataInheritanceCache::new(
            config.inheritable_fields.clone(),
        ));

        let read = DraftReadPath::new(store.clone(), resolver.clone());
        let engine = SubtreeMutationEngine::new(
            store.clone(),
            resolver.clone(),
            read.clone(),
            cache.clone(),
            events.clone(),
        );
        let writer = DraftWritePath::new(
            store.clone(),
            resolver.clone(),
            read.clone(),
            engine.clone(),
            events.clone(),
        );
        let classifier = PublishStateClassifier::new(store.clone(), resolver, read.clone());

        tracing::debug!(
            "DraftStore initialized (branch: {:?}, direct-only: {:?})",
            config.default_branch,
            config.direct_only_categories
        );

        Self {
            store,
            branch: config.default_branch,
            config: Arc::new(config),
            read,
            engine,
            writer,
            classifier,
            cache,
            events,
        }
    }

    /// Clone of this store bound to another branch mode
    ///
    /// The clone shares the document store, cache, and event channel.
    pub fn with_branch(&self, branch: BranchMode) -> Self {
        let mut cloned = self.clone();
        cloned.branch = branch;
        cloned
    }

    pub fn branch(&self) -> BranchMode {
        self.branch
    }

    /// Underlying document store, for callers that need raw document access
    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    pub fn config(&self) -> &DraftStoreConfig {
        &self.config
    }

    /// Subscribe to domain events
    ///
    /// Every clone made by `with_branch` publishes to the same channel.
    pub fn subscribe_to_events(&self) -> broadcast::Receiver<DomainEvent> {
        self.events.subscribe()
    }

    // Reads

    pub async fn get_item(
        &self,
        location: &Location,
        filter: Option<RevisionFilter>,
    ) -> Result<Node, DraftStoreError> {
        self.read.get_item(location, filter, self.branch).await
    }

    pub async fn has_item(
        &self,
        location: &Location,
        filter: Option<RevisionFilter>,
    ) -> Result<bool, DraftStoreError> {
        self.read.has_item(location, filter, self.branch).await
    }

    pub async fn get_items(
        &self,
        course: &CourseKey,
        query: &NodeQuery,
        filter: Option<RevisionFilter>,
    ) -> Result<Vec<Node>, DraftStoreError> {
        self.read.get_items(course, query, filter, self.branch).await
    }

    pub async fn get_parent(
        &self,
        location: &Location,
        filter: Option<RevisionFilter>,
    ) -> Result<Vec<Location>, DraftStoreError> {
        self.read.get_parent(location, filter, self.branch).await
    }

    pub async fn get_children(&self, location: &Location) -> Result<Vec<Node>, DraftStoreError> {
        self.read.get_children(location, self.branch).await
    }

    /// Draftable nodes of a course referenced by no parent in either revision
    pub async fn get_orphans(&self, course: &CourseKey) -> Result<Vec<Location>, DraftStoreError> {
        self.read.get_orphans(course).await
    }

    // Writes

    pub async fn create(&self, location: &Location, fields: Value) -> Result<Node, DraftStoreError> {
        self.writer.create(location, fields, self.branch).await
    }

    pub async fn create_child(
        &self,
        parent: &Location,
        location: &Location,
        fields: Value,
    ) -> Result<Node, DraftStoreError> {
        self.writer
            .create_child(parent, location, fields, self.branch)
            .await
    }

    pub async fn update_item(
        &self,
        node: Node,
        options: UpdateOptions,
    ) -> Result<Node, DraftStoreError> {
        self.writer.update_item(node, options, self.branch).await
    }

    pub async fn delete_item(
        &self,
        location: &Location,
        scope: DeleteScope,
    ) -> Result<(), DraftStoreError> {
        self.engine.delete_item(location, scope, self.branch).await
    }

    /// Delete every orphan of a course in both revisions
    ///
    /// Returns the logical locations that were deleted.
    pub async fn delete_orphans(&self, course: &CourseKey) -> Result<Vec<Location>, DraftStoreError> {
        if !self.branch.is_draft() {
            return Err(DraftStoreError::invalid_operation(
                "delete_orphans requires the draft branch",
            ));
        }

        let orphans = self.read.get_orphans(course).await?;
        for orphan in &orphans {
            self.engine
                .delete_item(orphan, DeleteScope::All, self.branch)
                .await?;
        }
        if !orphans.is_empty() {
            tracing::info!("Deleted {} orphan(s) from {}", orphans.len(), course);
        }
        Ok(orphans)
    }

    // Subtree operations

    pub async fn convert_to_draft(
        &self,
        location: &Location,
        options: ConvertOptions,
    ) -> Result<Node, DraftStoreError> {
        self.engine
            .convert_to_draft(location, options, self.branch)
            .await
    }

    pub async fn publish(&self, location: &Location) -> Result<Node, DraftStoreError> {
        self.engine.publish(location, self.branch).await
    }

    pub async fn unpublish(&self, location: &Location) -> Result<Node, DraftStoreError> {
        self.engine.unpublish(location, self.branch).await
    }

    // Classification

    pub async fn has_changes(&self, location: &Location) -> Result<bool, DraftStoreError> {
        self.classifier.has_changes(location).await
    }

    pub async fn compute_publish_state(&self, node: &Node) -> Result<PublishState, DraftStoreError> {
        self.classifier.compute_publish_state(node).await
    }

    /// Effective inheritable settings of a node under the current branch mode
    ///
    /// # Errors
    ///
    /// `NotFound` if the node is not readable under the current branch mode.
    pub async fn inherited_metadata(
        &self,
        location: &Location,
    ) -> Result<Map<String, Value>, DraftStoreError> {
        let tree = self
            .cache
            .tree(&location.course, self.branch, &self.read)
            .await?;
        tree.get(&location.logical())
            .cloned()
            .ok_or_else(|| DraftStoreError::not_found(&location.logical()))
    }
}
