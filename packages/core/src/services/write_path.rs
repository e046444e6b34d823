//! Write Path
//!
//! Writes under the drafting policy never touch the published revision of a
//! draftable node: new nodes are created as drafts, and the first edit of a
//! published node materializes a draft copy of its subtree before the edit lands.
//! Direct-only nodes are written in place.

use super::error::DraftStoreError;
use super::mutation_engine::{ConvertOptions, SubtreeMutationEngine};
use super::read_path::DraftReadPath;
use super::revision_resolver::RevisionResolver;
use crate::db::{DocumentStore, DomainEvent, EventBus};
use crate::models::{BranchMode, Location, Node, Revision};
use chrono::Utc;
use serde_json::Value;
use std::sync::Arc;

/// Options for `update_item`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateOptions {
    /// Write the node even if it exists in neither revision, or if a descendant of
    /// its published copy is missing
    pub allow_not_found: bool,
}

#[derive(Clone)]
pub struct DraftWritePath {
    store: Arc<dyn DocumentStore>,
    resolver: RevisionResolver,
    read: DraftReadPath,
    engine: SubtreeMutationEngine,
    events: EventBus,
}

impl DraftWritePath {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        resolver: RevisionResolver,
        read: DraftReadPath,
        engine: SubtreeMutationEngine,
        events: EventBus,
    ) -> Self {
        Self {
            store,
            resolver,
            read,
            engine,
            events,
        }
    }

    /// Create a new childless node
    ///
    /// Draftable categories are created in the draft revision, direct-only ones in
    /// the published revision.
    ///
    /// # Errors
    ///
    /// - `PreconditionFailed` unless the branch is `Draft`
    /// - `DuplicateExists` if the node already exists
    pub async fn create(
        &self,
        location: &Location,
        fields: Value,
        branch: BranchMode,
    ) -> Result<Node, DraftStoreError> {
        if !branch.is_draft() {
            return Err(DraftStoreError::precondition_failed(
                "create requires the draft branch",
            ));
        }

        let logical = location.logical();
        let direct_only = self.resolver.is_direct_only(&logical.category);
        if !direct_only && self.store.exists(&self.resolver.published_key(&logical)).await? {
            return Err(DraftStoreError::duplicate_exists(&logical));
        }

        let key = self.resolver.write_key(&logical);
        let mut node = Node::new(key.clone(), fields);
        if !direct_only {
            node.edited_on = Some(Utc::now());
        }

        match self.store.insert(node.clone()).await {
            Ok(()) => {}
            Err(e) if e.is_duplicate_key() => {
                return Err(DraftStoreError::duplicate_exists(&key));
            }
            Err(e) => return Err(e.into()),
        }

        tracing::debug!("Created {}", key);
        self.events.emit(DomainEvent::NodeCreated {
            location: logical.clone(),
            revision: key.revision,
        });
        self.engine.invalidate(&logical).await;
        Ok(node.normalized())
    }

    /// Create a node and append it to `parent`'s children
    ///
    /// The parent is edited through `update_item`, so a published draftable parent
    /// gains a draft first.
    pub async fn create_child(
        &self,
        parent: &Location,
        location: &Location,
        fields: Value,
        branch: BranchMode,
    ) -> Result<Node, DraftStoreError> {
        let mut parent_node = self.read.get_item(parent, None, branch).await?;
        let child = self.create(location, fields, branch).await?;

        parent_node.children.push(child.location.clone());
        self.update_item(parent_node, UpdateOptions::default(), branch)
            .await?;
        Ok(child)
    }

    /// Write a node's content, drafting it first if needed
    ///
    /// The stored `published_date` is kept; `edited_on` is stamped for drafts.
    ///
    /// # Errors
    ///
    /// - `InvalidOperation` unless the branch is `Draft`
    /// - `NotFound` if the node exists in neither revision and `allow_not_found` is unset
    /// - `BrokenTree` if drafting the published subtree hits a missing descendant and
    ///   `allow_not_found` is unset
    pub async fn update_item(
        &self,
        node: Node,
        options: UpdateOptions,
        branch: BranchMode,
    ) -> Result<Node, DraftStoreError> {
        if !branch.is_draft() {
            return Err(DraftStoreError::invalid_operation(
                "update_item requires the draft branch",
            ));
        }

        let logical = node.location.logical();
        if self.resolver.is_direct_only(&logical.category) {
            return self.update_direct(node, options).await;
        }

        let draft_key = self.resolver.draft_key(&logical);
        let existing_draft = match self.store.get(&draft_key).await? {
            Some(draft) => Some(draft),
            None => {
                let converted = self
                    .engine
                    .convert_to_draft(
                        &logical,
                        ConvertOptions {
                            delete_published: false,
                            ignore_if_draft: true,
                        },
                        branch,
                    )
                    .await;
                match converted {
                    Ok(_) => self.store.get(&draft_key).await?,
                    Err(e) if e.is_missing() && options.allow_not_found => None,
                    Err(e) => return Err(e),
                }
            }
        };

        let mut draft = node.stored_as(Revision::Draft);
        draft.children = draft.children.iter().map(Location::logical).collect();
        draft.published_date = existing_draft.and_then(|d| d.published_date);
        draft.edited_on = Some(Utc::now());
        self.store.save(draft.clone()).await?;

        self.events.emit(DomainEvent::NodeUpdated {
            location: logical.clone(),
            revision: Revision::Draft,
        });
        self.engine.invalidate(&logical).await;
        Ok(draft.normalized())
    }

    async fn update_direct(
        &self,
        node: Node,
        options: UpdateOptions,
    ) -> Result<Node, DraftStoreError> {
        let published_key = self.resolver.published_key(&node.location);
        if !options.allow_not_found && !self.store.exists(&published_key).await? {
            return Err(DraftStoreError::not_found(&published_key));
        }

        let mut stored = node.stored_as(Revision::Published);
        stored.children = stored.children.iter().map(Location::logical).collect();
        self.store.save(stored.clone()).await?;

        self.events.emit(DomainEvent::NodeUpdated {
            location: published_key.clone(),
            revision: Revision::Published,
        });
        self.engine.invalidate(&published_key).await;
        Ok(stored.normalized())
    }
}
