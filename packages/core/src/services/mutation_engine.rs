//! Subtree Mutation Engine
//!
//! Depth-first algorithms that move whole subtrees between the draft and published
//! revisions:
//!
//! - `convert_to_draft` - copy-on-write promotion, children before parent
//! - `publish` - draft replaces published, children before parent, removed children
//!   that nothing else references are deleted
//! - `unpublish` - published moves back into the draft revision
//! - `delete_item` - detach from parents, then remove the subtree
//!
//! # Partial Failure
//!
//! Walks are not transactional. Each step is either a fail-on-duplicate insert, an
//! overwrite, or an idempotent remove, ordered so that an interrupted walk leaves
//! every node readable through the draft-preferring read path. Re-running the same
//! operation skips the steps already applied.

use super::error::DraftStoreError;
use super::metadata_cache::MetadataInheritanceCache;
use super::read_path::DraftReadPath;
use super::revision_resolver::RevisionResolver;
use crate::db::{DocumentStore, DomainEvent, EventBus};
use crate::models::{
    BranchMode, DeleteScope, Location, Node, ParentRevision, Revision, RevisionFilter,
};
use chrono::Utc;
use std::collections::HashSet;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

type WalkFuture<'a> = Pin<Box<dyn Future<Output = Result<(), DraftStoreError>> + Send + 'a>>;

/// Options for `convert_to_draft`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConvertOptions {
    /// Remove each published document once its draft copy exists (unpublish)
    pub delete_published: bool,
    /// Accept existing drafts instead of failing with `DuplicateExists`
    pub ignore_if_draft: bool,
}

#[derive(Clone)]
pub struct SubtreeMutationEngine {
    store: Arc<dyn DocumentStore>,
    resolver: RevisionResolver,
    read: DraftReadPath,
    cache: Arc<MetadataInheritanceCache>,
    events: EventBus,
}

impl SubtreeMutationEngine {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        resolver: RevisionResolver,
        read: DraftReadPath,
        cache: Arc<MetadataInheritanceCache>,
        events: EventBus,
    ) -> Self {
        Self {
            store,
            resolver,
            read,
            cache,
            events,
        }
    }

    fn require_drafting(branch: BranchMode, operation: &str) -> Result<(), DraftStoreError> {
        if branch.is_draft() {
            Ok(())
        } else {
            Err(DraftStoreError::invalid_operation(format!(
                "{} requires the draft branch",
                operation
            )))
        }
    }

    pub(crate) async fn invalidate(&self, location: &Location) {
        self.cache.invalidate(&location.course).await;
        self.events.emit(DomainEvent::MetadataInvalidated {
            course: location.course.clone(),
        });
    }

    /// Copy the published subtree rooted at `location` into the draft revision
    ///
    /// # Errors
    ///
    /// - `InvalidOperation` if the branch is not `Draft` or the category is direct-only
    /// - `NotFound` if the node has no published document
    /// - `BrokenTree` if a descendant's published document is missing
    /// - `DuplicateExists` if a draft already exists and `ignore_if_draft` is unset
    pub async fn convert_to_draft(
        &self,
        location: &Location,
        options: ConvertOptions,
        branch: BranchMode,
    ) -> Result<Node, DraftStoreError> {
        Self::require_drafting(branch, "convert_to_draft")?;
        if self.resolver.is_direct_only(&location.category) {
            return Err(DraftStoreError::invalid_operation(format!(
                "{} is direct-only and cannot have a draft",
                location.logical()
            )));
        }

        let published_key = self.resolver.published_key(location);
        let original = self
            .store
            .get(&published_key)
            .await?
            .ok_or_else(|| DraftStoreError::not_found(&published_key))?;

        self.convert_subtree(original.clone(), options).await?;
        self.invalidate(location).await;
        self.events.emit(DomainEvent::ConvertedToDraft {
            location: location.logical(),
        });

        Ok(original.stored_as(Revision::Draft).normalized())
    }

    fn convert_subtree(&self, root: Node, options: ConvertOptions) -> WalkFuture<'_> {
        Box::pin(async move {
            for child in &root.children {
                if self.resolver.is_direct_only(&child.category) {
                    tracing::debug!("Skipping direct-only child {} during draft conversion", child);
                    continue;
                }
                let child_doc = self
                    .store
                    .get(&self.resolver.published_key(child))
                    .await?
                    .ok_or_else(|| DraftStoreError::broken_tree(&root.location, child))?;
                self.convert_subtree(child_doc, options).await?;
            }

            let published_key = root.location.clone();
            let draft = root.stored_as(Revision::Draft);
            let draft_key = draft.location.clone();

            match self.store.insert(draft).await {
                Ok(()) => self.events.emit(DomainEvent::NodeCreated {
                    location: published_key.logical(),
                    revision: Revision::Draft,
                }),
                Err(e) if e.is_duplicate_key() => {
                    if !options.ignore_if_draft {
                        return Err(DraftStoreError::duplicate_exists(&draft_key));
                    }
                    tracing::debug!("Draft {} already exists, keeping it", draft_key);
                }
                Err(e) => return Err(e.into()),
            }

            if options.delete_published && self.store.remove(&published_key).await? {
                self.events.emit(DomainEvent::NodeDeleted {
                    location: published_key.logical(),
                    revision: Revision::Published,
                });
            }
            Ok(())
        })
    }

    /// Publish the subtree rooted at `location` and remove its drafts
    ///
    /// Direct-only and non-draft nodes are descended through but not written.
    /// Returns the node read back from the published revision.
    pub async fn publish(
        &self,
        location: &Location,
        branch: BranchMode,
    ) -> Result<Node, DraftStoreError> {
        Self::require_drafting(branch, "publish")?;
        tracing::info!("Publishing subtree rooted at {}", location.logical());

        self.publish_subtree(location.logical()).await?;
        self.invalidate(location).await;

        self.read
            .get_item(location, Some(RevisionFilter::PublishedOnly), branch)
            .await
    }

    fn publish_subtree(&self, location: Location) -> WalkFuture<'_> {
        Box::pin(async move {
            let draft = self
                .read
                .get_item(&location, None, BranchMode::Draft)
                .await?;

            for child in &draft.children {
                match self.publish_subtree(child.clone()).await {
                    Err(DraftStoreError::NotFound { location: missing })
                        if missing.same_node(child) =>
                    {
                        return Err(DraftStoreError::broken_tree(&location, child));
                    }
                    other => other?,
                }
            }

            if self.resolver.is_direct_only(&location.category) || !draft.is_draft {
                tracing::debug!("Nothing to publish for {}", location);
                return Ok(());
            }

            let published_key = self.resolver.published_key(&location);
            if let Some(original_published) = self.store.get(&published_key).await? {
                self.delete_removed_children(&location, &original_published, &draft)
                    .await?;
            }

            let mut published = draft.stored_as(Revision::Published);
            published.published_date = Some(Utc::now());
            self.store.save(published).await?;
            self.store
                .remove(&self.resolver.draft_key(&location))
                .await?;

            self.events.emit(DomainEvent::NodePublished {
                location: location.clone(),
            });
            Ok(())
        })
    }

    /// Delete children dropped from the draft whose only parent is this node
    async fn delete_removed_children(
        &self,
        location: &Location,
        original_published: &Node,
        draft: &Node,
    ) -> Result<(), DraftStoreError> {
        for child in &original_published.children {
            if draft.has_child(child) {
                continue;
            }

            let parents = self
                .read
                .parent_locations(child, ParentRevision::All)
                .await?;
            if parents.len() == 1 && parents[0].same_node(location) {
                tracing::info!(
                    "Deleting subtree {} removed from {} before publish",
                    child,
                    location
                );
                self.delete_item(child, DeleteScope::All, BranchMode::Draft)
                    .await?;
            } else {
                tracing::debug!(
                    "Child {} removed from {} is still referenced by {} parent(s)",
                    child,
                    location,
                    parents.len()
                );
            }
        }
        Ok(())
    }

    /// Move the published subtree back into the draft revision
    ///
    /// # Errors
    ///
    /// Same as `convert_to_draft`; a node that already has a draft fails with
    /// `DuplicateExists`.
    pub async fn unpublish(
        &self,
        location: &Location,
        branch: BranchMode,
    ) -> Result<Node, DraftStoreError> {
        tracing::info!("Unpublishing subtree rooted at {}", location.logical());
        let node = self
            .convert_to_draft(
                location,
                ConvertOptions {
                    delete_published: true,
                    ignore_if_draft: false,
                },
                branch,
            )
            .await?;
        self.events.emit(DomainEvent::NodeUnpublished {
            location: location.logical(),
        });
        Ok(node)
    }

    /// Detach a node from its parents and delete its subtree in the scoped revisions
    ///
    /// Idempotent: documents already gone are skipped.
    pub async fn delete_item(
        &self,
        location: &Location,
        scope: DeleteScope,
        branch: BranchMode,
    ) -> Result<(), DraftStoreError> {
        Self::require_drafting(branch, "delete_item")?;

        let logical = location.logical();
        let direct_only = self.resolver.is_direct_only(&logical.category);
        let revisions = scope.revisions(direct_only);
        tracing::info!("Deleting {} ({:?} scope)", logical, scope);

        let parents = self
            .read
            .parent_documents(&logical, scope.parent_revision(direct_only))
            .await?;
        for parent in parents {
            if !direct_only && self.resolver.is_direct_only(parent.category()) {
                if let [deleted] = revisions {
                    let surviving = self.resolver.key_for(&logical, deleted.other());
                    if self.store.exists(&surviving).await? {
                        tracing::debug!(
                            "Keeping {} attached to {}: {} revision survives",
                            logical,
                            parent.location,
                            deleted.other()
                        );
                        continue;
                    }
                }
            }
            self.detach(parent, &logical).await?;
        }

        let members = self.exclusive_subtree(&logical, revisions).await?;
        self.delete_subtree(logical.clone(), revisions, &members).await?;
        self.invalidate(&logical).await;
        Ok(())
    }

    async fn detach(&self, mut parent: Node, child: &Location) -> Result<(), DraftStoreError> {
        if !parent.remove_child(child) {
            return Ok(());
        }
        if parent.location.is_draft() {
            parent.edited_on = Some(Utc::now());
        }

        let location = parent.location.logical();
        let revision = parent.location.revision;
        self.store.save(parent).await?;
        self.events
            .emit(DomainEvent::NodeUpdated { location, revision });
        Ok(())
    }

    /// Logical nodes under `root` that are referenced only from inside the subtree
    ///
    /// A descendant with a parent outside the subtree (moved elsewhere, or shared) is
    /// left out together with everything reachable only through it. `root` itself is
    /// always a member; its parents have been detached by the caller.
    async fn exclusive_subtree(
        &self,
        root: &Location,
        revisions: &'static [Revision],
    ) -> Result<HashSet<Location>, DraftStoreError> {
        let mut members = HashSet::new();
        let mut pending = vec![root.logical()];
        while let Some(location) = pending.pop() {
            if !members.insert(location.clone()) {
                continue;
            }
            for &revision in revisions {
                let key = self.resolver.key_for(&location, revision);
                if let Some(doc) = self.store.get(&key).await? {
                    pending.extend(doc.children.iter().map(Location::logical));
                }
            }
        }

        let mut parents = Vec::with_capacity(members.len());
        for location in members.iter().filter(|m| *m != root) {
            let found = self
                .read
                .parent_locations(location, ParentRevision::All)
                .await?;
            parents.push((location.clone(), found));
        }

        // Dropping a node can orphan its own children from the subtree, so repeat
        // until no member has an outside parent.
        loop {
            let shared: Vec<Location> = parents
                .iter()
                .filter(|(location, found)| {
                    members.contains(location)
                        && found.iter().any(|p| !members.contains(&p.logical()))
                })
                .map(|(location, _)| location.clone())
                .collect();
            if shared.is_empty() {
                break;
            }
            for location in shared {
                tracing::debug!(
                    "Keeping {}: still referenced outside the subtree of {}",
                    location,
                    root
                );
                members.remove(&location);
            }
        }
        Ok(members)
    }

    fn delete_subtree<'a>(
        &'a self,
        location: Location,
        revisions: &'static [Revision],
        members: &'a HashSet<Location>,
    ) -> WalkFuture<'a> {
        Box::pin(async move {
            for &revision in revisions {
                let key = self.resolver.key_for(&location, revision);
                let Some(doc) = self.store.get(&key).await? else {
                    continue;
                };
                for child in &doc.children {
                    if members.contains(&child.logical()) {
                        self.delete_subtree(child.clone(), revisions, members)
                            .await?;
                    }
                }
                if self.store.remove(&key).await? {
                    self.events.emit(DomainEvent::NodeDeleted {
                        location: location.logical(),
                        revision,
                    });
                }
            }
            Ok(())
        })
    }
}

#[cfg(test)]
#[path = "mutation_engine_test.rs"]
mod mutation_engine_test;
