//! Draft-Aware Read Path
//!
//! Resolves which stored revision(s) a read sees:
//!
//! | filter           | branch      | revisions tried            |
//! |------------------|-------------|----------------------------|
//! | `PublishedOnly`  | any         | published                  |
//! | `DraftOnly`      | any         | draft                      |
//! | none             | `Published` | published                  |
//! | none             | `Draft`     | draft, then published      |
//!
//! Direct-only categories are always read from the published revision. Every node
//! returned is normalized to its logical location with `is_draft` set from the
//! revision actually read.

use super::error::DraftStoreError;
use super::revision_resolver::RevisionResolver;
use crate::db::DocumentStore;
use crate::models::{
    BranchMode, CourseKey, Location, Node, NodeQuery, ParentRevision, Revision, RevisionFilter,
};
use std::collections::HashSet;
use std::sync::Arc;

const PUBLISHED: &[Revision] = &[Revision::Published];
const DRAFT: &[Revision] = &[Revision::Draft];
const DRAFT_THEN_PUBLISHED: &[Revision] = &[Revision::Draft, Revision::Published];

#[derive(Clone)]
pub struct DraftReadPath {
    store: Arc<dyn DocumentStore>,
    resolver: RevisionResolver,
}

impl DraftReadPath {
    pub fn new(store: Arc<dyn DocumentStore>, resolver: RevisionResolver) -> Self {
        Self { store, resolver }
    }

    fn read_order(
        &self,
        location: &Location,
        filter: Option<RevisionFilter>,
        branch: BranchMode,
    ) -> &'static [Revision] {
        if filter == Some(RevisionFilter::PublishedOnly)
            || self.resolver.is_direct_only(&location.category)
        {
            return PUBLISHED;
        }
        match (filter, branch) {
            (Some(RevisionFilter::DraftOnly), _) => DRAFT,
            (_, BranchMode::Draft) => DRAFT_THEN_PUBLISHED,
            (_, BranchMode::Published) => PUBLISHED,
        }
    }

    /// Fetch a node, preferring the draft under the draft branch
    ///
    /// # Errors
    ///
    /// `NotFound` if none of the resolved revisions exists.
    pub async fn get_item(
        &self,
        location: &Location,
        filter: Option<RevisionFilter>,
        branch: BranchMode,
    ) -> Result<Node, DraftStoreError> {
        for &revision in self.read_order(location, filter, branch) {
            let key = self.resolver.key_for(location, revision);
            if let Some(doc) = self.store.get(&key).await? {
                return Ok(doc.normalized());
            }
        }
        Err(DraftStoreError::not_found(&location.logical()))
    }

    pub async fn has_item(
        &self,
        location: &Location,
        filter: Option<RevisionFilter>,
        branch: BranchMode,
    ) -> Result<bool, DraftStoreError> {
        for &revision in self.read_order(location, filter, branch) {
            if self
                .store
                .exists(&self.resolver.key_for(location, revision))
                .await?
            {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Query a course; drafts shadow published documents of the same node
    ///
    /// Drafts (if any) are listed first, followed by the published documents that
    /// have no draft.
    pub async fn get_items(
        &self,
        course: &CourseKey,
        query: &NodeQuery,
        filter: Option<RevisionFilter>,
        branch: BranchMode,
    ) -> Result<Vec<Node>, DraftStoreError> {
        let (include_drafts, include_published) = match (filter, branch) {
            (Some(RevisionFilter::DraftOnly), _) => (true, false),
            (Some(RevisionFilter::PublishedOnly), _) => (false, true),
            (None, BranchMode::Draft) => (true, true),
            (None, BranchMode::Published) => (false, true),
        };

        let mut items: Vec<Node> = Vec::new();
        if include_drafts {
            items = self
                .store
                .find(course, Revision::Draft, query)
                .await?
                .into_iter()
                .map(Node::normalized)
                .collect();
        }
        if !include_published {
            return Ok(items);
        }

        let shadowed: HashSet<Location> = items.iter().map(|n| n.location.clone()).collect();
        let published = self
            .store
            .find(course, Revision::Published, query)
            .await?
            .into_iter()
            .map(Node::normalized)
            .filter(|n| !shadowed.contains(&n.location));
        items.extend(published);
        Ok(items)
    }

    /// Stored parent documents of a node, restricted to one parent revision
    ///
    /// Direct-only parents always qualify; other parents only when their revision is
    /// accepted by `revision`.
    pub async fn parent_documents(
        &self,
        location: &Location,
        revision: ParentRevision,
    ) -> Result<Vec<Node>, DraftStoreError> {
        let candidates = self.store.find_parents(&location.logical()).await?;
        Ok(candidates
            .into_iter()
            .filter(|parent| {
                self.resolver.is_direct_only(parent.category())
                    || revision.accepts(parent.location.revision)
            })
            .collect())
    }

    /// Revision-tagged parent locations under a parent revision
    pub async fn parent_locations(
        &self,
        location: &Location,
        revision: ParentRevision,
    ) -> Result<Vec<Location>, DraftStoreError> {
        Ok(self
            .parent_documents(location, revision)
            .await?
            .into_iter()
            .map(|parent| parent.location)
            .collect())
    }

    /// Parents of a node, revision-tagged
    ///
    /// Under the draft branch without a filter both a draft and a published parent
    /// may be returned (the node was moved in the draft); callers that need a single
    /// parent disambiguate with a filter.
    pub async fn get_parent(
        &self,
        location: &Location,
        filter: Option<RevisionFilter>,
        branch: BranchMode,
    ) -> Result<Vec<Location>, DraftStoreError> {
        let revision = match (filter, branch) {
            (Some(RevisionFilter::PublishedOnly), _) | (None, BranchMode::Published) => {
                ParentRevision::Published
            }
            (Some(RevisionFilter::DraftOnly), _) => ParentRevision::Draft,
            (None, BranchMode::Draft) => ParentRevision::All,
        };
        self.parent_locations(location, revision).await
    }

    /// Resolve every child of a node, in children-list order
    ///
    /// # Errors
    ///
    /// `BrokenTree` if a referenced child exists in no readable revision.
    pub async fn get_children(
        &self,
        location: &Location,
        branch: BranchMode,
    ) -> Result<Vec<Node>, DraftStoreError> {
        let parent = self.get_item(location, None, branch).await?;
        let mut children = Vec::with_capacity(parent.children.len());
        for child in &parent.children {
            match self.get_item(child, None, branch).await {
                Ok(node) => children.push(node),
                Err(e) if e.is_not_found() => {
                    return Err(DraftStoreError::broken_tree(&parent.location, child))
                }
                Err(e) => return Err(e),
            }
        }
        Ok(children)
    }

    /// Draftable nodes of a course that no document in either revision references
    pub async fn get_orphans(&self, course: &CourseKey) -> Result<Vec<Location>, DraftStoreError> {
        let query = NodeQuery::all();
        let mut documents = self.store.find(course, Revision::Draft, &query).await?;
        documents.extend(self.store.find(course, Revision::Published, &query).await?);

        let referenced: HashSet<Location> = documents
            .iter()
            .flat_map(|doc| doc.children.iter().map(Location::logical))
            .collect();

        let mut seen = HashSet::new();
        let mut orphans = Vec::new();
        for doc in documents {
            let logical = doc.location.logical();
            if self.resolver.is_direct_only(&logical.category) || referenced.contains(&logical) {
                continue;
            }
            if seen.insert(logical.clone()) {
                orphans.push(logical);
            }
        }
        Ok(orphans)
    }
}
