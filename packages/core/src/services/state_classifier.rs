//! Publish state classification
//!
//! Derives the tri-state status shown to course authors and the "unpublished
//! changes" flag by comparing a node's revisions and timestamps.

use super::error::DraftStoreError;
use super::read_path::DraftReadPath;
use super::revision_resolver::RevisionResolver;
use crate::db::DocumentStore;
use crate::models::{BranchMode, Location, Node, PublishState};
use std::sync::Arc;

#[derive(Clone)]
pub struct PublishStateClassifier {
    store: Arc<dyn DocumentStore>,
    resolver: RevisionResolver,
    read: DraftReadPath,
}

impl PublishStateClassifier {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        resolver: RevisionResolver,
        read: DraftReadPath,
    ) -> Self {
        Self {
            store,
            resolver,
            read,
        }
    }

    /// Whether the node carries edits newer than its last publish
    ///
    /// Direct-only nodes never have changes. A node without an edit timestamp is
    /// reported as changed.
    ///
    /// # Errors
    ///
    /// `NotFound` if the node exists in neither revision.
    pub async fn has_changes(&self, location: &Location) -> Result<bool, DraftStoreError> {
        if self.resolver.is_direct_only(&location.category) {
            return Ok(false);
        }

        let node = self.read.get_item(location, None, BranchMode::Draft).await?;
        let Some(published_date) = node.published_date else {
            return Ok(true);
        };
        Ok(match node.edited_on {
            Some(edited_on) => edited_on > published_date,
            None => true,
        })
    }

    /// Classify a node returned by the read path
    ///
    /// - not a draft copy: `Public`
    /// - draft copy with a published document: `Draft`
    /// - draft copy never published: `Private`
    pub async fn compute_publish_state(&self, node: &Node) -> Result<PublishState, DraftStoreError> {
        if !node.is_draft {
            return Ok(PublishState::Public);
        }

        let published_key = self.resolver.published_key(&node.location);
        if self.store.exists(&published_key).await? {
            Ok(PublishState::Draft)
        } else {
            Ok(PublishState::Private)
        }
    }
}
