//! Revision Model
//!
//! Every logical node may be stored in two revisions at once: a mutable draft and a
//! published copy visible to consumers. The types in this module describe which
//! revision an operation reads, writes, or deletes.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::ValidationError;

/// Revision tag carried by a stored document
///
/// `Published` doubles as the revision-less tag of a logical identity.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Revision {
    #[default]
    #[serde(alias = "none")]
    Published,
    Draft,
}

impl Revision {
    /// The revision a node does *not* currently occupy
    pub fn other(self) -> Self {
        match self {
            Revision::Published => Revision::Draft,
            Revision::Draft => Revision::Published,
        }
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Revision::Published => f.write_str("published"),
            Revision::Draft => f.write_str("draft"),
        }
    }
}

/// Explicit per-call revision filter, overriding the session's branch mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RevisionFilter {
    DraftOnly,
    PublishedOnly,
}

/// Read preference of a store session
///
/// - `Published`: only published documents are visible
/// - `Draft`: drafts are read in preference to published documents, and the
///   drafting write policy is active
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BranchMode {
    #[default]
    Published,
    Draft,
}

impl BranchMode {
    pub fn is_draft(self) -> bool {
        self == BranchMode::Draft
    }
}

impl FromStr for BranchMode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "published" => Ok(BranchMode::Published),
            "draft" => Ok(BranchMode::Draft),
            other => Err(ValidationError::InvalidBranch(other.to_string())),
        }
    }
}

/// Which revisions a delete removes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeleteScope {
    /// Draft revision only (direct-only nodes: both)
    #[default]
    Default,
    PublishedOnly,
    All,
}

/// Revision of the parents a lookup should return
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParentRevision {
    Draft,
    Published,
    All,
}

impl ParentRevision {
    pub fn accepts(self, revision: Revision) -> bool {
        match self {
            ParentRevision::Draft => revision == Revision::Draft,
            ParentRevision::Published => revision == Revision::Published,
            ParentRevision::All => true,
        }
    }
}

const DRAFT_ONLY: &[Revision] = &[Revision::Draft];
const PUBLISHED_ONLY: &[Revision] = &[Revision::Published];
const BOTH: &[Revision] = &[Revision::Draft, Revision::Published];

impl DeleteScope {
    /// Revisions whose documents are removed for a node of the given kind
    pub fn revisions(self, direct_only: bool) -> &'static [Revision] {
        match (self, direct_only) {
            (_, true) | (DeleteScope::All, _) => BOTH,
            (DeleteScope::PublishedOnly, false) => PUBLISHED_ONLY,
            (DeleteScope::Default, false) => DRAFT_ONLY,
        }
    }

    /// Revision of the parents the node has to be detached from
    pub fn parent_revision(self, direct_only: bool) -> ParentRevision {
        if direct_only || self == DeleteScope::PublishedOnly {
            ParentRevision::Published
        } else if self == DeleteScope::All {
            ParentRevision::All
        } else {
            ParentRevision::Draft
        }
    }
}

/// Publication status of a node as seen by authors
///
/// - `Draft`: published once, with unpublished edits pending
/// - `Public`: the published copy is current
/// - `Private`: never published
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PublishState {
    Draft,
    Public,
    Private,
}
