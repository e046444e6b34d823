//! Node Documents
//!
//! This module defines the `Node` document stored for each revision of a logical
//! node, and the validation errors raised while building identities and queries.
//!
//! # Architecture
//!
//! - **Revision-less children**: `children` always holds logical locations; which
//!   revision of a child is read is decided by the read path, never by the parent
//! - **Free-form fields**: all content lives in the `fields` JSON object
//! - **Two timestamps**: `edited_on` tracks the last draft mutation, `published_date`
//!   the last publish of this exact node
//!
//! # Examples
//!
//! ```rust
//! use drafttree_core::models::{CourseKey, Location, Node};
//! use serde_json::json;
//!
//! let course = CourseKey::new("edX", "demo", "2024");
//! let unit = Node::new(
//!     Location::new(course.clone(), "vertical", "unit-1"),
//!     json!({ "display_name": "Unit 1" }),
//! )
//! .with_children(vec![Location::new(course, "problem", "problem-1")]);
//!
//! assert_eq!(unit.children.len(), 1);
//! assert_eq!(unit.field("display_name"), Some(&json!("Unit 1")));
//! ```

use super::location::Location;
use super::revision::Revision;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Validation errors for identities, queries, and configuration values
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Invalid location: {0}")]
    InvalidLocation(String),

    #[error("Invalid branch mode: {0}")]
    InvalidBranch(String),

    #[error("Invalid field pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },
}

/// A stored content node
///
/// Documents read through the draft-aware read path are *normalized*: `location`
/// holds the logical identity and `is_draft` records which revision was read.
/// Documents handed to a [`DocumentStore`](crate::db::DocumentStore) carry the
/// revision they are stored under in `location.revision`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub location: Location,

    /// Ordered logical child identities
    #[serde(default)]
    pub children: Vec<Location>,

    /// Content and settings
    #[serde(default)]
    pub fields: Map<String, Value>,

    /// Last draft mutation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edited_on: Option<DateTime<Utc>>,

    /// Last successful publish of this node
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_date: Option<DateTime<Utc>>,

    /// Whether the node was read from the draft revision (never persisted)
    #[serde(skip)]
    pub is_draft: bool,
}

impl Node {
    /// Create a childless node from a JSON object of fields
    ///
    /// Non-object `fields` values are stored under a single `"data"` field.
    pub fn new(location: Location, fields: Value) -> Self {
        let fields = match fields {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => {
                let mut map = Map::new();
                map.insert("data".to_string(), other);
                map
            }
        };

        Self {
            location,
            children: Vec::new(),
            fields,
            edited_on: None,
            published_date: None,
            is_draft: false,
        }
    }

    pub fn with_children(mut self, children: Vec<Location>) -> Self {
        self.children = children.into_iter().map(|c| c.logical()).collect();
        self
    }

    pub fn category(&self) -> &str {
        &self.location.category
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn set_field(&mut self, name: impl Into<String>, value: Value) {
        self.fields.insert(name.into(), value);
    }

    pub fn has_child(&self, child: &Location) -> bool {
        self.children.iter().any(|c| c.same_node(child))
    }

    /// Remove every reference to `child`, returning whether one existed
    pub fn remove_child(&mut self, child: &Location) -> bool {
        let before = self.children.len();
        self.children.retain(|c| !c.same_node(child));
        self.children.len() != before
    }

    /// Same document re-keyed under the given revision
    pub fn stored_as(mut self, revision: Revision) -> Self {
        self.location = self.location.with_revision(revision);
        self.is_draft = false;
        self
    }

    /// Normalize a stored document: logical location plus the `is_draft` flag
    pub fn normalized(mut self) -> Self {
        self.is_draft = self.location.is_draft();
        self.location = self.location.logical();
        self
    }

    /// Storage revision a normalized node was read from
    pub fn read_revision(&self) -> Revision {
        if self.is_draft {
            Revision::Draft
        } else {
            self.location.revision
        }
    }
}
