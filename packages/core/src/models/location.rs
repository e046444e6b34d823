//! Node Identity
//!
//! A node is addressed by a [`Location`]: the course namespace it lives in, its
//! category (node type), its name, and the revision tag of the stored document.
//!
//! Two locations that differ only in their revision denote the *same logical node*
//! stored in two revisions. The revision-less ("logical") form of a location is the
//! one carrying [`Revision::Published`], which mirrors how published documents are
//! keyed in the store.
//!
//! # Textual Form
//!
//! ```text
//! org/course/run/category/name          (published / logical)
//! org/course/run/category/name@draft    (draft)
//! ```
//!
//! # Examples
//!
//! ```rust
//! use drafttree_core::models::{CourseKey, Location, Revision};
//!
//! let course = CourseKey::new("edX", "demo", "2024");
//! let unit = Location::new(course, "vertical", "unit-1");
//!
//! let draft = unit.as_draft();
//! assert_eq!(draft.revision, Revision::Draft);
//! assert_eq!(draft.to_string(), "edX/demo/2024/vertical/unit-1@draft");
//! assert_eq!(draft.logical(), unit);
//! ```

use super::revision::Revision;
use super::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

const DRAFT_SUFFIX: &str = "@draft";

/// Course namespace shared by every node of a content tree
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CourseKey {
    pub org: String,
    pub course: String,
    pub run: String,
}

impl CourseKey {
    pub fn new(org: impl Into<String>, course: impl Into<String>, run: impl Into<String>) -> Self {
        Self {
            org: org.into(),
            course: course.into(),
            run: run.into(),
        }
    }
}

impl fmt::Display for CourseKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.org, self.course, self.run)
    }
}

/// Storage identity of a node document
///
/// # Fields
///
/// - `course`: Namespace the node belongs to
/// - `category`: Node type (e.g., "course", "chapter", "vertical", "problem")
/// - `name`: Unique name within the course and category
/// - `revision`: Which stored revision this location addresses
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub course: CourseKey,
    pub category: String,
    pub name: String,
    #[serde(default)]
    pub revision: Revision,
}

impl Location {
    /// Create a logical (revision-less) location
    pub fn new(course: CourseKey, category: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            course,
            category: category.into(),
            name: name.into(),
            revision: Revision::Published,
        }
    }

    /// Create a logical location with a generated, collision-free name
    pub fn with_generated_name(course: CourseKey, category: impl Into<String>) -> Self {
        Self::new(course, category, Uuid::new_v4().simple().to_string())
    }

    /// Same location with the given revision tag
    pub fn with_revision(&self, revision: Revision) -> Self {
        Self {
            revision,
            ..self.clone()
        }
    }

    /// Draft storage key of this logical node
    pub fn as_draft(&self) -> Self {
        self.with_revision(Revision::Draft)
    }

    /// Published storage key of this logical node
    pub fn as_published(&self) -> Self {
        self.with_revision(Revision::Published)
    }

    /// Revision-less identity of this node
    pub fn logical(&self) -> Self {
        self.as_published()
    }

    pub fn is_draft(&self) -> bool {
        self.revision == Revision::Draft
    }

    /// True if both locations address the same logical node
    pub fn same_node(&self, other: &Location) -> bool {
        self.course == other.course && self.category == other.category && self.name == other.name
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.course, self.category, self.name)?;
        if self.is_draft() {
            f.write_str(DRAFT_SUFFIX)?;
        }
        Ok(())
    }
}

impl FromStr for Location {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (body, revision) = match s.strip_suffix(DRAFT_SUFFIX) {
            Some(body) => (body, Revision::Draft),
            None => (s, Revision::Published),
        };

        let parts: Vec<&str> = body.split('/').collect();
        if parts.len() != 5 || parts.iter().any(|p| p.is_empty()) {
            return Err(ValidationError::InvalidLocation(s.to_string()));
        }

        Ok(Location::new(CourseKey::new(parts[0], parts[1], parts[2]), parts[3], parts[4])
            .with_revision(revision))
    }
}
