//! Node Queries
//!
//! `NodeQuery` is the predicate a [`DocumentStore`](crate::db::DocumentStore)
//! evaluates in `find`. It supports matching on category and name, plus any number
//! of field filters:
//!
//! - `Equals`: equality; if the stored field is a list, list membership instead
//! - `Matches`: regular expression match on a string field (or any string in a list)
//!
//! # Examples
//!
//! ```rust
//! use drafttree_core::models::NodeQuery;
//! use serde_json::json;
//!
//! let query = NodeQuery::by_category("problem")
//!     .with_field_equals("weight", json!(1))
//!     .with_field_matching("display_name", "^Quiz")
//!     .unwrap();
//! assert_eq!(query.filters.len(), 2);
//! ```

use super::node::{Node, ValidationError};
use regex::Regex;
use serde_json::Value;

/// How a field value is compared
#[derive(Debug, Clone)]
pub enum FieldMatcher {
    Equals(Value),
    Matches(Regex),
}

/// A predicate on one named field of a node
#[derive(Debug, Clone)]
pub struct FieldFilter {
    pub field: String,
    pub matcher: FieldMatcher,
}

impl FieldFilter {
    pub fn matches(&self, node: &Node) -> bool {
        let Some(value) = node.field(&self.field) else {
            return false;
        };

        match (&self.matcher, value) {
            (FieldMatcher::Equals(expected), Value::Array(items)) => {
                items.contains(expected) || value == expected
            }
            (FieldMatcher::Equals(expected), actual) => actual == expected,
            (FieldMatcher::Matches(re), Value::String(s)) => re.is_match(s),
            (FieldMatcher::Matches(re), Value::Array(items)) => items
                .iter()
                .any(|item| item.as_str().is_some_and(|s| re.is_match(s))),
            (FieldMatcher::Matches(_), _) => false,
        }
    }
}

/// Query over the documents of one course and revision
#[derive(Debug, Clone, Default)]
pub struct NodeQuery {
    pub category: Option<String>,
    pub name: Option<String>,
    pub filters: Vec<FieldFilter>,
}

impl NodeQuery {
    /// Query matching every node
    pub fn all() -> Self {
        Self::default()
    }

    pub fn by_category(category: impl Into<String>) -> Self {
        Self {
            category: Some(category.into()),
            ..Default::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_field_equals(mut self, field: impl Into<String>, value: Value) -> Self {
        self.filters.push(FieldFilter {
            field: field.into(),
            matcher: FieldMatcher::Equals(value),
        });
        self
    }

    /// Add a regex filter
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::InvalidPattern` if the pattern does not compile.
    pub fn with_field_matching(
        mut self,
        field: impl Into<String>,
        pattern: &str,
    ) -> Result<Self, ValidationError> {
        let re = Regex::new(pattern).map_err(|e| ValidationError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })?;
        self.filters.push(FieldFilter {
            field: field.into(),
            matcher: FieldMatcher::Matches(re),
        });
        Ok(self)
    }

    /// Evaluate the query against a stored document (revision is not considered)
    pub fn matches(&self, node: &Node) -> bool {
        if let Some(category) = &self.category {
            if node.location.category != *category {
                return false;
            }
        }
        if let Some(name) = &self.name {
            if node.location.name != *name {
                return false;
            }
        }
        self.filters.iter().all(|f| f.matches(node))
    }
}
