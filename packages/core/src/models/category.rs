//! Category Registry
//!
//! Categories are fixed per node type. A *direct-only* category is a structural
//! container (course, chapter, sequential, ...) that is always published and can
//! never have a draft revision.

use std::collections::HashSet;

/// Categories that exist only in the published revision unless configured otherwise
pub const DEFAULT_DIRECT_ONLY_CATEGORIES: &[&str] = &[
    "course",
    "chapter",
    "sequential",
    "about",
    "static_tab",
    "course_info",
];

/// Static lookup of direct-only categories
#[derive(Debug, Clone)]
pub struct CategoryRegistry {
    direct_only: HashSet<String>,
}

impl CategoryRegistry {
    pub fn new<I, S>(direct_only: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            direct_only: direct_only.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_direct_only(&self, category: &str) -> bool {
        self.direct_only.contains(category)
    }

    pub fn direct_only_categories(&self) -> impl Iterator<Item = &str> {
        self.direct_only.iter().map(String::as_str)
    }
}

impl Default for CategoryRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_DIRECT_ONLY_CATEGORIES.iter().copied())
    }
}
