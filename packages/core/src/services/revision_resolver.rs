//! Revision Resolver
//!
//! Pure mapping from a logical identity to its two storage keys, and the
//! direct-only classification of categories. No I/O, never fails.

use crate::models::{CategoryRegistry, Location, Revision};
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct RevisionResolver {
    categories: Arc<CategoryRegistry>,
}

impl RevisionResolver {
    pub fn new(categories: CategoryRegistry) -> Self {
        Self {
            categories: Arc::new(categories),
        }
    }

    pub fn draft_key(&self, location: &Location) -> Location {
        location.as_draft()
    }

    pub fn published_key(&self, location: &Location) -> Location {
        location.as_published()
    }

    pub fn key_for(&self, location: &Location, revision: Revision) -> Location {
        location.with_revision(revision)
    }

    pub fn is_direct_only(&self, category: &str) -> bool {
        self.categories.is_direct_only(category)
    }

    /// Key new or edited content of this node is written to
    pub fn write_key(&self, location: &Location) -> Location {
        if self.is_direct_only(&location.category) {
            self.published_key(location)
        } else {
            self.draft_key(location)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CourseKey;

    #[test]
    fn test_keys() {
        let resolver = RevisionResolver::default();
        let course = CourseKey::new("edX", "demo", "2024");
        let unit = Location::new(course.clone(), "vertical", "u1");

        assert_eq!(resolver.draft_key(&unit).revision, Revision::Draft);
        assert_eq!(
            resolver.published_key(&unit.as_draft()).revision,
            Revision::Published
        );
        assert_eq!(resolver.write_key(&unit), unit.as_draft());

        let chapter = Location::new(course, "chapter", "ch1");
        assert_eq!(resolver.write_key(&chapter), chapter);
        assert!(resolver.is_direct_only("chapter"));
        assert!(!resolver.is_direct_only("vertical"));
    }
}
