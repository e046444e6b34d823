//! Metadata Inheritance Cache
//!
//! Settings such as `due` or `start` flow from a node to its descendants unless a
//! descendant overrides them. Computing the effective settings needs a walk over the
//! whole course, so the result is cached per (course, branch mode) and dropped
//! whenever a mutation touches the course.
//!
//! # Cache Invalidation
//!
//! Invalidation is event-driven only: every subtree operation and write invalidates
//! its course. A generation counter prevents a computation that raced with an
//! invalidation from repopulating the cache with stale data.

use super::error::DraftStoreError;
use super::read_path::DraftReadPath;
use crate::models::{BranchMode, CourseKey, Location, Node, NodeQuery};
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Effective inheritable settings of every node of a course
pub type InheritanceTree = HashMap<Location, Map<String, Value>>;

/// Cache statistics for monitoring
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub cached_trees: usize,
    pub generation: u64,
}

pub struct MetadataInheritanceCache {
    /// Map: (course, branch) → computed tree
    trees: RwLock<HashMap<(CourseKey, BranchMode), Arc<InheritanceTree>>>,

    /// Bumped on every invalidation
    generation: AtomicU64,

    inheritable_fields: Vec<String>,
}

impl MetadataInheritanceCache {
    pub fn new(inheritable_fields: Vec<String>) -> Self {
        Self {
            trees: RwLock::new(HashMap::new()),
            generation: AtomicU64::new(0),
            inheritable_fields,
        }
    }

    /// Cached tree for a course, computing it on a miss
    pub async fn tree(
        &self,
        course: &CourseKey,
        branch: BranchMode,
        read: &DraftReadPath,
    ) -> Result<Arc<InheritanceTree>, DraftStoreError> {
        let key = (course.clone(), branch);
        if let Some(tree) = self.trees.read().await.get(&key) {
            return Ok(tree.clone());
        }

        let generation = self.generation.load(Ordering::SeqCst);
        let nodes = read
            .get_items(course, &NodeQuery::all(), None, branch)
            .await?;
        let tree = Arc::new(compute_inheritance(&nodes, &self.inheritable_fields));

        let mut trees = self.trees.write().await;
        if self.generation.load(Ordering::SeqCst) == generation {
            trees.insert(key, tree.clone());
        } else {
            tracing::debug!("Discarding inheritance tree for {} computed before invalidation", course);
        }
        Ok(tree)
    }

    /// Drop every cached tree of a course
    pub async fn invalidate(&self, course: &CourseKey) {
        let mut trees = self.trees.write().await;
        self.generation.fetch_add(1, Ordering::SeqCst);
        trees.retain(|(cached, _), _| cached != course);
    }

    pub async fn stats(&self) -> CacheStats {
        CacheStats {
            cached_trees: self.trees.read().await.len(),
            generation: self.generation.load(Ordering::SeqCst),
        }
    }
}

/// Walk every root of the course top-down, carrying the effective settings
fn compute_inheritance(nodes: &[Node], fields: &[String]) -> InheritanceTree {
    let by_location: HashMap<&Location, &Node> =
        nodes.iter().map(|n| (&n.location, n)).collect();

    let referenced: HashSet<Location> = nodes
        .iter()
        .flat_map(|n| n.children.iter().map(Location::logical))
        .collect();

    let mut tree = InheritanceTree::new();
    let mut stack: Vec<(&Node, Map<String, Value>)> = nodes
        .iter()
        .filter(|n| !referenced.contains(&n.location))
        .map(|n| (n, Map::new()))
        .collect();

    while let Some((node, inherited)) = stack.pop() {
        if tree.contains_key(&node.location) {
            continue;
        }

        let mut effective = inherited;
        for field in fields {
            if let Some(value) = node.field(field) {
                effective.insert(field.clone(), value.clone());
            }
        }

        for child in node.children.iter().rev() {
            if let Some(&child_node) = by_location.get(&child.logical()) {
                stack.push((child_node, effective.clone()));
            }
        }
        tree.insert(node.location.clone(), effective);
    }

    tree
}
