//! Tests for Subtree Mutations
//!
//! Exercises convert, publish, unpublish, and delete walks against the in-memory
//! document store, including walks interrupted by injected write failures.

#[cfg(test)]
mod subtree_tests {
    use crate::db::{DocumentStore, DomainEvent, EventBus, InMemoryDocumentStore};
    use crate::models::{
        BranchMode, CourseKey, DeleteScope, Location, Node, RevisionFilter,
    };
    use crate::services::{
        ConvertOptions, DraftReadPath, DraftStoreError, MetadataInheritanceCache,
        RevisionResolver, SubtreeMutationEngine,
    };
    use serde_json::json;
    use std::sync::Arc;

    const DRAFT: BranchMode = BranchMode::Draft;

    struct Harness {
        engine: SubtreeMutationEngine,
        read: DraftReadPath,
        store: Arc<InMemoryDocumentStore>,
        events: EventBus,
    }

    /// Helper to wire an engine over a fresh in-memory store
    fn harness() -> Harness {
        let store = Arc::new(InMemoryDocumentStore::new());
        let resolver = RevisionResolver::default();
        let read = DraftReadPath::new(store.clone(), resolver.clone());
        let cache = Arc::new(MetadataInheritanceCache::new(vec!["due".to_string()]));
        let events = EventBus::new(64);
        let engine =
            SubtreeMutationEngine::new(store.clone(), resolver, read.clone(), cache, events.clone());
        Harness {
            engine,
            read,
            store,
            events,
        }
    }

    fn loc(category: &str, name: &str) -> Location {
        Location::new(CourseKey::new("edX", "demo", "2024"), category, name)
    }

    async fn put(store: &InMemoryDocumentStore, key: Location, children: Vec<Location>) {
        let name = key.name.clone();
        store
            .save(Node::new(key, json!({ "display_name": name })).with_children(children))
            .await
            .unwrap();
    }

    async fn stored(store: &InMemoryDocumentStore, key: &Location) -> bool {
        store.exists(key).await.unwrap()
    }

    #[tokio::test]
    async fn test_convert_copies_subtree() {
        let h = harness();
        put(&h.store, loc("vertical", "u1"), vec![loc("problem", "p1")]).await;
        put(&h.store, loc("problem", "p1"), vec![]).await;

        let node = h
            .engine
            .convert_to_draft(&loc("vertical", "u1"), ConvertOptions::default(), DRAFT)
            .await
            .unwrap();
        assert!(node.is_draft);
        assert_eq!(node.location, loc("vertical", "u1"));
        assert_eq!(node.children, vec![loc("problem", "p1")]);

        // Published documents are untouched
        for key in [
            loc("vertical", "u1"),
            loc("vertical", "u1").as_draft(),
            loc("problem", "p1"),
            loc("problem", "p1").as_draft(),
        ] {
            assert!(stored(&h.store, &key).await, "missing {}", key);
        }
    }

    #[tokio::test]
    async fn test_convert_duplicate_draft() {
        let h = harness();
        put(&h.store, loc("html", "a"), vec![]).await;
        put(&h.store, loc("html", "a").as_draft(), vec![]).await;

        let err = h
            .engine
            .convert_to_draft(&loc("html", "a"), ConvertOptions::default(), DRAFT)
            .await
            .unwrap_err();
        assert!(matches!(err, DraftStoreError::DuplicateExists { .. }));

        let options = ConvertOptions {
            ignore_if_draft: true,
            ..Default::default()
        };
        h.engine
            .convert_to_draft(&loc("html", "a"), options, DRAFT)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_convert_rejections() {
        let h = harness();
        put(&h.store, loc("chapter", "ch1"), vec![]).await;
        put(&h.store, loc("vertical", "broken"), vec![loc("html", "gone")]).await;

        let err = h
            .engine
            .convert_to_draft(&loc("chapter", "ch1"), ConvertOptions::default(), DRAFT)
            .await
            .unwrap_err();
        assert!(matches!(err, DraftStoreError::InvalidOperation(_)));

        let err = h
            .engine
            .convert_to_draft(
                &loc("vertical", "broken"),
                ConvertOptions::default(),
                BranchMode::Published,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DraftStoreError::InvalidOperation(_)));

        let err = h
            .engine
            .convert_to_draft(&loc("vertical", "missing"), ConvertOptions::default(), DRAFT)
            .await
            .unwrap_err();
        assert!(err.is_not_found());

        let err = h
            .engine
            .convert_to_draft(&loc("vertical", "broken"), ConvertOptions::default(), DRAFT)
            .await
            .unwrap_err();
        match err {
            DraftStoreError::BrokenTree { parent, child } => {
                assert_eq!(parent, loc("vertical", "broken"));
                assert_eq!(child, loc("html", "gone"));
            }
            other => panic!("expected BrokenTree, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_publish_round_trip() {
        let h = harness();
        put(&h.store, loc("vertical", "u1").as_draft(), vec![loc("problem", "p1")]).await;
        put(&h.store, loc("problem", "p1").as_draft(), vec![]).await;

        let published = h.engine.publish(&loc("vertical", "u1"), DRAFT).await.unwrap();
        assert!(!published.is_draft);
        assert!(published.published_date.is_some());
        assert_eq!(published.children, vec![loc("problem", "p1")]);
        assert_eq!(published.field("display_name"), Some(&json!("u1")));

        for key in [loc("vertical", "u1"), loc("problem", "p1")] {
            assert!(stored(&h.store, &key).await);
            assert!(!h
                .read
                .has_item(&key, Some(RevisionFilter::DraftOnly), DRAFT)
                .await
                .unwrap());
        }
    }

    #[tokio::test]
    async fn test_publish_deletes_removed_child() {
        let h = harness();
        put(
            &h.store,
            loc("vertical", "u1"),
            vec![loc("problem", "a"), loc("problem", "b")],
        )
        .await;
        put(&h.store, loc("problem", "a"), vec![]).await;
        put(&h.store, loc("problem", "b"), vec![loc("html", "b-hint")]).await;
        put(&h.store, loc("problem", "b").as_draft(), vec![loc("html", "b-hint")]).await;
        put(&h.store, loc("html", "b-hint"), vec![]).await;
        put(&h.store, loc("vertical", "u1").as_draft(), vec![loc("problem", "a")]).await;

        h.engine.publish(&loc("vertical", "u1"), DRAFT).await.unwrap();

        let unit = h
            .read
            .get_item(&loc("vertical", "u1"), Some(RevisionFilter::PublishedOnly), DRAFT)
            .await
            .unwrap();
        assert_eq!(unit.children, vec![loc("problem", "a")]);
        assert!(stored(&h.store, &loc("problem", "a")).await);
        for key in [
            loc("problem", "b"),
            loc("problem", "b").as_draft(),
            loc("html", "b-hint"),
        ] {
            assert!(!stored(&h.store, &key).await, "{} survived", key);
        }
    }

    #[tokio::test]
    async fn test_publish_keeps_moved_child() {
        let h = harness();
        put(
            &h.store,
            loc("vertical", "u1"),
            vec![loc("problem", "a"), loc("problem", "b")],
        )
        .await;
        put(&h.store, loc("problem", "a"), vec![]).await;
        put(&h.store, loc("problem", "b"), vec![]).await;
        put(&h.store, loc("vertical", "u1").as_draft(), vec![loc("problem", "a")]).await;
        // b moved to u2 in the draft
        put(&h.store, loc("vertical", "u2").as_draft(), vec![loc("problem", "b")]).await;

        h.engine.publish(&loc("vertical", "u1"), DRAFT).await.unwrap();
        assert!(stored(&h.store, &loc("problem", "b")).await);

        let parents = h
            .read
            .get_parent(&loc("problem", "b"), None, DRAFT)
            .await
            .unwrap();
        assert_eq!(parents, vec![loc("vertical", "u2").as_draft()]);
    }

    #[tokio::test]
    async fn test_publish_keeps_grandchild_moved_out_of_removed_child() {
        let h = harness();
        let (parent, removed, kept) = (
            loc("vertical", "p"),
            loc("split_test", "b"),
            loc("split_test", "u"),
        );
        let (moved, nested) = (loc("problem", "g"), loc("html", "g-hint"));
        put(&h.store, parent.clone(), vec![removed.clone(), kept.clone()]).await;
        put(&h.store, removed.clone(), vec![moved.clone(), nested.clone()]).await;
        put(&h.store, kept.clone(), vec![]).await;
        put(&h.store, moved.clone(), vec![nested.clone()]).await;
        put(&h.store, nested.clone(), vec![]).await;

        // g moves from b to u in the draft, then b is dropped from p
        put(&h.store, removed.as_draft(), vec![nested.clone()]).await;
        put(&h.store, kept.as_draft(), vec![moved.clone()]).await;
        put(&h.store, parent.as_draft(), vec![kept.clone()]).await;

        h.engine.publish(&parent, DRAFT).await.unwrap();

        assert!(!stored(&h.store, &removed).await);
        assert!(!stored(&h.store, &removed.as_draft()).await);
        // g and its hint are only reachable through u now
        assert!(stored(&h.store, &moved).await);
        assert!(stored(&h.store, &nested).await);

        let children = h.read.get_children(&kept, DRAFT).await.unwrap();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].location, moved);
        let grandchildren = h.read.get_children(&moved, DRAFT).await.unwrap();
        assert_eq!(grandchildren[0].location, nested);
    }

    #[tokio::test]
    async fn test_delete_keeps_shared_descendant() {
        let h = harness();
        put(&h.store, loc("vertical", "u1").as_draft(), vec![loc("problem", "shared")]).await;
        put(&h.store, loc("vertical", "u2").as_draft(), vec![loc("problem", "shared")]).await;
        put(&h.store, loc("problem", "shared").as_draft(), vec![]).await;

        h.engine
            .delete_item(&loc("vertical", "u1"), DeleteScope::Default, DRAFT)
            .await
            .unwrap();

        assert!(!stored(&h.store, &loc("vertical", "u1").as_draft()).await);
        assert!(stored(&h.store, &loc("problem", "shared").as_draft()).await);
        let children = h
            .read
            .get_children(&loc("vertical", "u2"), DRAFT)
            .await
            .unwrap();
        assert_eq!(children.len(), 1);
    }

    #[tokio::test]
    async fn test_publish_direct_only_root_publishes_descendants() {
        let h = harness();
        put(&h.store, loc("sequential", "s1"), vec![loc("vertical", "u1")]).await;
        put(&h.store, loc("vertical", "u1").as_draft(), vec![]).await;

        let node = h.engine.publish(&loc("sequential", "s1"), DRAFT).await.unwrap();
        assert_eq!(node.children, vec![loc("vertical", "u1")]);
        assert!(stored(&h.store, &loc("vertical", "u1")).await);
        assert!(!stored(&h.store, &loc("vertical", "u1").as_draft()).await);
    }

    #[tokio::test]
    async fn test_publish_broken_child() {
        let h = harness();
        put(&h.store, loc("vertical", "u1").as_draft(), vec![loc("html", "gone")]).await;

        let err = h
            .engine
            .publish(&loc("vertical", "u1"), DRAFT)
            .await
            .unwrap_err();
        assert!(matches!(err, DraftStoreError::BrokenTree { .. }));
        // Nothing was published
        assert!(!stored(&h.store, &loc("vertical", "u1")).await);
    }

    #[tokio::test]
    async fn test_interrupted_publish_resumes() {
        let h = harness();
        put(
            &h.store,
            loc("vertical", "u1").as_draft(),
            vec![loc("problem", "p1"), loc("problem", "p2")],
        )
        .await;
        put(&h.store, loc("problem", "p1").as_draft(), vec![]).await;
        put(&h.store, loc("problem", "p2").as_draft(), vec![]).await;

        // p1 is saved and its draft removed, then p2's save fails
        h.store.fail_writes_after(2);
        let err = h
            .engine
            .publish(&loc("vertical", "u1"), DRAFT)
            .await
            .unwrap_err();
        assert!(matches!(err, DraftStoreError::Storage(_)));

        // Half-published subtree is still fully readable
        let children = h.read.get_children(&loc("vertical", "u1"), DRAFT).await.unwrap();
        assert_eq!(children.len(), 2);
        assert!(!children[0].is_draft);
        assert!(children[1].is_draft);

        h.store.clear_write_failures();
        h.engine.publish(&loc("vertical", "u1"), DRAFT).await.unwrap();

        let keys = h.store.keys().await;
        assert_eq!(keys.len(), 3);
        assert!(keys.iter().all(|k| !k.is_draft()));
    }

    #[tokio::test]
    async fn test_unpublish_moves_subtree_to_draft() {
        let h = harness();
        put(&h.store, loc("vertical", "u1"), vec![loc("problem", "p1")]).await;
        put(&h.store, loc("problem", "p1"), vec![]).await;

        let node = h.engine.unpublish(&loc("vertical", "u1"), DRAFT).await.unwrap();
        assert!(node.is_draft);

        let keys = h.store.keys().await;
        assert_eq!(
            keys,
            vec![loc("problem", "p1").as_draft(), loc("vertical", "u1").as_draft()]
        );

        let err = h
            .engine
            .unpublish(&loc("vertical", "u1"), DRAFT)
            .await
            .unwrap_err();
        assert!(err.is_not_found());

        let err = h
            .engine
            .unpublish(&loc("sequential", "s1"), DRAFT)
            .await
            .unwrap_err();
        assert!(matches!(err, DraftStoreError::InvalidOperation(_)));
    }

    #[tokio::test]
    async fn test_unpublish_with_pending_draft_fails() {
        let h = harness();
        put(&h.store, loc("html", "a"), vec![]).await;
        put(&h.store, loc("html", "a").as_draft(), vec![]).await;

        let err = h
            .engine
            .unpublish(&loc("html", "a"), DRAFT)
            .await
            .unwrap_err();
        assert!(matches!(err, DraftStoreError::DuplicateExists { .. }));
        assert!(stored(&h.store, &loc("html", "a")).await);
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let h = harness();
        put(&h.store, loc("vertical", "u1").as_draft(), vec![loc("html", "a")]).await;
        put(&h.store, loc("vertical", "u1"), vec![loc("html", "a")]).await;
        put(&h.store, loc("html", "a").as_draft(), vec![]).await;
        put(&h.store, loc("html", "a"), vec![]).await;

        h.engine
            .delete_item(&loc("html", "a"), DeleteScope::All, DRAFT)
            .await
            .unwrap();
        h.engine
            .delete_item(&loc("html", "a"), DeleteScope::All, DRAFT)
            .await
            .unwrap();

        assert!(!stored(&h.store, &loc("html", "a")).await);
        assert!(!stored(&h.store, &loc("html", "a").as_draft()).await);
        for key in [loc("vertical", "u1"), loc("vertical", "u1").as_draft()] {
            let parent = h.store.get(&key).await.unwrap().unwrap();
            assert!(parent.children.is_empty());
        }
        let draft_parent = h
            .store
            .get(&loc("vertical", "u1").as_draft())
            .await
            .unwrap()
            .unwrap();
        assert!(draft_parent.edited_on.is_some());
    }

    #[tokio::test]
    async fn test_delete_scopes() {
        let h = harness();
        put(&h.store, loc("html", "a"), vec![]).await;
        put(&h.store, loc("html", "a").as_draft(), vec![]).await;

        h.engine
            .delete_item(&loc("html", "a"), DeleteScope::Default, DRAFT)
            .await
            .unwrap();
        assert!(stored(&h.store, &loc("html", "a")).await);
        assert!(!stored(&h.store, &loc("html", "a").as_draft()).await);

        h.engine
            .delete_item(&loc("html", "a"), DeleteScope::PublishedOnly, DRAFT)
            .await
            .unwrap();
        assert!(h.store.is_empty().await);

        let err = h
            .engine
            .delete_item(&loc("html", "a"), DeleteScope::All, BranchMode::Published)
            .await
            .unwrap_err();
        assert!(matches!(err, DraftStoreError::InvalidOperation(_)));
    }

    #[tokio::test]
    async fn test_delete_keeps_direct_only_parent_link_while_published() {
        let h = harness();
        put(&h.store, loc("sequential", "s1"), vec![loc("vertical", "u1")]).await;
        put(&h.store, loc("vertical", "u1"), vec![]).await;
        put(&h.store, loc("vertical", "u1").as_draft(), vec![]).await;

        // Discarding the draft leaves the published unit in place
        h.engine
            .delete_item(&loc("vertical", "u1"), DeleteScope::Default, DRAFT)
            .await
            .unwrap();
        let section = h.store.get(&loc("sequential", "s1")).await.unwrap().unwrap();
        assert_eq!(section.children, vec![loc("vertical", "u1")]);
        assert!(section.edited_on.is_none());

        h.engine
            .delete_item(&loc("vertical", "u1"), DeleteScope::All, DRAFT)
            .await
            .unwrap();
        let section = h.store.get(&loc("sequential", "s1")).await.unwrap().unwrap();
        assert!(section.children.is_empty());
        assert_eq!(h.store.len().await, 1);
    }

    #[tokio::test]
    async fn test_delete_direct_only_removes_published_subtree() {
        let h = harness();
        put(&h.store, loc("chapter", "ch1"), vec![loc("sequential", "s1")]).await;
        put(&h.store, loc("sequential", "s1"), vec![loc("vertical", "u1")]).await;
        put(&h.store, loc("vertical", "u1"), vec![]).await;
        put(&h.store, loc("vertical", "u1").as_draft(), vec![]).await;

        h.engine
            .delete_item(&loc("sequential", "s1"), DeleteScope::Default, DRAFT)
            .await
            .unwrap();

        assert_eq!(h.store.keys().await, vec![loc("chapter", "ch1")]);
        let chapter = h.store.get(&loc("chapter", "ch1")).await.unwrap().unwrap();
        assert!(chapter.children.is_empty());
    }

    #[tokio::test]
    async fn test_events_emitted_by_walks() {
        let h = harness();
        let mut rx = h.events.subscribe();
        put(&h.store, loc("html", "a").as_draft(), vec![]).await;

        h.engine.publish(&loc("html", "a"), DRAFT).await.unwrap();

        let mut received = Vec::new();
        while let Ok(event) = rx.try_recv() {
            received.push(event);
        }
        assert!(received.contains(&DomainEvent::NodePublished {
            location: loc("html", "a")
        }));
        assert!(matches!(
            received.last(),
            Some(DomainEvent::MetadataInvalidated { .. })
        ));
    }
}
