//! Domain Events
//!
//! This module defines the domain events emitted by `DraftStore` when content
//! changes. Events follow the observer pattern: subscribers (cache layers, search
//! indexers, UI bridges) learn about revision changes without coupling to the
//! store implementation.
//!
//! # Architecture
//!
//! Events are emitted using tokio's broadcast channel, allowing multiple subscribers
//! to receive notifications asynchronously. Emission never fails an operation; if
//! nobody is subscribed the event is dropped.

use crate::models::{CourseKey, Location, Revision};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Domain events emitted by the draft store
///
/// Locations are logical; the affected revision is carried separately where it
/// matters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum DomainEvent {
    /// A new document was created
    #[serde(rename_all = "camelCase")]
    NodeCreated {
        location: Location,
        revision: Revision,
    },

    /// An existing document was overwritten
    #[serde(rename_all = "camelCase")]
    NodeUpdated {
        location: Location,
        revision: Revision,
    },

    /// A document was removed by a subtree delete
    #[serde(rename_all = "camelCase")]
    NodeDeleted {
        location: Location,
        revision: Revision,
    },

    /// A draft document replaced the published one
    NodePublished { location: Location },

    /// A published document moved back into the draft revision
    NodeUnpublished { location: Location },

    /// A subtree rooted at `location` gained draft copies
    ConvertedToDraft { location: Location },

    /// Cached derived metadata of a course was dropped
    MetadataInvalidated { course: CourseKey },
}

impl DomainEvent {
    /// Get a string representation of the event type
    pub fn event_type(&self) -> &str {
        match self {
            DomainEvent::NodeCreated { .. } => "node:created",
            DomainEvent::NodeUpdated { .. } => "node:updated",
            DomainEvent::NodeDeleted { .. } => "node:deleted",
            DomainEvent::NodePublished { .. } => "node:published",
            DomainEvent::NodeUnpublished { .. } => "node:unpublished",
            DomainEvent::ConvertedToDraft { .. } => "node:converted-to-draft",
            DomainEvent::MetadataInvalidated { .. } => "course:metadata-invalidated",
        }
    }
}

/// Broadcast sender shared by every component of a store
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<DomainEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Emit an event to all subscribers; dropped if nobody listens
    pub fn emit(&self, event: DomainEvent) {
        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DomainEvent> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Contract test: internally tagged JSON with camelCase field names
    #[test]
    fn test_event_serialization_contract() {
        let event = DomainEvent::NodeDeleted {
            location: Location::new(CourseKey::new("edX", "demo", "2024"), "html", "intro"),
            revision: Revision::Draft,
        };

        let parsed = serde_json::to_value(&event).unwrap();
        assert_eq!(parsed.get("type").unwrap(), "nodeDeleted");
        assert_eq!(parsed.get("revision").unwrap(), "draft");
        assert_eq!(
            parsed.pointer("/location/category").unwrap(),
            "html"
        );
        assert!(parsed.get("nodeDeleted").is_none());
    }

    #[test]
    fn test_event_type_names() {
        let course = CourseKey::new("edX", "demo", "2024");
        let location = Location::new(course.clone(), "vertical", "u1");

        assert_eq!(
            DomainEvent::NodePublished {
                location: location.clone()
            }
            .event_type(),
            "node:published"
        );
        assert_eq!(
            DomainEvent::ConvertedToDraft { location }.event_type(),
            "node:converted-to-draft"
        );
        assert_eq!(
            DomainEvent::MetadataInvalidated { course }.event_type(),
            "course:metadata-invalidated"
        );
    }

    #[tokio::test]
    async fn test_event_bus_delivers_to_subscribers() {
        let bus = EventBus::new(0);
        // No subscriber yet: emitting is a no-op
        bus.emit(DomainEvent::MetadataInvalidated {
            course: CourseKey::new("edX", "demo", "2024"),
        });

        let mut rx = bus.subscribe();
        let course = CourseKey::new("edX", "demo", "2024");
        bus.emit(DomainEvent::MetadataInvalidated {
            course: course.clone(),
        });
        assert_eq!(
            rx.recv().await.unwrap(),
            DomainEvent::MetadataInvalidated { course }
        );
    }
}
