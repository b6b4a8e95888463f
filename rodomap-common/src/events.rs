//! Event types and bus for the viewer
//!
//! Events are broadcast via EventBus and serialized for SSE transmission.
//! The 3D model viewer trigger travels on this bus as well, instead of
//! through a process-wide mutable callback.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::model::RecordId;

/// Viewer event types
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum MapEvent {
    /// Initial data load completed (possibly degraded)
    LayersLoaded {
        /// Names of the layers that loaded successfully
        layers: Vec<String>,
        /// Number of occurrence records extracted
        occurrences: usize,
        timestamp: DateTime<Utc>,
    },

    /// A new occurrence was submitted and folded into the record set
    OccurrenceAdded {
        id: RecordId,
        timestamp: DateTime<Utc>,
    },

    /// The highlighted record changed (None clears the selection)
    SelectionChanged {
        id: Option<RecordId>,
        /// Cluster whose popup should be re-opened, when the record is on
        /// the map
        cluster: Option<usize>,
        timestamp: DateTime<Utc>,
    },

    /// The 3D model viewer trigger hook fired
    OpenModelViewer {
        id: RecordId,
        timestamp: DateTime<Utc>,
    },
}

impl MapEvent {
    /// SSE event name
    pub fn name(&self) -> &'static str {
        match self {
            MapEvent::LayersLoaded { .. } => "LayersLoaded",
            MapEvent::OccurrenceAdded { .. } => "OccurrenceAdded",
            MapEvent::SelectionChanged { .. } => "SelectionChanged",
            MapEvent::OpenModelViewer { .. } => "OpenModelViewer",
        }
    }
}

/// Broadcast bus for viewer events
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<MapEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Publish an event; having no subscribers is not an error
    pub fn publish(&self, event: MapEvent) {
        let _ = self.tx.send(event);
    }

    /// Subscribe for SSE delivery
    pub fn subscribe(&self) -> broadcast::Receiver<MapEvent> {
        self.tx.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_publish_and_receive() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe();
        bus.publish(MapEvent::OccurrenceAdded {
            id: 8,
            timestamp: Utc::now(),
        });
        match rx.recv().await.unwrap() {
            MapEvent::OccurrenceAdded { id, .. } => assert_eq!(id, 8),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_publish_without_subscribers_is_ok() {
        let bus = EventBus::default();
        bus.publish(MapEvent::OpenModelViewer {
            id: 414,
            timestamp: Utc::now(),
        });
    }

    #[test]
    fn test_event_serialization_is_tagged() {
        let event = MapEvent::SelectionChanged {
            id: Some(3),
            cluster: Some(0),
            timestamp: Utc::now(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "SelectionChanged");
        assert_eq!(json["id"], 3);
    }
}
