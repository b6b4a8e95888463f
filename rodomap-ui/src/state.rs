//! Shared viewer state
//!
//! The record set is mutated only by single-threaded append; clustering,
//! ranking, and scoring are pure recomputations from the current records
//! plus selection on every request, never cached or patched incrementally.

use std::collections::BTreeMap;

use chrono::Utc;
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::info;

use rodomap_common::events::{EventBus, MapEvent};
use rodomap_common::model::{self, Coordinate, Occurrence, RecordId, Status};
use rodomap_common::present::{self, MapView, MemberView, MODEL_VIEWER_RECORD_ID};
use rodomap_common::rank;
use rodomap_common::{Error, Result};

use crate::loader::LoadedData;

/// A record submission from the record-creation collaborator
///
/// The form validates its own input; the core only assigns the id and folds
/// the record in like any load-time record.
#[derive(Debug, Clone, Deserialize)]
pub struct NewOccurrence {
    pub kind: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub km: Option<String>,
    #[serde(default)]
    pub local: Option<String>,
    #[serde(default)]
    pub recorded_at: String,
    pub lon: f64,
    pub lat: f64,
}

/// State shared across all handlers
pub struct SharedState {
    /// Raw layer JSON, immutable after the initial load
    layers: BTreeMap<String, Value>,
    /// Append-only occurrence set
    records: RwLock<Vec<Occurrence>>,
    /// At most one highlighted record id
    selection: RwLock<Option<RecordId>>,
    /// Event broadcaster for SSE delivery
    pub events: EventBus,
}

impl SharedState {
    pub fn new(loaded: LoadedData) -> Self {
        let events = EventBus::default();
        events.publish(MapEvent::LayersLoaded {
            layers: loaded.layers.keys().cloned().collect(),
            occurrences: loaded.records.len(),
            timestamp: Utc::now(),
        });
        Self {
            layers: loaded.layers,
            records: RwLock::new(loaded.records),
            selection: RwLock::new(None),
            events,
        }
    }

    /// Names of the successfully loaded layers
    pub fn layer_names(&self) -> Vec<String> {
        self.layers.keys().cloned().collect()
    }

    /// Raw GeoJSON passthrough for one layer
    pub fn layer(&self, name: &str) -> Option<&Value> {
        self.layers.get(name)
    }

    /// Current selection
    pub async fn selection(&self) -> Option<RecordId> {
        *self.selection.read().await
    }

    /// Full map view: draw-ordered features, cluster popups, bindings
    pub async fn map_view(&self) -> MapView {
        let records = self.records.read().await;
        let selection = *self.selection.read().await;
        present::build_map_view(&records, selection)
    }

    /// All records ranked newest-first, for the list collaborator
    pub async fn history(&self) -> Vec<MemberView> {
        let records = self.records.read().await;
        let selection = *self.selection.read().await;
        let mut ordered: Vec<&Occurrence> = records.iter().collect();
        rank::rank_newest_first(&mut ordered);
        ordered
            .into_iter()
            .map(|record| MemberView::from_record(record, selection))
            .collect()
    }

    /// Append a newly submitted occurrence with id = (max existing) + 1
    pub async fn add_occurrence(&self, submission: NewOccurrence) -> Occurrence {
        let mut records = self.records.write().await;
        let record = Occurrence {
            id: model::next_id(&records),
            kind: submission.kind,
            status: Status::classify(&submission.status),
            status_text: submission.status,
            description: submission.description,
            km: submission.km,
            local: submission.local,
            admin_code: None,
            recorded_at: rank::parse_instant(&submission.recorded_at),
            recorded_at_text: submission.recorded_at,
            coordinate: Some(Coordinate::new(submission.lon, submission.lat)),
        };
        records.push(record.clone());
        info!("Occurrence {} appended ({} total)", record.id, records.len());

        self.events.publish(MapEvent::OccurrenceAdded {
            id: record.id,
            timestamp: Utc::now(),
        });
        record
    }

    /// Highlight one record; returns the cluster index whose popup the map
    /// collaborator should re-open (None when the record has no coordinate)
    pub async fn select(&self, id: RecordId) -> Result<Option<usize>> {
        let cluster = {
            let records = self.records.read().await;
            if !records.iter().any(|r| r.id == id) {
                return Err(Error::NotFound(format!("occurrence {}", id)));
            }
            present::build_map_view(&records, Some(id))
                .bindings
                .get(&id)
                .copied()
        };

        *self.selection.write().await = Some(id);
        self.events.publish(MapEvent::SelectionChanged {
            id: Some(id),
            cluster,
            timestamp: Utc::now(),
        });
        Ok(cluster)
    }

    /// Clear the highlighted record
    pub async fn clear_selection(&self) {
        *self.selection.write().await = None;
        self.events.publish(MapEvent::SelectionChanged {
            id: None,
            cluster: None,
            timestamp: Utc::now(),
        });
    }

    /// Fire the 3D model viewer trigger hook
    ///
    /// The viewer itself is an independent subsystem; this is the only
    /// coupling, tied to one hard-coded record
    pub fn trigger_model_viewer(&self) -> RecordId {
        self.events.publish(MapEvent::OpenModelViewer {
            id: MODEL_VIEWER_RECORD_ID,
            timestamp: Utc::now(),
        });
        MODEL_VIEWER_RECORD_ID
    }
}
