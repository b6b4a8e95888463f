//! Presentation adapter
//!
//! Converts ranked, scored clusters into typed view models for the external
//! rendering collaborators: marker descriptors for the map, popup contents
//! per cluster, and an id-to-cluster binding table so a select event can
//! re-open the right popup. No markup is generated here; the collaborators
//! consume the view models with their own templating.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::cluster::SpatialIndex;
use crate::geojson::{Feature, FeatureCollection};
use crate::model::{Coordinate, Occurrence, RecordId, Status};
use crate::normalize::ID_KEY;
use crate::{rank, score};

/// Marker fill colors by status
pub const COLOR_PENDING: &str = "#ef4444";
pub const COLOR_IN_PROGRESS: &str = "#f59e0b";
pub const COLOR_RESOLVED: &str = "#22c55e";
/// Empty or missing status text
pub const COLOR_UNKNOWN: &str = "#94a3b8";
/// Non-empty status text that matched no known category
pub const COLOR_FALLBACK: &str = "#3b82f6";

/// The one record whose popup exposes the 3D model viewer trigger
pub const MODEL_VIEWER_RECORD_ID: RecordId = 414;

/// Marker fill color for a record's status
pub fn marker_color(status: Status, status_text: &str) -> &'static str {
    match status {
        Status::Pending => COLOR_PENDING,
        Status::InProgress => COLOR_IN_PROGRESS,
        Status::Resolved => COLOR_RESOLVED,
        Status::Unknown => {
            if status_text.trim().is_empty() {
                COLOR_UNKNOWN
            } else {
                COLOR_FALLBACK
            }
        }
    }
}

/// One record entry inside a cluster popup or the history list
#[derive(Debug, Clone, Serialize)]
pub struct MemberView {
    pub id: RecordId,
    pub kind: String,
    pub status: Status,
    pub status_label: &'static str,
    pub status_text: String,
    pub recorded_at: NaiveDateTime,
    pub recorded_at_text: String,
    pub description: String,
    pub km: Option<String>,
    /// Location name, shown in the list view
    pub local: Option<String>,
    /// Highlight styling for the currently selected record
    pub highlighted: bool,
}

impl MemberView {
    /// Build the entry for one record; also used for the history list,
    /// which shares the exact ranking the popups use
    pub fn from_record(record: &Occurrence, selection: Option<RecordId>) -> Self {
        Self {
            id: record.id,
            kind: record.kind.clone(),
            status: record.status,
            status_label: record.status.label(),
            status_text: record.status_text.clone(),
            recorded_at: record.recorded_at,
            recorded_at_text: record.recorded_at_text.clone(),
            description: record.description.clone(),
            km: record.km.clone(),
            local: record.local.clone(),
            highlighted: selection == Some(record.id),
        }
    }
}

/// Popup view model for one cluster of co-located records
#[derive(Debug, Clone, Serialize)]
pub struct ClusterView {
    /// Marker anchor; all members sit within tolerance of it
    pub anchor: Coordinate,
    /// Header: location name of the top-ranked member
    pub local: Option<String>,
    /// Header: administrative code of the top-ranked member
    pub admin_code: Option<String>,
    /// Member count shown in the popup badge and footer
    pub count: usize,
    /// Marker fill color; follows the selected member when one is here
    pub color: String,
    /// Whether the popup offers the 3D model viewer trigger
    pub model_viewer: bool,
    /// Whether the selected record belongs to this cluster
    pub contains_selected: bool,
    /// Members, newest first
    pub members: Vec<MemberView>,
}

/// Everything the map collaborator needs to render one frame
#[derive(Debug, Clone, Serialize)]
pub struct MapView {
    /// Occurrence markers in draw order (later entries render on top)
    pub features: FeatureCollection,
    /// Popup view models, one per cluster
    pub clusters: Vec<ClusterView>,
    /// Record id to cluster index, for re-opening a popup on select
    pub bindings: BTreeMap<RecordId, usize>,
}

/// Build the full map view from the current record set and selection.
///
/// Pure recomputation; nothing is cached between calls.
pub fn build_map_view(records: &[Occurrence], selection: Option<RecordId>) -> MapView {
    let index = SpatialIndex::new(records);
    let mut bindings = BTreeMap::new();
    let mut clusters = Vec::new();

    for member_indices in index.partition() {
        // Record order here mirrors the draw stack; the last highest-score
        // member is the marker actually visible on top
        let stacked: Vec<&Occurrence> =
            member_indices.iter().map(|&i| &records[i]).collect();
        let Some(top) = visible_member(&stacked, selection) else {
            continue;
        };

        let mut members = stacked.clone();
        rank::rank_newest_first(&mut members);
        let Some(anchor) = members[0].coordinate else {
            continue;
        };

        let cluster_index = clusters.len();
        for member in &members {
            bindings.insert(member.id, cluster_index);
        }

        clusters.push(ClusterView {
            anchor,
            local: members[0].local.clone(),
            admin_code: members[0].admin_code.clone(),
            count: members.len(),
            color: marker_color(top.status, &top.status_text).to_string(),
            model_viewer: members.iter().any(|m| m.id == MODEL_VIEWER_RECORD_ID),
            contains_selected: selection
                .is_some_and(|id| members.iter().any(|m| m.id == id)),
            members: members
                .iter()
                .map(|m| MemberView::from_record(m, selection))
                .collect(),
        });
    }

    MapView {
        features: draw_ordered_features(records, selection),
        clusters,
        bindings,
    }
}

/// The member whose status drives the marker color: the selected record if
/// it is in this cluster, otherwise the top of the draw stack
fn visible_member<'a>(
    stacked: &[&'a Occurrence],
    selection: Option<RecordId>,
) -> Option<&'a Occurrence> {
    if let Some(id) = selection {
        if let Some(selected) = stacked.iter().copied().find(|m| m.id == id) {
            return Some(selected);
        }
    }
    stacked
        .iter()
        .max_by_key(|m| score::priority(m.status))
        .copied()
}

/// The reordered feature collection handed to the map collaborator
fn draw_ordered_features(
    records: &[Occurrence],
    selection: Option<RecordId>,
) -> FeatureCollection {
    let mut collection = FeatureCollection::empty();
    for record in score::draw_order(records, selection) {
        let Some(coordinate) = record.coordinate else {
            continue;
        };
        let mut properties = Map::new();
        properties.insert(ID_KEY.to_string(), Value::from(record.id));
        properties.insert("tipo".to_string(), Value::from(record.kind.clone()));
        properties.insert("status".to_string(), Value::from(record.status_text.clone()));
        properties.insert(
            "data_hora".to_string(),
            Value::from(record.recorded_at_text.clone()),
        );
        if let Some(km) = &record.km {
            properties.insert("km".to_string(), Value::from(km.clone()));
        }
        if let Some(local) = &record.local {
            properties.insert("Local".to_string(), Value::from(local.clone()));
        }
        properties.insert(
            "color".to_string(),
            Value::from(marker_color(record.status, &record.status_text)),
        );
        properties.insert(
            "selected".to_string(),
            Value::from(selection == Some(record.id)),
        );
        collection.features.push(Feature::point(properties, coordinate));
    }
    collection
}
