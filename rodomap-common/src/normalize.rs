//! GeoJSON layer normalization and record extraction
//!
//! The consolidated occurrences layer carries property keys prefixed with
//! the name of the spreadsheet it was exported from. Normalization
//! re-exposes those under their plain suffix, guarantees the primary
//! identifier is populated, and extracts typed records. Malformed input
//! degrades to an empty layer so downstream stages keep working.

use serde_json::{Map, Value};
use tracing::warn;

use crate::geojson::{Feature, FeatureCollection};
use crate::model::{Occurrence, RecordId, Status};
use crate::rank;

/// Legacy property-key prefix on the consolidated occurrences export
pub const LEGACY_PREFIX: &str = "historico_ocorrencias_demonstrativo — Sheet1_";

/// Primary identifier property
pub const ID_KEY: &str = "id_ocorrencia";

/// Secondary identifier property, used when the primary is absent
pub const OBJECT_ID_KEY: &str = "objectid";

/// Normalize a raw occurrences layer.
///
/// Every property key carrying the legacy prefix is re-exposed under its
/// suffix (the prefixed key is kept, matching the source data), and
/// `id_ocorrencia` is backfilled from `objectid` when missing. Returns an
/// empty collection for malformed or missing input.
pub fn normalize_layer(raw: Value) -> FeatureCollection {
    let mut collection: FeatureCollection = match serde_json::from_value(raw) {
        Ok(collection) => collection,
        Err(e) => {
            warn!("Malformed occurrences layer, using empty collection: {}", e);
            return FeatureCollection::empty();
        }
    };

    for feature in &mut collection.features {
        normalize_properties(&mut feature.properties);
    }

    collection
}

fn normalize_properties(properties: &mut Map<String, Value>) {
    let unprefixed: Vec<(String, Value)> = properties
        .iter()
        .filter_map(|(key, value)| {
            key.strip_prefix(LEGACY_PREFIX)
                .map(|suffix| (suffix.to_string(), value.clone()))
        })
        .collect();
    for (key, value) in unprefixed {
        properties.insert(key, value);
    }

    let id_missing = properties
        .get(ID_KEY)
        .map_or(true, |v| v.is_null());
    if id_missing {
        if let Some(object_id) = properties.get(OBJECT_ID_KEY).cloned() {
            properties.insert(ID_KEY.to_string(), object_id);
        }
    }
}

/// Extract typed occurrence records from a normalized layer.
///
/// Status classification and timestamp parsing happen here, once. Features
/// without a usable identifier are dropped (and logged); features without a
/// point coordinate are kept with `coordinate: None` so the list view still
/// shows them.
pub fn extract_occurrences(collection: &FeatureCollection) -> Vec<Occurrence> {
    let mut records = Vec::with_capacity(collection.features.len());
    for feature in &collection.features {
        match occurrence_from_feature(feature) {
            Some(record) => records.push(record),
            None => warn!("Dropping occurrence feature without usable id"),
        }
    }
    records
}

fn occurrence_from_feature(feature: &Feature) -> Option<Occurrence> {
    let properties = &feature.properties;
    let id = prop_id(properties, ID_KEY).or_else(|| prop_id(properties, OBJECT_ID_KEY))?;

    let status_text = prop_string(properties, "status").unwrap_or_default();
    let recorded_at_text = prop_string(properties, "data_hora").unwrap_or_default();

    Some(Occurrence {
        id,
        kind: prop_string(properties, "tipo").unwrap_or_default(),
        status: Status::classify(&status_text),
        status_text,
        description: prop_string(properties, "descricao_detalhada").unwrap_or_default(),
        km: prop_string(properties, "km"),
        local: prop_string(properties, "Local"),
        admin_code: prop_string(properties, "sigla_adm"),
        recorded_at: rank::parse_instant(&recorded_at_text),
        recorded_at_text,
        coordinate: feature.point_coordinate(),
    })
}

/// Read an id that may be encoded as a JSON number or a numeric string
fn prop_id(properties: &Map<String, Value>, key: &str) -> Option<RecordId> {
    match properties.get(key)? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Read a property as display text; numbers are rendered, null is absent
fn prop_string(properties: &Map<String, Value>, key: &str) -> Option<String> {
    match properties.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
