//! Initial layer loading
//!
//! Reads the fixed layer list from the data folder. A layer that fails to
//! read or parse is logged and omitted; the others proceed unaffected.
//! Total failure yields an empty dataset, never an error: the viewer comes
//! up degraded rather than not at all.

use std::collections::BTreeMap;
use std::path::Path;

use serde_json::Value;
use tracing::{info, warn};

use rodomap_common::model::Occurrence;
use rodomap_common::normalize;

/// Layer files served from the data folder, in display order
pub const LAYER_FILES: [&str; 4] = [
    "curvas_nivel_1_50000.geojson",
    "ocorrencias_consolidated.geojson",
    "rodovia_br101_trecho_ViaSul.geojson",
    "trechos_inundacao.geojson",
];

/// The layer that supplies occurrence records
pub const OCCURRENCES_LAYER: &str = "ocorrencias_consolidated";

/// Result of the initial load
#[derive(Debug, Default)]
pub struct LoadedData {
    /// Successfully loaded layers, keyed by file stem, normalized where
    /// applicable
    pub layers: BTreeMap<String, Value>,
    /// Typed records extracted from the occurrences layer
    pub records: Vec<Occurrence>,
}

/// Load all layers from the data folder
pub async fn load_all(data_folder: &Path) -> LoadedData {
    let mut loaded = LoadedData::default();

    for file in LAYER_FILES {
        let name = file.trim_end_matches(".geojson");
        let path = data_folder.join(file);
        let raw = match read_layer(&path).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Skipping layer {}: {}", name, e);
                continue;
            }
        };

        if name == OCCURRENCES_LAYER {
            let collection = normalize::normalize_layer(raw);
            loaded.records = normalize::extract_occurrences(&collection);
            match serde_json::to_value(&collection) {
                Ok(value) => {
                    loaded.layers.insert(name.to_string(), value);
                }
                Err(e) => warn!("Could not re-encode occurrences layer: {}", e),
            }
        } else {
            loaded.layers.insert(name.to_string(), raw);
        }
    }

    info!(
        "Loaded {} layer(s), {} occurrence record(s)",
        loaded.layers.len(),
        loaded.records.len()
    );
    loaded
}

async fn read_layer(path: &Path) -> rodomap_common::Result<Value> {
    let text = tokio::fs::read_to_string(path).await?;
    Ok(serde_json::from_str(&text)?)
}
