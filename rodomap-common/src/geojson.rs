//! Minimal GeoJSON feature-collection types
//!
//! Only what the occurrences layer needs: property maps plus point
//! extraction. Hazard layers (contour lines, flood stretches, the road
//! itself) pass through the service as raw JSON and are never typed.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::model::Coordinate;

/// A GeoJSON FeatureCollection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureCollection {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    /// An empty collection, used as the degraded result for malformed input
    pub fn empty() -> Self {
        Self {
            kind: "FeatureCollection".to_string(),
            features: Vec::new(),
        }
    }
}

/// A GeoJSON Feature with free-form properties
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Feature {
    #[serde(rename = "type", default = "feature_type")]
    pub kind: String,
    #[serde(default)]
    pub properties: Map<String, Value>,
    #[serde(default)]
    pub geometry: Option<Geometry>,
}

fn feature_type() -> String {
    "Feature".to_string()
}

impl Feature {
    /// Build a Point feature from properties and a coordinate
    pub fn point(properties: Map<String, Value>, coordinate: Coordinate) -> Self {
        Self {
            kind: "Feature".to_string(),
            properties,
            geometry: Some(Geometry {
                kind: "Point".to_string(),
                coordinates: Value::Array(vec![
                    Value::from(coordinate.lon),
                    Value::from(coordinate.lat),
                ]),
            }),
        }
    }

    /// Extract the [lon, lat] pair of a Point geometry, if present and valid
    pub fn point_coordinate(&self) -> Option<Coordinate> {
        let geometry = self.geometry.as_ref()?;
        if geometry.kind != "Point" {
            return None;
        }
        let coords = geometry.coordinates.as_array()?;
        let lon = coords.first()?.as_f64()?;
        let lat = coords.get(1)?.as_f64()?;
        Some(Coordinate::new(lon, lat))
    }
}

/// A GeoJSON geometry; coordinates stay untyped since only points are read
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Geometry {
    #[serde(rename = "type")]
    pub kind: String,
    pub coordinates: Value,
}
