//! # Rodomap Common Library
//!
//! Core engine for the road-occurrence map viewer:
//! - Occurrence data model and status classification
//! - GeoJSON layer normalization (legacy property keys, id fallback)
//! - Spatial aggregation of records at effectively identical coordinates
//! - Chronological ranking of mixed-format timestamps
//! - Draw/stacking priority scoring
//! - Typed view models for the map and list collaborators

pub mod cluster;
pub mod error;
pub mod events;
pub mod geojson;
pub mod model;
pub mod normalize;
pub mod present;
pub mod rank;
pub mod score;

pub use error::{Error, Result};
pub use model::{Coordinate, Occurrence, RecordId, Status};
