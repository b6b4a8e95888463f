//! Occurrence record data model
//!
//! An occurrence is one road-incident report. Records are immutable once
//! created and the record set only grows by append; everything derived from
//! them (clusters, rankings, draw order) is recomputed from scratch on each
//! change rather than patched incrementally.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Unique occurrence identifier, strictly increasing with each addition
pub type RecordId = i64;

/// Maximum per-axis coordinate difference for two points to count as the
/// same location (roughly 11cm at the equator)
pub const COORD_TOLERANCE: f64 = 1e-6;

/// A longitude/latitude pair in WGS84
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    /// Longitude (WGS84)
    pub lon: f64,
    /// Latitude (WGS84)
    pub lat: f64,
}

impl Coordinate {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    /// True when both axes differ by less than the tolerance.
    ///
    /// Axis-wise comparison, not geodesic distance; this matches the
    /// observed clustering behavior of the data set and is preserved as-is.
    pub fn matches(&self, other: &Coordinate) -> bool {
        (self.lon - other.lon).abs() < COORD_TOLERANCE
            && (self.lat - other.lat).abs() < COORD_TOLERANCE
    }
}

/// Normalized occurrence status, assigned once at ingestion
///
/// All downstream color/score/badge logic switches on this enum instead of
/// re-parsing the free-text status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    /// Unresolved or pending ("não resolvido", "pendente")
    Pending,
    /// Work in progress ("em andamento")
    InProgress,
    /// Resolved ("resolvido")
    Resolved,
    /// Empty or unrecognized status text
    Unknown,
}

impl Status {
    /// Classify free-text status into the normalized enum.
    ///
    /// The negative/pending markers are checked FIRST: "não resolvido"
    /// contains "resolvido", so reversing the order would misclassify
    /// pending records as resolved.
    pub fn classify(text: &str) -> Status {
        let s = text.trim().to_lowercase();
        if s.is_empty() {
            return Status::Unknown;
        }
        if s.contains("não") || s.contains("nao") || s.contains("pendente") {
            Status::Pending
        } else if s.contains("em andamento") {
            Status::InProgress
        } else if s.contains("resolvido") {
            Status::Resolved
        } else {
            Status::Unknown
        }
    }

    /// Badge label for the list collaborator
    pub fn label(&self) -> &'static str {
        match self {
            Status::Pending => "pending",
            Status::InProgress => "in-progress",
            Status::Resolved => "resolved",
            Status::Unknown => "unknown",
        }
    }
}

/// One road-incident report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Occurrence {
    /// Unique id ("id_ocorrencia"), falling back to the source object id
    pub id: RecordId,
    /// Occurrence type ("tipo")
    pub kind: String,
    /// Raw free-text status as supplied
    pub status_text: String,
    /// Normalized status, assigned once at ingestion
    pub status: Status,
    /// Detailed description
    pub description: String,
    /// Kilometer marker along the road, if any
    pub km: Option<String>,
    /// Location name, if any
    pub local: Option<String>,
    /// Administrative unit code ("sigla_adm"), if any
    pub admin_code: Option<String>,
    /// Raw timestamp string, mixed format
    pub recorded_at_text: String,
    /// Parsed instant; the Unix epoch when the text matched no known format
    pub recorded_at: NaiveDateTime,
    /// Point coordinate; None for malformed records, which stay in the list
    /// view but are excluded from spatial and priority computation
    pub coordinate: Option<Coordinate>,
}

/// Next id for a newly submitted record: (maximum existing id) + 1
pub fn next_id(records: &[Occurrence]) -> RecordId {
    records.iter().map(|r| r.id).max().unwrap_or(0) + 1
}
