//! Draw/stacking priority scoring
//!
//! Markers are rendered in array order, so the record set is reordered
//! ascending by effective score: later positions land visually on top.

use crate::model::{Occurrence, RecordId, Status};

/// Base priority from the normalized status
///
/// Pending incidents stack above everything; resolved and unknown sit at
/// the bottom. Classification already ran at ingestion with the pending
/// check ahead of the resolved check, so substring overlap between the two
/// phrases cannot misclassify here.
pub fn priority(status: Status) -> i32 {
    match status {
        Status::Pending => 2,
        Status::InProgress => 1,
        Status::Resolved | Status::Unknown => 0,
    }
}

/// Effective priority including the selection override.
///
/// The selected record always outranks every status-derived score; this is
/// a final rule independent of the status table.
pub fn effective_priority(record: &Occurrence, selection: Option<RecordId>) -> i32 {
    if selection == Some(record.id) {
        i32::MAX
    } else {
        priority(record.status)
    }
}

/// The full record set reordered ascending by effective score.
///
/// Stable: records with equal scores keep their original relative order.
pub fn draw_order<'a>(
    records: &'a [Occurrence],
    selection: Option<RecordId>,
) -> Vec<&'a Occurrence> {
    let mut ordered: Vec<&Occurrence> = records.iter().collect();
    ordered.sort_by_key(|record| effective_priority(record, selection));
    ordered
}
