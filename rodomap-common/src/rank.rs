//! Chronological ranking of mixed-format timestamps
//!
//! The same parsing and ordering logic backs both the map popup view and
//! the list view; the two must never diverge for the same data.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::model::Occurrence;

/// The "unknown/oldest" instant used when a timestamp matches no format
pub const UNKNOWN_INSTANT: NaiveDateTime = NaiveDateTime::UNIX_EPOCH;

/// Parse a date string into a totally ordered instant.
///
/// Priority:
/// 1. `D[D]/M[M]/YYYY`, optionally followed by `H[H]:M[M]`, as local
///    calendar time (hour/minute default to 00:00)
/// 2. Generic calendar parse (RFC 3339, then `YYYY-MM-DD[ HH:MM[:SS]]`)
/// 3. The Unix epoch instant — sorts as oldest, never raises
pub fn parse_instant(text: &str) -> NaiveDateTime {
    let s = text.trim();
    if s.is_empty() {
        return UNKNOWN_INSTANT;
    }

    if let Some(instant) = parse_day_month_year(s) {
        return instant;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return dt.naive_utc();
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return dt;
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M") {
        return dt;
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        if let Some(dt) = date.and_hms_opt(0, 0, 0) {
            return dt;
        }
    }

    UNKNOWN_INSTANT
}

/// Parse the `D[D]/M[M]/YYYY` form with an optional trailing `H[H]:M[M]`
fn parse_day_month_year(s: &str) -> Option<NaiveDateTime> {
    let (date_part, rest) = match s.find(char::is_whitespace) {
        Some(i) => (&s[..i], s[i..].trim_start()),
        None => (s, ""),
    };

    let mut parts = date_part.splitn(3, '/');
    let day: u32 = parts.next()?.parse().ok()?;
    let month: u32 = parts.next()?.parse().ok()?;
    let year_part = parts.next()?;
    if year_part.len() != 4 {
        return None;
    }
    let year: i32 = year_part.parse().ok()?;

    let date = NaiveDate::from_ymd_opt(year, month, day)?;
    let (hour, minute) = parse_time(rest).unwrap_or((0, 0));
    date.and_hms_opt(hour, minute, 0)
}

/// Parse an `H[H]:M[M]` time, ignoring trailing seconds
fn parse_time(s: &str) -> Option<(u32, u32)> {
    let token = s.split_whitespace().next()?;
    let mut parts = token.splitn(3, ':');
    let hour: u32 = parts.next()?.parse().ok()?;
    let minute: u32 = parts.next()?.parse().ok()?;
    if hour > 23 || minute > 59 {
        return None;
    }
    Some((hour, minute))
}

/// Order cluster members newest-first.
///
/// Stable sort on the parsed instant alone; ties preserve the original
/// relative order, with no secondary sort key.
pub fn rank_newest_first(members: &mut [&Occurrence]) {
    members.sort_by(|a, b| b.recorded_at.cmp(&a.recorded_at));
}
