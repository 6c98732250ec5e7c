use chrono::{DateTime, NaiveDateTime, Utc};

/// Parses an RFC 3339 timestamp, or one without an offset taken as UTC.
///
/// Returns `None` for anything else; callers drop the field rather than the record.
pub fn parse_lenient(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f").map(|dt| dt.and_utc())
        })
        .ok()
}
