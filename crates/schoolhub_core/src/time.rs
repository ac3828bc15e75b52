//! Wire-format timestamp handling.
//!
//! # Responsibility
//! - Parse and format the fixed ISO-8601 UTC wire format (`Z` suffix,
//!   second precision) used by every date field in the API contract.
//! - Provide the legacy space-separated format expected by the push
//!   delivery collaborator.
//!
//! # Invariants
//! - Timestamps without an explicit offset are interpreted as UTC.
//! - Date-only inputs mean midnight UTC of that day.
//! - `format_utc(parse_utc(s))` is stable for canonical inputs.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use std::error::Error;
use std::fmt::{Display, Formatter};

const WIRE_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";
const NAIVE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";
const DATE_FORMAT: &str = "%Y-%m-%d";
const PUSH_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Parse failure for wire timestamps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeParseError {
    value: String,
}

impl Display for TimeParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "invalid timestamp `{}`; expected ISO-8601 such as 2017-09-01T08:30:00Z",
            self.value
        )
    }
}

impl Error for TimeParseError {}

/// Formats a timestamp in the canonical wire format.
///
/// Sub-second precision is dropped; the suffix is always a literal `Z`.
pub fn format_utc(value: DateTime<Utc>) -> String {
    value.format(WIRE_FORMAT).to_string()
}

/// Formats a timestamp the way the push collaborator expects it.
pub fn format_push(value: DateTime<Utc>) -> String {
    value.format(PUSH_FORMAT).to_string()
}

/// Parses a wire timestamp.
///
/// Accepted shapes, tried in order:
/// - full RFC 3339 (offset honored, converted to UTC),
/// - naive `YYYY-MM-DDTHH:MM:SS` (interpreted as UTC),
/// - date-only `YYYY-MM-DD` (midnight UTC).
pub fn parse_utc(value: &str) -> Result<DateTime<Utc>, TimeParseError> {
    let trimmed = value.trim();

    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(parsed.with_timezone(&Utc));
    }

    if let Ok(parsed) = NaiveDateTime::parse_from_str(trimmed, NAIVE_FORMAT) {
        return Ok(parsed.and_utc());
    }

    if let Ok(parsed) = NaiveDate::parse_from_str(trimmed, DATE_FORMAT) {
        let midnight = parsed
            .and_hms_opt(0, 0, 0)
            .ok_or_else(|| TimeParseError {
                value: trimmed.to_string(),
            })?;
        return Ok(midnight.and_utc());
    }

    Err(TimeParseError {
        value: trimmed.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::{format_push, format_utc, parse_utc};
    use chrono::{TimeZone, Utc};

    #[test]
    fn parses_canonical_wire_timestamp() {
        let parsed = parse_utc("2017-09-01T08:30:00Z").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2017, 9, 1, 8, 30, 0).unwrap());
    }

    #[test]
    fn naive_timestamp_is_interpreted_as_utc() {
        let parsed = parse_utc("2017-09-01T08:30:00").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2017, 9, 1, 8, 30, 0).unwrap());
    }

    #[test]
    fn offset_timestamp_is_converted_to_utc() {
        let parsed = parse_utc("2017-09-01T10:30:00+02:00").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2017, 9, 1, 8, 30, 0).unwrap());
    }

    #[test]
    fn date_only_means_midnight_utc() {
        let parsed = parse_utc("2017-09-01").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2017, 9, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn format_round_trips_with_second_precision_and_z_suffix() {
        let value = Utc.with_ymd_and_hms(2017, 9, 1, 8, 30, 0).unwrap();
        let formatted = format_utc(value);
        assert_eq!(formatted, "2017-09-01T08:30:00Z");
        assert_eq!(parse_utc(&formatted).unwrap(), value);
    }

    #[test]
    fn push_format_uses_space_separator() {
        let value = Utc.with_ymd_and_hms(2017, 9, 1, 8, 30, 0).unwrap();
        assert_eq!(format_push(value), "2017-09-01 08:30:00");
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(parse_utc("not-a-date").is_err());
        assert!(parse_utc("").is_err());
    }
}
