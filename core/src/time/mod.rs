//! Timestamp helpers shared by the track, record and sensor readers.
//!
//! Every instant handled by the pipeline is a `DateTime<Utc>`. Source files carry
//! naive wall-clock strings that are interpreted as UTC unless a reader states
//! otherwise.

pub mod units;

pub use units::{TimeUnit, TimeUnits};

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};

const NAIVE_FORMATS: [&str; 6] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Parses a timestamp as written by the track exports and station loggers.
///
/// Strings with an explicit offset (RFC 3339) are converted to UTC, naive strings
/// are taken as UTC wall clock. A bare date maps to midnight UTC.
pub fn parse_utc_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim().trim_matches('"');
    if value.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Seconds elapsed from `origin` to `instant`, negative when `instant` is earlier.
pub fn elapsed_seconds(origin: DateTime<Utc>, instant: DateTime<Utc>) -> f64 {
    (instant - origin).num_milliseconds() as f64 / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_track_export_forms() {
        let expected = Utc.with_ymd_and_hms(2015, 10, 29, 23, 44, 0).unwrap();
        assert_eq!(parse_utc_timestamp("2015-10-29T23:44"), Some(expected));
        assert_eq!(parse_utc_timestamp("2015-10-29T23:44:00"), Some(expected));
        assert_eq!(parse_utc_timestamp("2015-10-29 23:44:00"), Some(expected));
        assert_eq!(parse_utc_timestamp("\"2015-10-29 23:44\""), Some(expected));
    }

    #[test]
    fn converts_offsets_to_utc() {
        let parsed = parse_utc_timestamp("2015-10-30T00:48:15+01:00").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2015, 10, 29, 23, 48, 15).unwrap());
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_utc_timestamp("").is_none());
        assert!(parse_utc_timestamp("yesterday").is_none());
    }

    #[test]
    fn elapsed_keeps_sign_and_fraction() {
        let origin = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        let later = origin + chrono::Duration::milliseconds(90_500);
        assert_eq!(elapsed_seconds(origin, later), 90.5);
        assert_eq!(elapsed_seconds(later, origin), -90.5);
    }
}
