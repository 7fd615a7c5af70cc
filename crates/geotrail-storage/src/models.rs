// SPDX-FileCopyrightText: 2026 Geotrail Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Row-level encodings shared by the query modules.
//!
//! The canonical types live in `geotrail-core::types`; this module owns how
//! they are written to and read back from SQLite columns.

use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use rusqlite::types::{Type, ValueRef};
use serde_json::Value;

use geotrail_core::{Coordinate, LiveLocation};

pub use geotrail_core::types::{Device, HistorySnapshot, LogRecord, RecentLogEntry};

/// Encode a timestamp for a TEXT column, e.g. `2026-03-01T08:15:00.250Z`.
///
/// Fixed width and UTC, so string order equals time order.
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Decode a TEXT timestamp column written by [`format_timestamp`].
pub fn parse_timestamp(idx: usize, raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Decode an epoch-milliseconds column, or `None` when it is not an
/// integer or falls outside the representable range.
pub fn millis_column(value: ValueRef<'_>) -> Option<DateTime<Utc>> {
    let ms = value.as_i64().ok()?;
    Utc.timestamp_millis_opt(ms).single()
}

/// A TEXT column as UTF-8, or `None` for any other storage class or
/// invalid UTF-8.
pub fn text_column(value: ValueRef<'_>) -> Option<&str> {
    match value {
        ValueRef::Text(raw) => std::str::from_utf8(raw).ok(),
        _ => None,
    }
}

/// Decode the raw `info` column into the device's current position.
///
/// Never fails; bytes that are not UTF-8 text are [`LiveLocation::Malformed`].
pub fn decode_info_column(value: ValueRef<'_>) -> LiveLocation {
    match value {
        ValueRef::Null => LiveLocation::Absent,
        ValueRef::Text(raw) | ValueRef::Blob(raw) => match std::str::from_utf8(raw) {
            Ok(info) => decode_live_location(Some(info)),
            Err(e) => LiveLocation::Malformed(format!("info is not valid UTF-8: {e}")),
        },
        other => LiveLocation::Malformed(format!("info is stored as {}", other.data_type())),
    }
}

/// Decode a device's `info` JSON into its current position.
///
/// Never fails: anything that cannot be understood becomes
/// [`LiveLocation::Malformed`] so one bad row cannot hide the others.
pub fn decode_live_location(info: Option<&str>) -> LiveLocation {
    let Some(raw) = info else {
        return LiveLocation::Absent;
    };

    let value: Value = match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(e) => return LiveLocation::Malformed(format!("info is not valid JSON: {e}")),
    };
    let Some(info) = value.as_object() else {
        return LiveLocation::Malformed("info is not a JSON object".to_string());
    };

    let location = match info.get("location") {
        Some(location) if is_truthy(location) => location,
        _ => return LiveLocation::Absent,
    };

    let lat = location.get("lat").and_then(loose_number);
    let lon = location.get("lon").and_then(loose_number);
    match Coordinate::from_parts(lat, lon) {
        Some(coordinate) => LiveLocation::Fix {
            coordinate,
            observed_at: location
                .get("ts")
                .and_then(loose_number)
                .filter(|ms| *ms != 0.0)
                .and_then(|ms| Utc.timestamp_millis_opt(ms as i64).single()),
        },
        None => LiveLocation::NoFix,
    }
}

/// Numbers, and strings that parse as numbers.
fn loose_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamps_format_with_millis_and_z() {
        let ts = Utc.timestamp_millis_opt(1_767_225_600_250).unwrap();
        let encoded = format_timestamp(ts);
        assert_eq!(encoded, "2026-01-01T00:00:00.250Z");
        assert_eq!(parse_timestamp(0, &encoded).unwrap(), ts);
    }

    #[test]
    fn timestamp_strings_sort_chronologically() {
        let early = format_timestamp(Utc.timestamp_millis_opt(9_000).unwrap());
        let late = format_timestamp(Utc.timestamp_millis_opt(10_000).unwrap());
        assert!(early < late);
    }

    #[test]
    fn garbage_timestamp_is_a_conversion_error() {
        assert!(parse_timestamp(3, "yesterday").is_err());
    }

    #[test]
    fn info_column_tolerates_bad_bytes() {
        assert_eq!(decode_info_column(ValueRef::Null), LiveLocation::Absent);
        assert!(matches!(
            decode_info_column(ValueRef::Text(b"{\xff}")),
            LiveLocation::Malformed(_)
        ));
        assert!(matches!(
            decode_info_column(ValueRef::Integer(7)),
            LiveLocation::Malformed(_)
        ));
        assert_eq!(
            decode_info_column(ValueRef::Text(br#"{"location": {"lat": 1.5, "lon": 2.5}}"#))
                .coordinate(),
            Coordinate::new(1.5, 2.5)
        );
    }

    #[test]
    fn out_of_range_millis_are_dropped() {
        assert_eq!(
            millis_column(ValueRef::Integer(1_767_225_600_000)),
            Utc.timestamp_millis_opt(1_767_225_600_000).single()
        );
        assert_eq!(millis_column(ValueRef::Integer(i64::MAX)), None);
        assert_eq!(millis_column(ValueRef::Text(b"soon")), None);
        assert_eq!(text_column(ValueRef::Text(b"ok")), Some("ok"));
        assert_eq!(text_column(ValueRef::Text(b"\xff")), None);
    }

    #[test]
    fn null_info_is_absent() {
        assert_eq!(decode_live_location(None), LiveLocation::Absent);
    }

    #[test]
    fn info_without_location_is_absent() {
        assert_eq!(decode_live_location(Some(r#"{"battery": 80}"#)), LiveLocation::Absent);
        assert_eq!(decode_live_location(Some(r#"{"location": null}"#)), LiveLocation::Absent);
        assert_eq!(decode_live_location(Some(r#"{"location": {}}"#)), LiveLocation::Absent);
    }

    #[test]
    fn zero_or_missing_axes_are_no_fix() {
        assert_eq!(
            decode_live_location(Some(r#"{"location": {"lat": 0, "lon": 0}}"#)),
            LiveLocation::NoFix
        );
        assert_eq!(
            decode_live_location(Some(r#"{"location": {"lat": 12.5}}"#)),
            LiveLocation::NoFix
        );
        assert_eq!(
            decode_live_location(Some(r#"{"location": {"lat": "north", "lon": 3}}"#)),
            LiveLocation::NoFix
        );
    }

    #[test]
    fn fix_carries_observation_time() {
        let decoded = decode_live_location(Some(
            r#"{"location": {"lat": 12.34, "lon": 56.78, "ts": 1767225600000}}"#,
        ));
        let LiveLocation::Fix {
            coordinate,
            observed_at,
        } = decoded
        else {
            panic!("expected a fix, got {decoded:?}");
        };
        assert_eq!(coordinate, Coordinate::new(12.34, 56.78).unwrap());
        assert_eq!(observed_at, Utc.timestamp_millis_opt(1_767_225_600_000).single());
    }

    #[test]
    fn zero_ts_means_unknown_observation_time() {
        let decoded =
            decode_live_location(Some(r#"{"location": {"lat": 1.5, "lon": 2.5, "ts": 0}}"#));
        assert!(matches!(decoded, LiveLocation::Fix { observed_at: None, .. }));
    }

    #[test]
    fn numeric_strings_are_accepted() {
        let decoded =
            decode_live_location(Some(r#"{"location": {"lat": "-33.45", "lon": " -70.66 "}}"#));
        assert_eq!(decoded.coordinate(), Coordinate::new(-33.45, -70.66));
    }

    #[test]
    fn undecodable_info_is_malformed() {
        assert!(matches!(
            decode_live_location(Some("{not json")),
            LiveLocation::Malformed(_)
        ));
        assert!(matches!(
            decode_live_location(Some("[1, 2]")),
            LiveLocation::Malformed(_)
        ));
    }
}
