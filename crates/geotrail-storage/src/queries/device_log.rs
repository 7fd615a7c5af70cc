// SPDX-FileCopyrightText: 2026 Geotrail Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Event-log reads filtered on a location-update marker.
//!
//! Marker matching uses `instr`, which is case-sensitive, unlike `LIKE`.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use geotrail_core::GeotrailError;
use rusqlite::{Row, params};
use tracing::debug;

use crate::database::Database;
use crate::models::{LogRecord, RecentLogEntry, millis_column, text_column};

/// Decode one `(device_id, created_at_ms, message)` row.
///
/// Rows whose time or text cannot be decoded are dropped, not reported.
fn log_record_from_row(row: &Row<'_>) -> rusqlite::Result<Option<LogRecord>> {
    let device_id: i64 = row.get(0)?;
    let created_at = millis_column(row.get_ref(1)?);
    let message = text_column(row.get_ref(2)?);
    match (created_at, message) {
        (Some(created_at), Some(message)) => Ok(Some(LogRecord {
            device_id,
            created_at,
            message: message.to_string(),
        })),
        _ => {
            debug!(device_id, "dropping undecodable event-log record");
            Ok(None)
        }
    }
}

fn recent_entry_from_row(row: &Row<'_>) -> rusqlite::Result<Option<RecentLogEntry>> {
    let number: String = row.get(0)?;
    let description: Option<String> = row.get(1)?;
    let time = millis_column(row.get_ref(2)?);
    let message = text_column(row.get_ref(3)?);
    match (time, message) {
        (Some(time), Some(message)) => Ok(Some(RecentLogEntry {
            number,
            description,
            time,
            message: message.to_string(),
        })),
        _ => {
            debug!(device = %number, "dropping undecodable event-log record");
            Ok(None)
        }
    }
}

/// Marked records for one device created strictly after `since`, oldest first.
pub async fn marked_since(
    db: &Database,
    device_id: i64,
    marker: &str,
    since: DateTime<Utc>,
) -> Result<Vec<LogRecord>, GeotrailError> {
    let marker = marker.to_string();
    let since_ms = since.timestamp_millis();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT device_id, created_at_ms, message FROM device_log
                 WHERE device_id = ?1 AND instr(message, ?2) > 0 AND created_at_ms > ?3
                 ORDER BY created_at_ms ASC, id ASC",
            )?;
            let rows =
                stmt.query_map(params![device_id, marker, since_ms], log_record_from_row)?;
            let mut records = Vec::new();
            for row in rows {
                records.extend(row?);
            }
            Ok(records)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Count of marked records per device, over all time.
pub async fn marked_counts(db: &Database, marker: &str) -> Result<HashMap<i64, u64>, GeotrailError> {
    let marker = marker.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT device_id, COUNT(*) FROM device_log
                 WHERE instr(message, ?1) > 0
                 GROUP BY device_id",
            )?;
            let rows = stmt.query_map(params![marker], |row| {
                Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?))
            })?;
            let mut counts = HashMap::new();
            for row in rows {
                let (device_id, count) = row?;
                counts.insert(device_id, count.max(0) as u64);
            }
            Ok(counts)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// The newest `limit` marked records across all devices, newest first.
pub async fn recent_marked(
    db: &Database,
    marker: &str,
    limit: usize,
) -> Result<Vec<RecentLogEntry>, GeotrailError> {
    let marker = marker.to_string();
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT d.number, d.description, l.created_at_ms, l.message
                 FROM device_log l JOIN devices d ON d.id = l.device_id
                 WHERE instr(l.message, ?1) > 0
                 ORDER BY l.created_at_ms DESC, l.id DESC
                 LIMIT ?2",
            )?;
            let rows = stmt.query_map(params![marker, limit], recent_entry_from_row)?;
            let mut entries = Vec::new();
            for row in rows {
                entries.extend(row?);
            }
            Ok(entries)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Append one event and return its id.
pub async fn append(
    db: &Database,
    device_id: i64,
    created_at: DateTime<Utc>,
    message: &str,
) -> Result<i64, GeotrailError> {
    let message = message.to_string();
    let created_at_ms = created_at.timestamp_millis();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO device_log (device_id, created_at_ms, message) VALUES (?1, ?2, ?3)",
                params![device_id, created_at_ms, message],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::devices::insert_device;
    use chrono::{Duration, TimeZone};

    const MARKER: &str = "GPS location update";

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_767_225_600 + secs, 0).unwrap()
    }

    #[tokio::test]
    async fn marked_since_filters_marker_window_and_orders_ascending() {
        let db = Database::open(":memory:", false).await.unwrap();
        let id = insert_device(&db, "D1", None, None, Some("{}")).await.unwrap();
        let other = insert_device(&db, "D2", None, None, Some("{}")).await.unwrap();

        append(&db, id, at(30), "GPS location update lat=2, lon=2").await.unwrap();
        append(&db, id, at(10), "GPS location update lat=1, lon=1").await.unwrap();
        append(&db, id, at(20), "battery low").await.unwrap();
        append(&db, id, at(0), "GPS location update lat=0.5, lon=0.5").await.unwrap();
        append(&db, id, at(40), "gps location update lat=3, lon=3").await.unwrap();
        append(&db, other, at(15), "GPS location update lat=9, lon=9").await.unwrap();

        let records = marked_since(&db, id, MARKER, at(0)).await.unwrap();
        let messages: Vec<&str> = records.iter().map(|r| r.message.as_str()).collect();
        assert_eq!(
            messages,
            vec![
                "GPS location update lat=1, lon=1",
                "GPS location update lat=2, lon=2"
            ]
        );
        assert_eq!(records[0].created_at, at(10));
    }

    async fn append_raw(db: &Database, device_id: i64, created_at_ms: i64, message: &'static [u8]) {
        db.connection()
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO device_log (device_id, created_at_ms, message)
                     VALUES (?1, ?2, CAST(?3 AS TEXT))",
                    params![device_id, created_at_ms, message],
                )
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn undecodable_records_are_dropped_not_fatal() {
        let db = Database::open(":memory:", false).await.unwrap();
        let id = insert_device(&db, "D1", None, None, Some("{}")).await.unwrap();
        append(&db, id, at(10), "GPS location update lat=1, lon=1").await.unwrap();
        append_raw(&db, id, at(20).timestamp_millis(), b"GPS location update lat=2, lon=2 \xff").await;
        append_raw(&db, id, i64::MAX, b"GPS location update lat=3, lon=3").await;

        let records = marked_since(&db, id, MARKER, at(0)).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].message, "GPS location update lat=1, lon=1");

        let recent = recent_marked(&db, MARKER, 10).await.unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].time, at(10));
    }

    #[tokio::test]
    async fn marked_counts_groups_by_device() {
        let db = Database::open(":memory:", false).await.unwrap();
        let a = insert_device(&db, "A", None, None, Some("{}")).await.unwrap();
        let b = insert_device(&db, "B", None, None, Some("{}")).await.unwrap();
        let c = insert_device(&db, "C", None, None, Some("{}")).await.unwrap();
        for i in 0..3 {
            append(&db, a, at(i), "GPS location update lat=1, lon=1").await.unwrap();
        }
        append(&db, b, at(0), "GPS location update lat=1, lon=1").await.unwrap();
        append(&db, c, at(0), "ignition on").await.unwrap();

        let counts = marked_counts(&db, MARKER).await.unwrap();
        assert_eq!(counts.get(&a), Some(&3));
        assert_eq!(counts.get(&b), Some(&1));
        assert_eq!(counts.get(&c), None);
    }

    #[tokio::test]
    async fn recent_marked_is_newest_first_and_limited() {
        let db = Database::open(":memory:", false).await.unwrap();
        let a = insert_device(&db, "A", Some("Van"), None, Some("{}")).await.unwrap();
        let start = at(0);
        for i in 0..12 {
            append(
                &db,
                a,
                start + Duration::seconds(i),
                &format!("GPS location update lat={i}.5, lon=1"),
            )
            .await
            .unwrap();
        }

        let recent = recent_marked(&db, MARKER, 10).await.unwrap();
        assert_eq!(recent.len(), 10);
        assert_eq!(recent[0].time, start + Duration::seconds(11));
        assert_eq!(recent[0].number, "A");
        assert_eq!(recent[0].description.as_deref(), Some("Van"));
        assert!(recent.windows(2).all(|w| w[0].time >= w[1].time));
    }
}
