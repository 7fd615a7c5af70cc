// SPDX-FileCopyrightText: 2026 Geotrail Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Backup table of position snapshots.

use chrono::{DateTime, Utc};
use geotrail_core::GeotrailError;
use rusqlite::{TransactionBehavior, params};

use crate::database::Database;
use crate::models::{HistorySnapshot, format_timestamp, parse_timestamp};

/// Snapshots for one device recorded strictly after `since`, oldest first.
pub async fn snapshots_since(
    db: &Database,
    device_id: i64,
    since: DateTime<Utc>,
) -> Result<Vec<HistorySnapshot>, GeotrailError> {
    let since = format_timestamp(since);
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT device_id, lat, lon, recorded_at, source FROM location_history
                 WHERE device_id = ?1 AND recorded_at > ?2
                 ORDER BY recorded_at ASC, id ASC",
            )?;
            let rows = stmt.query_map(params![device_id, since], |row| {
                let recorded_at: String = row.get(3)?;
                Ok(HistorySnapshot {
                    device_id: row.get(0)?,
                    lat: row.get(1)?,
                    lon: row.get(2)?,
                    recorded_at: parse_timestamp(3, &recorded_at)?,
                    source: row.get(4)?,
                })
            })?;
            rows.collect::<rusqlite::Result<Vec<_>>>()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Insert `snapshot` unless the same device already has a row with exactly
/// the same coordinates recorded after `window_start`.
///
/// Check and insert share one IMMEDIATE transaction. Returns whether a row
/// was written.
pub async fn insert_unless_recent(
    db: &Database,
    snapshot: &HistorySnapshot,
    window_start: DateTime<Utc>,
) -> Result<bool, GeotrailError> {
    let snapshot = snapshot.clone();
    let window_start = format_timestamp(window_start);
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let duplicate: bool = tx.query_row(
                "SELECT EXISTS(
                     SELECT 1 FROM location_history
                     WHERE device_id = ?1 AND lat = ?2 AND lon = ?3 AND recorded_at > ?4
                 )",
                params![snapshot.device_id, snapshot.lat, snapshot.lon, window_start],
                |row| row.get(0),
            )?;
            if duplicate {
                return Ok(false);
            }
            insert_row(&tx, &snapshot)?;
            tx.commit()?;
            Ok(true)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Insert `snapshot` unconditionally. Used to seed history.
pub async fn insert(db: &Database, snapshot: &HistorySnapshot) -> Result<(), GeotrailError> {
    let snapshot = snapshot.clone();
    db.connection()
        .call(move |conn| insert_row(conn, &snapshot))
        .await
        .map_err(crate::database::map_tr_err)
}

fn insert_row(conn: &rusqlite::Connection, snapshot: &HistorySnapshot) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO location_history (device_id, lat, lon, recorded_at, source)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            snapshot.device_id,
            snapshot.lat,
            snapshot.lon,
            format_timestamp(snapshot.recorded_at),
            snapshot.source,
        ],
    )?;
    Ok(())
}

/// Total rows stored for one device.
pub async fn count_for_device(db: &Database, device_id: i64) -> Result<u64, GeotrailError> {
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT COUNT(*) FROM location_history WHERE device_id = ?1",
                params![device_id],
                |row| row.get::<_, i64>(0),
            )
        })
        .await
        .map(|n| n.max(0) as u64)
        .map_err(crate::database::map_tr_err)
}
