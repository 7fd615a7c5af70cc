// SPDX-FileCopyrightText: 2026 Geotrail Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Device inventory reads, plus the inserts used to seed an inventory.

use geotrail_core::GeotrailError;
use rusqlite::{OptionalExtension, Row, params};

use crate::database::Database;
use crate::models::{Device, decode_info_column};

const DEVICE_COLUMNS: &str = "id, number, description, imei, info";

// `info` is read raw so one undecodable blob marks only its own device.
fn device_from_row(row: &Row<'_>) -> rusqlite::Result<Device> {
    Ok(Device {
        id: row.get(0)?,
        number: row.get(1)?,
        description: row.get(2)?,
        imei: row.get(3)?,
        location: decode_info_column(row.get_ref(4)?),
    })
}

/// Look up a device by its external number.
pub async fn find_by_number(db: &Database, number: &str) -> Result<Option<Device>, GeotrailError> {
    let number = number.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!("SELECT {DEVICE_COLUMNS} FROM devices WHERE number = ?1"),
                params![number],
                device_from_row,
            )
            .optional()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Every device whose `info` is non-null, ordered by number.
pub async fn list_reporting(db: &Database) -> Result<Vec<Device>, GeotrailError> {
    db.connection()
        .call(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {DEVICE_COLUMNS} FROM devices WHERE info IS NOT NULL ORDER BY number"
            ))?;
            let rows = stmt.query_map([], device_from_row)?;
            rows.collect::<rusqlite::Result<Vec<_>>>()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Insert a device row and return its id.
pub async fn insert_device(
    db: &Database,
    number: &str,
    description: Option<&str>,
    imei: Option<&str>,
    info: Option<&str>,
) -> Result<i64, GeotrailError> {
    let number = number.to_string();
    let description = description.map(str::to_string);
    let imei = imei.map(str::to_string);
    let info = info.map(str::to_string);
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO devices (number, description, imei, info) VALUES (?1, ?2, ?3, ?4)",
                params![number, description, imei, info],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Replace a device's `info` blob.
pub async fn update_info(db: &Database, id: i64, info: Option<&str>) -> Result<(), GeotrailError> {
    let info = info.map(str::to_string);
    db.connection()
        .call(move |conn| {
            conn.execute("UPDATE devices SET info = ?1 WHERE id = ?2", params![info, id])?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}
