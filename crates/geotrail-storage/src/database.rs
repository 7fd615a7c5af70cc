// SPDX-FileCopyrightText: 2026 Geotrail Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All statements are serialized through tokio-rusqlite's single background
//! thread. Do NOT create additional Connection instances for writes.

use std::path::Path;
use std::time::Duration;

use geotrail_core::GeotrailError;
use tracing::debug;

/// Handle to the geotrail SQLite database.
///
/// Query modules take `&Database` and run their statements through
/// [`Database::connection`].
pub struct Database {
    conn: tokio_rusqlite::Connection,
}

impl Database {
    /// Open (creating if needed) the database at `path`, apply connection
    /// pragmas, and run embedded migrations.
    ///
    /// `":memory:"` opens a private in-memory database.
    pub async fn open(path: &str, wal_mode: bool) -> Result<Self, GeotrailError> {
        let conn = if path == ":memory:" {
            tokio_rusqlite::Connection::open_in_memory()
                .await
                .map_err(GeotrailError::storage)?
        } else {
            if let Some(parent) = Path::new(path).parent()
                && !parent.as_os_str().is_empty()
            {
                std::fs::create_dir_all(parent).map_err(GeotrailError::storage)?;
            }
            tokio_rusqlite::Connection::open(path)
                .await
                .map_err(GeotrailError::storage)?
        };

        conn.call(move |conn| -> Result<(), rusqlite::Error> {
            conn.busy_timeout(Duration::from_secs(5))?;
            conn.pragma_update(None, "foreign_keys", "ON")?;
            if wal_mode {
                let mode: String =
                    conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
                conn.pragma_update(None, "synchronous", "NORMAL")?;
                debug!(journal_mode = %mode, "journal mode set");
            }
            Ok(())
        })
        .await
        .map_err(map_tr_err)?;

        conn.call(crate::migrations::run_migrations)
            .await
            .map_err(|e| match e {
                tokio_rusqlite::Error::Error(inner) => inner,
                other => GeotrailError::Internal(format!("migration call failed: {other}")),
            })?;

        debug!(path, "database opened");
        Ok(Self { conn })
    }

    /// The shared async connection.
    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }

    /// Checkpoint the WAL and close the connection.
    ///
    /// Statements issued afterwards fail with a storage error.
    pub async fn close(&self) -> Result<(), GeotrailError> {
        checkpoint(self).await?;
        self.conn.clone().close().await.map_err(GeotrailError::storage)
    }
}

/// Fold the WAL back into the main database file.
pub async fn checkpoint(db: &Database) -> Result<(), GeotrailError> {
    db.connection()
        .call(|conn| -> Result<(), rusqlite::Error> {
            conn.query_row("PRAGMA wal_checkpoint(TRUNCATE);", [], |_| Ok(()))?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Map a tokio-rusqlite call error to the crate error type.
pub fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> GeotrailError {
    GeotrailError::Storage {
        source: Box::new(e),
    }
}
