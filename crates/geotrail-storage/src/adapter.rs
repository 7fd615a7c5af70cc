// SPDX-FileCopyrightText: 2026 Geotrail Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the store traits.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::OnceCell;
use tracing::debug;

use geotrail_config::model::StorageConfig;
use geotrail_core::types::{Device, HistorySnapshot, LogRecord, RecentLogEntry};
use geotrail_core::{EventLog, GeotrailError, HealthStatus, Inventory, SnapshotStore, StoreAdapter};

use crate::database::Database;
use crate::queries;

/// SQLite-backed store serving the inventory, the event log, and the
/// snapshot backup table from one database file.
///
/// The database is opened on the first call to [`StoreAdapter::initialize`].
pub struct SqliteStore {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteStore {
    /// Create a store for the configured path without opening it.
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    /// The underlying database, or an error if [`initialize`](StoreAdapter::initialize)
    /// has not run yet.
    pub fn database(&self) -> Result<&Database, GeotrailError> {
        self.db.get().ok_or_else(|| GeotrailError::Storage {
            source: "store not initialized -- call initialize() first".into(),
        })
    }
}

#[async_trait]
impl StoreAdapter for SqliteStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn initialize(&self) -> Result<(), GeotrailError> {
        let db = Database::open(&self.config.database_path, self.config.wal_mode).await?;
        self.db.set(db).map_err(|_| GeotrailError::Storage {
            source: "store already initialized".into(),
        })?;
        debug!(path = %self.config.database_path, "SQLite store initialized");
        Ok(())
    }

    async fn health_check(&self) -> Result<HealthStatus, GeotrailError> {
        let Some(db) = self.db.get() else {
            return Ok(HealthStatus::Unhealthy("store not initialized".to_string()));
        };
        let ping = db
            .connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.query_row("SELECT 1", [], |_| Ok(()))
            })
            .await;
        Ok(match ping {
            Ok(()) => HealthStatus::Healthy,
            Err(e) => HealthStatus::Unhealthy(e.to_string()),
        })
    }

    async fn close(&self) -> Result<(), GeotrailError> {
        if let Some(db) = self.db.get() {
            db.close().await?;
            debug!("SQLite store closed");
        }
        Ok(())
    }
}

#[async_trait]
impl Inventory for SqliteStore {
    async fn find_device(&self, number: &str) -> Result<Option<Device>, GeotrailError> {
        queries::devices::find_by_number(self.database()?, number).await
    }

    async fn list_reporting_devices(&self) -> Result<Vec<Device>, GeotrailError> {
        queries::devices::list_reporting(self.database()?).await
    }
}

#[async_trait]
impl EventLog for SqliteStore {
    async fn marked_records(
        &self,
        device_id: i64,
        marker: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<LogRecord>, GeotrailError> {
        queries::device_log::marked_since(self.database()?, device_id, marker, since).await
    }

    async fn marked_counts(&self, marker: &str) -> Result<HashMap<i64, u64>, GeotrailError> {
        queries::device_log::marked_counts(self.database()?, marker).await
    }

    async fn recent_marked(
        &self,
        marker: &str,
        limit: usize,
    ) -> Result<Vec<RecentLogEntry>, GeotrailError> {
        queries::device_log::recent_marked(self.database()?, marker, limit).await
    }
}

#[async_trait]
impl SnapshotStore for SqliteStore {
    async fn snapshots_since(
        &self,
        device_id: i64,
        since: DateTime<Utc>,
    ) -> Result<Vec<HistorySnapshot>, GeotrailError> {
        queries::location_history::snapshots_since(self.database()?, device_id, since).await
    }

    async fn insert_unless_recent(
        &self,
        snapshot: &HistorySnapshot,
        window_start: DateTime<Utc>,
    ) -> Result<bool, GeotrailError> {
        queries::location_history::insert_unless_recent(self.database()?, snapshot, window_start)
            .await
    }
}
