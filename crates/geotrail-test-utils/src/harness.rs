// SPDX-FileCopyrightText: 2026 Geotrail Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness backed by a temp-file SQLite store.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use geotrail_config::model::{GeotrailConfig, HistoryConfig, SnapshotConfig, StorageConfig};
use geotrail_core::{Coordinate, Device, GeotrailError, HistorySnapshot, StoreAdapter};
use geotrail_storage::{Database, SqliteStore, queries};

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    history: HistoryConfig,
    snapshot: SnapshotConfig,
    wal_mode: bool,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            history: HistoryConfig::default(),
            snapshot: SnapshotConfig::default(),
            wal_mode: true,
        }
    }

    /// Override the history query settings.
    pub fn with_history(mut self, history: HistoryConfig) -> Self {
        self.history = history;
        self
    }

    /// Override the snapshot job settings.
    pub fn with_snapshot(mut self, snapshot: SnapshotConfig) -> Self {
        self.snapshot = snapshot;
        self
    }

    /// Open the database with the rollback journal instead of WAL.
    pub fn without_wal(mut self) -> Self {
        self.wal_mode = false;
        self
    }

    /// Create the temp directory and open an initialized store in it.
    pub async fn build(self) -> Result<TestHarness, GeotrailError> {
        let temp_dir = tempfile::TempDir::new().map_err(GeotrailError::storage)?;
        let db_path = temp_dir.path().join("test.db");

        let storage = StorageConfig {
            database_path: db_path.to_string_lossy().to_string(),
            wal_mode: self.wal_mode,
        };
        let store = SqliteStore::new(storage.clone());
        store.initialize().await?;

        let config = GeotrailConfig {
            storage,
            history: self.history,
            snapshot: self.snapshot,
            ..GeotrailConfig::default()
        };

        Ok(TestHarness {
            store: Arc::new(store),
            config,
            _temp_dir: temp_dir,
        })
    }
}

/// A ready-to-use store plus the configuration it was built with.
///
/// The temp directory lives as long as the harness.
pub struct TestHarness {
    store: Arc<SqliteStore>,
    pub config: GeotrailConfig,
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Shared handle to the store; coerces to any of the store traits.
    pub fn store(&self) -> Arc<SqliteStore> {
        self.store.clone()
    }

    fn db(&self) -> Result<&Database, GeotrailError> {
        self.store.database()
    }

    /// Insert a device and return it as the inventory reads it back.
    ///
    /// `info` is the raw JSON blob; `None` marks a device that never reported.
    pub async fn add_device(
        &self,
        number: &str,
        description: Option<&str>,
        info: Option<&str>,
    ) -> Result<Device, GeotrailError> {
        let db = self.db()?;
        queries::devices::insert_device(db, number, description, None, info).await?;
        queries::devices::find_by_number(db, number)
            .await?
            .ok_or_else(|| GeotrailError::DeviceNotFound {
                number: number.to_string(),
            })
    }

    /// Replace a device's live `info` blob.
    pub async fn set_info(&self, device: &Device, info: Option<&str>) -> Result<(), GeotrailError> {
        queries::devices::update_info(self.db()?, device.id, info).await
    }

    /// Append an event-log line for `device`.
    pub async fn add_log(
        &self,
        device: &Device,
        at: DateTime<Utc>,
        message: &str,
    ) -> Result<i64, GeotrailError> {
        queries::device_log::append(self.db()?, device.id, at, message).await
    }

    /// Store a backup snapshot unconditionally, bypassing de-duplication.
    pub async fn add_snapshot(
        &self,
        device: &Device,
        lat: f64,
        lon: f64,
        at: DateTime<Utc>,
    ) -> Result<(), GeotrailError> {
        let coordinate = Coordinate::new(lat, lon)
            .ok_or_else(|| GeotrailError::Internal(format!("invalid seed coordinate {lat},{lon}")))?;
        let label = self.config.snapshot.source_label.as_str();
        let snapshot = HistorySnapshot::new(device.id, coordinate, at, label);
        queries::location_history::insert(self.db()?, &snapshot).await
    }

    /// Run raw SQL against the store, for rows the typed helpers cannot
    /// express (e.g. text that is not valid UTF-8).
    pub async fn execute_sql(&self, sql: &str) -> Result<(), GeotrailError> {
        let sql = sql.to_string();
        self.db()?
            .connection()
            .call(move |conn| conn.execute_batch(&sql))
            .await
            .map_err(geotrail_storage::database::map_tr_err)
    }

    pub async fn snapshot_count(&self, device_id: i64) -> Result<u64, GeotrailError> {
        queries::location_history::count_for_device(self.db()?, device_id).await
    }

    /// Every snapshot stored for `device_id`, oldest first.
    pub async fn snapshots(&self, device_id: i64) -> Result<Vec<HistorySnapshot>, GeotrailError> {
        queries::location_history::snapshots_since(
            self.db()?,
            device_id,
            DateTime::<Utc>::MIN_UTC,
        )
        .await
    }
}
