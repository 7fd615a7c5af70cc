// SPDX-FileCopyrightText: 2026 Geotrail Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Durable backup table of deduplicated position snapshots.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::GeotrailError;
use crate::types::HistorySnapshot;

/// Store of [`HistorySnapshot`] rows. Rows are never updated once inserted.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Snapshots for `device_id` recorded strictly after `since`, ascending.
    async fn snapshots_since(
        &self,
        device_id: i64,
        since: DateTime<Utc>,
    ) -> Result<Vec<HistorySnapshot>, GeotrailError>;

    /// Inserts `snapshot` unless a row for the same device with exactly the
    /// same `lat` and `lon` was recorded strictly after `window_start`.
    ///
    /// The check and the insert happen atomically. Returns whether a row
    /// was inserted.
    async fn insert_unless_recent(
        &self,
        snapshot: &HistorySnapshot,
        window_start: DateTime<Utc>,
    ) -> Result<bool, GeotrailError>;
}
