// SPDX-FileCopyrightText: 2026 Geotrail Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Time-windowed de-bounce for position snapshots.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use geotrail_core::{Coordinate, GeotrailError, HistorySnapshot, SnapshotStore};

/// Outcome of [`SnapshotDeduplicator::consider_snapshot`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapshotDecision {
    pub persisted: bool,
}

/// Persists a candidate position unless the same device already reported
/// exactly the same coordinates within the trailing window.
///
/// Equality is exact on both axes; this is a de-bounce, not a proximity test.
pub struct SnapshotDeduplicator {
    store: Arc<dyn SnapshotStore>,
    window: Duration,
    source_label: String,
}

impl SnapshotDeduplicator {
    pub fn new(
        store: Arc<dyn SnapshotStore>,
        window: Duration,
        source_label: impl Into<String>,
    ) -> Self {
        Self {
            store,
            window,
            source_label: source_label.into(),
        }
    }

    /// Decide whether to persist `(lat, lon)` for `device_id`, observed at `now`.
    ///
    /// Missing, zero, or non-finite axes are skipped silently. The only side
    /// effect is one inserted row when the result is `persisted: true`.
    pub async fn consider_snapshot(
        &self,
        device_id: i64,
        lat: Option<f64>,
        lon: Option<f64>,
        now: DateTime<Utc>,
    ) -> Result<SnapshotDecision, GeotrailError> {
        let Some(coordinate) = Coordinate::from_parts(lat, lon) else {
            return Ok(SnapshotDecision { persisted: false });
        };

        let snapshot = HistorySnapshot::new(device_id, coordinate, now, self.source_label.as_str());
        let window_start = now
            .checked_sub_signed(self.window)
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        let persisted = self.store.insert_unless_recent(&snapshot, window_start).await?;
        Ok(SnapshotDecision { persisted })
    }
}
