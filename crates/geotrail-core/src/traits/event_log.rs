// SPDX-FileCopyrightText: 2026 Geotrail Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Read-only view of the append-only device event log.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::GeotrailError;
use crate::types::{LogRecord, RecentLogEntry};

/// Append-only store of free-text device events.
///
/// Every query filters on a case-sensitive substring `marker` identifying
/// location-update events.
#[async_trait]
pub trait EventLog: Send + Sync {
    /// Records for `device_id` containing `marker`, created strictly after
    /// `since`, ascending by creation time.
    async fn marked_records(
        &self,
        device_id: i64,
        marker: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<LogRecord>, GeotrailError>;

    /// Number of records containing `marker`, per device id, over all time.
    async fn marked_counts(&self, marker: &str) -> Result<HashMap<i64, u64>, GeotrailError>;

    /// The newest `limit` records containing `marker` across all devices.
    async fn recent_marked(
        &self,
        marker: &str,
        limit: usize,
    ) -> Result<Vec<RecentLogEntry>, GeotrailError>;
}
