// SPDX-FileCopyrightText: 2026 Geotrail Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Read-side query surface consumed by the HTTP gateway.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use geotrail_config::model::HistoryConfig;
use geotrail_core::{
    EventLog, GeotrailError, Inventory, LiveLocation, LocationPoint, RecentLogEntry, SnapshotStore,
};

use crate::extractor::{CoordinateParser, LatLonText};
use crate::reconstructor::HistoryReconstructor;
use crate::sources::{BackupHistorySource, EventLogSource, EvidenceSource, LiveSnapshotSource};

const UNKNOWN_DEVICE: &str = "Unknown Device";

/// A device with a usable current position.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurrentLocation {
    pub id: i64,
    pub number: String,
    pub description: String,
    pub imei: Option<String>,
    pub lat: f64,
    pub lon: f64,
    pub time: DateTime<Utc>,
    pub status: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceRef {
    pub number: String,
    pub description: Option<String>,
}

/// Response body of a history query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceHistoryView {
    pub device: DeviceRef,
    pub history: Vec<LocationPoint>,
    pub total_points: usize,
}

/// One inventory entry annotated with how much log evidence exists for it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceListing {
    pub number: String,
    pub name: String,
    pub gps_count: u64,
}

/// Stateless query facade. Every call re-reads the store.
pub struct LocationService {
    inventory: Arc<dyn Inventory>,
    event_log: Arc<dyn EventLog>,
    reconstructor: HistoryReconstructor,
    marker: String,
    default_window_days: u32,
    max_window_days: u32,
}

impl LocationService {
    /// Wire the service over one store using the standard source precedence
    /// (event log, then backup history, then live position).
    pub fn new<S>(store: Arc<S>, config: &HistoryConfig) -> Self
    where
        S: Inventory + EventLog + SnapshotStore + 'static,
    {
        Self::with_parser(store, config, Arc::new(LatLonText))
    }

    /// Like [`new`](Self::new) with a different log-message coordinate parser.
    pub fn with_parser<S>(
        store: Arc<S>,
        config: &HistoryConfig,
        parser: Arc<dyn CoordinateParser>,
    ) -> Self
    where
        S: Inventory + EventLog + SnapshotStore + 'static,
    {
        let sources: Vec<Arc<dyn EvidenceSource>> = vec![
            Arc::new(EventLogSource::new(
                store.clone(),
                config.location_marker.clone(),
                parser,
            )),
            Arc::new(BackupHistorySource::new(store.clone())),
            Arc::new(LiveSnapshotSource),
        ];
        Self {
            inventory: store.clone(),
            event_log: store.clone(),
            reconstructor: HistoryReconstructor::new(store, sources),
            marker: config.location_marker.clone(),
            default_window_days: config.default_window_days,
            max_window_days: config.max_window_days,
        }
    }

    /// Resolve a caller-supplied window, falling back to the default.
    ///
    /// Returns `None` when the value is outside `1..=max_window_days`.
    pub fn window_days(&self, requested: Option<i64>) -> Option<u32> {
        match requested {
            None => Some(self.default_window_days),
            Some(days) => u32::try_from(days)
                .ok()
                .filter(|d| (1..=self.max_window_days).contains(d)),
        }
    }

    pub fn max_window_days(&self) -> u32 {
        self.max_window_days
    }

    /// One entry per reporting device that currently has a fix, by number.
    pub async fn list_current_locations(&self) -> Result<Vec<CurrentLocation>, GeotrailError> {
        let now = Utc::now();
        let devices = self.inventory.list_reporting_devices().await?;

        Ok(devices
            .into_iter()
            .filter_map(|device| {
                let LiveLocation::Fix {
                    coordinate,
                    observed_at,
                } = device.location
                else {
                    if let LiveLocation::Malformed(reason) = &device.location {
                        debug!(device = %device.number, reason = %reason, "skipping malformed info");
                    }
                    return None;
                };
                Some(CurrentLocation {
                    id: device.id,
                    number: device.number,
                    description: device
                        .description
                        .unwrap_or_else(|| UNKNOWN_DEVICE.to_string()),
                    imei: device.imei,
                    lat: coordinate.lat,
                    lon: coordinate.lon,
                    time: observed_at.unwrap_or(now),
                    status: "active",
                })
            })
            .collect())
    }

    /// Reconstructed track for `number` over `window_days`.
    pub async fn device_history(
        &self,
        number: &str,
        window_days: u32,
    ) -> Result<DeviceHistoryView, GeotrailError> {
        let history = self.reconstructor.get_history(number, window_days).await?;
        let points = history.timeline.into_points();
        Ok(DeviceHistoryView {
            device: DeviceRef {
                number: history.device.number,
                description: history.device.description,
            },
            total_points: points.len(),
            history: points,
        })
    }

    /// Every reporting device with its count of location-update log records.
    ///
    /// Sorted by description (devices without one last), then number.
    pub async fn list_devices(&self) -> Result<Vec<DeviceListing>, GeotrailError> {
        let devices = self.inventory.list_reporting_devices().await?;
        let counts = self.event_log.marked_counts(&self.marker).await?;

        let mut rows: Vec<_> = devices
            .into_iter()
            .map(|device| {
                let gps_count = counts.get(&device.id).copied().unwrap_or(0);
                (device.description, device.number, gps_count)
            })
            .collect();
        rows.sort_by(|a, b| {
            (a.0.is_none(), &a.0, &a.1).cmp(&(b.0.is_none(), &b.0, &b.1))
        });

        Ok(rows
            .into_iter()
            .map(|(description, number, gps_count)| DeviceListing {
                name: display_name(description.as_deref(), &number, gps_count),
                number,
                gps_count,
            })
            .collect())
    }

    /// The newest `limit` location-update log records, for diagnostics.
    pub async fn recent_location_logs(
        &self,
        limit: usize,
    ) -> Result<Vec<RecentLogEntry>, GeotrailError> {
        self.event_log.recent_marked(&self.marker, limit).await
    }
}

fn display_name(description: Option<&str>, number: &str, gps_count: u64) -> String {
    let base = description.unwrap_or(number);
    if gps_count > 0 {
        format!("{base} ({gps_count} GPS updates)")
    } else {
        format!("{base} (No GPS history)")
    }
}
