// SPDX-FileCopyrightText: 2026 Geotrail Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The three evidence sources a device's track can be rebuilt from.
//!
//! Each source turns its raw store rows into [`LocationPoint`]s tagged with
//! its own [`Origin`]. Rows that do not yield a valid coordinate are dropped
//! here and never reach the caller.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::debug;

use geotrail_core::{
    Coordinate, Device, EventLog, GeotrailError, LiveLocation, LocationPoint, Origin,
    SnapshotStore,
};

use crate::extractor::CoordinateParser;

/// Something that can produce located points for a device.
#[async_trait]
pub trait EvidenceSource: Send + Sync {
    /// Provenance stamped on every point this source returns.
    fn origin(&self) -> Origin;

    /// Points for `device` observed after `since`, ascending by time.
    ///
    /// `now` is the reference time of the request.
    async fn fetch(
        &self,
        device: &Device,
        since: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<Vec<LocationPoint>, GeotrailError>;
}

/// Location-update records from the device event log.
pub struct EventLogSource {
    log: Arc<dyn EventLog>,
    marker: String,
    parser: Arc<dyn CoordinateParser>,
}

impl EventLogSource {
    pub fn new(
        log: Arc<dyn EventLog>,
        marker: impl Into<String>,
        parser: Arc<dyn CoordinateParser>,
    ) -> Self {
        Self {
            log,
            marker: marker.into(),
            parser,
        }
    }
}

#[async_trait]
impl EvidenceSource for EventLogSource {
    fn origin(&self) -> Origin {
        Origin::Logged
    }

    async fn fetch(
        &self,
        device: &Device,
        since: DateTime<Utc>,
        _now: DateTime<Utc>,
    ) -> Result<Vec<LocationPoint>, GeotrailError> {
        let records = self.log.marked_records(device.id, &self.marker, since).await?;
        let total = records.len();

        let points: Vec<LocationPoint> = records
            .into_iter()
            .filter_map(|record| {
                let (lat, lon) = self.parser.extract(&record.message)?;
                let coordinate = Coordinate::new(lat, lon)?;
                Some(LocationPoint::new(coordinate, record.created_at, Origin::Logged))
            })
            .collect();

        if points.len() < total {
            debug!(
                device = %device.number,
                parser = self.parser.version(),
                dropped = total - points.len(),
                "log records without a usable coordinate"
            );
        }
        Ok(points)
    }
}

/// Rows previously written by the snapshot task.
pub struct BackupHistorySource {
    store: Arc<dyn SnapshotStore>,
}

impl BackupHistorySource {
    pub fn new(store: Arc<dyn SnapshotStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl EvidenceSource for BackupHistorySource {
    fn origin(&self) -> Origin {
        Origin::Backup
    }

    async fn fetch(
        &self,
        device: &Device,
        since: DateTime<Utc>,
        _now: DateTime<Utc>,
    ) -> Result<Vec<LocationPoint>, GeotrailError> {
        let rows = self.store.snapshots_since(device.id, since).await?;
        Ok(rows
            .into_iter()
            .filter_map(|row| {
                let coordinate = Coordinate::new(row.lat, row.lon)?;
                Some(LocationPoint::new(coordinate, row.recorded_at, Origin::Backup))
            })
            .collect())
    }
}

/// The device's current position. Ignores the window: it describes "now".
#[derive(Debug, Default)]
pub struct LiveSnapshotSource;

impl LiveSnapshotSource {
    /// The current point for `device`, if it has a fix.
    pub fn current_point(device: &Device, now: DateTime<Utc>) -> Option<LocationPoint> {
        match &device.location {
            LiveLocation::Fix {
                coordinate,
                observed_at,
            } => Some(LocationPoint::new(
                *coordinate,
                observed_at.unwrap_or(now),
                Origin::Current,
            )),
            _ => None,
        }
    }
}

#[async_trait]
impl EvidenceSource for LiveSnapshotSource {
    fn origin(&self) -> Origin {
        Origin::Current
    }

    async fn fetch(
        &self,
        device: &Device,
        _since: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<Vec<LocationPoint>, GeotrailError> {
        Ok(Self::current_point(device, now).into_iter().collect())
    }
}
