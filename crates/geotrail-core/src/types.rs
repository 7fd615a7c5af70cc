// SPDX-FileCopyrightText: 2026 Geotrail Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared by the stores, the history engine, and the gateway.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Health status reported by store health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Store is fully operational.
    Healthy,
    /// Store is operational but experiencing issues.
    Degraded(String),
    /// Store is not operational.
    Unhealthy(String),
}

/// A latitude/longitude pair that represents a real fix.
///
/// Zero on either axis is the sensor convention for "no signal" and is never
/// a valid coordinate, nor is any non-finite value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    /// Builds a coordinate, returning `None` when the pair is not a fix.
    pub fn new(lat: f64, lon: f64) -> Option<Self> {
        if !lat.is_finite() || !lon.is_finite() || lat == 0.0 || lon == 0.0 {
            return None;
        }
        Some(Self { lat, lon })
    }

    /// Builds a coordinate from optional axes, as read from loosely typed input.
    pub fn from_parts(lat: Option<f64>, lon: Option<f64>) -> Option<Self> {
        Self::new(lat?, lon?)
    }
}

/// Provenance of a [`LocationPoint`]: which evidence source produced it.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    /// Parsed from a location-update record in the device event log.
    Logged,
    /// Read back from the snapshot backup table.
    Backup,
    /// The device's current position from the inventory.
    Current,
}

/// One positioned, timestamped point in a device's track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationPoint {
    pub lat: f64,
    pub lon: f64,
    pub time: DateTime<Utc>,
    #[serde(rename = "type")]
    pub origin: Origin,
}

impl LocationPoint {
    pub fn new(coordinate: Coordinate, time: DateTime<Utc>, origin: Origin) -> Self {
        Self {
            lat: coordinate.lat,
            lon: coordinate.lon,
            time,
            origin,
        }
    }
}

/// Ordered, single-provenance sequence of points for one device.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Timeline {
    points: Vec<LocationPoint>,
}

impl Timeline {
    /// A timeline with no evidence. A valid outcome, not an error.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds a timeline from the points of one source, ordered ascending by time.
    ///
    /// The sort is stable, so points sharing a timestamp keep source order.
    pub fn from_points(mut points: Vec<LocationPoint>) -> Self {
        points.sort_by_key(|p| p.time);
        Self { points }
    }

    pub fn points(&self) -> &[LocationPoint] {
        &self.points
    }

    pub fn into_points(self) -> Vec<LocationPoint> {
        self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// The provenance shared by every point, or `None` for an empty timeline.
    pub fn origin(&self) -> Option<Origin> {
        self.points.first().map(|p| p.origin)
    }
}

/// The current-position field of a device, decoded once at the inventory boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum LiveLocation {
    /// No `info` blob, or it carries no location.
    Absent,
    /// A location is present but its coordinate is null, zero, or non-numeric.
    NoFix,
    /// A usable current position.
    Fix {
        coordinate: Coordinate,
        /// Device-reported observation time; `None` means "now" to readers.
        observed_at: Option<DateTime<Utc>>,
    },
    /// The `info` blob could not be decoded at all.
    Malformed(String),
}

impl LiveLocation {
    pub fn coordinate(&self) -> Option<Coordinate> {
        match self {
            LiveLocation::Fix { coordinate, .. } => Some(*coordinate),
            _ => None,
        }
    }
}

/// A device as known to the inventory.
#[derive(Debug, Clone, PartialEq)]
pub struct Device {
    /// Internal identity used by the event log and the backup table.
    pub id: i64,
    /// Stable external identifier.
    pub number: String,
    pub description: Option<String>,
    pub imei: Option<String>,
    pub location: LiveLocation,
}

/// One free-text record from the device event log.
#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
    pub device_id: i64,
    pub created_at: DateTime<Utc>,
    pub message: String,
}

/// A location-update log record joined with its device, for diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecentLogEntry {
    pub number: String,
    pub description: Option<String>,
    pub time: DateTime<Utc>,
    pub message: String,
}

/// A persisted, deduplicated observation of a device position.
#[derive(Debug, Clone, PartialEq)]
pub struct HistorySnapshot {
    pub device_id: i64,
    pub lat: f64,
    pub lon: f64,
    pub recorded_at: DateTime<Utc>,
    pub source: String,
}

impl HistorySnapshot {
    pub fn new(
        device_id: i64,
        coordinate: Coordinate,
        recorded_at: DateTime<Utc>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            device_id,
            lat: coordinate.lat,
            lon: coordinate.lon,
            recorded_at,
            source: source.into(),
        }
    }
}
