// SPDX-FileCopyrightText: 2026 Geotrail Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Location history engine for geotrail.
//!
//! Rebuilds a device's movement track from three independent evidence
//! sources (event log, snapshot backup, live position) under a strict
//! precedence policy, and periodically snapshots live positions into the
//! backup table with a time-windowed de-bounce.

pub mod dedup;
pub mod extractor;
pub mod reconstructor;
pub mod scheduler;
pub mod service;
pub mod sources;

pub use dedup::{SnapshotDecision, SnapshotDeduplicator};
pub use extractor::{CoordinateParser, LatLonText};
pub use reconstructor::{DeviceHistory, HistoryReconstructor};
pub use scheduler::{DeviceOutcome, PassReport, SnapshotScheduler};
pub use service::{CurrentLocation, DeviceHistoryView, DeviceListing, DeviceRef, LocationService};
pub use sources::{BackupHistorySource, EventLogSource, EvidenceSource, LiveSnapshotSource};
