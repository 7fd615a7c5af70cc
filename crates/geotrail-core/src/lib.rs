// SPDX-FileCopyrightText: 2026 Geotrail Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for geotrail.
//!
//! This crate provides the error taxonomy, the domain types, and the store
//! traits used throughout the workspace. Store backends implement the traits
//! defined here; the history engine only ever sees them as trait objects.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::GeotrailError;
pub use types::{
    Coordinate, Device, HealthStatus, HistorySnapshot, LiveLocation, LocationPoint, LogRecord,
    Origin, RecentLogEntry, Timeline,
};

pub use traits::{EventLog, Inventory, SnapshotStore, StoreAdapter};

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn geotrail_error_classification() {
        let storage = GeotrailError::storage(std::io::Error::other("test"));
        let not_found = GeotrailError::DeviceNotFound {
            number: "D1".into(),
        };
        let malformed = GeotrailError::MalformedEvidence {
            device: "D1".into(),
            reason: "bad json".into(),
        };
        let internal = GeotrailError::Internal("test".into());

        assert!(not_found.is_not_found());
        assert!(!not_found.is_store_unavailable());
        assert!(storage.is_store_unavailable());
        assert!(!malformed.is_store_unavailable());
        assert!(!internal.is_not_found());
        assert_eq!(
            malformed.to_string(),
            "malformed evidence for device D1: bad json"
        );
    }

    #[test]
    fn coordinate_rejects_zero_and_non_finite() {
        assert!(Coordinate::new(12.34, 56.78).is_some());
        assert!(Coordinate::new(-33.9, -70.1).is_some());
        assert!(Coordinate::new(0.0, 56.78).is_none());
        assert!(Coordinate::new(12.34, 0.0).is_none());
        assert!(Coordinate::new(0.0, 0.0).is_none());
        assert!(Coordinate::new(f64::NAN, 1.0).is_none());
        assert!(Coordinate::new(1.0, f64::INFINITY).is_none());
        assert!(Coordinate::from_parts(None, Some(1.0)).is_none());
        assert!(Coordinate::from_parts(Some(1.0), Some(2.0)).is_some());
    }

    #[test]
    fn origin_display_and_parse_round_trip() {
        use std::str::FromStr;

        for origin in [Origin::Logged, Origin::Backup, Origin::Current] {
            let s = origin.to_string();
            assert_eq!(Origin::from_str(&s).unwrap(), origin);
        }
        assert_eq!(Origin::Logged.to_string(), "logged");
    }

    #[test]
    fn location_point_serializes_origin_as_type() {
        let time = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let point = LocationPoint::new(
            Coordinate::new(12.34, 56.78).unwrap(),
            time,
            Origin::Backup,
        );
        let json = serde_json::to_value(&point).unwrap();
        assert_eq!(json["type"], "backup");
        assert_eq!(json["lat"], 12.34);
        assert_eq!(json["lon"], 56.78);
        assert!(json.get("origin").is_none());
    }

    #[test]
    fn timeline_orders_points_by_time() {
        let coord = Coordinate::new(1.0, 1.0).unwrap();
        let t1 = Utc.timestamp_millis_opt(100).unwrap();
        let t2 = Utc.timestamp_millis_opt(200).unwrap();
        let timeline = Timeline::from_points(vec![
            LocationPoint::new(coord, t2, Origin::Logged),
            LocationPoint::new(coord, t1, Origin::Logged),
        ]);
        assert_eq!(timeline.len(), 2);
        assert_eq!(timeline.points()[0].time, t1);
        assert_eq!(timeline.origin(), Some(Origin::Logged));
    }

    #[test]
    fn empty_timeline_has_no_origin() {
        let timeline = Timeline::empty();
        assert!(timeline.is_empty());
        assert_eq!(timeline.origin(), None);
    }

    #[test]
    fn live_location_exposes_coordinate_only_for_fix() {
        let coordinate = Coordinate::new(5.0, 6.0).unwrap();
        let fix = LiveLocation::Fix {
            coordinate,
            observed_at: None,
        };
        assert_eq!(fix.coordinate(), Some(coordinate));
        assert_eq!(LiveLocation::NoFix.coordinate(), None);
        assert_eq!(LiveLocation::Absent.coordinate(), None);
        assert_eq!(LiveLocation::Malformed("x".into()).coordinate(), None);
    }

    #[test]
    fn all_store_traits_are_exported() {
        fn _assert_store_adapter<T: StoreAdapter>() {}
        fn _assert_inventory<T: Inventory>() {}
        fn _assert_event_log<T: EventLog>() {}
        fn _assert_snapshot_store<T: SnapshotStore>() {}
    }
}
