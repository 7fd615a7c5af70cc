// SPDX-FileCopyrightText: 2026 Geotrail Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Periodic snapshot of every device's current position into the backup table.
//!
//! One pass walks the whole reporting inventory. Each device yields a tagged
//! [`DeviceOutcome`]; a failing device is logged and the pass moves on.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use geotrail_config::model::SnapshotConfig;
use geotrail_core::{Device, GeotrailError, Inventory, LiveLocation, SnapshotStore};

use crate::dedup::SnapshotDeduplicator;

/// What happened to one device during a pass.
#[derive(Debug)]
pub enum DeviceOutcome {
    /// A new backup row was written.
    Persisted,
    /// The same position was already recorded inside the de-bounce window.
    Duplicate,
    /// No usable current position.
    NoFix,
    /// The device's info could not be decoded; always
    /// [`GeotrailError::MalformedEvidence`].
    Malformed(GeotrailError),
    /// The store rejected the write.
    Failed(GeotrailError),
}

/// Aggregate counts for one pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassReport {
    pub examined: usize,
    pub persisted: usize,
    /// Duplicates and devices without a fix.
    pub skipped: usize,
    pub failed: usize,
}

impl PassReport {
    fn record(&mut self, outcome: &DeviceOutcome) {
        self.examined += 1;
        match outcome {
            DeviceOutcome::Persisted => self.persisted += 1,
            DeviceOutcome::Duplicate | DeviceOutcome::NoFix => self.skipped += 1,
            DeviceOutcome::Malformed(_) | DeviceOutcome::Failed(_) => self.failed += 1,
        }
    }
}

/// Drives [`SnapshotDeduplicator`] across the inventory on a fixed cadence.
pub struct SnapshotScheduler {
    inventory: Arc<dyn Inventory>,
    dedup: SnapshotDeduplicator,
    interval: Duration,
}

impl SnapshotScheduler {
    pub fn new(
        inventory: Arc<dyn Inventory>,
        dedup: SnapshotDeduplicator,
        interval: Duration,
    ) -> Self {
        Self {
            inventory,
            dedup,
            interval,
        }
    }

    /// Build a scheduler over one store from the `[snapshot]` config section.
    pub fn from_config<S>(store: Arc<S>, config: &SnapshotConfig) -> Self
    where
        S: Inventory + SnapshotStore + 'static,
    {
        let window = i64::try_from(config.dedup_window_secs)
            .ok()
            .and_then(chrono::TimeDelta::try_seconds)
            .unwrap_or(chrono::TimeDelta::MAX);
        let dedup = SnapshotDeduplicator::new(store.clone(), window, config.source_label.clone());
        Self::new(store, dedup, Duration::from_secs(config.interval_secs))
    }

    /// Run one pass over every reporting device, stamping snapshots with `now`.
    ///
    /// Only a failure to list the inventory is returned as an error.
    pub async fn run_pass(&self, now: DateTime<Utc>) -> Result<PassReport, GeotrailError> {
        let devices = self.inventory.list_reporting_devices().await?;
        let mut report = PassReport::default();

        for device in &devices {
            let outcome = self.snapshot_device(device, now).await;
            match &outcome {
                DeviceOutcome::Malformed(e) => {
                    warn!(device = %device.number, error = %e, "skipping device with malformed info");
                }
                DeviceOutcome::Failed(e) => {
                    warn!(device = %device.number, error = %e, "failed to snapshot device");
                }
                other => debug!(device = %device.number, outcome = ?other, "device snapshot"),
            }
            report.record(&outcome);
        }

        Ok(report)
    }

    async fn snapshot_device(&self, device: &Device, now: DateTime<Utc>) -> DeviceOutcome {
        let coordinate = match &device.location {
            LiveLocation::Fix { coordinate, .. } => *coordinate,
            LiveLocation::Malformed(reason) => {
                return DeviceOutcome::Malformed(GeotrailError::MalformedEvidence {
                    device: device.number.clone(),
                    reason: reason.clone(),
                });
            }
            LiveLocation::Absent | LiveLocation::NoFix => return DeviceOutcome::NoFix,
        };

        match self
            .dedup
            .consider_snapshot(device.id, Some(coordinate.lat), Some(coordinate.lon), now)
            .await
        {
            Ok(decision) if decision.persisted => DeviceOutcome::Persisted,
            Ok(_) => DeviceOutcome::Duplicate,
            Err(e) => DeviceOutcome::Failed(e),
        }
    }

    /// Run passes until `cancel` fires, sleeping `interval` after each one.
    ///
    /// The first pass starts immediately. Passes never overlap, and a failed
    /// pass is not retried before the next scheduled one.
    pub async fn run(&self, cancel: CancellationToken) {
        info!(interval_secs = self.interval.as_secs(), "snapshot task started");

        loop {
            match self.run_pass(Utc::now()).await {
                Ok(report) => info!(
                    examined = report.examined,
                    persisted = report.persisted,
                    skipped = report.skipped,
                    failed = report.failed,
                    "Saved {} new device locations",
                    report.persisted
                ),
                Err(e) => warn!(error = %e, "snapshot pass failed (non-fatal)"),
            }

            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                _ = cancel.cancelled() => {
                    info!("snapshot task shutting down");
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use geotrail_test_utils::TestHarness;
    use tracing_test::traced_test;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 4, 2, 16, 30, 0).unwrap()
    }

    fn scheduler(harness: &TestHarness, interval: Duration) -> SnapshotScheduler {
        let store = harness.store();
        let dedup =
            SnapshotDeduplicator::new(store.clone(), chrono::Duration::minutes(10), "auto-save");
        SnapshotScheduler::new(store, dedup, interval)
    }

    #[tokio::test]
    async fn from_config_uses_configured_label() {
        let config = SnapshotConfig {
            source_label: "cron".to_string(),
            ..SnapshotConfig::default()
        };
        let harness = TestHarness::builder().with_snapshot(config).build().await.unwrap();
        let device = harness
            .add_device("A", None, Some(r#"{"location": {"lat": 1.5, "lon": 2.5}}"#))
            .await
            .unwrap();

        let sched = SnapshotScheduler::from_config(harness.store(), &harness.config.snapshot);
        assert_eq!(sched.interval, Duration::from_secs(300));
        sched.run_pass(now()).await.unwrap();
        assert_eq!(harness.snapshots(device.id).await.unwrap()[0].source, "cron");
    }

    #[tokio::test]
    async fn pass_persists_fixes_and_skips_the_rest() {
        let harness = TestHarness::builder().build().await.unwrap();
        let a = harness
            .add_device("A", None, Some(r#"{"location": {"lat": 1.5, "lon": 2.5}}"#))
            .await
            .unwrap();
        harness
            .add_device("B", None, Some(r#"{"location": {"lat": 0, "lon": 0}}"#))
            .await
            .unwrap();
        harness.add_device("C", None, Some("{broken")).await.unwrap();
        let d = harness
            .add_device("D", None, Some(r#"{"location": {"lat": "3.5", "lon": "4.5"}}"#))
            .await
            .unwrap();
        // No info: not part of the reporting inventory.
        harness.add_device("E", None, None).await.unwrap();

        let sched = scheduler(&harness, Duration::from_secs(300));
        let report = sched.run_pass(now()).await.unwrap();
        assert_eq!(
            report,
            PassReport {
                examined: 4,
                persisted: 2,
                skipped: 1,
                failed: 1,
            }
        );
        assert_eq!(harness.snapshot_count(a.id).await.unwrap(), 1);
        assert_eq!(harness.snapshot_count(d.id).await.unwrap(), 1);

        // A second pass moments later is fully de-bounced.
        let again = sched.run_pass(now() + chrono::Duration::minutes(5)).await.unwrap();
        assert_eq!(again.persisted, 0);
        assert_eq!(again.skipped, 3);
    }

    #[traced_test]
    #[tokio::test]
    async fn undecodable_info_bytes_do_not_abort_the_pass() {
        let harness = TestHarness::builder().build().await.unwrap();
        let a = harness
            .add_device("A", None, Some(r#"{"location": {"lat": 1.5, "lon": 2.5}}"#))
            .await
            .unwrap();
        harness
            .execute_sql("INSERT INTO devices (number, info) VALUES ('B', CAST(X'7BFF7D' AS TEXT))")
            .await
            .unwrap();

        let report = scheduler(&harness, Duration::from_secs(300))
            .run_pass(now())
            .await
            .unwrap();
        assert_eq!(
            report,
            PassReport {
                examined: 2,
                persisted: 1,
                skipped: 0,
                failed: 1,
            }
        );
        assert_eq!(harness.snapshot_count(a.id).await.unwrap(), 1);
        assert!(logs_contain("malformed evidence for device B"));
    }

    #[tokio::test]
    async fn moved_device_is_snapshotted_inside_the_window() {
        let harness = TestHarness::builder().build().await.unwrap();
        let device = harness
            .add_device("A", None, Some(r#"{"location": {"lat": 1.5, "lon": 2.5}}"#))
            .await
            .unwrap();
        let sched = scheduler(&harness, Duration::from_secs(300));
        sched.run_pass(now()).await.unwrap();

        harness
            .set_info(&device, Some(r#"{"location": {"lat": 1.6, "lon": 2.5}}"#))
            .await
            .unwrap();
        let report = sched.run_pass(now() + chrono::Duration::minutes(2)).await.unwrap();
        assert_eq!(report.persisted, 1);
        assert_eq!(harness.snapshot_count(device.id).await.unwrap(), 2);
    }

    #[traced_test]
    #[tokio::test]
    async fn malformed_device_is_logged_and_does_not_stop_the_pass() {
        let harness = TestHarness::builder().build().await.unwrap();
        harness.add_device("A", None, Some("[]")).await.unwrap();
        let b = harness
            .add_device("B", None, Some(r#"{"location": {"lat": 9.5, "lon": 9.5}}"#))
            .await
            .unwrap();

        let report = scheduler(&harness, Duration::from_secs(300))
            .run_pass(now())
            .await
            .unwrap();
        assert_eq!(report.failed, 1);
        assert_eq!(report.persisted, 1);
        assert_eq!(harness.snapshot_count(b.id).await.unwrap(), 1);
        assert!(logs_contain("skipping device with malformed info"));
    }

    #[tokio::test]
    async fn run_loop_snapshots_then_stops_on_cancel() {
        let harness = TestHarness::builder().build().await.unwrap();
        let device = harness
            .add_device("A", None, Some(r#"{"location": {"lat": 1.5, "lon": 2.5}}"#))
            .await
            .unwrap();

        let sched = Arc::new(scheduler(&harness, Duration::from_millis(20)));
        let cancel = CancellationToken::new();
        let task = {
            let sched = sched.clone();
            let cancel = cancel.clone();
            tokio::spawn(async move { sched.run(cancel).await })
        };

        let mut stored = 0;
        for _ in 0..100 {
            stored = harness.snapshot_count(device.id).await.unwrap();
            if stored > 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        cancel.cancel();
        tokio::time::timeout(Duration::from_secs(5), task)
            .await
            .expect("snapshot task should stop after cancel")
            .unwrap();

        // Repeated passes inside the de-bounce window add nothing.
        assert_eq!(stored, 1);
        assert_eq!(harness.snapshot_count(device.id).await.unwrap(), 1);
    }
}
