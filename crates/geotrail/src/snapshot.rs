// SPDX-FileCopyrightText: 2026 Geotrail Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `geotrail snapshot` command implementation.
//!
//! Runs one snapshot pass against the configured store and exits. Useful for
//! backfilling after downtime or driving the job from cron instead of `serve`.

use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use geotrail_config::GeotrailConfig;
use geotrail_core::{GeotrailError, StoreAdapter};
use geotrail_history::SnapshotScheduler;
use geotrail_storage::SqliteStore;

use crate::serve::init_tracing;

pub async fn run_snapshot(config: GeotrailConfig) -> Result<(), GeotrailError> {
    init_tracing(&config.service.log_level);

    let store = Arc::new(SqliteStore::new(config.storage.clone()));
    store.initialize().await?;

    let scheduler = SnapshotScheduler::from_config(store.clone(), &config.snapshot);
    let outcome = scheduler.run_pass(Utc::now()).await;
    store.close().await?;
    let report = outcome?;

    info!(
        examined = report.examined,
        persisted = report.persisted,
        skipped = report.skipped,
        failed = report.failed,
        "snapshot pass complete"
    );
    println!(
        "Saved {} new device locations ({} examined, {} skipped, {} failed)",
        report.persisted, report.examined, report.skipped, report.failed
    );
    Ok(())
}
