// SPDX-FileCopyrightText: 2026 Geotrail Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `geotrail serve` command implementation.
//!
//! Opens the SQLite store, starts the periodic snapshot task, and serves the
//! HTTP API until SIGINT/SIGTERM. Both contexts share only the store.

use std::sync::Arc;

use tracing::{error, info, warn};

use geotrail_config::GeotrailConfig;
use geotrail_core::{GeotrailError, StoreAdapter};
use geotrail_gateway::AppState;
use geotrail_history::{LocationService, SnapshotScheduler};
use geotrail_storage::SqliteStore;

use crate::shutdown;

/// Runs the `geotrail serve` command.
pub async fn run_serve(config: GeotrailConfig) -> Result<(), GeotrailError> {
    init_tracing(&config.service.log_level);

    info!("starting geotrail serve");

    let store = Arc::new(SqliteStore::new(config.storage.clone()));
    store.initialize().await?;
    info!(path = %config.storage.database_path, "store ready");

    let cancel = shutdown::install_signal_handler();

    let snapshot_task = if config.snapshot.enabled {
        let scheduler = SnapshotScheduler::from_config(store.clone(), &config.snapshot);
        let task_cancel = cancel.clone();
        Some(tokio::spawn(async move { scheduler.run(task_cancel).await }))
    } else {
        info!("snapshot task disabled");
        None
    };

    let service = Arc::new(LocationService::new(store.clone(), &config.history));
    let state = AppState::new(service, store.clone());
    let served = geotrail_gateway::start_server(&config.gateway, state, cancel.clone()).await;
    if let Err(e) = &served {
        error!(error = %e, "gateway failed");
    }

    // The gateway may have stopped on its own; stop the snapshot task too.
    cancel.cancel();
    if let Some(task) = snapshot_task
        && let Err(e) = task.await
    {
        warn!(error = %e, "snapshot task ended abnormally");
    }

    store.close().await?;
    info!("geotrail serve shutdown complete");
    served
}

/// Install the global fmt subscriber. `RUST_LOG` overrides the configured level.
pub fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("geotrail={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
