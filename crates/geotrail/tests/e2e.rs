// SPDX-FileCopyrightText: 2026 Geotrail Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end tests for the complete geotrail pipeline.
//!
//! Each test creates an isolated TestHarness with a temp SQLite file. Tests
//! are independent and order-insensitive.

use std::process::Command;
use std::sync::Arc;

use chrono::{Duration, Utc};
use tokio_util::sync::CancellationToken;

use geotrail_core::Origin;
use geotrail_gateway::AppState;
use geotrail_history::{LocationService, SnapshotScheduler};
use geotrail_test_utils::TestHarness;

const LIVE: &str = r#"{"location": {"lat": 48.8584, "lon": 2.2945}}"#;

fn write_config(dir: &std::path::Path, body: &str) -> std::path::PathBuf {
    let path = dir.join("geotrail.toml");
    std::fs::write(&path, body).unwrap();
    path
}

// ---- Snapshot task feeds history ----

#[tokio::test]
async fn snapshot_passes_become_backup_history() {
    let harness = TestHarness::builder().build().await.unwrap();
    let device = harness.add_device("D1", Some("Van"), Some(LIVE)).await.unwrap();
    harness.add_device("D2", None, Some(r#"{"location": null}"#)).await.unwrap();

    let scheduler = SnapshotScheduler::from_config(harness.store(), &harness.config.snapshot);
    let now = Utc::now() - Duration::minutes(30);
    let first = scheduler.run_pass(now).await.unwrap();
    let second = scheduler.run_pass(now + Duration::minutes(5)).await.unwrap();

    assert_eq!(first.examined, 2);
    assert_eq!(first.persisted, 1);
    assert_eq!(second.persisted, 0);
    assert_eq!(harness.snapshot_count(device.id).await.unwrap(), 1);

    let service = LocationService::new(harness.store(), &harness.config.history);
    let view = service.device_history("D1", 7).await.unwrap();
    assert_eq!(view.total_points, 1);
    assert_eq!(view.history[0].origin, Origin::Backup);
    assert_eq!(view.history[0].lat, 48.8584);
}

#[tokio::test]
async fn log_evidence_outranks_snapshots() {
    let harness = TestHarness::builder().build().await.unwrap();
    let device = harness.add_device("D1", None, Some(LIVE)).await.unwrap();
    let scheduler = SnapshotScheduler::from_config(harness.store(), &harness.config.snapshot);
    scheduler.run_pass(Utc::now() - Duration::hours(2)).await.unwrap();
    harness
        .add_log(&device, Utc::now() - Duration::hours(1), "GPS location update lat=1.5, lon=2.5")
        .await
        .unwrap();

    let service = LocationService::new(harness.store(), &harness.config.history);
    let view = service.device_history("D1", 1).await.unwrap();
    assert_eq!(view.total_points, 1);
    assert_eq!(view.history[0].origin, Origin::Logged);
}

// ---- HTTP over a real socket ----

#[tokio::test]
async fn gateway_serves_and_shuts_down() {
    let harness = TestHarness::builder().build().await.unwrap();
    harness.add_device("D1", Some("Van"), Some(LIVE)).await.unwrap();

    let store = harness.store();
    let service = Arc::new(LocationService::new(store.clone(), &harness.config.history));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let cancel = CancellationToken::new();
    let server = tokio::spawn(geotrail_gateway::serve(
        listener,
        AppState::new(service, store),
        cancel.clone(),
    ));

    let client = reqwest::Client::new();
    let locations: serde_json::Value = client
        .get(format!("http://{addr}/api/locations"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(locations[0]["number"], "D1");
    assert_eq!(locations[0]["description"], "Van");

    let missing = client
        .get(format!("http://{addr}/api/device/ghost/history"))
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status().as_u16(), 404);
    drop(client);

    cancel.cancel();
    let finished = tokio::time::timeout(std::time::Duration::from_secs(5), server)
        .await
        .expect("server did not stop");
    assert!(finished.unwrap().is_ok());
}

// ---- Binary subcommands ----

#[test]
fn check_config_accepts_valid_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(dir.path(), "[gateway]\nport = 8088\n");

    let output = Command::new(env!("CARGO_BIN_EXE_geotrail"))
        .args(["check-config", "--config"])
        .arg(&path)
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("configuration OK"), "{stdout}");
    assert!(stdout.contains("8088"), "{stdout}");
}

#[test]
fn check_config_rejects_typo_with_suggestion() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(dir.path(), "[gateway]\nprot = 8088\n");

    let output = Command::new(env!("CARGO_BIN_EXE_geotrail"))
        .args(["check-config", "--config"])
        .arg(&path)
        .output()
        .unwrap();

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("prot"), "{stderr}");
    assert!(stderr.contains("port"), "{stderr}");
}

#[tokio::test]
async fn snapshot_command_runs_one_pass() {
    let harness = TestHarness::builder().build().await.unwrap();
    let device = harness.add_device("D1", None, Some(LIVE)).await.unwrap();
    let db_path = harness.config.storage.database_path.clone();

    let dir = tempfile::tempdir().unwrap();
    let path = write_config(
        dir.path(),
        &format!("[storage]\ndatabase_path = {db_path:?}\n"),
    );

    let output = tokio::task::spawn_blocking(move || {
        Command::new(env!("CARGO_BIN_EXE_geotrail"))
            .args(["snapshot", "--config"])
            .arg(&path)
            .output()
    })
    .await
    .unwrap()
    .unwrap();

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert!(String::from_utf8_lossy(&output.stdout).contains("Saved 1 new device locations"));
    assert_eq!(harness.snapshot_count(device.id).await.unwrap(), 1);
}
