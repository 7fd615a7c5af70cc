// SPDX-FileCopyrightText: 2026 Geotrail Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for geotrail.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level geotrail configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GeotrailConfig {
    /// Process-wide service settings.
    #[serde(default)]
    pub service: ServiceConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// History reconstruction settings.
    #[serde(default)]
    pub history: HistoryConfig,

    /// Periodic snapshot settings.
    #[serde(default)]
    pub snapshot: SnapshotConfig,

    /// HTTP gateway settings.
    #[serde(default)]
    pub gateway: GatewayConfig,
}

/// Process-wide service configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("geotrail").join("geotrail.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("geotrail.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

/// History reconstruction configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct HistoryConfig {
    /// Look-back window used when a caller does not specify one.
    #[serde(default = "default_window_days")]
    pub default_window_days: u32,

    /// Largest look-back window a caller may request.
    #[serde(default = "default_max_window_days")]
    pub max_window_days: u32,

    /// Substring that marks an event-log message as a location update.
    #[serde(default = "default_location_marker")]
    pub location_marker: String,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            default_window_days: default_window_days(),
            max_window_days: default_max_window_days(),
            location_marker: default_location_marker(),
        }
    }
}

fn default_window_days() -> u32 {
    7
}

fn default_max_window_days() -> u32 {
    365
}

fn default_location_marker() -> String {
    "GPS location update".to_string()
}

/// Periodic snapshot configuration.
///
/// The snapshot task copies each device's current position into the backup
/// table so that history survives for devices that keep no event log.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SnapshotConfig {
    /// Run the snapshot task alongside the HTTP server.
    #[serde(default = "default_snapshot_enabled")]
    pub enabled: bool,

    /// Seconds between the end of one pass and the start of the next.
    #[serde(default = "default_snapshot_interval_secs")]
    pub interval_secs: u64,

    /// An identical position recorded within this many seconds is not stored again.
    #[serde(default = "default_dedup_window_secs")]
    pub dedup_window_secs: u64,

    /// Value written to the `source` column of every stored snapshot.
    #[serde(default = "default_source_label")]
    pub source_label: String,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            enabled: default_snapshot_enabled(),
            interval_secs: default_snapshot_interval_secs(),
            dedup_window_secs: default_dedup_window_secs(),
            source_label: default_source_label(),
        }
    }
}

fn default_snapshot_enabled() -> bool {
    true
}

fn default_snapshot_interval_secs() -> u64 {
    300 // 5 minutes
}

fn default_dedup_window_secs() -> u64 {
    600 // 10 minutes
}

fn default_source_label() -> String {
    "auto-save".to_string()
}

/// HTTP gateway configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    /// Host address to bind.
    #[serde(default = "default_gateway_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_gateway_port")]
    pub port: u16,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_gateway_host(),
            port: default_gateway_port(),
        }
    }
}

fn default_gateway_host() -> String {
    "127.0.0.1".to_string()
}

fn default_gateway_port() -> u16 {
    5003
}
