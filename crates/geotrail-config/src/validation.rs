// SPDX-FileCopyrightText: 2026 Geotrail Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde attributes,
//! such as non-empty paths, positive intervals, and consistent window bounds.

use crate::diagnostic::ConfigError;
use crate::model::GeotrailConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &GeotrailConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut fail = |message: String| errors.push(ConfigError::Validation { message });

    if !LOG_LEVELS.contains(&config.service.log_level.as_str()) {
        fail(format!(
            "service.log_level `{}` must be one of: {}",
            config.service.log_level,
            LOG_LEVELS.join(", ")
        ));
    }

    if config.storage.database_path.trim().is_empty() {
        fail("storage.database_path must not be empty".to_string());
    }

    if config.history.default_window_days == 0 {
        fail("history.default_window_days must be at least 1".to_string());
    }

    if config.history.default_window_days > config.history.max_window_days {
        fail(format!(
            "history.default_window_days ({}) must not exceed history.max_window_days ({})",
            config.history.default_window_days, config.history.max_window_days
        ));
    }

    if config.history.location_marker.trim().is_empty() {
        fail("history.location_marker must not be empty".to_string());
    }

    if config.snapshot.interval_secs == 0 {
        fail("snapshot.interval_secs must be at least 1".to_string());
    }

    if config.snapshot.dedup_window_secs == 0 {
        fail("snapshot.dedup_window_secs must be at least 1".to_string());
    }

    if config.snapshot.source_label.trim().is_empty() {
        fail("snapshot.source_label must not be empty".to_string());
    }

    let host = config.gateway.host.trim();
    if host.is_empty() {
        fail("gateway.host must not be empty".to_string());
    } else {
        let is_valid_ip = host.parse::<std::net::IpAddr>().is_ok();
        let is_valid_hostname = host
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-' || c == ':');
        if !is_valid_ip && !is_valid_hostname {
            fail(format!(
                "gateway.host `{host}` is not a valid IP address or hostname"
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
