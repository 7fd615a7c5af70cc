// SPDX-FileCopyrightText: 2026 Geotrail Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./geotrail.toml` > `~/.config/geotrail/geotrail.toml` >
//! `/etc/geotrail/geotrail.toml` with environment variable overrides via `GEOTRAIL_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::GeotrailConfig;

/// System-wide configuration file.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/geotrail/geotrail.toml";

/// Configuration file in the working directory.
pub const LOCAL_CONFIG_PATH: &str = "geotrail.toml";

/// Sections whose env keys are rewritten from `section_key` to `section.key`.
const ENV_SECTIONS: &[&str] = &["service", "storage", "history", "snapshot", "gateway"];

/// Path of the per-user configuration file, if a config dir exists.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("geotrail/geotrail.toml"))
}

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/geotrail/geotrail.toml` (system-wide)
/// 3. `~/.config/geotrail/geotrail.toml` (user XDG config)
/// 4. `./geotrail.toml` (local directory)
/// 5. `GEOTRAIL_*` environment variables
pub fn load_config() -> Result<GeotrailConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<GeotrailConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(GeotrailConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<GeotrailConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(GeotrailConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading.
///
/// Returns the Figment before extraction so callers can inspect metadata.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(GeotrailConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG_PATH))
        .merge(Toml::file(user_config_path().unwrap_or_default()))
        .merge(Toml::file(LOCAL_CONFIG_PATH))
        .merge(env_provider())
}

/// Environment provider mapping `GEOTRAIL_SECTION_KEY` to `section.key`.
///
/// Uses `Env::map()` rather than `Env::split("_")` because key names contain
/// underscores: `GEOTRAIL_STORAGE_DATABASE_PATH` must map to
/// `storage.database_path`, not `storage.database.path`.
fn env_provider() -> Env {
    Env::prefixed("GEOTRAIL_").map(|key| map_env_key(key.as_str()).into())
}

/// Rewrites a lowercased, prefix-stripped env key into a dotted config path.
pub fn map_env_key(key: &str) -> String {
    for section in ENV_SECTIONS {
        if let Some(rest) = key
            .strip_prefix(section)
            .and_then(|rest| rest.strip_prefix('_'))
        {
            return format!("{section}.{rest}");
        }
    }
    key.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_keys_map_to_sections() {
        assert_eq!(map_env_key("storage_database_path"), "storage.database_path");
        assert_eq!(map_env_key("snapshot_interval_secs"), "snapshot.interval_secs");
        assert_eq!(map_env_key("gateway_port"), "gateway.port");
        assert_eq!(map_env_key("service_log_level"), "service.log_level");
    }

    #[test]
    fn unknown_env_key_is_left_alone() {
        assert_eq!(map_env_key("unrelated_thing"), "unrelated_thing");
    }
}
