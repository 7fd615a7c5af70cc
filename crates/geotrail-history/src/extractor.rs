// SPDX-FileCopyrightText: 2026 Geotrail Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Parsing of coordinates embedded in free-text log messages.
//!
//! Devices report positions as text such as
//! `GPS location update: lat=12.34, lon=56.78`. The encoding is an informal
//! convention, so it sits behind [`CoordinateParser`] and each encoding
//! carries a version tag.

use std::sync::LazyLock;

use regex::Regex;

/// Extracts a `(lat, lon)` pair from a message.
///
/// Returning `None` is the normal outcome for text without a coordinate;
/// implementations never error.
pub trait CoordinateParser: Send + Sync {
    /// Identifies the text encoding this parser understands.
    fn version(&self) -> &'static str;

    fn extract(&self, text: &str) -> Option<(f64, f64)>;
}

/// `lat=<decimal>` then `lon=<decimal>`, with an optional comma and any
/// whitespace between them, anywhere in the text.
static LAT_LON_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"lat=(-?\d+\.?\d*),?\s*lon=(-?\d+\.?\d*)").unwrap());

/// The `lat=.. lon=..` encoding emitted by current device firmware.
#[derive(Debug, Clone, Copy, Default)]
pub struct LatLonText;

impl CoordinateParser for LatLonText {
    fn version(&self) -> &'static str {
        "lat-lon-text/1"
    }

    fn extract(&self, text: &str) -> Option<(f64, f64)> {
        let caps = LAT_LON_PATTERN.captures(text)?;
        let lat = caps[1].parse::<f64>().ok()?;
        let lon = caps[2].parse::<f64>().ok()?;
        Some((lat, lon))
    }
}
