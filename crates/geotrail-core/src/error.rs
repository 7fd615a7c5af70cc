// SPDX-FileCopyrightText: 2026 Geotrail Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for geotrail.

use thiserror::Error;

/// The primary error type used across store traits and the history engine.
#[derive(Debug, Error)]
pub enum GeotrailError {
    /// The backing store could not be reached or a statement failed.
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// No device with the requested number exists in the inventory.
    #[error("device not found: {number}")]
    DeviceNotFound { number: String },

    /// A unit of evidence (info blob, log line, field) could not be interpreted.
    ///
    /// Batch operations log and skip these; they are never returned to a caller.
    #[error("malformed evidence for device {device}: {reason}")]
    MalformedEvidence { device: String, reason: String },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl GeotrailError {
    /// Wraps any store-level failure.
    pub fn storage<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        GeotrailError::Storage {
            source: Box::new(err),
        }
    }

    /// True when the error means the requested device does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, GeotrailError::DeviceNotFound { .. })
    }

    /// True when the error came from the store (connectivity or statement failure).
    pub fn is_store_unavailable(&self) -> bool {
        matches!(self, GeotrailError::Storage { .. })
    }
}
