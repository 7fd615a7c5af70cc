// SPDX-FileCopyrightText: 2026 Geotrail Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Lifecycle trait implemented by every store backend.

use async_trait::async_trait;

use crate::error::GeotrailError;
use crate::types::HealthStatus;

/// Identity, lifecycle, and health of a store backend.
#[async_trait]
pub trait StoreAdapter: Send + Sync + 'static {
    /// Returns the human-readable name of this backend.
    fn name(&self) -> &str;

    /// Opens connections and applies pending migrations.
    async fn initialize(&self) -> Result<(), GeotrailError>;

    /// Performs a health check and returns the backend's current status.
    async fn health_check(&self) -> Result<HealthStatus, GeotrailError>;

    /// Flushes pending writes and releases connections.
    async fn close(&self) -> Result<(), GeotrailError>;
}
