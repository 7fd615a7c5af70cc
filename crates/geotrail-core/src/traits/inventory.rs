// SPDX-FileCopyrightText: 2026 Geotrail Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Read-only view of the device inventory.

use async_trait::async_trait;

use crate::error::GeotrailError;
use crate::types::Device;

/// Device inventory owned by an external system.
///
/// Implementations decode each device's `info` blob into a
/// [`LiveLocation`](crate::types::LiveLocation) so readers never re-parse it.
#[async_trait]
pub trait Inventory: Send + Sync {
    /// Resolves a device by its external number.
    async fn find_device(&self, number: &str) -> Result<Option<Device>, GeotrailError>;

    /// Lists every device that carries an `info` blob, ordered by number.
    async fn list_reporting_devices(&self) -> Result<Vec<Device>, GeotrailError>;
}
