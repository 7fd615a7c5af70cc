// SPDX-FileCopyrightText: 2026 Geotrail Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Rebuilds a device's track from whichever evidence source has data.
//!
//! Sources are consulted in a fixed order and the first non-empty one wins
//! outright. A timeline therefore never mixes provenances.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use geotrail_core::{Device, GeotrailError, Inventory, Timeline};

use crate::sources::EvidenceSource;

/// A device together with its reconstructed track.
#[derive(Debug, Clone)]
pub struct DeviceHistory {
    pub device: Device,
    pub timeline: Timeline,
}

/// Answers history queries by walking evidence sources in precedence order.
pub struct HistoryReconstructor {
    inventory: Arc<dyn Inventory>,
    /// Highest precedence first.
    sources: Vec<Arc<dyn EvidenceSource>>,
}

impl HistoryReconstructor {
    /// `sources` are tried in the given order; put the highest-fidelity one first.
    pub fn new(inventory: Arc<dyn Inventory>, sources: Vec<Arc<dyn EvidenceSource>>) -> Self {
        Self { inventory, sources }
    }

    /// History for `number` over the trailing `window_days`, relative to now.
    pub async fn get_history(
        &self,
        number: &str,
        window_days: u32,
    ) -> Result<DeviceHistory, GeotrailError> {
        self.get_history_at(number, window_days, Utc::now()).await
    }

    /// History for `number` over the `window_days` ending at `now`.
    ///
    /// Fails with [`GeotrailError::DeviceNotFound`] for an unknown number. A
    /// known device with no evidence yields an empty timeline.
    pub async fn get_history_at(
        &self,
        number: &str,
        window_days: u32,
        now: DateTime<Utc>,
    ) -> Result<DeviceHistory, GeotrailError> {
        let device = self
            .inventory
            .find_device(number)
            .await?
            .ok_or_else(|| GeotrailError::DeviceNotFound {
                number: number.to_string(),
            })?;

        let since = now
            .checked_sub_signed(Duration::days(i64::from(window_days)))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        for source in &self.sources {
            let points = source.fetch(&device, since, now).await?;
            if !points.is_empty() {
                debug!(
                    device = %device.number,
                    origin = %source.origin(),
                    points = points.len(),
                    "history resolved"
                );
                return Ok(DeviceHistory {
                    device,
                    timeline: Timeline::from_points(points),
                });
            }
        }

        debug!(device = %device.number, "no location evidence in window");
        Ok(DeviceHistory {
            device,
            timeline: Timeline::empty(),
        })
    }
}
