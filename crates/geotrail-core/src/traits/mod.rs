// SPDX-FileCopyrightText: 2026 Geotrail Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Seam traits between the history engine and its stores.
//!
//! All async traits use `#[async_trait]` so they can be held as trait objects.

pub mod adapter;
pub mod event_log;
pub mod inventory;
pub mod snapshot;

pub use adapter::StoreAdapter;
pub use event_log::EventLog;
pub use inventory::Inventory;
pub use snapshot::SnapshotStore;
