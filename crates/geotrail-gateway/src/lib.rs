// SPDX-FileCopyrightText: 2026 Geotrail Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP gateway for geotrail.
//!
//! A thin axum layer over [`geotrail_history::LocationService`]. Handlers do
//! no caching and hold no state beyond the shared service handle; every
//! request re-reads the store.

pub mod handlers;
pub mod server;

pub use server::{AppState, router, serve, start_server};
