// SPDX-FileCopyrightText: 2026 Geotrail Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for geotrail integration tests.
//!
//! [`TestHarness`] opens a throwaway SQLite store in a temp directory and
//! offers helpers to seed devices, event-log lines, and backup snapshots
//! without hand-writing SQL in every test.

pub mod harness;

pub use harness::{TestHarness, TestHarnessBuilder};
