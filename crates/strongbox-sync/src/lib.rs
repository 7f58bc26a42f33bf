// SPDX-FileCopyrightText: 2026 Strongbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Manual device-to-device sync for the Strongbox credential vault.
//!
//! One vault exports a [`Snapshot`](strongbox_core::Snapshot) of all owners
//! and entries, seals it under the session key, and writes it to a `.sbx`
//! file. Another vault opened with the same master password reads the file
//! and merges it: owners match by name, entries by owner and site, and the
//! newer `updated_at` wins.

pub mod blob;
pub mod engine;
pub mod report;

pub use engine::{SYNC_FILE_EXTENSION, SyncEngine, describe_last_sync};
pub use report::MergeReport;
