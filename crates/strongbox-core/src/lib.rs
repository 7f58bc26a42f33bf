// SPDX-FileCopyrightText: 2026 Strongbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Strongbox credential vault.
//!
//! This crate provides the storage contract every backend implements, the
//! shared error type, and the record types that flow between storage, the
//! encryption layer, and the sync engine.

pub mod error;
pub mod handle;
pub mod timestamp;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::StrongboxError;
pub use handle::{StorageGuard, StorageHandle};
pub use traits::{Command, ExecOutcome, Query, VaultStorage};
pub use types::{
    Entry, EntryFields, FromRecord, HealthStatus, MasterCredential, NewEntry, NewOwner, Owner,
    Record, RecordId, RecoveryQuestion, Snapshot, SyncMetadata,
};
