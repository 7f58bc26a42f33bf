// SPDX-FileCopyrightText: 2026 Strongbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persistence backends for the Strongbox credential vault.
//!
//! Two engines implement the same [`VaultStorage`] contract: a WAL-mode SQLite
//! database with embedded migrations, and a document store that keeps keyed
//! object stores in one JSON file. Callers pick one through
//! [`StorageConfig::backend`] and never see the difference.

pub mod adapter;
pub mod database;
pub mod document;
pub mod migrations;
pub mod queries;

use std::sync::Arc;

use strongbox_config::model::{StorageBackend, StorageConfig};
use strongbox_core::VaultStorage;
use tracing::info;

pub use adapter::SqliteStorage;
pub use database::Database;
pub use document::DocumentStorage;

/// Build the backend selected by configuration. The result still needs
/// [`VaultStorage::initialize`].
pub fn open_storage(config: &StorageConfig) -> Arc<dyn VaultStorage> {
    info!(backend = %config.backend, "selecting storage backend");
    match config.backend {
        StorageBackend::Sqlite => Arc::new(SqliteStorage::new(config)),
        StorageBackend::Document => Arc::new(DocumentStorage::new(config)),
    }
}
