// SPDX-FileCopyrightText: 2026 Strongbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the VaultStorage trait.

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::{debug, trace};

use strongbox_config::model::StorageConfig;
use strongbox_core::traits::storage::{unsupported_command, unsupported_query};
use strongbox_core::{
    Command, ExecOutcome, HealthStatus, Query, Record, StrongboxError, VaultStorage,
};

use crate::database::Database;
use crate::queries::{credentials, entries, owners, sync_meta};

/// SQLite-backed vault storage.
///
/// Wraps a [`Database`] handle and delegates every command to the typed query
/// modules. The database is opened on the first call to
/// [`VaultStorage::initialize`].
pub struct SqliteStorage {
    path: String,
    wal_mode: bool,
    db: OnceCell<Database>,
}

impl SqliteStorage {
    /// Create a new SqliteStorage with the given configuration.
    ///
    /// The database connection is not opened until [`VaultStorage::initialize`] is called.
    pub fn new(config: &StorageConfig) -> Self {
        Self::at_path(&config.database_path, config.wal_mode)
    }

    pub fn at_path(path: &str, wal_mode: bool) -> Self {
        Self {
            path: path.to_string(),
            wal_mode,
            db: OnceCell::new(),
        }
    }

    /// Returns the underlying Database, or an error if not initialized.
    fn db(&self) -> Result<&Database, StrongboxError> {
        self.db
            .get()
            .ok_or_else(|| StrongboxError::storage("storage not initialized -- call initialize() first"))
    }
}

fn rows<T: Into<Record>>(items: impl IntoIterator<Item = T>) -> Vec<Record> {
    items.into_iter().map(Into::into).collect()
}

#[async_trait]
impl VaultStorage for SqliteStorage {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn initialize(&self) -> Result<(), StrongboxError> {
        if self.db.initialized() {
            return Err(StrongboxError::storage("storage already initialized"));
        }
        let db = Database::open(&self.path, self.wal_mode)
            .await
            .map_err(|e| StrongboxError::BackendUnavailable {
                source: Box::new(e),
            })?;
        self.db
            .set(db)
            .map_err(|_| StrongboxError::storage("storage already initialized"))?;
        debug!(path = %self.path, "SQLite storage initialized");
        Ok(())
    }

    async fn health_check(&self) -> Result<HealthStatus, StrongboxError> {
        let Ok(db) = self.db() else {
            return Ok(HealthStatus::Unhealthy("not initialized".to_string()));
        };
        match db.execute_batch("SELECT 1;").await {
            Ok(()) => Ok(HealthStatus::Healthy),
            Err(e) => Ok(HealthStatus::Unhealthy(e.to_string())),
        }
    }

    async fn close(&self) -> Result<(), StrongboxError> {
        let db = self.db()?;
        db.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);").await?;
        debug!("WAL checkpoint complete");
        Ok(())
    }

    async fn execute(&self, command: Command) -> Result<ExecOutcome, StrongboxError> {
        let db = self.db()?;
        trace!(command = command.name(), "sqlite execute");
        let outcome = match command {
            Command::PutMasterCredential(credential) => {
                credentials::put_master_credential(db, credential).await?;
                ExecOutcome::Done
            }
            Command::PutRecoveryQuestion(question) => {
                credentials::put_recovery_question(db, question).await?;
                ExecOutcome::Done
            }
            Command::PutSyncMetadata(meta) => {
                sync_meta::put_sync_metadata(db, meta).await?;
                ExecOutcome::Done
            }
            Command::TouchLastSync { at } => {
                ExecOutcome::Affected(sync_meta::touch_last_sync(db, at).await?)
            }
            Command::InsertOwner(owner) => {
                ExecOutcome::Inserted(owners::insert_owner(db, owner).await?)
            }
            Command::UpdateOwner {
                id,
                encrypted_payload,
                updated_at,
            } => ExecOutcome::Affected(
                owners::update_owner(db, id, encrypted_payload, updated_at).await?,
            ),
            Command::UpdateOwnerByName {
                name,
                encrypted_payload,
                updated_at,
            } => ExecOutcome::Affected(
                owners::update_owner_by_name(db, name, encrypted_payload, updated_at).await?,
            ),
            Command::DeleteOwner { id } => {
                ExecOutcome::Affected(owners::delete_owner(db, id).await?)
            }
            Command::DeleteAllOwners => ExecOutcome::Affected(owners::delete_all_owners(db).await?),
            Command::InsertEntry(entry) => {
                ExecOutcome::Inserted(entries::insert_entry(db, entry).await?)
            }
            Command::UpdateEntry {
                id,
                fields,
                updated_at,
            } => ExecOutcome::Affected(entries::update_entry(db, id, fields, updated_at).await?),
            Command::DeleteEntry { id } => {
                ExecOutcome::Affected(entries::delete_entry(db, id).await?)
            }
            Command::Begin => {
                db.execute_batch("BEGIN IMMEDIATE").await?;
                ExecOutcome::Done
            }
            Command::Commit => {
                db.execute_batch("COMMIT").await?;
                ExecOutcome::Done
            }
            Command::Rollback => {
                db.execute_batch("ROLLBACK").await?;
                ExecOutcome::Done
            }
            other => return Err(unsupported_command(self.name(), &other)),
        };
        Ok(outcome)
    }

    async fn select(&self, query: Query) -> Result<Vec<Record>, StrongboxError> {
        let db = self.db()?;
        trace!(query = query.name(), "sqlite select");
        let records = match query {
            Query::MasterCredential => rows(credentials::get_master_credential(db).await?),
            Query::RecoveryQuestion => rows(credentials::get_recovery_question(db).await?),
            Query::SyncMetadata => rows(sync_meta::get_sync_metadata(db).await?),
            Query::AllOwners => rows(owners::list_owners(db).await?),
            Query::OwnerById { id } => rows(owners::get_owner(db, id).await?),
            Query::OwnerByName { name } => rows(owners::get_owner_by_name(db, name).await?),
            Query::AllEntries => rows(entries::list_entries(db).await?),
            Query::EntryById { id } => rows(entries::get_entry(db, id).await?),
            Query::EntriesByOwner { owner_id } => {
                rows(entries::entries_by_owner(db, owner_id).await?)
            }
            Query::EntryByOwnerAndSite {
                owner_id,
                encrypted_site,
            } => rows(entries::entry_by_owner_and_site(db, owner_id, encrypted_site).await?),
            other => return Err(unsupported_query(self.name(), &other)),
        };
        Ok(records)
    }
}
