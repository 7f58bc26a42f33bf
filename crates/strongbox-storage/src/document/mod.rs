// SPDX-FileCopyrightText: 2026 Strongbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Document-store implementation of the VaultStorage trait.
//!
//! Records live in keyed object stores held in memory and, when a path is
//! configured, are written as one JSON document after every committed write.
//! `Begin` snapshots the whole state; `Rollback` restores the snapshot.

mod state;

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, trace};

use strongbox_config::model::StorageConfig;
use strongbox_core::traits::storage::{unsupported_command, unsupported_query};
use strongbox_core::{
    Command, ExecOutcome, HealthStatus, Query, Record, StrongboxError, VaultStorage,
};

pub use state::DocumentState;

#[derive(Default)]
struct Inner {
    /// `None` until initialized.
    state: Option<DocumentState>,
    /// State as of `Begin`, present while a transaction is open.
    snapshot: Option<DocumentState>,
}

/// Document-store vault storage.
pub struct DocumentStorage {
    path: Option<PathBuf>,
    inner: Mutex<Inner>,
}

impl DocumentStorage {
    pub fn new(config: &StorageConfig) -> Self {
        Self::at_path(&config.document_path)
    }

    /// A store persisted to the JSON document at `path`.
    pub fn at_path(path: impl AsRef<Path>) -> Self {
        Self {
            path: Some(path.as_ref().to_path_buf()),
            inner: Mutex::new(Inner::default()),
        }
    }

    /// A store that lives only as long as this value.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            inner: Mutex::new(Inner::default()),
        }
    }

    async fn load(path: &Path) -> Result<DocumentState, StrongboxError> {
        let raw = match tokio::fs::read(path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(DocumentState::default());
            }
            Err(e) => return Err(e.into()),
        };
        let mut state: DocumentState = serde_json::from_slice(&raw)?;
        state.rebuild_indexes();
        Ok(state)
    }

    /// Atomically replace the document with the current state.
    async fn persist(&self, state: &DocumentState) -> Result<(), StrongboxError> {
        let Some(path) = self.path.clone() else {
            return Ok(());
        };
        let bytes = serde_json::to_vec(state)?;
        tokio::task::spawn_blocking(move || write_atomically(&path, &bytes))
            .await
            .map_err(|e| StrongboxError::Internal(format!("persist task failed: {e}")))?
    }
}

fn write_atomically(path: &Path, bytes: &[u8]) -> Result<(), StrongboxError> {
    use std::io::Write;

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| StrongboxError::Io(e.error))?;
    Ok(())
}

fn no_transaction(command: &str) -> StrongboxError {
    StrongboxError::storage(format!("cannot {command} - no transaction is active"))
}

fn not_initialized() -> StrongboxError {
    StrongboxError::storage("storage not initialized -- call initialize() first")
}

fn rows<T: Into<Record>>(items: impl IntoIterator<Item = T>) -> Vec<Record> {
    items.into_iter().map(Into::into).collect()
}

#[async_trait]
impl VaultStorage for DocumentStorage {
    fn name(&self) -> &str {
        "document"
    }

    async fn initialize(&self) -> Result<(), StrongboxError> {
        let mut inner = self.inner.lock().await;
        if inner.state.is_some() {
            return Err(StrongboxError::storage("storage already initialized"));
        }
        let state = match &self.path {
            Some(path) => {
                if let Some(parent) = path.parent()
                    && !parent.as_os_str().is_empty()
                {
                    tokio::fs::create_dir_all(parent).await.map_err(|e| {
                        StrongboxError::BackendUnavailable {
                            source: Box::new(e),
                        }
                    })?;
                }
                Self::load(path)
                    .await
                    .map_err(|e| StrongboxError::BackendUnavailable {
                        source: Box::new(e),
                    })?
            }
            None => DocumentState::default(),
        };
        inner.state = Some(state);
        debug!(path = ?self.path, "document storage initialized");
        Ok(())
    }

    async fn health_check(&self) -> Result<HealthStatus, StrongboxError> {
        let inner = self.inner.lock().await;
        Ok(match inner.state {
            Some(_) => HealthStatus::Healthy,
            None => HealthStatus::Unhealthy("not initialized".to_string()),
        })
    }

    async fn close(&self) -> Result<(), StrongboxError> {
        let mut inner = self.inner.lock().await;
        // An open transaction is abandoned, not committed.
        if let Some(snapshot) = inner.snapshot.take() {
            inner.state = Some(snapshot);
        }
        let state = inner.state.as_ref().ok_or_else(not_initialized)?;
        self.persist(state).await?;
        debug!("document storage flushed");
        Ok(())
    }

    async fn execute(&self, command: Command) -> Result<ExecOutcome, StrongboxError> {
        let mut guard = self.inner.lock().await;
        let inner = &mut *guard;
        let state = inner.state.as_mut().ok_or_else(not_initialized)?;
        trace!(command = command.name(), "document execute");

        // Outside a transaction each write is its own unit: undone if it
        // cannot be persisted.
        let restore_point = match command {
            Command::Begin | Command::Commit | Command::Rollback => None,
            _ if inner.snapshot.is_none() && self.path.is_some() => Some(state.clone()),
            _ => None,
        };

        let outcome = match command {
            Command::Begin => {
                if inner.snapshot.is_some() {
                    return Err(StrongboxError::storage(
                        "cannot start a transaction within a transaction",
                    ));
                }
                inner.snapshot = Some(state.clone());
                return Ok(ExecOutcome::Done);
            }
            Command::Commit => {
                if inner.snapshot.is_none() {
                    return Err(no_transaction("commit"));
                }
                // A failed write keeps the transaction open for `Rollback`.
                self.persist(state).await?;
                inner.snapshot = None;
                return Ok(ExecOutcome::Done);
            }
            Command::Rollback => {
                let snapshot = inner.snapshot.take().ok_or_else(|| no_transaction("rollback"))?;
                *state = snapshot;
                return Ok(ExecOutcome::Done);
            }
            Command::PutMasterCredential(credential) => {
                state.put_master_credential(credential);
                ExecOutcome::Done
            }
            Command::PutRecoveryQuestion(question) => {
                state.put_recovery_question(question);
                ExecOutcome::Done
            }
            Command::PutSyncMetadata(meta) => {
                state.put_sync_metadata(meta);
                ExecOutcome::Done
            }
            Command::TouchLastSync { at } => ExecOutcome::Affected(state.touch_last_sync(at)),
            Command::InsertOwner(owner) => ExecOutcome::Inserted(state.insert_owner(owner)?),
            Command::UpdateOwner {
                id,
                encrypted_payload,
                updated_at,
            } => ExecOutcome::Affected(state.update_owner(id, encrypted_payload, updated_at)),
            Command::UpdateOwnerByName {
                name,
                encrypted_payload,
                updated_at,
            } => ExecOutcome::Affected(match state.owner_id_by_name(&name) {
                Some(id) => state.update_owner(id, encrypted_payload, updated_at),
                None => 0,
            }),
            Command::DeleteOwner { id } => ExecOutcome::Affected(state.delete_owner(id)),
            Command::DeleteAllOwners => ExecOutcome::Affected(state.delete_all_owners()),
            Command::InsertEntry(entry) => ExecOutcome::Inserted(state.insert_entry(entry)?),
            Command::UpdateEntry {
                id,
                fields,
                updated_at,
            } => ExecOutcome::Affected(state.update_entry(id, fields, updated_at)),
            Command::DeleteEntry { id } => ExecOutcome::Affected(state.delete_entry(id)),
            other => return Err(unsupported_command(self.name(), &other)),
        };

        // Inside a transaction, writes reach disk on commit.
        if let Some(before) = restore_point
            && let Err(e) = self.persist(state).await
        {
            *state = before;
            return Err(e);
        }
        Ok(outcome)
    }

    async fn select(&self, query: Query) -> Result<Vec<Record>, StrongboxError> {
        let inner = self.inner.lock().await;
        let state = inner.state.as_ref().ok_or_else(not_initialized)?;
        trace!(query = query.name(), "document select");

        let records = match query {
            Query::MasterCredential => rows(state.master_credential().cloned()),
            Query::RecoveryQuestion => rows(state.recovery_question().cloned()),
            Query::SyncMetadata => rows(state.sync_metadata().cloned()),
            Query::AllOwners => rows(state.owners()),
            Query::OwnerById { id } => rows(state.owner(id).cloned()),
            Query::OwnerByName { name } => rows(state.owner_by_name(&name).cloned()),
            Query::AllEntries => rows(state.entries()),
            Query::EntryById { id } => rows(state.entry(id).cloned()),
            Query::EntriesByOwner { owner_id } => rows(state.entries_by_owner(owner_id)),
            Query::EntryByOwnerAndSite {
                owner_id,
                encrypted_site,
            } => {
                let mut matches: Vec<_> = state
                    .entries_by_owner(owner_id)
                    .into_iter()
                    .filter(|entry| entry.encrypted_site == encrypted_site)
                    .collect();
                matches.sort_by_key(|entry| entry.id);
                rows(matches)
            }
            other => return Err(unsupported_query(self.name(), &other)),
        };
        Ok(records)
    }
}
