// SPDX-FileCopyrightText: 2026 Strongbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Snapshot export and last-write-wins import.
//!
//! Record ids are local to each vault and never compared across vaults.
//! Owners are matched by name and remote owner ids are remapped to the local
//! ids of the same names; entries are matched by local owner plus site.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use strongbox_config::model::SyncConfig;
use strongbox_core::{
    Command, Entry, EntryFields, NewEntry, NewOwner, Query, RecordId, Snapshot, StorageHandle,
    StrongboxError, SyncMetadata, VaultStorage, timestamp,
};
use strongbox_crypto::EncryptionService;

use crate::blob;
use crate::report::MergeReport;

/// File extension of exported sync files.
pub const SYNC_FILE_EXTENSION: &str = "sbx";

const SYNC_VERSION: u32 = 1;

/// Export, import, and sync-file handling for one vault.
#[derive(Debug, Clone)]
pub struct SyncEngine {
    storage: StorageHandle,
    crypto: EncryptionService,
    config: SyncConfig,
}

impl SyncEngine {
    pub fn new(storage: StorageHandle, crypto: EncryptionService, config: SyncConfig) -> Self {
        Self {
            storage,
            crypto,
            config,
        }
    }

    /// Make sure this vault has a device id, creating one on first use.
    pub async fn initialize_metadata(&self) -> Result<SyncMetadata, StrongboxError> {
        let guard = self.storage.lock().await;
        ensure_metadata(&*guard).await
    }

    pub async fn device_id(&self) -> Result<Option<String>, StrongboxError> {
        let guard = self.storage.lock().await;
        Ok(guard.sync_metadata().await?.map(|meta| meta.device_id))
    }

    /// Time of the last successful import, if any.
    pub async fn last_sync_time(&self) -> Result<Option<DateTime<Utc>>, StrongboxError> {
        let guard = self.storage.lock().await;
        Ok(guard
            .sync_metadata()
            .await?
            .and_then(|meta| meta.last_sync_timestamp))
    }

    /// Read every owner and entry into a snapshot.
    pub async fn export(&self) -> Result<Snapshot, StrongboxError> {
        let guard = self.storage.lock().await;
        let meta = ensure_metadata(&*guard).await?;
        let owners = guard.owners().await?;
        let entries = guard.entries().await?;
        debug!(
            owners = owners.len(),
            entries = entries.len(),
            "snapshot exported"
        );
        Ok(Snapshot {
            owners,
            entries,
            timestamp: Utc::now().timestamp_millis(),
            device_id: meta.device_id,
        })
    }

    /// Merge a remote snapshot into this vault in one transaction.
    ///
    /// On any failure the transaction is rolled back, local state is left as
    /// it was, and the cause is returned inside [`StrongboxError::Transaction`].
    pub async fn import(&self, snapshot: &Snapshot) -> Result<MergeReport, StrongboxError> {
        let guard = self.storage.lock().await;
        guard.execute(Command::Begin).await?;

        let merged = match self.merge(&*guard, snapshot).await {
            Ok(report) => guard.execute(Command::Commit).await.map(|_| report),
            Err(e) => Err(e),
        };

        match merged {
            Ok(report) => {
                info!(
                    remote_device = %snapshot.device_id,
                    %report,
                    "sync import committed"
                );
                Ok(report)
            }
            Err(e) => {
                if let Err(rollback) = guard.execute(Command::Rollback).await {
                    warn!(error = %rollback, "rollback after failed import also failed");
                }
                warn!(error = %e, "sync import rolled back");
                Err(StrongboxError::transaction(e))
            }
        }
    }

    async fn merge(
        &self,
        storage: &dyn VaultStorage,
        snapshot: &Snapshot,
    ) -> Result<MergeReport, StrongboxError> {
        let mut report = MergeReport::default();

        for remote in &snapshot.owners {
            // Compare at stored precision so every backend decides alike.
            let remote_updated = timestamp::truncate(remote.updated_at);
            match storage.owner_by_name(&remote.name).await? {
                None => {
                    storage
                        .execute(Command::InsertOwner(NewOwner {
                            name: remote.name.clone(),
                            encrypted_payload: remote.encrypted_payload.clone(),
                            created_at: timestamp::truncate(remote.created_at),
                            updated_at: remote_updated,
                        }))
                        .await?;
                    report.owners_inserted += 1;
                }
                Some(local) if remote_updated > local.updated_at => {
                    storage
                        .execute(Command::UpdateOwnerByName {
                            name: remote.name.clone(),
                            encrypted_payload: remote.encrypted_payload.clone(),
                            updated_at: remote_updated,
                        })
                        .await?;
                    report.owners_updated += 1;
                }
                Some(_) => report.owners_unchanged += 1,
            }
        }

        let mut owner_ids: HashMap<RecordId, RecordId> = HashMap::new();
        for remote in &snapshot.owners {
            if let Some(local) = storage.owner_by_name(&remote.name).await? {
                owner_ids.insert(remote.id, local.id);
            }
        }

        for remote in &snapshot.entries {
            let Some(&owner_id) = owner_ids.get(&remote.owner_id) else {
                debug!(
                    remote_entry = remote.id,
                    remote_owner = remote.owner_id,
                    "skipping entry with unknown owner"
                );
                report.entries_skipped += 1;
                continue;
            };

            let remote_updated = timestamp::truncate(remote.updated_at);
            match self.find_local_entry(storage, owner_id, remote).await? {
                None => {
                    storage
                        .execute(Command::InsertEntry(NewEntry {
                            owner_id,
                            fields: remote.fields(),
                            created_at: timestamp::truncate(remote.created_at),
                            updated_at: remote_updated,
                        }))
                        .await?;
                    report.entries_inserted += 1;
                }
                Some(local) if remote_updated > local.updated_at => {
                    storage
                        .execute(Command::UpdateEntry {
                            id: local.id,
                            fields: EntryFields {
                                encrypted_site: local.encrypted_site.clone(),
                                ..remote.fields()
                            },
                            updated_at: remote_updated,
                        })
                        .await?;
                    report.entries_updated += 1;
                }
                Some(_) => report.entries_unchanged += 1,
            }
        }

        let touched = storage
            .execute(Command::TouchLastSync {
                at: timestamp::now(),
            })
            .await?;
        if touched.affected() == 0 {
            let mut meta = new_metadata();
            meta.last_sync_timestamp = Some(timestamp::now());
            storage.execute(Command::PutSyncMetadata(meta)).await?;
        }

        Ok(report)
    }

    /// The local entry of `owner_id` for the remote entry's site.
    ///
    /// Exact ciphertext equality is tried first. Otherwise sites are compared
    /// after decryption; a site that does not decrypt under the current key
    /// never matches.
    async fn find_local_entry(
        &self,
        storage: &dyn VaultStorage,
        owner_id: RecordId,
        remote: &Entry,
    ) -> Result<Option<Entry>, StrongboxError> {
        let exact: Vec<Entry> = storage
            .select_as(Query::EntryByOwnerAndSite {
                owner_id,
                encrypted_site: remote.encrypted_site.clone(),
            })
            .await?;
        if let Some(local) = exact.into_iter().next() {
            return Ok(Some(local));
        }

        let Some(remote_site) = self.try_decrypt(&remote.encrypted_site)? else {
            return Ok(None);
        };
        let mut candidates = storage.entries_by_owner(owner_id).await?;
        candidates.sort_by_key(|entry| entry.id);
        for local in candidates {
            if self.try_decrypt(&local.encrypted_site)?.as_deref() == Some(remote_site.as_str()) {
                return Ok(Some(local));
            }
        }
        Ok(None)
    }

    /// Decrypt a field, mapping undecryptable ciphertext to `None`.
    fn try_decrypt(&self, ciphertext: &str) -> Result<Option<String>, StrongboxError> {
        match self.crypto.decrypt(ciphertext) {
            Ok(plaintext) => Ok(Some(plaintext)),
            Err(StrongboxError::Locked) => Err(StrongboxError::Locked),
            Err(_) => Ok(None),
        }
    }

    /// Export, seal, and write a sync file into `dir`. Returns its path.
    pub async fn save_sync_file(&self, dir: impl AsRef<Path>) -> Result<PathBuf, StrongboxError> {
        let snapshot = self.export().await?;
        let sealed = blob::seal(&self.crypto, &snapshot)?;

        let dir = dir.as_ref();
        tokio::fs::create_dir_all(dir).await?;
        let path = dir.join(format!(
            "{}-{}.{SYNC_FILE_EXTENSION}",
            self.config.file_prefix, snapshot.timestamp
        ));
        tokio::fs::write(&path, sealed).await?;
        info!(
            path = %path.display(),
            owners = snapshot.owners.len(),
            entries = snapshot.entries.len(),
            "sync file written"
        );
        Ok(path)
    }

    /// Write a sync file into the configured export directory.
    pub async fn save_sync_file_default(&self) -> Result<PathBuf, StrongboxError> {
        let dir = PathBuf::from(&self.config.export_dir);
        self.save_sync_file(dir).await
    }

    /// Read, open, and import a sync file.
    pub async fn load_sync_file(&self, path: impl AsRef<Path>) -> Result<MergeReport, StrongboxError> {
        let path = path.as_ref();
        let sealed = tokio::fs::read_to_string(path).await?;
        let snapshot = blob::open(&self.crypto, &sealed)?;
        debug!(
            path = %path.display(),
            remote_device = %snapshot.device_id,
            "sync file opened"
        );
        self.import(&snapshot).await
    }
}

fn new_metadata() -> SyncMetadata {
    SyncMetadata {
        last_sync_timestamp: None,
        device_id: uuid::Uuid::new_v4().to_string(),
        sync_version: SYNC_VERSION,
    }
}

async fn ensure_metadata(storage: &dyn VaultStorage) -> Result<SyncMetadata, StrongboxError> {
    if let Some(meta) = storage.sync_metadata().await? {
        return Ok(meta);
    }
    let meta = new_metadata();
    storage
        .execute(Command::PutSyncMetadata(meta.clone()))
        .await?;
    info!(device_id = %meta.device_id, "sync metadata initialized");
    Ok(meta)
}

/// Human-readable age of the last sync, e.g. `"3 hours ago"`.
pub fn describe_last_sync(last: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    let Some(last) = last else {
        return "Never".to_string();
    };
    let minutes = (now - last).num_minutes();
    let hours = minutes / 60;
    let days = hours / 24;

    let plural = |n: i64, unit: &str| format!("{n} {unit}{} ago", if n > 1 { "s" } else { "" });
    if days > 0 {
        plural(days, "day")
    } else if hours > 0 {
        plural(hours, "hour")
    } else if minutes > 0 {
        plural(minutes, "minute")
    } else {
        "Just now".to_string()
    }
}
