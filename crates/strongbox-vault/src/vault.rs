// SPDX-FileCopyrightText: 2026 Strongbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Vault lifecycle and owner/entry operations.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use strongbox_auth::{AuthSession, RecoveryService};
use strongbox_config::model::StrongboxConfig;
use strongbox_core::{
    Command, HealthStatus, NewEntry, NewOwner, Owner, RecordId, StorageHandle, StrongboxError,
    VaultStorage, timestamp,
};
use strongbox_crypto::{EncryptionService, KeySlot};
use strongbox_storage::open_storage;
use strongbox_sync::SyncEngine;

use crate::entry::{DecryptedEntry, EntryInput};

/// Plaintext of an owner's encrypted payload.
#[derive(Debug, Serialize, Deserialize)]
struct OwnerPayload {
    name: String,
}

/// An opened vault.
///
/// Owner and entry operations need an unlocked session and count as
/// activity for the inactivity timeout.
pub struct Vault {
    storage: StorageHandle,
    crypto: EncryptionService,
    auth: AuthSession,
    recovery: RecoveryService,
    sync: SyncEngine,
}

impl std::fmt::Debug for Vault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Vault")
            .field("backend", &self.storage.backend_name())
            .field("unlocked", &self.crypto.is_unlocked())
            .finish()
    }
}

impl Vault {
    /// Open the backend selected by `config` and prepare sync metadata.
    pub async fn open(config: &StrongboxConfig) -> Result<Self, StrongboxError> {
        Self::with_storage(open_storage(&config.storage), config).await
    }

    /// Open a vault on an explicit, not yet initialized backend.
    pub async fn with_storage(
        storage: Arc<dyn VaultStorage>,
        config: &StrongboxConfig,
    ) -> Result<Self, StrongboxError> {
        storage.initialize().await?;
        let backend = storage.name().to_string();

        let storage = StorageHandle::new(storage);
        let crypto = EncryptionService::new(KeySlot::new());
        let auth = AuthSession::new(storage.clone(), crypto.clone(), &config.session);
        let recovery = RecoveryService::new(storage.clone(), auth.clone());
        let sync = SyncEngine::new(storage.clone(), crypto.clone(), config.sync.clone());
        sync.initialize_metadata().await?;

        info!(backend = %backend, "vault opened");
        Ok(Self {
            storage,
            crypto,
            auth,
            recovery,
            sync,
        })
    }

    pub fn auth(&self) -> &AuthSession {
        &self.auth
    }

    pub fn recovery(&self) -> &RecoveryService {
        &self.recovery
    }

    pub fn sync(&self) -> &SyncEngine {
        &self.sync
    }

    pub fn storage(&self) -> &StorageHandle {
        &self.storage
    }

    pub fn backend_name(&self) -> &str {
        self.storage.backend_name()
    }

    pub async fn health_check(&self) -> Result<HealthStatus, StrongboxError> {
        self.storage.lock().await.health_check().await
    }

    /// Lock the session and flush the backend.
    pub async fn close(&self) -> Result<(), StrongboxError> {
        self.auth.logout();
        self.storage.lock().await.close().await?;
        debug!("vault closed");
        Ok(())
    }

    /// Fail with `Locked` unless the session is unlocked, and record activity.
    pub fn touch(&self) -> Result<(), StrongboxError> {
        if !self.crypto.is_unlocked() {
            return Err(StrongboxError::Locked);
        }
        self.auth.update_activity();
        Ok(())
    }

    /// All owners ordered by name.
    pub async fn list_owners(&self) -> Result<Vec<Owner>, StrongboxError> {
        self.touch()?;
        self.storage.lock().await.owners().await
    }

    pub async fn create_owner(&self, name: &str) -> Result<Owner, StrongboxError> {
        self.touch()?;
        let encrypted_payload = self.crypto.encrypt_object(&OwnerPayload {
            name: name.to_string(),
        })?;
        let now = timestamp::now();

        let guard = self.storage.lock().await;
        let id = guard
            .execute(Command::InsertOwner(NewOwner {
                name: name.to_string(),
                encrypted_payload,
                created_at: now,
                updated_at: now,
            }))
            .await?
            .inserted_id()?;
        let owner = guard
            .owner_by_id(id)
            .await?
            .ok_or_else(|| StrongboxError::Internal(format!("owner {id} vanished after insert")))?;
        info!(owner_id = id, "owner created");
        Ok(owner)
    }

    /// Delete an owner and all of its entries.
    pub async fn delete_owner(&self, id: RecordId) -> Result<(), StrongboxError> {
        self.touch()?;
        let affected = self
            .storage
            .lock()
            .await
            .execute(Command::DeleteOwner { id })
            .await?
            .affected();
        if affected == 0 {
            return Err(StrongboxError::NotFound(format!("owner {id}")));
        }
        info!(owner_id = id, "owner deleted");
        Ok(())
    }

    /// Resolve an owner by name.
    pub async fn owner_by_name(&self, name: &str) -> Result<Owner, StrongboxError> {
        self.touch()?;
        self.storage
            .lock()
            .await
            .owner_by_name(name)
            .await?
            .ok_or_else(|| StrongboxError::NotFound(format!("owner `{name}`")))
    }

    /// Decrypted entries of one owner, newest first.
    pub async fn list_entries(&self, owner_id: RecordId) -> Result<Vec<DecryptedEntry>, StrongboxError> {
        self.touch()?;
        let entries = self.storage.lock().await.entries_by_owner(owner_id).await?;
        entries
            .into_iter()
            .map(|entry| DecryptedEntry::open(entry, &self.crypto))
            .collect()
    }

    pub async fn get_entry(&self, id: RecordId) -> Result<DecryptedEntry, StrongboxError> {
        self.touch()?;
        let entry = self
            .storage
            .lock()
            .await
            .entry_by_id(id)
            .await?
            .ok_or_else(|| StrongboxError::NotFound(format!("entry {id}")))?;
        DecryptedEntry::open(entry, &self.crypto)
    }

    pub async fn add_entry(
        &self,
        owner_id: RecordId,
        input: &EntryInput,
    ) -> Result<RecordId, StrongboxError> {
        self.touch()?;
        let fields = input.seal(&self.crypto)?;
        let now = timestamp::now();

        let guard = self.storage.lock().await;
        if guard.owner_by_id(owner_id).await?.is_none() {
            return Err(StrongboxError::NotFound(format!("owner {owner_id}")));
        }
        let id = guard
            .execute(Command::InsertEntry(NewEntry {
                owner_id,
                fields,
                created_at: now,
                updated_at: now,
            }))
            .await?
            .inserted_id()?;
        info!(owner_id, entry_id = id, "entry added");
        Ok(id)
    }

    /// Replace every field of an entry.
    ///
    /// The new `updated_at` never moves backwards, even if the clock does.
    pub async fn update_entry(&self, id: RecordId, input: &EntryInput) -> Result<(), StrongboxError> {
        self.touch()?;
        let fields = input.seal(&self.crypto)?;

        let guard = self.storage.lock().await;
        let previous = guard
            .entry_by_id(id)
            .await?
            .ok_or_else(|| StrongboxError::NotFound(format!("entry {id}")))?;
        let updated_at = timestamp::now().max(previous.updated_at);
        guard
            .execute(Command::UpdateEntry {
                id,
                fields,
                updated_at,
            })
            .await?;
        info!(entry_id = id, "entry updated");
        Ok(())
    }

    pub async fn delete_entry(&self, id: RecordId) -> Result<(), StrongboxError> {
        self.touch()?;
        let affected = self
            .storage
            .lock()
            .await
            .execute(Command::DeleteEntry { id })
            .await?
            .affected();
        if affected == 0 {
            return Err(StrongboxError::NotFound(format!("entry {id}")));
        }
        info!(entry_id = id, "entry deleted");
        Ok(())
    }

    /// Entries of one owner whose site, username, or email contains `query`,
    /// ignoring case. A blank query returns every entry.
    pub async fn search_entries(
        &self,
        owner_id: RecordId,
        query: &str,
    ) -> Result<Vec<DecryptedEntry>, StrongboxError> {
        let entries = self.list_entries(owner_id).await?;
        Ok(entries.into_iter().filter(|e| e.matches(query)).collect())
    }

    /// Decrypt an owner's payload and return the name it holds.
    pub fn owner_display_name(&self, owner: &Owner) -> Result<String, StrongboxError> {
        let payload: OwnerPayload = self.crypto.decrypt_object(&owner.encrypted_payload)?;
        Ok(payload.name)
    }
}

#[cfg(test)]
mod tests {
    use secrecy::SecretString;
    use strongbox_storage::DocumentStorage;

    use super::*;

    async fn unlocked_vault() -> Vault {
        let vault = Vault::with_storage(
            Arc::new(DocumentStorage::in_memory()),
            &StrongboxConfig::default(),
        )
        .await
        .unwrap();
        vault
            .auth()
            .create_master_credential(&SecretString::from("master".to_string()))
            .await
            .unwrap();
        vault
    }

    fn input(site: &str, password: &str) -> EntryInput {
        EntryInput {
            site: site.to_string(),
            username: "me".to_string(),
            email: "me@example.com".to_string(),
            password: SecretString::from(password.to_string()),
        }
    }

    #[tokio::test]
    async fn locked_vault_refuses_operations() {
        let vault = unlocked_vault().await;
        vault.auth().logout();
        assert!(matches!(
            vault.list_owners().await,
            Err(StrongboxError::Locked)
        ));
        assert!(matches!(
            vault.create_owner("Alice").await,
            Err(StrongboxError::Locked)
        ));
    }

    #[tokio::test]
    async fn owner_payload_round_trips() {
        let vault = unlocked_vault().await;
        let owner = vault.create_owner("Alice").await.unwrap();
        assert_eq!(vault.owner_display_name(&owner).unwrap(), "Alice");
        assert!(!owner.encrypted_payload.contains("Alice"));
    }

    #[tokio::test]
    async fn entry_for_missing_owner_is_not_found() {
        let vault = unlocked_vault().await;
        assert!(matches!(
            vault.add_entry(42, &input("site", "pw")).await,
            Err(StrongboxError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn update_never_moves_timestamp_backwards() {
        let vault = unlocked_vault().await;
        let owner = vault.create_owner("Alice").await.unwrap();
        let id = vault.add_entry(owner.id, &input("site", "one")).await.unwrap();

        // Push the stored timestamp into the future, as a merge from a device
        // with a fast clock would.
        let future = timestamp::now() + chrono::Duration::hours(1);
        let stored = vault.storage().lock().await.entry_by_id(id).await.unwrap().unwrap();
        vault
            .storage()
            .lock()
            .await
            .execute(Command::UpdateEntry {
                id,
                fields: stored.fields(),
                updated_at: future,
            })
            .await
            .unwrap();

        vault.update_entry(id, &input("site", "two")).await.unwrap();
        let entry = vault.get_entry(id).await.unwrap();
        assert_eq!(entry.updated_at, future);
    }

    #[tokio::test]
    async fn deleting_missing_records_is_not_found() {
        let vault = unlocked_vault().await;
        assert!(matches!(
            vault.delete_owner(7).await,
            Err(StrongboxError::NotFound(_))
        ));
        assert!(matches!(
            vault.delete_entry(7).await,
            Err(StrongboxError::NotFound(_))
        ));
    }
}
