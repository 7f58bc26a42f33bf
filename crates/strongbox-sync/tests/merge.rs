// SPDX-FileCopyrightText: 2026 Strongbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Merge behavior between two vaults unlocked with the same session key.

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;
use strongbox_config::model::SyncConfig;
use strongbox_core::{
    Command, EntryFields, NewEntry, NewOwner, RecordId, Snapshot, StorageHandle, StrongboxError,
    VaultStorage,
};
use strongbox_crypto::{EncryptionService, KeySlot};
use strongbox_storage::{DocumentStorage, SqliteStorage};
use strongbox_sync::{MergeReport, SyncEngine};
use tempfile::TempDir;
use zeroize::Zeroizing;

struct TestVault {
    storage: Arc<dyn VaultStorage>,
    crypto: EncryptionService,
    sync: SyncEngine,
    _dir: Option<TempDir>,
}

#[derive(Debug, Clone, Copy)]
enum Backend {
    Sqlite,
    Document,
}

const BACKENDS: [Backend; 2] = [Backend::Sqlite, Backend::Document];

/// An on-disk vault of the given backend in its own temp dir.
async fn vault_in(backend: Backend, key: u8) -> TestVault {
    let dir = tempfile::tempdir().unwrap();
    let storage: Arc<dyn VaultStorage> = match backend {
        Backend::Sqlite => {
            let path = dir.path().join("vault.db");
            Arc::new(SqliteStorage::at_path(path.to_str().unwrap(), true))
        }
        Backend::Document => Arc::new(DocumentStorage::at_path(dir.path().join("vault.json"))),
    };
    let mut vault = vault_on(storage, key).await;
    vault._dir = Some(dir);
    vault
}

async fn vault_on(storage: Arc<dyn VaultStorage>, key: u8) -> TestVault {
    storage.initialize().await.unwrap();
    let crypto = EncryptionService::new(KeySlot::new());
    crypto.install_session_key(Zeroizing::new([key; 32]));
    let sync = SyncEngine::new(
        StorageHandle::new(storage.clone()),
        crypto.clone(),
        SyncConfig::default(),
    );
    TestVault {
        storage,
        crypto,
        sync,
        _dir: None,
    }
}

async fn vault(key: u8) -> TestVault {
    vault_on(Arc::new(DocumentStorage::in_memory()), key).await
}

fn at(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
}

impl TestVault {
    async fn owner(&self, name: &str, updated: DateTime<Utc>) -> RecordId {
        self.storage
            .execute(Command::InsertOwner(NewOwner {
                name: name.to_string(),
                encrypted_payload: self
                    .crypto
                    .encrypt_object(&serde_json::json!({ "name": name }))
                    .unwrap(),
                created_at: at(0),
                updated_at: updated,
            }))
            .await
            .unwrap()
            .inserted_id()
            .unwrap()
    }

    async fn entry(&self, owner_id: RecordId, site: &str, password: &str, updated: DateTime<Utc>) {
        self.storage
            .execute(Command::InsertEntry(NewEntry {
                owner_id,
                fields: EntryFields {
                    encrypted_site: self.crypto.encrypt(site).unwrap(),
                    encrypted_username: self.crypto.encrypt("user").unwrap(),
                    encrypted_email: self.crypto.encrypt("user@example.com").unwrap(),
                    encrypted_password: self.crypto.encrypt(password).unwrap(),
                },
                created_at: at(0),
                updated_at: updated,
            }))
            .await
            .unwrap();
    }

    /// `(owner name, site, password)` triples, sorted.
    async fn contents(&self) -> Vec<(String, String, String)> {
        let mut rows = Vec::new();
        for owner in self.storage.owners().await.unwrap() {
            for entry in self.storage.entries_by_owner(owner.id).await.unwrap() {
                rows.push((
                    owner.name.clone(),
                    self.crypto.decrypt(&entry.encrypted_site).unwrap(),
                    self.crypto.decrypt(&entry.encrypted_password).unwrap(),
                ));
            }
        }
        rows.sort();
        rows
    }
}

#[tokio::test]
async fn import_into_empty_vault_copies_everything() {
    let a = vault(9).await;
    let alice = a.owner("Alice", at(0)).await;
    a.entry(alice, "example.com", "pw1", at(0)).await;
    a.entry(alice, "other.org", "pw2", at(0)).await;

    let b = vault(9).await;
    let report = b.sync.import(&a.sync.export().await.unwrap()).await.unwrap();
    assert_eq!(report.owners_inserted, 1);
    assert_eq!(report.entries_inserted, 2);
    assert_eq!(b.contents().await, a.contents().await);
    assert!(b.sync.last_sync_time().await.unwrap().is_some());
}

#[tokio::test]
async fn import_is_idempotent() {
    let a = vault(9).await;
    let alice = a.owner("Alice", at(0)).await;
    a.entry(alice, "example.com", "pw", at(0)).await;
    let snapshot = a.sync.export().await.unwrap();

    for backend in BACKENDS {
        let b = vault_in(backend, 9).await;
        b.sync.import(&snapshot).await.unwrap();
        let once = b.contents().await;

        let report = b.sync.import(&snapshot).await.unwrap();
        assert_eq!(
            report,
            MergeReport {
                owners_unchanged: 1,
                entries_unchanged: 1,
                ..Default::default()
            },
            "{backend:?}"
        );
        assert_eq!(b.contents().await, once);
        assert_eq!(b.storage.entries().await.unwrap().len(), 1);
    }
}

#[tokio::test]
async fn sub_millisecond_timestamps_import_once_on_every_backend() {
    let a = vault(9).await;
    let alice = a.owner("Alice", at(0)).await;
    a.entry(alice, "example.com", "pw", at(0)).await;
    let mut snapshot = a.sync.export().await.unwrap();
    let fine = at(0) + Duration::microseconds(500);
    snapshot.owners[0].updated_at = fine;
    snapshot.entries[0].updated_at = fine;

    // Also through the wire format, where the extra digits are text.
    let json = serde_json::to_string(&snapshot)
        .unwrap()
        .replace(".000Z", ".000500Z");
    assert!(json.contains(".000500Z"));
    let parsed: Snapshot = serde_json::from_str(&json).unwrap();

    for backend in BACKENDS {
        for remote in [&snapshot, &parsed] {
            let b = vault_in(backend, 9).await;
            b.sync.import(remote).await.unwrap();
            let second = b.sync.import(remote).await.unwrap();
            assert_eq!(
                (second.owners_updated, second.entries_updated),
                (0, 0),
                "{backend:?}"
            );
            assert_eq!(second.owners_unchanged, 1, "{backend:?}");
            assert_eq!(second.entries_unchanged, 1, "{backend:?}");
        }
    }
}

#[tokio::test]
async fn unwritable_commit_leaves_document_vault_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    let sub = dir.path().join("sub");
    let b = vault_on(Arc::new(DocumentStorage::at_path(sub.join("vault.json"))), 9).await;
    b.owner("Existing", at(0)).await;

    let a = vault(9).await;
    let alice = a.owner("Alice", at(0)).await;
    a.entry(alice, "example.com", "pw", at(0)).await;
    let snapshot = a.sync.export().await.unwrap();

    std::fs::remove_dir_all(&sub).unwrap();
    let err = b.sync.import(&snapshot).await.unwrap_err();
    assert!(matches!(err, StrongboxError::Transaction { .. }), "got {err}");

    let names: Vec<String> = b
        .storage
        .owners()
        .await
        .unwrap()
        .into_iter()
        .map(|o| o.name)
        .collect();
    assert_eq!(names, ["Existing"]);
    assert!(b.storage.entries().await.unwrap().is_empty());

    // The failed commit left no transaction behind.
    std::fs::create_dir_all(&sub).unwrap();
    let report = b.sync.import(&snapshot).await.unwrap();
    assert_eq!(report.owners_inserted, 1);
}

#[tokio::test]
async fn owner_ids_are_remapped_by_name() {
    let a = vault(9).await;
    a.owner("Padding", at(0)).await;
    let bob_remote = a.owner("Bob", at(0)).await;
    a.entry(bob_remote, "bank.example", "secret", at(0)).await;
    let snapshot = a.sync.export().await.unwrap();

    for backend in BACKENDS {
        let b = vault_in(backend, 9).await;
        let bob_local = b.owner("Bob", at(0)).await;
        assert_ne!(bob_local, bob_remote);

        b.sync.import(&snapshot).await.unwrap();
        let entries = b.storage.entries_by_owner(bob_local).await.unwrap();
        assert_eq!(entries.len(), 1, "{backend:?}");
    }
}

#[tokio::test]
async fn entries_of_unknown_owners_are_skipped() {
    let a = vault(9).await;
    let alice = a.owner("Alice", at(0)).await;
    a.entry(alice, "example.com", "pw", at(0)).await;
    let mut snapshot = a.sync.export().await.unwrap();
    snapshot.owners.clear();

    let b = vault(9).await;
    let report = b.sync.import(&snapshot).await.unwrap();
    assert_eq!(report.entries_skipped, 1);
    assert!(b.storage.entries().await.unwrap().is_empty());
}

#[tokio::test]
async fn newer_owner_payload_wins() {
    let a = vault(9).await;
    a.owner("Alice", at(100)).await;
    let snapshot = a.sync.export().await.unwrap();

    for backend in BACKENDS {
        let b = vault_in(backend, 9).await;
        b.owner("Alice", at(50)).await;

        let report = b.sync.import(&snapshot).await.unwrap();
        assert_eq!(report.owners_updated, 1, "{backend:?}");
        let owner = b.storage.owner_by_name("Alice").await.unwrap().unwrap();
        assert_eq!(owner.updated_at, at(100));
    }
}

#[tokio::test]
async fn foreign_key_sites_never_match() {
    // Same plaintext under another key cannot be recognized as the same site.
    let a = vault(1).await;
    let alice = a.owner("Alice", at(0)).await;
    a.entry(alice, "example.com", "pw", at(0)).await;

    let b = vault(2).await;
    let alice_b = b.owner("Alice", at(0)).await;
    b.entry(alice_b, "example.com", "pw", at(0)).await;

    let report = b.sync.import(&a.sync.export().await.unwrap()).await.unwrap();
    assert_eq!(report.entries_inserted, 1);
    assert_eq!(b.storage.entries().await.unwrap().len(), 2);
}

#[tokio::test]
async fn failed_import_rolls_back() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("vault.db");
    let b = vault_on(
        Arc::new(SqliteStorage::at_path(path.to_str().unwrap(), true)),
        9,
    )
    .await;
    b.owner("Existing", at(0)).await;

    let a = vault(9).await;
    let alice = a.owner("Alice", at(0)).await;
    a.entry(alice, "example.com", "pw", at(0)).await;
    let snapshot = a.sync.export().await.unwrap();

    // Lock the importing vault: site matching needs the key, so the merge
    // fails after the owner insert.
    b.crypto.clear_session_key();
    let err = b.sync.import(&snapshot).await.unwrap_err();
    match err {
        StrongboxError::Transaction { source } => {
            assert!(matches!(
                source.downcast_ref::<StrongboxError>(),
                Some(StrongboxError::Locked)
            ));
        }
        other => panic!("expected a transaction error, got {other}"),
    }

    let names: Vec<String> = b
        .storage
        .owners()
        .await
        .unwrap()
        .into_iter()
        .map(|o| o.name)
        .collect();
    assert_eq!(names, ["Existing"]);
    assert!(b.sync.last_sync_time().await.unwrap().is_none());
}

#[tokio::test]
async fn sync_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let a = vault(9).await;
    let alice = a.owner("Alice", at(0)).await;
    a.entry(alice, "example.com", "pw", at(0)).await;

    let path = a.sync.save_sync_file(dir.path()).await.unwrap();
    let file_name = path.file_name().unwrap().to_str().unwrap().to_string();
    assert!(file_name.starts_with("strongbox-sync-"));
    assert!(file_name.ends_with(".sbx"));

    let b = vault(9).await;
    let report = b.sync.load_sync_file(&path).await.unwrap();
    assert_eq!(report.entries_inserted, 1);
    assert_eq!(b.contents().await, a.contents().await);

    let stranger = vault(3).await;
    assert!(stranger.sync.load_sync_file(&path).await.is_err());
}

#[tokio::test]
async fn export_creates_device_id_once() {
    let a = vault(9).await;
    assert!(a.sync.device_id().await.unwrap().is_none());
    let first: Snapshot = a.sync.export().await.unwrap();
    let second = a.sync.export().await.unwrap();
    assert_eq!(first.device_id, second.device_id);
    assert_eq!(a.sync.device_id().await.unwrap(), Some(first.device_id));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn last_write_wins(t1 in -1_000i64..1_000, t2 in -1_000i64..1_000) {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        let outcomes = rt.block_on(async {
            let mut outcomes = Vec::new();
            for backend in BACKENDS {
                let local = vault_in(backend, 9).await;
                let alice = local.owner("Alice", at(0)).await;
                local.entry(alice, "example.com", "local-pw", at(t1)).await;

                let remote = vault(9).await;
                let alice_r = remote.owner("Alice", at(0)).await;
                remote.entry(alice_r, "example.com", "remote-pw", at(t2)).await;

                local.sync.import(&remote.sync.export().await.unwrap()).await.unwrap();
                let entries = local.storage.entries().await.unwrap();
                assert_eq!(entries.len(), 1);
                outcomes.push((
                    local.crypto.decrypt(&entries[0].encrypted_password).unwrap(),
                    entries[0].updated_at,
                ));
            }
            outcomes
        });

        for (password, updated) in outcomes {
            if t2 > t1 {
                prop_assert_eq!(password, "remote-pw");
                prop_assert_eq!(updated, at(t2));
            } else {
                prop_assert_eq!(password, "local-pw");
                prop_assert_eq!(updated, at(t1));
            }
        }
    }
}
