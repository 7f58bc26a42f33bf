// SPDX-FileCopyrightText: 2026 Strongbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Full-stack vault scenarios on real on-disk backends.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use strongbox_config::model::{StorageBackend, StrongboxConfig};
use strongbox_core::Command;
use strongbox_vault::{EntryInput, Vault};
use tempfile::TempDir;

fn secret(s: &str) -> SecretString {
    SecretString::from(s.to_string())
}

fn config(dir: &TempDir, backend: StorageBackend) -> StrongboxConfig {
    let mut config = StrongboxConfig::default();
    config.storage.backend = backend;
    config.storage.database_path = dir.path().join("vault.db").to_string_lossy().into_owned();
    config.storage.document_path = dir.path().join("vault.json").to_string_lossy().into_owned();
    config.sync.export_dir = dir.path().join("exports").to_string_lossy().into_owned();
    config
}

fn input(site: &str, username: &str, password: &str) -> EntryInput {
    EntryInput {
        site: site.to_string(),
        username: username.to_string(),
        email: String::new(),
        password: secret(password),
    }
}

/// Open vault B with a copy of vault A's master credential and unlock both.
async fn paired_vaults(
    a_dir: &TempDir,
    a_backend: StorageBackend,
    b_dir: &TempDir,
    b_backend: StorageBackend,
) -> (Vault, Vault) {
    let a = Vault::open(&config(a_dir, a_backend)).await.unwrap();
    a.auth().create_master_credential(&secret("shared")).await.unwrap();

    let credential = a
        .storage()
        .lock()
        .await
        .master_credential()
        .await
        .unwrap()
        .unwrap();
    let b = Vault::open(&config(b_dir, b_backend)).await.unwrap();
    b.storage()
        .lock()
        .await
        .execute(Command::PutMasterCredential(credential))
        .await
        .unwrap();
    assert!(b.auth().login(&secret("shared")).await.unwrap());
    (a, b)
}

async fn alice_scenario(a_backend: StorageBackend, b_backend: StorageBackend) {
    let (a_dir, b_dir) = (tempfile::tempdir().unwrap(), tempfile::tempdir().unwrap());
    let (a, b) = paired_vaults(&a_dir, a_backend, &b_dir, b_backend).await;

    let alice_a = a.create_owner("Alice").await.unwrap();
    a.add_entry(alice_a.id, &input("example.com", "a", "x1"))
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_millis(20)).await;

    let alice_b = b.create_owner("Alice").await.unwrap();
    b.add_entry(alice_b.id, &input("example.com", "a", "x2"))
        .await
        .unwrap();

    let path = b.sync().save_sync_file_default().await.unwrap();
    let report = a.sync().load_sync_file(&path).await.unwrap();
    assert_eq!(report.entries_updated, 1);

    let owners = a.list_owners().await.unwrap();
    assert_eq!(owners.len(), 1);
    assert_eq!(owners[0].name, "Alice");

    let entries = a.list_entries(owners[0].id).await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].site, "example.com");
    assert_eq!(entries[0].password.expose_secret(), "x2");
    assert!(a.sync().last_sync_time().await.unwrap().is_some());
}

#[tokio::test]
async fn alice_scenario_sqlite() {
    alice_scenario(StorageBackend::Sqlite, StorageBackend::Sqlite).await;
}

#[tokio::test]
async fn alice_scenario_document() {
    alice_scenario(StorageBackend::Document, StorageBackend::Document).await;
}

#[tokio::test]
async fn alice_scenario_across_backends() {
    alice_scenario(StorageBackend::Document, StorageBackend::Sqlite).await;
}

#[tokio::test]
async fn entries_survive_reopen_and_relogin() {
    let dir = tempfile::tempdir().unwrap();
    {
        let vault = Vault::open(&config(&dir, StorageBackend::Sqlite)).await.unwrap();
        vault.auth().create_master_credential(&secret("pw")).await.unwrap();
        let owner = vault.create_owner("Bob").await.unwrap();
        vault
            .add_entry(owner.id, &input("bank.example", "bob", "s3cret"))
            .await
            .unwrap();
        vault.close().await.unwrap();
    }

    let vault = Vault::open(&config(&dir, StorageBackend::Sqlite)).await.unwrap();
    assert!(!vault.auth().login(&secret("wrong")).await.unwrap());
    assert!(vault.auth().login(&secret("pw")).await.unwrap());
    let owner = vault.owner_by_name("Bob").await.unwrap();
    let found = vault.search_entries(owner.id, "BANK").await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].password.expose_secret(), "s3cret");
    assert!(vault.search_entries(owner.id, "nothing").await.unwrap().is_empty());
}

#[tokio::test]
async fn recovery_reset_wipes_vault_data() {
    let dir = tempfile::tempdir().unwrap();
    let vault = Vault::open(&config(&dir, StorageBackend::Document)).await.unwrap();
    vault.auth().create_master_credential(&secret("old")).await.unwrap();
    vault
        .recovery()
        .save_recovery_question(1, &secret("Rex"))
        .await
        .unwrap();
    let owner = vault.create_owner("Alice").await.unwrap();
    vault
        .add_entry(owner.id, &input("example.com", "a", "x"))
        .await
        .unwrap();

    assert!(
        vault
            .recovery()
            .reset_master_credential(&secret(" rex "), &secret("new"))
            .await
            .unwrap()
    );
    assert!(!vault.auth().is_authenticated());
    assert!(vault.auth().login(&secret("new")).await.unwrap());
    assert!(vault.list_owners().await.unwrap().is_empty());
}

#[tokio::test]
async fn deleting_owner_removes_its_entries() {
    let dir = tempfile::tempdir().unwrap();
    let vault = Vault::open(&config(&dir, StorageBackend::Sqlite)).await.unwrap();
    vault.auth().create_master_credential(&secret("pw")).await.unwrap();
    let owner = vault.create_owner("Carol").await.unwrap();
    let id = vault
        .add_entry(owner.id, &input("mail.example", "carol", "pw"))
        .await
        .unwrap();

    vault.delete_owner(owner.id).await.unwrap();
    assert!(vault.get_entry(id).await.is_err());
}
