// SPDX-FileCopyrightText: 2026 Strongbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Object stores and secondary indexes of the document engine.
//!
//! The engine has no schema-level constraints, so uniqueness of owner names,
//! entry-to-owner references, and the owner delete cascade are enforced here
//! by hand.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strongbox_core::{
    Entry, MasterCredential, NewEntry, NewOwner, Owner, RecordId, RecoveryQuestion,
    StrongboxError, SyncMetadata, timestamp,
};

/// An auto-incrementing keyed collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectStore<T> {
    next_id: RecordId,
    records: BTreeMap<RecordId, T>,
}

impl<T> Default for ObjectStore<T> {
    fn default() -> Self {
        Self {
            next_id: 1,
            records: BTreeMap::new(),
        }
    }
}

impl<T> ObjectStore<T> {
    fn allocate_id(&mut self) -> RecordId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn get(&self, id: RecordId) -> Option<&T> {
        self.records.get(&id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.records.values()
    }
}

/// Everything one document vault holds.
///
/// Indexes are derived data: they are skipped on disk and rebuilt on load.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentState {
    #[serde(default)]
    master_password: Option<MasterCredential>,
    #[serde(default)]
    security_question: Option<RecoveryQuestion>,
    #[serde(default)]
    sync_metadata: Option<SyncMetadata>,
    #[serde(default)]
    password_owners: ObjectStore<Owner>,
    #[serde(default)]
    password_entries: ObjectStore<Entry>,
    /// `password_owners` by-name unique index.
    #[serde(skip)]
    name_index: BTreeMap<String, RecordId>,
    /// `password_entries` by-owner index.
    #[serde(skip)]
    owner_index: BTreeMap<RecordId, BTreeSet<RecordId>>,
}

impl DocumentState {
    /// Recompute secondary indexes after deserialization.
    pub fn rebuild_indexes(&mut self) {
        self.name_index = self
            .password_owners
            .records
            .values()
            .map(|owner| (owner.name.clone(), owner.id))
            .collect();
        self.owner_index.clear();
        for entry in self.password_entries.records.values() {
            self.owner_index
                .entry(entry.owner_id)
                .or_default()
                .insert(entry.id);
        }
    }

    pub fn master_credential(&self) -> Option<&MasterCredential> {
        self.master_password.as_ref()
    }

    pub fn put_master_credential(&mut self, credential: MasterCredential) {
        self.master_password = Some(credential);
    }

    pub fn recovery_question(&self) -> Option<&RecoveryQuestion> {
        self.security_question.as_ref()
    }

    pub fn put_recovery_question(&mut self, question: RecoveryQuestion) {
        self.security_question = Some(question);
    }

    pub fn sync_metadata(&self) -> Option<&SyncMetadata> {
        self.sync_metadata.as_ref()
    }

    pub fn put_sync_metadata(&mut self, meta: SyncMetadata) {
        self.sync_metadata = Some(meta);
    }

    /// Returns 0 when no metadata exists.
    pub fn touch_last_sync(&mut self, at: DateTime<Utc>) -> usize {
        match self.sync_metadata.as_mut() {
            Some(meta) => {
                meta.last_sync_timestamp = Some(timestamp::truncate(at));
                1
            }
            None => 0,
        }
    }

    pub fn insert_owner(&mut self, owner: NewOwner) -> Result<RecordId, StrongboxError> {
        if self.name_index.contains_key(&owner.name) {
            return Err(StrongboxError::Conflict(format!(
                "duplicate record: owner name `{}` already exists",
                owner.name
            )));
        }
        let id = self.password_owners.allocate_id();
        self.name_index.insert(owner.name.clone(), id);
        self.password_owners.records.insert(
            id,
            Owner {
                id,
                name: owner.name,
                encrypted_payload: owner.encrypted_payload,
                created_at: timestamp::truncate(owner.created_at),
                updated_at: timestamp::truncate(owner.updated_at),
            },
        );
        Ok(id)
    }

    pub fn update_owner(
        &mut self,
        id: RecordId,
        encrypted_payload: String,
        updated_at: DateTime<Utc>,
    ) -> usize {
        match self.password_owners.records.get_mut(&id) {
            Some(owner) => {
                owner.encrypted_payload = encrypted_payload;
                owner.updated_at = timestamp::truncate(updated_at);
                1
            }
            None => 0,
        }
    }

    pub fn owner_by_name(&self, name: &str) -> Option<&Owner> {
        self.name_index
            .get(name)
            .and_then(|id| self.password_owners.get(*id))
    }

    pub fn owner_id_by_name(&self, name: &str) -> Option<RecordId> {
        self.name_index.get(name).copied()
    }

    pub fn owner(&self, id: RecordId) -> Option<&Owner> {
        self.password_owners.get(id)
    }

    /// Owners ordered by name, matching the by-name index order.
    pub fn owners(&self) -> Vec<Owner> {
        self.name_index
            .values()
            .filter_map(|id| self.password_owners.get(*id))
            .cloned()
            .collect()
    }

    /// Delete an owner and cascade to its entries.
    pub fn delete_owner(&mut self, id: RecordId) -> usize {
        let Some(owner) = self.password_owners.records.remove(&id) else {
            return 0;
        };
        self.name_index.remove(&owner.name);
        if let Some(entry_ids) = self.owner_index.remove(&id) {
            for entry_id in entry_ids {
                self.password_entries.records.remove(&entry_id);
            }
        }
        1
    }

    /// Delete every owner and every entry. Id counters keep counting.
    pub fn delete_all_owners(&mut self) -> usize {
        let removed = self.password_owners.len();
        self.password_owners.records.clear();
        self.password_entries.records.clear();
        self.name_index.clear();
        self.owner_index.clear();
        removed
    }

    pub fn insert_entry(&mut self, entry: NewEntry) -> Result<RecordId, StrongboxError> {
        if self.password_owners.get(entry.owner_id).is_none() {
            return Err(StrongboxError::Conflict(format!(
                "referenced record missing: owner {} does not exist",
                entry.owner_id
            )));
        }
        let id = self.password_entries.allocate_id();
        self.owner_index
            .entry(entry.owner_id)
            .or_default()
            .insert(id);
        self.password_entries.records.insert(
            id,
            Entry {
                id,
                owner_id: entry.owner_id,
                encrypted_site: entry.fields.encrypted_site,
                encrypted_username: entry.fields.encrypted_username,
                encrypted_email: entry.fields.encrypted_email,
                encrypted_password: entry.fields.encrypted_password,
                created_at: timestamp::truncate(entry.created_at),
                updated_at: timestamp::truncate(entry.updated_at),
            },
        );
        Ok(id)
    }

    pub fn update_entry(
        &mut self,
        id: RecordId,
        fields: strongbox_core::EntryFields,
        updated_at: DateTime<Utc>,
    ) -> usize {
        match self.password_entries.records.get_mut(&id) {
            Some(entry) => {
                entry.encrypted_site = fields.encrypted_site;
                entry.encrypted_username = fields.encrypted_username;
                entry.encrypted_email = fields.encrypted_email;
                entry.encrypted_password = fields.encrypted_password;
                entry.updated_at = timestamp::truncate(updated_at);
                1
            }
            None => 0,
        }
    }

    pub fn delete_entry(&mut self, id: RecordId) -> usize {
        let Some(entry) = self.password_entries.records.remove(&id) else {
            return 0;
        };
        if let Some(ids) = self.owner_index.get_mut(&entry.owner_id) {
            ids.remove(&id);
            if ids.is_empty() {
                self.owner_index.remove(&entry.owner_id);
            }
        }
        1
    }

    pub fn entry(&self, id: RecordId) -> Option<&Entry> {
        self.password_entries.get(id)
    }

    pub fn entries(&self) -> Vec<Entry> {
        self.password_entries.values().cloned().collect()
    }

    /// Entries of one owner, newest first.
    pub fn entries_by_owner(&self, owner_id: RecordId) -> Vec<Entry> {
        let mut entries: Vec<Entry> = self
            .owner_index
            .get(&owner_id)
            .into_iter()
            .flatten()
            .filter_map(|id| self.password_entries.get(*id))
            .cloned()
            .collect();
        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strongbox_core::{EntryFields, timestamp};

    fn new_owner(name: &str) -> NewOwner {
        let now = timestamp::now();
        NewOwner {
            name: name.into(),
            encrypted_payload: format!("payload-{name}"),
            created_at: now,
            updated_at: now,
        }
    }

    fn new_entry(owner_id: RecordId, site: &str) -> NewEntry {
        let now = timestamp::now();
        NewEntry {
            owner_id,
            fields: EntryFields {
                encrypted_site: site.into(),
                encrypted_username: "u".into(),
                encrypted_email: "e".into(),
                encrypted_password: "p".into(),
            },
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn indexes_survive_a_json_round_trip() {
        let mut state = DocumentState::default();
        let alice = state.insert_owner(new_owner("Alice")).unwrap();
        state.insert_entry(new_entry(alice, "site")).unwrap();

        let json = serde_json::to_string(&state).unwrap();
        let mut loaded: DocumentState = serde_json::from_str(&json).unwrap();
        loaded.rebuild_indexes();

        assert_eq!(loaded.owner_id_by_name("Alice"), Some(alice));
        assert_eq!(loaded.entries_by_owner(alice).len(), 1);
        assert!(loaded.insert_owner(new_owner("Alice")).is_err());
    }

    #[test]
    fn ids_are_not_reused_after_delete_all() {
        let mut state = DocumentState::default();
        let first = state.insert_owner(new_owner("A")).unwrap();
        state.delete_all_owners();
        let second = state.insert_owner(new_owner("A")).unwrap();
        assert!(second > first);
    }

    #[test]
    fn deleting_last_entry_drops_owner_index_bucket() {
        let mut state = DocumentState::default();
        let owner = state.insert_owner(new_owner("A")).unwrap();
        let entry = state.insert_entry(new_entry(owner, "s")).unwrap();
        assert_eq!(state.delete_entry(entry), 1);
        assert!(state.entries_by_owner(owner).is_empty());
        assert_eq!(state.delete_entry(entry), 0);
    }
}
