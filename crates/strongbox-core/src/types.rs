// SPDX-FileCopyrightText: 2026 Strongbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Record types persisted by the storage backends and carried in sync snapshots.
//!
//! Ids are assigned by the backend that stores a record and are only
//! meaningful inside that vault. Cross-vault identity is the owner name and,
//! for entries, the owner plus site.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::IntoStaticStr;

use crate::timestamp;

/// Backend-assigned auto-incrementing record id.
pub type RecordId = i64;

/// Health status reported by storage health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Backend is fully operational.
    Healthy,
    /// Backend is operational but experiencing issues.
    Degraded(String),
    /// Backend is not operational.
    Unhealthy(String),
}

/// Verification material for the master password. At most one exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MasterCredential {
    /// Hex PBKDF2 output of the master password.
    pub password_hash: String,
    /// Hex salt the hash was derived with.
    pub salt: String,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
}

/// The configured security question and its hashed answer. At most one exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecoveryQuestion {
    /// Index into the externally owned question catalog.
    pub question_id: u32,
    pub answer_hash: String,
    pub answer_salt: String,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
}

/// A named grouping of entries, unique by name within a vault.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Owner {
    pub id: RecordId,
    pub name: String,
    /// Encrypted JSON `{"name": ...}`.
    #[serde(alias = "encrypted_data")]
    pub encrypted_payload: String,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "timestamp")]
    pub updated_at: DateTime<Utc>,
}

/// An owner that has not been assigned an id yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOwner {
    pub name: String,
    pub encrypted_payload: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One stored credential. Every sensitive field is ciphertext.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub id: RecordId,
    pub owner_id: RecordId,
    pub encrypted_site: String,
    pub encrypted_username: String,
    pub encrypted_email: String,
    pub encrypted_password: String,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "timestamp")]
    pub updated_at: DateTime<Utc>,
}

impl Entry {
    /// The mutable ciphertext fields of this entry.
    pub fn fields(&self) -> EntryFields {
        EntryFields {
            encrypted_site: self.encrypted_site.clone(),
            encrypted_username: self.encrypted_username.clone(),
            encrypted_email: self.encrypted_email.clone(),
            encrypted_password: self.encrypted_password.clone(),
        }
    }
}

/// The ciphertext fields written by an entry update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryFields {
    pub encrypted_site: String,
    pub encrypted_username: String,
    pub encrypted_email: String,
    pub encrypted_password: String,
}

/// An entry that has not been assigned an id yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEntry {
    pub owner_id: RecordId,
    pub fields: EntryFields,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Per-installation sync bookkeeping. At most one exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncMetadata {
    #[serde(with = "timestamp::option")]
    pub last_sync_timestamp: Option<DateTime<Utc>>,
    pub device_id: String,
    pub sync_version: u32,
}

/// A full export of one vault's owners and entries.
///
/// Serialized field names match the sync file format, so `deviceId` stays
/// camel-cased. Unknown fields are ignored on import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub owners: Vec<Owner>,
    pub entries: Vec<Entry>,
    /// Milliseconds since the Unix epoch at export time.
    pub timestamp: i64,
    #[serde(rename = "deviceId")]
    pub device_id: String,
}

/// A row returned by [`crate::VaultStorage::select`].
#[derive(Debug, Clone, PartialEq, Eq, IntoStaticStr)]
pub enum Record {
    MasterCredential(MasterCredential),
    RecoveryQuestion(RecoveryQuestion),
    SyncMetadata(SyncMetadata),
    Owner(Owner),
    Entry(Entry),
}

impl Record {
    /// Short name of the record kind, used in logs and error messages.
    pub fn kind(&self) -> &'static str {
        self.into()
    }
}

/// Conversion from an untyped [`Record`] into one concrete record type.
pub trait FromRecord: Sized {
    /// Name of the expected record kind.
    const KIND: &'static str;

    /// Returns the record back when it is of a different kind.
    fn from_record(record: Record) -> Result<Self, Record>;
}

macro_rules! impl_from_record {
    ($ty:ident) => {
        impl FromRecord for $ty {
            const KIND: &'static str = stringify!($ty);

            fn from_record(record: Record) -> Result<Self, Record> {
                match record {
                    Record::$ty(inner) => Ok(inner),
                    other => Err(other),
                }
            }
        }

        impl From<$ty> for Record {
            fn from(inner: $ty) -> Self {
                Record::$ty(inner)
            }
        }
    };
}

impl_from_record!(MasterCredential);
impl_from_record!(RecoveryQuestion);
impl_from_record!(SyncMetadata);
impl_from_record!(Owner);
impl_from_record!(Entry);

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 1, h, 0, 0).unwrap()
    }

    #[test]
    fn snapshot_uses_camel_case_device_id() {
        let snapshot = Snapshot {
            owners: vec![],
            entries: vec![],
            timestamp: 1_700_000_000_000,
            device_id: "device-a".into(),
        };
        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["deviceId"], "device-a");
        assert!(json.get("device_id").is_none());
    }

    #[test]
    fn owner_accepts_legacy_payload_field_and_sql_timestamps() {
        let json = r#"{
            "id": 7,
            "name": "Alice",
            "encrypted_data": "ciphertext",
            "created_at": "2026-01-01 01:00:00",
            "updated_at": "2026-01-01 02:00:00",
            "extra": true
        }"#;
        let owner: Owner = serde_json::from_str(json).unwrap();
        assert_eq!(owner.encrypted_payload, "ciphertext");
        assert_eq!(owner.created_at, at(1));
        assert_eq!(owner.updated_at, at(2));
    }

    #[test]
    fn sync_metadata_round_trips_missing_last_sync() {
        let meta = SyncMetadata {
            last_sync_timestamp: None,
            device_id: "d".into(),
            sync_version: 1,
        };
        let json = serde_json::to_string(&meta).unwrap();
        let back: SyncMetadata = serde_json::from_str(&json).unwrap();
        assert_eq!(back, meta);
    }

    #[test]
    fn from_record_rejects_other_kinds() {
        let record = Record::SyncMetadata(SyncMetadata {
            last_sync_timestamp: Some(at(3)),
            device_id: "d".into(),
            sync_version: 1,
        });
        assert_eq!(record.kind(), "SyncMetadata");
        let back = Owner::from_record(record.clone()).unwrap_err();
        assert_eq!(back, record);
        assert!(SyncMetadata::from_record(record).is_ok());
    }
}
