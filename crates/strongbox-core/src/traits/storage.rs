// SPDX-FileCopyrightText: 2026 Strongbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage contract shared by every persistence backend.
//!
//! Backends receive a closed set of logical [`Command`]s and [`Query`]s
//! instead of SQL text, so the relational and document engines can honor the
//! same semantics: unique owner names, entry foreign keys, cascade on owner
//! delete, and atomic grouping between `Begin` and `Commit`/`Rollback`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use strum::IntoStaticStr;
use tracing::warn;

use crate::error::StrongboxError;
use crate::types::{
    Entry, EntryFields, FromRecord, HealthStatus, MasterCredential, NewEntry, NewOwner, Owner,
    Record, RecordId, RecoveryQuestion, SyncMetadata,
};

/// A write operation understood by storage backends.
#[derive(Debug, Clone, IntoStaticStr)]
#[non_exhaustive]
pub enum Command {
    /// Insert or replace the master credential singleton.
    PutMasterCredential(MasterCredential),
    /// Insert or replace the recovery question singleton.
    PutRecoveryQuestion(RecoveryQuestion),
    /// Insert or replace the sync metadata singleton.
    PutSyncMetadata(SyncMetadata),
    /// Record a successful sync. Affects zero rows when no metadata exists.
    TouchLastSync { at: DateTime<Utc> },
    /// Insert a new owner; fails with `Conflict` if the name is taken.
    InsertOwner(NewOwner),
    UpdateOwner {
        id: RecordId,
        encrypted_payload: String,
        updated_at: DateTime<Utc>,
    },
    UpdateOwnerByName {
        name: String,
        encrypted_payload: String,
        updated_at: DateTime<Utc>,
    },
    /// Delete an owner and every entry that references it.
    DeleteOwner { id: RecordId },
    /// Delete every owner and, by cascade, every entry.
    DeleteAllOwners,
    /// Insert a new entry; fails with `Conflict` if the owner does not exist.
    InsertEntry(NewEntry),
    UpdateEntry {
        id: RecordId,
        fields: EntryFields,
        updated_at: DateTime<Utc>,
    },
    DeleteEntry { id: RecordId },
    Begin,
    Commit,
    Rollback,
}

impl Command {
    /// Short command name for logs.
    pub fn name(&self) -> &'static str {
        self.into()
    }
}

/// A read operation understood by storage backends.
#[derive(Debug, Clone, IntoStaticStr)]
#[non_exhaustive]
pub enum Query {
    MasterCredential,
    RecoveryQuestion,
    SyncMetadata,
    /// All owners ordered by name.
    AllOwners,
    OwnerById { id: RecordId },
    OwnerByName { name: String },
    /// All entries ordered by id.
    AllEntries,
    EntryById { id: RecordId },
    /// Entries of one owner, newest first.
    EntriesByOwner { owner_id: RecordId },
    /// Entries of one owner whose site ciphertext equals `encrypted_site`.
    EntryByOwnerAndSite {
        owner_id: RecordId,
        encrypted_site: String,
    },
}

impl Query {
    /// Short query name for logs.
    pub fn name(&self) -> &'static str {
        self.into()
    }
}

/// Result of executing a [`Command`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecOutcome {
    /// A record was inserted with this id.
    Inserted(RecordId),
    /// Number of records changed by an update or delete.
    Affected(usize),
    /// Singleton writes and transaction markers.
    Done,
}

impl ExecOutcome {
    /// The id assigned by an insert.
    pub fn inserted_id(self) -> Result<RecordId, StrongboxError> {
        match self {
            Self::Inserted(id) => Ok(id),
            other => Err(StrongboxError::Internal(format!(
                "expected an inserted id, got {other:?}"
            ))),
        }
    }

    /// Rows affected by an update or delete; zero for other outcomes.
    pub fn affected(self) -> usize {
        match self {
            Self::Affected(n) => n,
            _ => 0,
        }
    }
}

/// A persistence backend for vault records.
///
/// Implementations must behave identically; callers only ever see
/// `dyn VaultStorage`. Commands or queries an implementation does not handle
/// are reported as [`StrongboxError::UnsupportedCommand`], never ignored.
#[async_trait]
pub trait VaultStorage: Send + Sync + 'static {
    /// Returns the backend name for logs and status output.
    fn name(&self) -> &str;

    /// Opens the backend and brings its schema up to date.
    async fn initialize(&self) -> Result<(), StrongboxError>;

    /// Performs a health check and returns the backend's current status.
    async fn health_check(&self) -> Result<HealthStatus, StrongboxError>;

    /// Flushes pending writes and releases resources.
    async fn close(&self) -> Result<(), StrongboxError>;

    async fn execute(&self, command: Command) -> Result<ExecOutcome, StrongboxError>;

    async fn select(&self, query: Query) -> Result<Vec<Record>, StrongboxError>;
}

impl dyn VaultStorage {
    /// Run a query and convert every row into `T`.
    ///
    /// A row of an unexpected kind is treated as an unsupported query result.
    pub async fn select_as<T: FromRecord>(&self, query: Query) -> Result<Vec<T>, StrongboxError> {
        let query_name = query.name();
        let rows = self.select(query).await?;
        rows.into_iter()
            .map(|record| {
                T::from_record(record).map_err(|other| {
                    warn!(
                        backend = self.name(),
                        query = query_name,
                        expected = T::KIND,
                        got = other.kind(),
                        "query returned an unexpected record kind"
                    );
                    StrongboxError::UnsupportedCommand(format!(
                        "{query_name} returned {} where {} was expected",
                        other.kind(),
                        T::KIND
                    ))
                })
            })
            .collect()
    }

    /// Run a query expected to yield at most one row.
    pub async fn select_one<T: FromRecord>(
        &self,
        query: Query,
    ) -> Result<Option<T>, StrongboxError> {
        Ok(self.select_as(query).await?.into_iter().next())
    }

    pub async fn master_credential(&self) -> Result<Option<MasterCredential>, StrongboxError> {
        self.select_one(Query::MasterCredential).await
    }

    pub async fn recovery_question(&self) -> Result<Option<RecoveryQuestion>, StrongboxError> {
        self.select_one(Query::RecoveryQuestion).await
    }

    pub async fn sync_metadata(&self) -> Result<Option<SyncMetadata>, StrongboxError> {
        self.select_one(Query::SyncMetadata).await
    }

    pub async fn owners(&self) -> Result<Vec<Owner>, StrongboxError> {
        self.select_as(Query::AllOwners).await
    }

    pub async fn owner_by_id(&self, id: RecordId) -> Result<Option<Owner>, StrongboxError> {
        self.select_one(Query::OwnerById { id }).await
    }

    pub async fn owner_by_name(&self, name: &str) -> Result<Option<Owner>, StrongboxError> {
        self.select_one(Query::OwnerByName {
            name: name.to_string(),
        })
        .await
    }

    pub async fn entries(&self) -> Result<Vec<Entry>, StrongboxError> {
        self.select_as(Query::AllEntries).await
    }

    pub async fn entry_by_id(&self, id: RecordId) -> Result<Option<Entry>, StrongboxError> {
        self.select_one(Query::EntryById { id }).await
    }

    pub async fn entries_by_owner(&self, owner_id: RecordId) -> Result<Vec<Entry>, StrongboxError> {
        self.select_as(Query::EntriesByOwner { owner_id }).await
    }
}

/// Reject a command this backend does not implement.
pub fn unsupported_command(backend: &str, command: &Command) -> StrongboxError {
    warn!(backend, command = command.name(), "unsupported storage command");
    StrongboxError::UnsupportedCommand(format!("{backend} does not handle {}", command.name()))
}

/// Reject a query this backend does not implement.
pub fn unsupported_query(backend: &str, query: &Query) -> StrongboxError {
    warn!(backend, query = query.name(), "unsupported storage query");
    StrongboxError::UnsupportedCommand(format!("{backend} does not handle {}", query.name()))
}
