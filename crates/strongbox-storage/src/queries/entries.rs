// SPDX-FileCopyrightText: 2026 Strongbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Entry CRUD operations.

use chrono::{DateTime, Utc};
use rusqlite::{Row, params};
use strongbox_core::{Entry, EntryFields, NewEntry, RecordId, StrongboxError, timestamp};

use super::{optional, ts};
use crate::database::{Database, map_tr_err};

const ENTRY_COLUMNS: &str = "id, owner_id, encrypted_site, encrypted_username, encrypted_email, \
                             encrypted_password, created_at, updated_at";

fn entry_from_row(row: &Row<'_>) -> rusqlite::Result<Entry> {
    Ok(Entry {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        encrypted_site: row.get(2)?,
        encrypted_username: row.get(3)?,
        encrypted_email: row.get(4)?,
        encrypted_password: row.get(5)?,
        created_at: ts(row, 6)?,
        updated_at: ts(row, 7)?,
    })
}

/// Insert a new entry and return its id. A missing owner is a `Conflict`.
pub async fn insert_entry(db: &Database, entry: NewEntry) -> Result<RecordId, StrongboxError> {
    db.connection()
        .call(move |conn| -> Result<RecordId, rusqlite::Error> {
            let NewEntry {
                owner_id,
                fields,
                created_at,
                updated_at,
            } = entry;
            conn.execute(
                "INSERT INTO password_entries
                 (owner_id, encrypted_site, encrypted_username, encrypted_email,
                  encrypted_password, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    owner_id,
                    fields.encrypted_site,
                    fields.encrypted_username,
                    fields.encrypted_email,
                    fields.encrypted_password,
                    timestamp::format(&created_at),
                    timestamp::format(&updated_at),
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await
        .map_err(map_tr_err)
}

pub async fn update_entry(
    db: &Database,
    id: RecordId,
    fields: EntryFields,
    updated_at: DateTime<Utc>,
) -> Result<usize, StrongboxError> {
    let updated_at = timestamp::format(&updated_at);
    db.connection()
        .call(move |conn| -> Result<usize, rusqlite::Error> {
            conn.execute(
                "UPDATE password_entries
                 SET encrypted_site = ?1, encrypted_username = ?2, encrypted_email = ?3,
                     encrypted_password = ?4, updated_at = ?5
                 WHERE id = ?6",
                params![
                    fields.encrypted_site,
                    fields.encrypted_username,
                    fields.encrypted_email,
                    fields.encrypted_password,
                    updated_at,
                    id,
                ],
            )
        })
        .await
        .map_err(map_tr_err)
}

pub async fn delete_entry(db: &Database, id: RecordId) -> Result<usize, StrongboxError> {
    db.connection()
        .call(move |conn| -> Result<usize, rusqlite::Error> {
            conn.execute("DELETE FROM password_entries WHERE id = ?1", params![id])
        })
        .await
        .map_err(map_tr_err)
}

/// All entries ordered by id.
pub async fn list_entries(db: &Database) -> Result<Vec<Entry>, StrongboxError> {
    db.connection()
        .call(|conn| -> Result<Vec<Entry>, rusqlite::Error> {
            let mut stmt = conn.prepare(&format!(
                "SELECT {ENTRY_COLUMNS} FROM password_entries ORDER BY id"
            ))?;
            let rows = stmt.query_map([], entry_from_row)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

pub async fn get_entry(db: &Database, id: RecordId) -> Result<Option<Entry>, StrongboxError> {
    db.connection()
        .call(move |conn| -> Result<Option<Entry>, rusqlite::Error> {
            optional(conn.query_row(
                &format!("SELECT {ENTRY_COLUMNS} FROM password_entries WHERE id = ?1"),
                params![id],
                entry_from_row,
            ))
        })
        .await
        .map_err(map_tr_err)
}

/// Entries of one owner, newest first.
pub async fn entries_by_owner(
    db: &Database,
    owner_id: RecordId,
) -> Result<Vec<Entry>, StrongboxError> {
    db.connection()
        .call(move |conn| -> Result<Vec<Entry>, rusqlite::Error> {
            let mut stmt = conn.prepare(&format!(
                "SELECT {ENTRY_COLUMNS} FROM password_entries
                 WHERE owner_id = ?1 ORDER BY created_at DESC, id DESC"
            ))?;
            let rows = stmt.query_map(params![owner_id], entry_from_row)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

/// Entries of one owner whose site ciphertext matches exactly.
pub async fn entry_by_owner_and_site(
    db: &Database,
    owner_id: RecordId,
    encrypted_site: String,
) -> Result<Vec<Entry>, StrongboxError> {
    db.connection()
        .call(move |conn| -> Result<Vec<Entry>, rusqlite::Error> {
            let mut stmt = conn.prepare(&format!(
                "SELECT {ENTRY_COLUMNS} FROM password_entries
                 WHERE owner_id = ?1 AND encrypted_site = ?2 ORDER BY id"
            ))?;
            let rows = stmt.query_map(params![owner_id, encrypted_site], entry_from_row)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}
