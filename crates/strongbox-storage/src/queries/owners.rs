// SPDX-FileCopyrightText: 2026 Strongbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Owner CRUD operations.

use chrono::{DateTime, Utc};
use rusqlite::{Row, params};
use strongbox_core::{NewOwner, Owner, RecordId, StrongboxError, timestamp};

use super::{optional, ts};
use crate::database::{Database, map_tr_err};

const OWNER_COLUMNS: &str = "id, name, encrypted_data, created_at, updated_at";

fn owner_from_row(row: &Row<'_>) -> rusqlite::Result<Owner> {
    Ok(Owner {
        id: row.get(0)?,
        name: row.get(1)?,
        encrypted_payload: row.get(2)?,
        created_at: ts(row, 3)?,
        updated_at: ts(row, 4)?,
    })
}

/// Insert a new owner and return its id. A taken name is a `Conflict`.
pub async fn insert_owner(db: &Database, owner: NewOwner) -> Result<RecordId, StrongboxError> {
    db.connection()
        .call(move |conn| -> Result<RecordId, rusqlite::Error> {
            conn.execute(
                "INSERT INTO password_owners (name, encrypted_data, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    owner.name,
                    owner.encrypted_payload,
                    timestamp::format(&owner.created_at),
                    timestamp::format(&owner.updated_at),
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await
        .map_err(map_tr_err)
}

pub async fn update_owner(
    db: &Database,
    id: RecordId,
    encrypted_payload: String,
    updated_at: DateTime<Utc>,
) -> Result<usize, StrongboxError> {
    let updated_at = timestamp::format(&updated_at);
    db.connection()
        .call(move |conn| -> Result<usize, rusqlite::Error> {
            conn.execute(
                "UPDATE password_owners SET encrypted_data = ?1, updated_at = ?2 WHERE id = ?3",
                params![encrypted_payload, updated_at, id],
            )
        })
        .await
        .map_err(map_tr_err)
}

pub async fn update_owner_by_name(
    db: &Database,
    name: String,
    encrypted_payload: String,
    updated_at: DateTime<Utc>,
) -> Result<usize, StrongboxError> {
    let updated_at = timestamp::format(&updated_at);
    db.connection()
        .call(move |conn| -> Result<usize, rusqlite::Error> {
            conn.execute(
                "UPDATE password_owners SET encrypted_data = ?1, updated_at = ?2 WHERE name = ?3",
                params![encrypted_payload, updated_at, name],
            )
        })
        .await
        .map_err(map_tr_err)
}

/// Delete an owner; its entries go with it via `ON DELETE CASCADE`.
pub async fn delete_owner(db: &Database, id: RecordId) -> Result<usize, StrongboxError> {
    db.connection()
        .call(move |conn| -> Result<usize, rusqlite::Error> {
            conn.execute("DELETE FROM password_owners WHERE id = ?1", params![id])
        })
        .await
        .map_err(map_tr_err)
}

pub async fn delete_all_owners(db: &Database) -> Result<usize, StrongboxError> {
    db.connection()
        .call(|conn| -> Result<usize, rusqlite::Error> {
            conn.execute("DELETE FROM password_owners", [])
        })
        .await
        .map_err(map_tr_err)
}

/// All owners ordered by name.
pub async fn list_owners(db: &Database) -> Result<Vec<Owner>, StrongboxError> {
    db.connection()
        .call(|conn| -> Result<Vec<Owner>, rusqlite::Error> {
            let mut stmt = conn.prepare(&format!(
                "SELECT {OWNER_COLUMNS} FROM password_owners ORDER BY name"
            ))?;
            let rows = stmt.query_map([], owner_from_row)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

pub async fn get_owner(db: &Database, id: RecordId) -> Result<Option<Owner>, StrongboxError> {
    db.connection()
        .call(move |conn| -> Result<Option<Owner>, rusqlite::Error> {
            optional(conn.query_row(
                &format!("SELECT {OWNER_COLUMNS} FROM password_owners WHERE id = ?1"),
                params![id],
                owner_from_row,
            ))
        })
        .await
        .map_err(map_tr_err)
}

pub async fn get_owner_by_name(
    db: &Database,
    name: String,
) -> Result<Option<Owner>, StrongboxError> {
    db.connection()
        .call(move |conn| -> Result<Option<Owner>, rusqlite::Error> {
            optional(conn.query_row(
                &format!("SELECT {OWNER_COLUMNS} FROM password_owners WHERE name = ?1"),
                params![name],
                owner_from_row,
            ))
        })
        .await
        .map_err(map_tr_err)
}
