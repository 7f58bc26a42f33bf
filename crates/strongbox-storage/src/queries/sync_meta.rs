// SPDX-FileCopyrightText: 2026 Strongbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Sync metadata singleton.

use chrono::{DateTime, Utc};
use rusqlite::params;
use strongbox_core::{StrongboxError, SyncMetadata, timestamp};

use super::{opt_ts, optional};
use crate::database::{Database, map_tr_err};

pub async fn put_sync_metadata(db: &Database, meta: SyncMetadata) -> Result<(), StrongboxError> {
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            conn.execute(
                "INSERT OR REPLACE INTO sync_metadata (id, last_sync, device_id, sync_version)
                 VALUES (1, ?1, ?2, ?3)",
                params![
                    meta.last_sync_timestamp.as_ref().map(timestamp::format),
                    meta.device_id,
                    meta.sync_version,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

pub async fn get_sync_metadata(db: &Database) -> Result<Option<SyncMetadata>, StrongboxError> {
    db.connection()
        .call(|conn| -> Result<Option<SyncMetadata>, rusqlite::Error> {
            optional(conn.query_row(
                "SELECT last_sync, device_id, sync_version FROM sync_metadata WHERE id = 1",
                [],
                |row| {
                    Ok(SyncMetadata {
                        last_sync_timestamp: opt_ts(row, 0)?,
                        device_id: row.get(1)?,
                        sync_version: row.get(2)?,
                    })
                },
            ))
        })
        .await
        .map_err(map_tr_err)
}

/// Set the last sync time. Returns 0 when no metadata row exists.
pub async fn touch_last_sync(db: &Database, at: DateTime<Utc>) -> Result<usize, StrongboxError> {
    let at = timestamp::format(&at);
    db.connection()
        .call(move |conn| -> Result<usize, rusqlite::Error> {
            conn.execute("UPDATE sync_metadata SET last_sync = ?1 WHERE id = 1", params![at])
        })
        .await
        .map_err(map_tr_err)
}
