// SPDX-FileCopyrightText: 2026 Strongbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and migrations.
//!
//! All statements, including transaction markers, run on tokio-rusqlite's
//! single background thread. Do NOT create additional Connection instances.

use std::path::Path;

use rusqlite::ErrorCode;
use rusqlite::ffi;
use strongbox_core::StrongboxError;
use tracing::debug;

use crate::migrations;

/// An open, migrated vault database.
#[derive(Clone)]
pub struct Database {
    conn: tokio_rusqlite::Connection,
}

impl Database {
    /// Open (creating if needed) the database at `path` and run migrations.
    ///
    /// `":memory:"` opens a private in-memory database.
    pub async fn open(path: &str, wal_mode: bool) -> Result<Self, StrongboxError> {
        if path != ":memory:"
            && let Some(parent) = Path::new(path).parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let conn = tokio_rusqlite::Connection::open(path)
            .await
            .map_err(|e| StrongboxError::storage(e.to_string()))?;

        conn.call(move |conn| -> Result<(), StrongboxError> {
            conn.execute_batch("PRAGMA foreign_keys = ON; PRAGMA busy_timeout = 5000;")
                .map_err(map_sqlite_err)?;
            if wal_mode {
                let mode: String = conn
                    .query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))
                    .map_err(map_sqlite_err)?;
                debug!(journal_mode = %mode, "journal mode set");
            }
            migrations::run_migrations(conn)
        })
        .await
        .map_err(flatten_tr_err)?;

        debug!(path, wal_mode, "database opened");
        Ok(Self { conn })
    }

    /// Returns the shared connection.
    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }

    /// Run a batch of SQL with no result rows.
    pub async fn execute_batch(&self, sql: &'static str) -> Result<(), StrongboxError> {
        self.conn
            .call(move |conn| -> Result<(), rusqlite::Error> { conn.execute_batch(sql) })
            .await
            .map_err(map_tr_err)
    }
}

/// Convert tokio-rusqlite errors to StrongboxError, classifying constraint failures.
pub(crate) fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> StrongboxError {
    match e {
        tokio_rusqlite::Error::Error(inner) => map_sqlite_err(inner),
        other => StrongboxError::storage(other.to_string()),
    }
}

/// Unwrap errors raised inside a `call` closure that already returns StrongboxError.
fn flatten_tr_err(e: tokio_rusqlite::Error<StrongboxError>) -> StrongboxError {
    match e {
        tokio_rusqlite::Error::Error(inner) => inner,
        other => StrongboxError::storage(other.to_string()),
    }
}

/// Unique and foreign-key violations become `Conflict`; everything else is `Storage`.
pub(crate) fn map_sqlite_err(e: rusqlite::Error) -> StrongboxError {
    if let rusqlite::Error::SqliteFailure(failure, message) = &e
        && failure.code == ErrorCode::ConstraintViolation
    {
        let detail = message.clone().unwrap_or_else(|| failure.to_string());
        match failure.extended_code {
            ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY => {
                return StrongboxError::Conflict(format!("duplicate record: {detail}"));
            }
            ffi::SQLITE_CONSTRAINT_FOREIGNKEY => {
                return StrongboxError::Conflict(format!("referenced record missing: {detail}"));
            }
            _ => {}
        }
    }
    StrongboxError::storage(e)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn open_creates_parent_directories_and_schema() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/dir/vault.db");
        let db = Database::open(path.to_str().unwrap(), true).await.unwrap();

        let tables: Vec<String> = db
            .connection()
            .call(|conn| -> Result<Vec<String>, rusqlite::Error> {
                let mut stmt = conn.prepare(
                    "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
                )?;
                let rows = stmt.query_map([], |row| row.get(0))?;
                rows.collect()
            })
            .await
            .unwrap();

        for table in [
            "master_password",
            "password_entries",
            "password_owners",
            "security_question",
            "sync_metadata",
        ] {
            assert!(tables.iter().any(|t| t == table), "missing {table}");
        }
    }

    #[tokio::test]
    async fn foreign_keys_are_enforced() {
        let db = Database::open(":memory:", false).await.unwrap();
        let enabled: i64 = db
            .connection()
            .call(|conn| -> Result<i64, rusqlite::Error> {
                conn.query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            })
            .await
            .unwrap();
        assert_eq!(enabled, 1);
    }

    #[tokio::test]
    async fn reopening_runs_migrations_idempotently() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("vault.db");
        let path = path.to_str().unwrap();
        drop(Database::open(path, true).await.unwrap());
        assert!(Database::open(path, true).await.is_ok());
    }
}
