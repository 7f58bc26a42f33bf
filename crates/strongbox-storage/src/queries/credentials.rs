// SPDX-FileCopyrightText: 2026 Strongbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Master credential and recovery question singletons.

use rusqlite::params;
use strongbox_core::{MasterCredential, RecoveryQuestion, StrongboxError, timestamp};

use super::{optional, ts};
use crate::database::{Database, map_tr_err};

/// Insert or replace the master credential.
pub async fn put_master_credential(
    db: &Database,
    credential: MasterCredential,
) -> Result<(), StrongboxError> {
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            conn.execute(
                "INSERT OR REPLACE INTO master_password (id, password_hash, salt, created_at)
                 VALUES (1, ?1, ?2, ?3)",
                params![
                    credential.password_hash,
                    credential.salt,
                    timestamp::format(&credential.created_at),
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

pub async fn get_master_credential(
    db: &Database,
) -> Result<Option<MasterCredential>, StrongboxError> {
    db.connection()
        .call(|conn| -> Result<Option<MasterCredential>, rusqlite::Error> {
            optional(conn.query_row(
                "SELECT password_hash, salt, created_at FROM master_password WHERE id = 1",
                [],
                |row| {
                    Ok(MasterCredential {
                        password_hash: row.get(0)?,
                        salt: row.get(1)?,
                        created_at: ts(row, 2)?,
                    })
                },
            ))
        })
        .await
        .map_err(map_tr_err)
}

/// Insert or replace the recovery question.
pub async fn put_recovery_question(
    db: &Database,
    question: RecoveryQuestion,
) -> Result<(), StrongboxError> {
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            conn.execute(
                "INSERT OR REPLACE INTO security_question
                 (id, question_id, answer_hash, answer_salt, created_at)
                 VALUES (1, ?1, ?2, ?3, ?4)",
                params![
                    question.question_id,
                    question.answer_hash,
                    question.answer_salt,
                    timestamp::format(&question.created_at),
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

pub async fn get_recovery_question(
    db: &Database,
) -> Result<Option<RecoveryQuestion>, StrongboxError> {
    db.connection()
        .call(|conn| -> Result<Option<RecoveryQuestion>, rusqlite::Error> {
            optional(conn.query_row(
                "SELECT question_id, answer_hash, answer_salt, created_at
                 FROM security_question WHERE id = 1",
                [],
                |row| {
                    Ok(RecoveryQuestion {
                        question_id: row.get(0)?,
                        answer_hash: row.get(1)?,
                        answer_salt: row.get(2)?,
                        created_at: ts(row, 3)?,
                    })
                },
            ))
        })
        .await
        .map_err(map_tr_err)
}
