// SPDX-FileCopyrightText: 2026 Strongbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Security-question recovery of a forgotten master password.
//!
//! Vault data is sealed under a key derived from the old password, so a reset
//! cannot re-encrypt it: the new credential is written and every owner and
//! entry is deleted in the same transaction.

use secrecy::{ExposeSecret, SecretString};
use tracing::{info, warn};
use zeroize::Zeroizing;

use strongbox_core::{Command, RecoveryQuestion, StorageHandle, StrongboxError, timestamp};
use strongbox_crypto::kdf;

use crate::run_blocking;
use crate::session::{AuthSession, new_credential};

/// Answers compare case-insensitively and ignore surrounding whitespace.
fn normalize(answer: &str) -> Zeroizing<String> {
    Zeroizing::new(answer.trim().to_lowercase())
}

#[derive(Debug, Clone)]
pub struct RecoveryService {
    storage: StorageHandle,
    session: AuthSession,
}

impl RecoveryService {
    pub fn new(storage: StorageHandle, session: AuthSession) -> Self {
        Self { storage, session }
    }

    /// Store the question id and a salted hash of the answer, replacing any
    /// previous question.
    pub async fn save_recovery_question(
        &self,
        question_id: u32,
        answer: &SecretString,
    ) -> Result<(), StrongboxError> {
        let answer = normalize(answer.expose_secret());
        let question = run_blocking(move || {
            let answer_salt = kdf::generate_salt()?;
            let answer_hash = kdf::derive_key(&answer, &answer_salt)?;
            Ok(RecoveryQuestion {
                question_id,
                answer_hash,
                answer_salt,
                created_at: timestamp::now(),
            })
        })
        .await?;

        let guard = self.storage.lock().await;
        guard.execute(Command::PutRecoveryQuestion(question)).await?;
        info!(question_id, "security question saved");
        Ok(())
    }

    pub async fn has_recovery_question(&self) -> Result<bool, StrongboxError> {
        Ok(self.recovery_question_id().await?.is_some())
    }

    /// Catalog id of the configured question, if any.
    pub async fn recovery_question_id(&self) -> Result<Option<u32>, StrongboxError> {
        let guard = self.storage.lock().await;
        Ok(guard.recovery_question().await?.map(|q| q.question_id))
    }

    /// Check `answer` against the stored hash.
    pub async fn verify_answer(&self, answer: &SecretString) -> Result<bool, StrongboxError> {
        let question = {
            let guard = self.storage.lock().await;
            stored_question(&*guard).await?
        };
        check_answer(question, answer).await
    }

    /// Replace the master password after a correct answer, deleting every
    /// owner and entry.
    ///
    /// A wrong answer returns `Ok(false)` and changes nothing. On success the
    /// current session is logged out.
    pub async fn reset_master_credential(
        &self,
        answer: &SecretString,
        new_password: &SecretString,
    ) -> Result<bool, StrongboxError> {
        let question = {
            let guard = self.storage.lock().await;
            stored_question(&*guard).await?
        };
        if !check_answer(question.clone(), answer).await? {
            warn!("master password reset rejected: wrong security answer");
            return Ok(false);
        }
        let (credential, _key) = new_credential(new_password).await?;

        let guard = self.storage.lock().await;
        if stored_question(&*guard).await? != question {
            return Err(StrongboxError::Conflict(
                "security question changed during reset".to_string(),
            ));
        }

        guard.execute(Command::Begin).await?;
        let result = async {
            guard
                .execute(Command::PutMasterCredential(credential))
                .await?;
            let removed = guard.execute(Command::DeleteAllOwners).await?;
            guard.execute(Command::Commit).await?;
            Ok(removed)
        }
        .await;
        let removed = match result {
            Ok(outcome) => outcome.affected(),
            Err(e) => {
                if let Err(rollback) = guard.execute(Command::Rollback).await {
                    warn!(error = %rollback, "rollback after failed reset also failed");
                }
                return Err(StrongboxError::transaction(e));
            }
        };
        drop(guard);

        self.session.logout();
        info!(owners_removed = removed, "master password reset; vault data wiped");
        Ok(true)
    }
}

async fn stored_question(
    storage: &dyn strongbox_core::VaultStorage,
) -> Result<RecoveryQuestion, StrongboxError> {
    storage
        .recovery_question()
        .await?
        .ok_or_else(|| StrongboxError::NotConfigured("security question".to_string()))
}

async fn check_answer(
    question: RecoveryQuestion,
    answer: &SecretString,
) -> Result<bool, StrongboxError> {
    let answer = normalize(answer.expose_secret());
    run_blocking(move || kdf::verify_key(&answer, &question.answer_salt, &question.answer_hash))
        .await
}
