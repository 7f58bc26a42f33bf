// SPDX-FileCopyrightText: 2026 Strongbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Strongbox credential vault.

use thiserror::Error;

/// The primary error type shared by every Strongbox component.
///
/// A failed login or a wrong recovery answer is not an error: those
/// operations return `Ok(false)`.
#[derive(Debug, Error)]
pub enum StrongboxError {
    /// A required singleton (master credential, recovery question) is absent.
    #[error("not configured: {0}")]
    NotConfigured(String),

    /// The session key is not available because the vault is locked.
    #[error("vault is locked")]
    Locked,

    /// A multi-step operation failed and its transaction was rolled back.
    #[error("transaction rolled back: {source}")]
    Transaction {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The storage backend could not be opened or initialized.
    #[error("storage backend unavailable: {source}")]
    BackendUnavailable {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Storage backend errors (query failure, closed connection, corrupt row).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Unique-name or foreign-key constraint violation.
    #[error("conflict: {0}")]
    Conflict(String),

    /// A record addressed by id or name does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// A storage command or query the backend does not handle.
    #[error("unsupported storage operation: {0}")]
    UnsupportedCommand(String),

    /// Key derivation, encryption, or decryption failure.
    #[error("crypto error: {0}")]
    Crypto(String),

    /// JSON encoding or decoding failure.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Configuration errors surfaced at runtime.
    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl StrongboxError {
    /// Wrap any error as a generic storage failure.
    pub fn storage(source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Storage {
            source: source.into(),
        }
    }

    /// Wrap the cause of a rolled-back transaction.
    pub fn transaction(source: StrongboxError) -> Self {
        Self::Transaction {
            source: Box::new(source),
        }
    }
}

impl From<serde_json::Error> for StrongboxError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}
