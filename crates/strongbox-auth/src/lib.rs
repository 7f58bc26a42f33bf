// SPDX-FileCopyrightText: 2026 Strongbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Master-password authentication for the Strongbox credential vault.
//!
//! [`AuthSession`] owns the Locked/Unlocked state, installs the session key
//! into the shared encryption service, and runs the inactivity monitor.
//! [`RecoveryService`] resets a forgotten master password through the
//! security question, which wipes every owner and entry.

pub mod recovery;
pub mod session;

pub use recovery::RecoveryService;
pub use session::AuthSession;

use strongbox_core::StrongboxError;

/// Run PBKDF2 work on the blocking pool.
pub(crate) async fn run_blocking<T, F>(work: F) -> Result<T, StrongboxError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, StrongboxError> + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| StrongboxError::Internal(format!("key derivation task failed: {e}")))?
}
