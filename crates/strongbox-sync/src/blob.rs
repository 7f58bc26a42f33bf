// SPDX-FileCopyrightText: 2026 Strongbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Transfer encryption of snapshots.
//!
//! A sync blob is the snapshot JSON sealed under the session key. Only a vault
//! unlocked with the same master password can open it.

use strongbox_core::{Snapshot, StrongboxError};
use strongbox_crypto::EncryptionService;

pub fn seal(crypto: &EncryptionService, snapshot: &Snapshot) -> Result<String, StrongboxError> {
    crypto.encrypt_object(snapshot)
}

/// Decrypt and parse a blob. Surrounding whitespace is ignored.
pub fn open(crypto: &EncryptionService, blob: &str) -> Result<Snapshot, StrongboxError> {
    crypto.decrypt_object(blob.trim())
}
