// SPDX-FileCopyrightText: 2026 Strongbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session-keyed encryption of record fields and sync snapshots.

use serde::Serialize;
use serde::de::DeserializeOwned;
use strongbox_core::StrongboxError;
use tracing::debug;
use zeroize::Zeroizing;

use crate::cipher;
use crate::kdf::{self, KEY_LEN};
use crate::session::KeySlot;

/// Encrypts and decrypts with whatever key the session slot holds.
///
/// The slot is read on every call, so once the session is cleared every
/// subsequent call fails with [`StrongboxError::Locked`].
#[derive(Debug, Clone)]
pub struct EncryptionService {
    slot: KeySlot,
}

impl EncryptionService {
    pub fn new(slot: KeySlot) -> Self {
        Self { slot }
    }

    /// The slot this service reads its key from.
    pub fn slot(&self) -> &KeySlot {
        &self.slot
    }

    /// Generate a random hex salt.
    pub fn generate_salt(&self) -> Result<String, StrongboxError> {
        kdf::generate_salt()
    }

    /// PBKDF2 hash of `secret` under `salt_hex`, hex-encoded.
    pub fn derive_key(&self, secret: &str, salt_hex: &str) -> Result<String, StrongboxError> {
        kdf::derive_key(secret, salt_hex)
    }

    /// Derive the session key from the master password and install it.
    pub fn set_session_key(&self, secret: &str, salt_hex: &str) -> Result<(), StrongboxError> {
        self.slot.install(kdf::derive_session_key(secret, salt_hex)?);
        debug!("session key installed");
        Ok(())
    }

    /// Install an already-derived session key.
    pub fn install_session_key(&self, key: Zeroizing<[u8; KEY_LEN]>) {
        self.slot.install(key);
    }

    /// The current session key, or `Locked`.
    pub fn session_key(&self) -> Result<Zeroizing<[u8; KEY_LEN]>, StrongboxError> {
        self.slot.get()
    }

    pub fn clear_session_key(&self) {
        self.slot.clear();
        debug!("session key cleared");
    }

    pub fn is_unlocked(&self) -> bool {
        self.slot.is_set()
    }

    pub fn encrypt(&self, plaintext: &str) -> Result<String, StrongboxError> {
        let key = self.slot.get()?;
        cipher::seal(&key, plaintext.as_bytes())
    }

    pub fn decrypt(&self, ciphertext: &str) -> Result<String, StrongboxError> {
        let key = self.slot.get()?;
        let plaintext = cipher::open(&key, ciphertext)?;
        String::from_utf8(plaintext)
            .map_err(|_| StrongboxError::Crypto("decrypted data is not valid UTF-8".to_string()))
    }

    /// Serialize `value` to JSON and encrypt it.
    pub fn encrypt_object<T: Serialize>(&self, value: &T) -> Result<String, StrongboxError> {
        let json = Zeroizing::new(serde_json::to_string(value)?);
        self.encrypt(&json)
    }

    /// Decrypt and deserialize a value produced by [`Self::encrypt_object`].
    pub fn decrypt_object<T: DeserializeOwned>(&self, ciphertext: &str) -> Result<T, StrongboxError> {
        let json = Zeroizing::new(self.decrypt(ciphertext)?);
        Ok(serde_json::from_str(&json)?)
    }
}
