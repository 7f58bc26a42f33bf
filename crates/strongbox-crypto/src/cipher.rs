// SPDX-FileCopyrightText: 2026 Strongbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! AES-256-GCM sealing into a self-contained text envelope.
//!
//! The envelope is `base64(nonce || ciphertext || tag)`: decrypting needs only
//! the envelope and the key. Every seal draws a fresh 96-bit nonce from the
//! system CSPRNG.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use ring::aead::{AES_256_GCM, Aad, LessSafeKey, NONCE_LEN, Nonce, UnboundKey};
use ring::rand::{SecureRandom, SystemRandom};
use strongbox_core::StrongboxError;

use crate::kdf::KEY_LEN;

fn aead_key(key: &[u8; KEY_LEN]) -> Result<LessSafeKey, StrongboxError> {
    let unbound = UnboundKey::new(&AES_256_GCM, key)
        .map_err(|_| StrongboxError::Crypto("failed to create AES-256-GCM key".to_string()))?;
    Ok(LessSafeKey::new(unbound))
}

/// Encrypt `plaintext` and return the base64 envelope.
pub fn seal(key: &[u8; KEY_LEN], plaintext: &[u8]) -> Result<String, StrongboxError> {
    let key = aead_key(key)?;

    let mut nonce_bytes = [0u8; NONCE_LEN];
    SystemRandom::new()
        .fill(&mut nonce_bytes)
        .map_err(|_| StrongboxError::Crypto("failed to generate random nonce".to_string()))?;

    let mut in_out = plaintext.to_vec();
    key.seal_in_place_append_tag(
        Nonce::assume_unique_for_key(nonce_bytes),
        Aad::empty(),
        &mut in_out,
    )
    .map_err(|_| StrongboxError::Crypto("AES-256-GCM encryption failed".to_string()))?;

    let mut envelope = Vec::with_capacity(NONCE_LEN + in_out.len());
    envelope.extend_from_slice(&nonce_bytes);
    envelope.extend_from_slice(&in_out);
    Ok(STANDARD.encode(envelope))
}

/// Decrypt a base64 envelope produced by [`seal`].
///
/// Fails on malformed input, a wrong key, or tampered data.
pub fn open(key: &[u8; KEY_LEN], envelope: &str) -> Result<Vec<u8>, StrongboxError> {
    let raw = STANDARD
        .decode(envelope.trim())
        .map_err(|e| StrongboxError::Crypto(format!("ciphertext is not valid base64: {e}")))?;
    if raw.len() < NONCE_LEN + AES_256_GCM.tag_len() {
        return Err(StrongboxError::Crypto("ciphertext is too short".to_string()));
    }

    let (nonce_bytes, sealed) = raw.split_at(NONCE_LEN);
    let nonce = Nonce::try_assume_unique_for_key(nonce_bytes)
        .map_err(|_| StrongboxError::Crypto("malformed nonce".to_string()))?;

    let key = aead_key(key)?;
    let mut in_out = sealed.to_vec();
    let plaintext = key
        .open_in_place(nonce, Aad::empty(), &mut in_out)
        .map_err(|_| {
            StrongboxError::Crypto(
                "AES-256-GCM decryption failed -- wrong key or corrupted data".to_string(),
            )
        })?;
    Ok(plaintext.to_vec())
}
