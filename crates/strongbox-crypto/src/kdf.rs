// SPDX-FileCopyrightText: 2026 Strongbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! PBKDF2-HMAC-SHA256 key derivation from a secret and a hex salt.
//!
//! The same derivation produces the stored master-password hash, recovery
//! answer hashes, and (with a context-suffixed salt) the session key, so the
//! stored hash is never usable as the encryption key.

use std::num::NonZeroU32;

use ring::pbkdf2;
use ring::rand::{SecureRandom, SystemRandom};
use strongbox_core::StrongboxError;
use zeroize::Zeroizing;

/// PBKDF2 iteration count.
pub const PBKDF2_ITERATIONS: u32 = 100_000;

/// Random salt length in bytes (hex-encoded to twice that).
pub const SALT_LEN: usize = 32;

/// Derived key length in bytes.
pub const KEY_LEN: usize = 32;

static ALGORITHM: pbkdf2::Algorithm = pbkdf2::PBKDF2_HMAC_SHA256;

/// Appended to the salt when deriving the session key.
const SESSION_KEY_CONTEXT: &[u8] = b"strongbox/session-key/v1";

fn iterations() -> NonZeroU32 {
    NonZeroU32::new(PBKDF2_ITERATIONS).unwrap_or(NonZeroU32::MIN)
}

fn decode_salt(salt_hex: &str) -> Result<Vec<u8>, StrongboxError> {
    hex::decode(salt_hex).map_err(|e| StrongboxError::Crypto(format!("salt is not valid hex: {e}")))
}

fn derive_raw(secret: &[u8], salt: &[u8]) -> Zeroizing<[u8; KEY_LEN]> {
    let mut out = Zeroizing::new([0u8; KEY_LEN]);
    pbkdf2::derive(ALGORITHM, iterations(), salt, secret, out.as_mut());
    out
}

/// Generate a random 32-byte salt, hex-encoded.
pub fn generate_salt() -> Result<String, StrongboxError> {
    let rng = SystemRandom::new();
    let mut salt = [0u8; SALT_LEN];
    rng.fill(&mut salt)
        .map_err(|_| StrongboxError::Crypto("failed to generate random salt".to_string()))?;
    Ok(hex::encode(salt))
}

/// Derive a 256-bit key from `secret` and a hex salt, hex-encoded.
///
/// Deterministic in `(secret, salt)`.
pub fn derive_key(secret: &str, salt_hex: &str) -> Result<String, StrongboxError> {
    let salt = decode_salt(salt_hex)?;
    let derived = derive_raw(secret.as_bytes(), &salt);
    Ok(hex::encode(&*derived))
}

/// Check `secret` against a hash produced by [`derive_key`] in constant time.
pub fn verify_key(secret: &str, salt_hex: &str, expected_hex: &str) -> Result<bool, StrongboxError> {
    let salt = decode_salt(salt_hex)?;
    let Ok(expected) = hex::decode(expected_hex) else {
        return Ok(false);
    };
    Ok(pbkdf2::verify(ALGORITHM, iterations(), &salt, secret.as_bytes(), &expected).is_ok())
}

/// Derive the AES-256 session key for `secret` under the stored master salt.
pub fn derive_session_key(
    secret: &str,
    salt_hex: &str,
) -> Result<Zeroizing<[u8; KEY_LEN]>, StrongboxError> {
    let mut salt = decode_salt(salt_hex)?;
    salt.extend_from_slice(SESSION_KEY_CONTEXT);
    Ok(derive_raw(secret.as_bytes(), &salt))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SALT: &str = "00112233445566778899aabbccddeeff00112233445566778899aabbccddeeff";

    #[test]
    fn derive_key_is_deterministic() {
        let a = derive_key("correct horse", SALT).unwrap();
        let b = derive_key("correct horse", SALT).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), KEY_LEN * 2);
    }

    #[test]
    fn different_salt_produces_different_key() {
        let other = generate_salt().unwrap();
        assert_ne!(
            derive_key("correct horse", SALT).unwrap(),
            derive_key("correct horse", &other).unwrap()
        );
    }

    #[test]
    fn different_secret_produces_different_key() {
        assert_ne!(
            derive_key("one", SALT).unwrap(),
            derive_key("two", SALT).unwrap()
        );
    }

    #[test]
    fn verify_key_accepts_only_the_same_secret() {
        let hash = derive_key("pw", SALT).unwrap();
        assert!(verify_key("pw", SALT, &hash).unwrap());
        assert!(!verify_key("pw2", SALT, &hash).unwrap());
        assert!(!verify_key("pw", SALT, "not-hex").unwrap());
    }

    #[test]
    fn session_key_differs_from_stored_hash() {
        let hash = derive_key("pw", SALT).unwrap();
        let session = derive_session_key("pw", SALT).unwrap();
        assert_ne!(hash, hex::encode(*session));
    }

    #[test]
    fn generate_salt_is_random_hex() {
        let a = generate_salt().unwrap();
        let b = generate_salt().unwrap();
        assert_ne!(a, b);
        assert_eq!(hex::decode(&a).unwrap().len(), SALT_LEN);
    }

    #[test]
    fn invalid_salt_is_a_crypto_error() {
        assert!(matches!(
            derive_key("pw", "zz"),
            Err(StrongboxError::Crypto(_))
        ));
    }
}
