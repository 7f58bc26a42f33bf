// SPDX-FileCopyrightText: 2026 Strongbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Encryption layer for the Strongbox credential vault.
//!
//! A master password is stretched with PBKDF2-HMAC-SHA256 (100 000 iterations)
//! into a verification hash and, separately, a session key. While the vault is
//! unlocked the session key lives in a [`KeySlot`]; every record field is
//! sealed with AES-256-GCM under that key.

pub mod cipher;
pub mod kdf;
pub mod prompt;
pub mod service;
pub mod session;

pub use prompt::{get_master_password, get_master_password_with_confirm, prompt_secret};
pub use service::EncryptionService;
pub use session::KeySlot;
