// SPDX-FileCopyrightText: 2026 Strongbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! One Strongbox vault: storage, encryption, session, recovery, and sync
//! behind a single handle.
//!
//! Owner names and entry fields are encrypted here before they reach storage
//! and decrypted on the way out; nothing below this crate sees plaintext.

pub mod entry;
pub mod passwords;
pub mod vault;

pub use entry::{DecryptedEntry, EntryInput};
pub use passwords::{
    PasswordStrength, StrengthLabel, generate_password, is_valid_email, mask_secret,
    password_strength,
};
pub use vault::Vault;
