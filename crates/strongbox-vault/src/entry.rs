// SPDX-FileCopyrightText: 2026 Strongbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use strongbox_core::{Entry, EntryFields, RecordId, StrongboxError};
use strongbox_crypto::EncryptionService;

/// Plaintext fields supplied when adding or updating an entry.
#[derive(Debug, Clone)]
pub struct EntryInput {
    pub site: String,
    pub username: String,
    pub email: String,
    pub password: SecretString,
}

impl EntryInput {
    pub(crate) fn seal(&self, crypto: &EncryptionService) -> Result<EntryFields, StrongboxError> {
        Ok(EntryFields {
            encrypted_site: crypto.encrypt(&self.site)?,
            encrypted_username: crypto.encrypt(&self.username)?,
            encrypted_email: crypto.encrypt(&self.email)?,
            encrypted_password: crypto.encrypt(self.password.expose_secret())?,
        })
    }
}

/// An entry decrypted under the session key. The password stays wrapped.
#[derive(Debug, Clone)]
pub struct DecryptedEntry {
    pub id: RecordId,
    pub owner_id: RecordId,
    pub site: String,
    pub username: String,
    pub email: String,
    pub password: SecretString,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DecryptedEntry {
    pub(crate) fn open(entry: Entry, crypto: &EncryptionService) -> Result<Self, StrongboxError> {
        Ok(Self {
            id: entry.id,
            owner_id: entry.owner_id,
            site: crypto.decrypt(&entry.encrypted_site)?,
            username: crypto.decrypt(&entry.encrypted_username)?,
            email: crypto.decrypt(&entry.encrypted_email)?,
            password: SecretString::from(crypto.decrypt(&entry.encrypted_password)?),
            created_at: entry.created_at,
            updated_at: entry.updated_at,
        })
    }

    /// Case-insensitive substring match over site, username, and email.
    ///
    /// A blank query matches everything.
    pub fn matches(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return true;
        }
        [&self.site, &self.username, &self.email]
            .iter()
            .any(|field| field.to_lowercase().contains(&query))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(site: &str, username: &str, email: &str) -> DecryptedEntry {
        DecryptedEntry {
            id: 1,
            owner_id: 1,
            site: site.to_string(),
            username: username.to_string(),
            email: email.to_string(),
            password: SecretString::from("hunter2".to_string()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn search_is_case_insensitive_over_visible_fields() {
        let e = entry("GitHub.com", "octo", "Octo@Example.com");
        assert!(e.matches("github"));
        assert!(e.matches("OCTO"));
        assert!(e.matches("example.COM"));
        assert!(e.matches("   "));
        assert!(!e.matches("hunter2"));
        assert!(!e.matches("gitlab"));
    }

    #[test]
    fn debug_output_redacts_password() {
        let e = entry("site", "user", "mail");
        assert!(!format!("{e:?}").contains("hunter2"));
    }
}
