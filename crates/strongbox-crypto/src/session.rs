// SPDX-FileCopyrightText: 2026 Strongbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory holder for the session key.

use std::sync::{Arc, PoisonError, RwLock};

use strongbox_core::StrongboxError;
use zeroize::Zeroizing;

use crate::kdf::KEY_LEN;

/// Shared slot holding the session key while the vault is unlocked.
///
/// Clones share the same slot. The key is zeroized when cleared or replaced.
/// Debug output never includes key material.
#[derive(Clone, Default)]
pub struct KeySlot {
    key: Arc<RwLock<Option<Zeroizing<[u8; KEY_LEN]>>>>,
}

impl std::fmt::Debug for KeySlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeySlot")
            .field("key", &if self.is_set() { "[REDACTED]" } else { "<empty>" })
            .finish()
    }
}

impl KeySlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn install(&self, key: Zeroizing<[u8; KEY_LEN]>) {
        *self.key.write().unwrap_or_else(PoisonError::into_inner) = Some(key);
    }

    pub fn clear(&self) {
        self.key.write().unwrap_or_else(PoisonError::into_inner).take();
    }

    pub fn is_set(&self) -> bool {
        self.key.read().unwrap_or_else(PoisonError::into_inner).is_some()
    }

    /// A copy of the current key, or `Locked` when the slot is empty.
    pub fn get(&self) -> Result<Zeroizing<[u8; KEY_LEN]>, StrongboxError> {
        self.key
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|key| Zeroizing::new(**key))
            .ok_or(StrongboxError::Locked)
    }
}
