// SPDX-FileCopyrightText: 2026 Strongbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Serialized access to a shared storage backend.
//!
//! Every component reaches storage through a [`StorageGuard`]. A caller that
//! needs several commands to run without interleaving (the sync import, the
//! recovery reset) holds one guard for the whole sequence.

use std::ops::Deref;
use std::sync::Arc;

use tokio::sync::{Mutex, MutexGuard};

use crate::traits::storage::VaultStorage;

/// Cloneable handle to one vault's storage backend.
#[derive(Clone)]
pub struct StorageHandle {
    storage: Arc<dyn VaultStorage>,
    gate: Arc<Mutex<()>>,
}

impl std::fmt::Debug for StorageHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageHandle")
            .field("backend", &self.storage.name())
            .finish()
    }
}

impl StorageHandle {
    pub fn new(storage: Arc<dyn VaultStorage>) -> Self {
        Self {
            storage,
            gate: Arc::new(Mutex::new(())),
        }
    }

    /// Wait for exclusive access to the backend.
    pub async fn lock(&self) -> StorageGuard<'_> {
        let permit = self.gate.lock().await;
        StorageGuard {
            storage: self.storage.as_ref(),
            _permit: permit,
        }
    }

    /// Backend name, readable without taking the gate.
    pub fn backend_name(&self) -> &str {
        self.storage.name()
    }
}

/// Exclusive access to the backend for as long as the guard lives.
pub struct StorageGuard<'a> {
    storage: &'a dyn VaultStorage,
    _permit: MutexGuard<'a, ()>,
}

impl Deref for StorageGuard<'_> {
    type Target = dyn VaultStorage;

    fn deref(&self) -> &Self::Target {
        self.storage
    }
}
