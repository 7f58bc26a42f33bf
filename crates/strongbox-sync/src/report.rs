// SPDX-FileCopyrightText: 2026 Strongbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use std::fmt;

use serde::Serialize;

/// What an import did to the local vault.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MergeReport {
    pub owners_inserted: usize,
    pub owners_updated: usize,
    pub owners_unchanged: usize,
    pub entries_inserted: usize,
    pub entries_updated: usize,
    pub entries_unchanged: usize,
    /// Remote entries whose owner is not part of the snapshot.
    pub entries_skipped: usize,
}

impl MergeReport {
    /// Whether the import changed any owner or entry.
    pub fn changed(&self) -> bool {
        self.owners_inserted + self.owners_updated + self.entries_inserted + self.entries_updated
            > 0
    }
}

impl fmt::Display for MergeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "owners: {} new, {} updated, {} unchanged; entries: {} new, {} updated, {} unchanged",
            self.owners_inserted,
            self.owners_updated,
            self.owners_unchanged,
            self.entries_inserted,
            self.entries_updated,
            self.entries_unchanged,
        )?;
        if self.entries_skipped > 0 {
            write!(f, ", {} skipped", self.entries_skipped)?;
        }
        Ok(())
    }
}
