//! Result type for a sync run.

use serde::{Deserialize, Serialize};

use crate::scope::Scope;

/// What a single `sync()` call did to the database store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncReport {
    pub scope: Scope,
    /// True when the service runs on the disk driver and nothing was done.
    pub skipped: bool,
    pub revisions_retired: usize,
    pub files_upserted: usize,
    pub files_deleted: usize,
}

impl SyncReport {
    pub fn skipped(scope: Scope) -> Self {
        Self {
            scope,
            skipped: true,
            revisions_retired: 0,
            files_upserted: 0,
            files_deleted: 0,
        }
    }

    pub fn new(scope: Scope) -> Self {
        Self {
            skipped: false,
            ..Self::skipped(scope)
        }
    }

    /// Whether the run mutated anything besides re-writing disk content.
    pub fn changed_ledger_or_file_set(&self) -> bool {
        self.revisions_retired > 0 || self.files_deleted > 0
    }
}
