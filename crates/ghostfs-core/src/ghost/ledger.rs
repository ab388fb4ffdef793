//! Read side of the revision ledger.
//!
//! Revisions are appended by the database driver itself on tracked writes;
//! this module only lists, groups and retires them. Under the disk driver
//! the ledger is reported empty and the database is never consulted.

use std::sync::Arc;

use ghostfs_types::error::GhostError;
use ghostfs_types::revision::{FileRevision, PendingChanges};
use ghostfs_types::scope::{DriverMode, Scope};

use crate::storage::driver::RevisionStore;

pub struct RevisionLedger<B> {
    db: Arc<B>,
    mode: DriverMode,
}

impl<B> Clone for RevisionLedger<B> {
    fn clone(&self) -> Self {
        Self {
            db: Arc::clone(&self.db),
            mode: self.mode,
        }
    }
}

impl<B: RevisionStore> RevisionLedger<B> {
    pub fn new(db: Arc<B>, mode: DriverMode) -> Self {
        Self { db, mode }
    }

    /// Every tracked revision under the scope root. Empty under the disk driver.
    pub async fn list(&self, scope: &Scope) -> Result<Vec<FileRevision>, GhostError> {
        if !self.mode.is_database() {
            return Ok(Vec::new());
        }
        self.db.list_revisions(&scope.root()).await
    }

    /// Revisions grouped by first folder beneath the scope root.
    pub async fn pending_changes(&self, scope: &Scope) -> Result<PendingChanges, GhostError> {
        let revisions = self.list(scope).await?;
        Ok(PendingChanges::group(&scope.root(), revisions))
    }

    pub async fn is_fully_synced(&self, scope: &Scope) -> Result<bool, GhostError> {
        Ok(self.list(scope).await?.is_empty())
    }
}
