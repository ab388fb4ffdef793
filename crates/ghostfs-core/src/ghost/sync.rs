//! Disk → database reconciliation.
//!
//! `SyncEngine` is the only component that talks to both drivers. A run
//! publishes disk content into the database and retires the ledger:
//!
//! 1. list the database ledger and the disk sync marker for the scope
//! 2. refuse to run unless every ledger revision is in the marker
//! 3. delete each ledger revision
//! 4. upsert every disk file into the database, untracked
//! 5. delete database files that are no longer on disk, untracked
//!
//! Each step is idempotent on its own, so re-running after a failure
//! converges without manual repair.

use std::collections::BTreeSet;
use std::sync::Arc;

use ghostfs_types::error::GhostError;
use ghostfs_types::scope::{Scope, join_path};
use ghostfs_types::sync::SyncReport;

use crate::cache::CoherentCache;
use crate::ghost::matcher::{ListingOptions, filter_listing};
use crate::storage::driver::{RevisionStore, SYNC_MARKER_FILE, SyncMarkerStore};

/// Disk paths that never take part in a sync.
pub const SYNC_EXCLUDES: [&str; 2] = ["**/revisions.json", "**/node_modules/**"];

pub(crate) fn sync_listing_options() -> ListingOptions {
    ListingOptions::excluding(SYNC_EXCLUDES).with_dot_files()
}

pub struct SyncEngine<D, B> {
    disk: Arc<D>,
    db: Arc<B>,
    cache: CoherentCache,
}

impl<D, B> SyncEngine<D, B>
where
    D: SyncMarkerStore,
    B: RevisionStore,
{
    pub fn new(disk: Arc<D>, db: Arc<B>, cache: CoherentCache) -> Self {
        Self { disk, db, cache }
    }

    /// Make the database mirror disk for `scope` and empty its ledger.
    ///
    /// Fails with `GhostError::SyncPrecondition`, before touching either
    /// store, when the database holds revisions disk's marker doesn't know.
    /// Callers must not run two syncs of the same scope concurrently.
    #[tracing::instrument(skip(self), fields(ghost.scope = %scope))]
    pub async fn sync(&self, scope: &Scope) -> Result<SyncReport, GhostError> {
        let root = scope.root();
        let mut report = SyncReport::new(scope.clone());

        let db_revisions = self.db.list_revisions(&root).await?;
        let marker = self.disk.read_sync_marker(&root).await?;
        let comparison = marker.compare(&db_revisions);

        if !comparison.missing_on_disk.is_empty() {
            tracing::warn!(
                pending = db_revisions.len(),
                missing_on_disk = comparison.missing_on_disk.len(),
                "disk has not caught up with the database, refusing to sync"
            );
            return Err(GhostError::SyncPrecondition {
                pending: db_revisions.len(),
                missing_on_disk: comparison.missing_on_disk.len(),
                unknown_on_disk: comparison.unknown_on_disk.len(),
            });
        }
        if !comparison.unknown_on_disk.is_empty() {
            tracing::debug!(
                count = comparison.unknown_on_disk.len(),
                "{SYNC_MARKER_FILE} lists revisions the database already retired"
            );
        }

        for revision in &db_revisions {
            self.db.delete_revision(revision).await?;
            report.revisions_retired += 1;
        }
        tracing::info!(retired = report.revisions_retired, "ledger retired");

        let db_files = self.db.directory_listing(&root).await?;
        let disk_files = filter_listing(
            self.disk.directory_listing(&root).await?,
            None,
            &sync_listing_options(),
        )?;

        for relative in &disk_files {
            let path = join_path(&[&root, relative]);
            let content = self.disk.read_file(&path).await?;
            self.db.upsert_file(&path, &content, false).await?;
            self.cache.invalidate([path]);
            report.files_upserted += 1;
        }

        let on_disk: BTreeSet<&str> = disk_files.iter().map(String::as_str).collect();
        for relative in db_files.iter().filter(|f| !on_disk.contains(f.as_str())) {
            let path = join_path(&[&root, relative]);
            match self.db.delete_file(&path, false).await {
                Ok(()) => report.files_deleted += 1,
                // Already gone, e.g. removed by an earlier interrupted run.
                Err(e) if e.is_not_found() => {}
                Err(e) => return Err(e),
            }
            self.cache.invalidate([path]);
        }

        tracing::info!(
            upserted = report.files_upserted,
            deleted = report.files_deleted,
            "sync complete"
        );
        Ok(report)
    }
}
