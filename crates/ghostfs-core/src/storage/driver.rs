//! Storage driver traits.
//!
//! Defines the raw read/write/list primitives every backend provides, the
//! revision ledger only the database backend keeps, and the sync marker only
//! the disk backend keeps. Implementations live in ghostfs-infra.

use ghostfs_types::error::GhostError;
use ghostfs_types::revision::{FileRevision, SyncMarker};

/// File name of the disk sync marker, stored at a scope root.
pub const SYNC_MARKER_FILE: &str = "revisions.json";

/// Raw file primitives over canonical ghost paths (`data/global/...`).
///
/// Uses RPITIT (native async fn in traits, Rust 2024 edition).
/// Implementations live in ghostfs-infra.
pub trait StorageDriver: Send + Sync {
    /// Read a file's bytes. Missing files fail with `GhostError::NotFound`.
    fn read_file(
        &self,
        path: &str,
    ) -> impl std::future::Future<Output = Result<Vec<u8>, GhostError>> + Send;

    /// Create or overwrite a file.
    ///
    /// `record_revision` asks the driver to append a ledger entry; drivers
    /// without a ledger ignore it.
    fn upsert_file(
        &self,
        path: &str,
        content: &[u8],
        record_revision: bool,
    ) -> impl std::future::Future<Output = Result<(), GhostError>> + Send;

    /// Delete a file. Missing files fail with `GhostError::NotFound`.
    fn delete_file(
        &self,
        path: &str,
        record_revision: bool,
    ) -> impl std::future::Future<Output = Result<(), GhostError>> + Send;

    fn file_exists(
        &self,
        path: &str,
    ) -> impl std::future::Future<Output = Result<bool, GhostError>> + Send;

    /// Every file under `folder`, as forward-slash paths relative to it,
    /// sorted. A folder that does not exist lists as empty.
    fn directory_listing(
        &self,
        folder: &str,
    ) -> impl std::future::Future<Output = Result<Vec<String>, GhostError>> + Send;

    fn move_file(
        &self,
        from: &str,
        to: &str,
    ) -> impl std::future::Future<Output = Result<(), GhostError>> + Send;

    /// Delete a folder and everything under it. Missing folders are a no-op.
    fn delete_dir(
        &self,
        folder: &str,
    ) -> impl std::future::Future<Output = Result<(), GhostError>> + Send;
}

/// Per-change revision ledger kept by the database driver.
pub trait RevisionStore: StorageDriver {
    /// Every tracked revision whose path lies under `prefix`, oldest first.
    fn list_revisions(
        &self,
        prefix: &str,
    ) -> impl std::future::Future<Output = Result<Vec<FileRevision>, GhostError>> + Send;

    /// Remove one revision. Removing an unknown revision succeeds.
    fn delete_revision(
        &self,
        revision: &FileRevision,
    ) -> impl std::future::Future<Output = Result<(), GhostError>> + Send;
}

/// Disk-side checkpoint of the ledger state disk content already reflects.
///
/// Read-only: markers land on disk through an export, as ordinary files.
pub trait SyncMarkerStore: StorageDriver {
    /// The marker covering `root`. Absent markers read as empty.
    fn read_sync_marker(
        &self,
        root: &str,
    ) -> impl std::future::Future<Output = Result<SyncMarker, GhostError>> + Send;
}
