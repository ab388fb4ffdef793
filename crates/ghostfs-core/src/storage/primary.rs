//! The active driver of a ghost service.
//!
//! `PrimaryDriver` is chosen once from the `DriverMode` and then used for every
//! read, write and listing, so call sites never branch on the mode.

use std::sync::Arc;

use ghostfs_types::error::GhostError;
use ghostfs_types::scope::DriverMode;

use super::driver::{RevisionStore, StorageDriver, SyncMarkerStore};

/// Tagged variant over the two backends.
pub enum PrimaryDriver<D, B> {
    Disk(Arc<D>),
    Database(Arc<B>),
}

impl<D, B> PrimaryDriver<D, B>
where
    D: SyncMarkerStore,
    B: RevisionStore,
{
    /// Pick the driver for `mode`.
    pub fn select(mode: DriverMode, disk: &Arc<D>, db: &Arc<B>) -> Self {
        match mode {
            DriverMode::Disk => PrimaryDriver::Disk(Arc::clone(disk)),
            DriverMode::Database => PrimaryDriver::Database(Arc::clone(db)),
        }
    }

    pub fn mode(&self) -> DriverMode {
        match self {
            PrimaryDriver::Disk(_) => DriverMode::Disk,
            PrimaryDriver::Database(_) => DriverMode::Database,
        }
    }
}

impl<D, B> Clone for PrimaryDriver<D, B> {
    fn clone(&self) -> Self {
        match self {
            PrimaryDriver::Disk(d) => PrimaryDriver::Disk(Arc::clone(d)),
            PrimaryDriver::Database(b) => PrimaryDriver::Database(Arc::clone(b)),
        }
    }
}

impl<D, B> StorageDriver for PrimaryDriver<D, B>
where
    D: SyncMarkerStore,
    B: RevisionStore,
{
    async fn read_file(&self, path: &str) -> Result<Vec<u8>, GhostError> {
        match self {
            PrimaryDriver::Disk(d) => d.read_file(path).await,
            PrimaryDriver::Database(b) => b.read_file(path).await,
        }
    }

    async fn upsert_file(
        &self,
        path: &str,
        content: &[u8],
        record_revision: bool,
    ) -> Result<(), GhostError> {
        match self {
            PrimaryDriver::Disk(d) => d.upsert_file(path, content, record_revision).await,
            PrimaryDriver::Database(b) => b.upsert_file(path, content, record_revision).await,
        }
    }

    async fn delete_file(&self, path: &str, record_revision: bool) -> Result<(), GhostError> {
        match self {
            PrimaryDriver::Disk(d) => d.delete_file(path, record_revision).await,
            PrimaryDriver::Database(b) => b.delete_file(path, record_revision).await,
        }
    }

    async fn file_exists(&self, path: &str) -> Result<bool, GhostError> {
        match self {
            PrimaryDriver::Disk(d) => d.file_exists(path).await,
            PrimaryDriver::Database(b) => b.file_exists(path).await,
        }
    }

    async fn directory_listing(&self, folder: &str) -> Result<Vec<String>, GhostError> {
        match self {
            PrimaryDriver::Disk(d) => d.directory_listing(folder).await,
            PrimaryDriver::Database(b) => b.directory_listing(folder).await,
        }
    }

    async fn move_file(&self, from: &str, to: &str) -> Result<(), GhostError> {
        match self {
            PrimaryDriver::Disk(d) => d.move_file(from, to).await,
            PrimaryDriver::Database(b) => b.move_file(from, to).await,
        }
    }

    async fn delete_dir(&self, folder: &str) -> Result<(), GhostError> {
        match self {
            PrimaryDriver::Disk(d) => d.delete_dir(folder).await,
            PrimaryDriver::Database(b) => b.delete_dir(folder).await,
        }
    }
}
