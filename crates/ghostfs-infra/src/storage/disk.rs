//! Disk ghost driver.
//!
//! Canonical ghost paths map one-to-one onto files below `base_dir`:
//!
//! ```text
//! {base_dir}/data/global/flows/main.flow.json
//! {base_dir}/data/global/revisions.json        <- sync marker
//! {base_dir}/data/bots/luna/bot.config.json
//! ```
//!
//! The disk keeps no ledger. Its `revisions.json` files are sync markers:
//! the ledger state an export captured, and that the disk content reflects.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use ghostfs_core::storage::driver::{SYNC_MARKER_FILE, StorageDriver, SyncMarkerStore};
use ghostfs_types::error::GhostError;
use ghostfs_types::revision::{FileRevision, SyncMarker};
use ghostfs_types::scope::normalize_path;

/// Local filesystem-backed ghost driver.
#[derive(Debug, Clone)]
pub struct DiskStorageDriver {
    base_dir: PathBuf,
}

impl DiskStorageDriver {
    /// Create a driver rooted at `base_dir`. Ghost paths resolve below it.
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn resolve(&self, path: &str) -> Result<PathBuf, GhostError> {
        let normalized = normalize_path(path)?;
        Ok(normalized
            .split('/')
            .filter(|s| !s.is_empty())
            .fold(self.base_dir.clone(), |acc, segment| acc.join(segment)))
    }

    /// Every marker file at or below `root`, skipping `node_modules`.
    async fn marker_files_below(&self, root: &Path) -> Result<Vec<PathBuf>, GhostError> {
        let root = root.to_path_buf();
        let scan_root = root.clone();
        let files = tokio::task::spawn_blocking(move || walk_files(&scan_root, true))
            .await
            .map_err(|e| GhostError::Driver(format!("marker scan failed: {e}")))?
            .map_err(|e| walk_error(&root.display().to_string(), e))?;
        Ok(files
            .into_iter()
            .filter(|f| f.file_name().is_some_and(|n| n == SYNC_MARKER_FILE))
            .collect())
    }

    async fn read_marker_file(&self, file: &Path) -> Result<Option<SyncMarker>, GhostError> {
        let bytes = match tokio::fs::read(file).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(io_error(&file.display().to_string(), e)),
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| GhostError::Parse {
                path: file.display().to_string(),
                message: e.to_string(),
            })
    }
}

fn io_error(path: &str, e: std::io::Error) -> GhostError {
    if e.kind() == std::io::ErrorKind::NotFound {
        GhostError::not_found(path)
    } else {
        GhostError::Driver(format!("{path}: {e}"))
    }
}

/// Files below `root`, following symlinks the way reads do.
///
/// A missing root walks as empty. Any other failure, including a symlink
/// loop or an unreadable folder, is returned rather than skipped.
fn walk_files(root: &Path, skip_node_modules: bool) -> Result<Vec<PathBuf>, walkdir::Error> {
    let walker = WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_entry(|e| !(skip_node_modules && e.depth() > 0 && e.file_name() == "node_modules"));

    let mut files = Vec::new();
    for entry in walker {
        match entry {
            Ok(e) if e.file_type().is_file() => files.push(e.into_path()),
            Ok(_) => {}
            Err(e)
                if e.depth() == 0
                    && e
                        .io_error()
                        .is_some_and(|io| io.kind() == std::io::ErrorKind::NotFound) =>
            {
                return Ok(Vec::new());
            }
            Err(e) => return Err(e),
        }
    }
    Ok(files)
}

fn walk_error(path: &str, e: walkdir::Error) -> GhostError {
    GhostError::Driver(format!("walking {path}: {e}"))
}

fn relative_slash_path(base: &Path, file: &Path) -> Option<String> {
    let relative = file.strip_prefix(base).ok()?;
    let segments: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    Some(segments.join("/"))
}

impl StorageDriver for DiskStorageDriver {
    async fn read_file(&self, path: &str) -> Result<Vec<u8>, GhostError> {
        let file = self.resolve(path)?;
        tokio::fs::read(&file).await.map_err(|e| io_error(path, e))
    }

    async fn upsert_file(
        &self,
        path: &str,
        content: &[u8],
        _record_revision: bool,
    ) -> Result<(), GhostError> {
        let file = self.resolve(path)?;
        if let Some(parent) = file.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| io_error(path, e))?;
        }
        tokio::fs::write(&file, content)
            .await
            .map_err(|e| io_error(path, e))
    }

    async fn delete_file(&self, path: &str, _record_revision: bool) -> Result<(), GhostError> {
        let file = self.resolve(path)?;
        tokio::fs::remove_file(&file)
            .await
            .map_err(|e| io_error(path, e))
    }

    async fn file_exists(&self, path: &str) -> Result<bool, GhostError> {
        let file = self.resolve(path)?;
        match tokio::fs::metadata(&file).await {
            Ok(meta) => Ok(meta.is_file()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(io_error(path, e)),
        }
    }

    async fn directory_listing(&self, folder: &str) -> Result<Vec<String>, GhostError> {
        let dir = self.resolve(folder)?;
        let mut files = tokio::task::spawn_blocking(move || {
            walk_files(&dir, false).map(|found| {
                found
                    .iter()
                    .filter_map(|f| relative_slash_path(&dir, f))
                    .collect::<Vec<_>>()
            })
        })
        .await
        .map_err(|e| GhostError::Driver(format!("listing {folder} failed: {e}")))?
        .map_err(|e| walk_error(folder, e))?;
        files.sort();
        Ok(files)
    }

    async fn move_file(&self, from: &str, to: &str) -> Result<(), GhostError> {
        let source = self.resolve(from)?;
        let target = self.resolve(to)?;
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| io_error(to, e))?;
        }
        tokio::fs::rename(&source, &target)
            .await
            .map_err(|e| io_error(from, e))
    }

    async fn delete_dir(&self, folder: &str) -> Result<(), GhostError> {
        let dir = self.resolve(folder)?;
        match tokio::fs::remove_dir_all(&dir).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_error(folder, e)),
        }
    }
}

impl SyncMarkerStore for DiskStorageDriver {
    /// Union of the markers in `root`, below it, and in its ancestors, keeping
    /// only revisions under `root`. An export of `data/bots` therefore covers
    /// each bot, and per-bot exports cover `data/bots`.
    async fn read_sync_marker(&self, root: &str) -> Result<SyncMarker, GhostError> {
        let root_dir = self.resolve(root)?;

        let mut files = self.marker_files_below(&root_dir).await?;
        let mut ancestor = root_dir.parent();
        while let Some(dir) = ancestor {
            if !dir.starts_with(&self.base_dir) {
                break;
            }
            files.push(dir.join(SYNC_MARKER_FILE));
            ancestor = dir.parent();
        }

        let mut seen = BTreeSet::new();
        let mut revisions: Vec<FileRevision> = Vec::new();
        for file in &files {
            if let Some(marker) = self.read_marker_file(file).await? {
                revisions.extend(marker.revisions.into_iter().filter(|r| seen.insert(r.key())));
            }
        }
        Ok(SyncMarker::new(revisions).scoped_to(root))
    }
}
