//! Filesystem adapters.
//!
//! Implements the `FileSystem` trait from `ghostfs-core` for real filesystem
//! I/O (export and import directories), and resolves the data directory.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use ghostfs_core::service::fs::FileSystem;

/// Local filesystem implementation of the `FileSystem` trait.
///
/// All operations go through `tokio::fs` for async I/O; directory walks run
/// on the blocking pool.
pub struct LocalFileSystem;

impl LocalFileSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LocalFileSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl FileSystem for LocalFileSystem {
    async fn write_bytes(&self, path: &Path, content: &[u8]) -> Result<(), std::io::Error> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, content).await
    }

    async fn read_bytes(&self, path: &Path) -> Result<Vec<u8>, std::io::Error> {
        tokio::fs::read(path).await
    }

    async fn list_files(&self, dir: &Path) -> Result<Vec<String>, std::io::Error> {
        let dir = dir.to_path_buf();
        let mut files = tokio::task::spawn_blocking(move || {
            let mut files = Vec::new();
            for entry in WalkDir::new(&dir).follow_links(true) {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(e) if e.depth() == 0 && is_not_found(&e) => return Ok(Vec::new()),
                    Err(e) => return Err(std::io::Error::from(e)),
                };
                if !entry.file_type().is_file() {
                    continue;
                }
                if let Ok(relative) = entry.path().strip_prefix(&dir) {
                    let segments: Vec<_> = relative
                        .components()
                        .map(|c| c.as_os_str().to_string_lossy().into_owned())
                        .collect();
                    files.push(segments.join("/"));
                }
            }
            Ok(files)
        })
        .await
        .map_err(std::io::Error::other)??;
        files.sort();
        Ok(files)
    }

    async fn exists(&self, path: &Path) -> bool {
        tokio::fs::try_exists(path).await.unwrap_or(false)
    }

    async fn create_dir_all(&self, path: &Path) -> Result<(), std::io::Error> {
        tokio::fs::create_dir_all(path).await
    }
}

/// Resolve the data directory from environment or platform defaults.
///
/// Priority:
/// 1. `GHOSTFS_DATA_DIR` environment variable
/// 2. `~/.ghostfs`
pub fn resolve_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("GHOSTFS_DATA_DIR") {
        return PathBuf::from(dir);
    }

    if let Some(home) = dirs::home_dir() {
        return home.join(".ghostfs");
    }

    // Last resort: current directory
    PathBuf::from(".ghostfs")
}

fn is_not_found(e: &walkdir::Error) -> bool {
    e.io_error()
        .is_some_and(|io| io.kind() == std::io::ErrorKind::NotFound)
}
