//! FileSystem trait for export and import directories.
//!
//! Defined in ghostfs-core so a scope can be exported to, or imported from,
//! a plain directory without depending on any specific filesystem
//! implementation. The `LocalFileSystem` adapter lives in ghostfs-infra.

use std::path::Path;

/// Abstraction over the host filesystem, outside any scope root.
pub trait FileSystem: Send + Sync {
    /// Write bytes to a file, creating parent directories as needed.
    fn write_bytes(
        &self,
        path: &Path,
        content: &[u8],
    ) -> impl std::future::Future<Output = Result<(), std::io::Error>> + Send;

    fn read_bytes(
        &self,
        path: &Path,
    ) -> impl std::future::Future<Output = Result<Vec<u8>, std::io::Error>> + Send;

    /// Every file below `dir`, as sorted forward-slash paths relative to it.
    /// A missing directory lists as empty.
    fn list_files(
        &self,
        dir: &Path,
    ) -> impl std::future::Future<Output = Result<Vec<String>, std::io::Error>> + Send;

    /// Check whether a path exists.
    fn exists(&self, path: &Path) -> impl std::future::Future<Output = bool> + Send;

    /// Create a directory and all parent directories.
    fn create_dir_all(
        &self,
        path: &Path,
    ) -> impl std::future::Future<Output = Result<(), std::io::Error>> + Send;
}
