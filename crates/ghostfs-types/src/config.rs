//! Configuration types for the ghost file store.
//!
//! `GhostConfig` represents the `config.toml` in the data directory that
//! selects the storage driver and sets size limits.

use serde::{Deserialize, Serialize};

/// 100 MiB, the default upload limit.
pub const DEFAULT_MAX_FILE_SIZE_BYTES: u64 = 100 * 1024 * 1024;

/// 500 MiB, the upload limit for `*.model` artifacts.
pub const DEFAULT_MAX_MODEL_FILE_SIZE_BYTES: u64 = 500 * 1024 * 1024;

/// 50 MiB; larger contents are served but never cached.
pub const DEFAULT_CACHE_MAX_ENTRY_BYTES: u64 = 50 * 1024 * 1024;

/// Top-level configuration. All fields have sensible defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GhostConfig {
    /// Read and write through the database driver instead of the disk.
    #[serde(default)]
    pub use_database_driver: bool,

    /// Database URL. Defaults to `sqlite://{data_dir}/ghost.db` when unset.
    #[serde(default)]
    pub database_url: Option<String>,

    #[serde(default = "default_max_file_size")]
    pub max_file_size_bytes: u64,

    /// Limit for files ending in `.model`.
    #[serde(default = "default_max_model_file_size")]
    pub max_model_file_size_bytes: u64,

    #[serde(default = "default_cache_max_entry")]
    pub cache_max_entry_bytes: u64,

    /// Sync disk into an empty database when the service starts.
    #[serde(default = "default_true")]
    pub sync_on_startup: bool,
}

fn default_max_file_size() -> u64 {
    DEFAULT_MAX_FILE_SIZE_BYTES
}

fn default_max_model_file_size() -> u64 {
    DEFAULT_MAX_MODEL_FILE_SIZE_BYTES
}

fn default_cache_max_entry() -> u64 {
    DEFAULT_CACHE_MAX_ENTRY_BYTES
}

fn default_true() -> bool {
    true
}

impl Default for GhostConfig {
    fn default() -> Self {
        Self {
            use_database_driver: false,
            database_url: None,
            max_file_size_bytes: default_max_file_size(),
            max_model_file_size_bytes: default_max_model_file_size(),
            cache_max_entry_bytes: default_cache_max_entry(),
            sync_on_startup: true,
        }
    }
}

impl GhostConfig {
    /// Upload limit for a given file name.
    pub fn file_size_limit(&self, file_name: &str) -> u64 {
        if file_name.ends_with(".model") {
            self.max_model_file_size_bytes
        } else {
            self.max_file_size_bytes
        }
    }
}
