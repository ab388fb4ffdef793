//! Application state wiring the ghost service together.
//!
//! `GhostService` is generic over its two drivers; AppState pins it to the
//! concrete disk and SQLite implementations.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;

use ghostfs_core::cache::LocalOnly;
use ghostfs_core::ghost::{GhostService, ScopedGhost};
use ghostfs_infra::config::{load_config, resolve_database_url};
use ghostfs_infra::filesystem::resolve_data_dir;
use ghostfs_infra::sqlite::{DatabasePool, SqliteStorageDriver};
use ghostfs_infra::storage::DiskStorageDriver;
use ghostfs_types::scope::DriverMode;

/// Concrete type aliases for the service generics pinned to infra implementations.
pub type ConcreteGhostService = GhostService<DiskStorageDriver, SqliteStorageDriver>;

pub type ConcreteScope = ScopedGhost<DiskStorageDriver, SqliteStorageDriver>;

/// Shared application state for CLI commands.
pub struct AppState {
    pub ghost: ConcreteGhostService,
    pub data_dir: PathBuf,
    pub database_url: String,
}

impl AppState {
    /// Initialize the application state: load config, connect to the DB, run
    /// the startup sync.
    pub async fn init() -> anyhow::Result<Self> {
        let data_dir = resolve_data_dir();

        // Ensure data directory exists
        tokio::fs::create_dir_all(&data_dir)
            .await
            .with_context(|| format!("Failed to create data dir {}", data_dir.display()))?;

        let config = load_config(&data_dir).await;
        let mode = DriverMode::from_flag(config.use_database_driver);

        let database_url = resolve_database_url(&config, &data_dir);
        let db_pool = DatabasePool::new(&with_create_mode(&database_url))
            .await
            .with_context(|| format!("Failed to open database {database_url}"))?;

        let ghost = GhostService::initialize(
            Arc::new(DiskStorageDriver::new(data_dir.clone())),
            Arc::new(SqliteStorageDriver::new(db_pool)),
            mode,
            config,
            Arc::new(LocalOnly),
        )
        .await?;

        Ok(Self {
            ghost,
            data_dir,
            database_url,
        })
    }

    /// Scope handle selected by the global `--bot` / `--bots` flags.
    pub fn scope(&self, bot: Option<&str>, all_bots: bool) -> anyhow::Result<Arc<ConcreteScope>> {
        match bot {
            Some(id) => Ok(self.ghost.for_bot(id)?),
            None if all_bots => Ok(self.ghost.bots()),
            None => Ok(self.ghost.global()),
        }
    }
}

/// Append `mode=rwc` to file URLs so a fresh data dir gets a database.
fn with_create_mode(url: &str) -> String {
    if url.contains("mode=") || url.contains(":memory:") {
        url.to_string()
    } else if url.contains('?') {
        format!("{url}&mode=rwc")
    } else {
        format!("{url}?mode=rwc")
    }
}
