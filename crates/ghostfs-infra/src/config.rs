//! Configuration loader for the ghost file store.
//!
//! Reads `config.toml` from the data directory (`~/.ghostfs/` by default)
//! and deserializes it into [`GhostConfig`]. Falls back to defaults when the
//! file is missing or malformed.

use std::path::Path;

use ghostfs_types::config::GhostConfig;

use crate::sqlite::pool::default_database_url;

/// Environment override for `use_database_driver`.
pub const USE_DB_ENV: &str = "GHOSTFS_USE_DB";

/// Load configuration from `{data_dir}/config.toml`, then apply environment
/// overrides.
///
/// - If the file does not exist, starts from [`GhostConfig::default()`].
/// - If the file exists but fails to parse, logs a warning and starts from the default.
/// - `GHOSTFS_USE_DB` (`1`/`true`/`0`/`false`) overrides `use_database_driver`.
pub async fn load_config(data_dir: &Path) -> GhostConfig {
    let mut config = read_config_file(data_dir).await;
    if let Some(use_db) = env_flag(USE_DB_ENV) {
        config.use_database_driver = use_db;
    }
    config
}

async fn read_config_file(data_dir: &Path) -> GhostConfig {
    let config_path = data_dir.join("config.toml");

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config.toml found at {}, using defaults", config_path.display());
            return GhostConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return GhostConfig::default();
        }
    };

    match toml::from_str::<GhostConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            GhostConfig::default()
        }
    }
}

fn env_flag(name: &str) -> Option<bool> {
    let value = std::env::var(name).ok()?;
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Some(true),
        "0" | "false" | "no" => Some(false),
        other => {
            tracing::warn!("Ignoring {name}={other}: expected true or false");
            None
        }
    }
}

/// Database URL from config, or `sqlite://{data_dir}/ghost.db`.
pub fn resolve_database_url(config: &GhostConfig, data_dir: &Path) -> String {
    config
        .database_url
        .clone()
        .unwrap_or_else(|| default_database_url(data_dir))
}
