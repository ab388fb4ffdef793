//! Infrastructure layer for the ghost file store.
//!
//! Contains implementations of the driver traits defined in `ghostfs-core`:
//! the disk driver (tokio::fs + walkdir), the SQLite driver (sqlx, split
//! reader/writer pool), filesystem adapters and config loading.

pub mod config;
pub mod filesystem;
pub mod sqlite;
pub mod storage;
