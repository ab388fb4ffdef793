//! SQLite storage layer.
//!
//! The database ghost driver, backed by SQLite with WAL mode and split
//! read/write connection pools.

pub mod driver;
pub mod pool;

pub use driver::SqliteStorageDriver;
pub use pool::DatabasePool;
