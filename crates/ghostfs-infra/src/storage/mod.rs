//! Ghost storage on the local filesystem.

pub mod disk;

pub use disk::DiskStorageDriver;
