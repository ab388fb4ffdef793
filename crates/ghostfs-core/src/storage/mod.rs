//! Storage driver abstractions.
//!
//! Defines the capability traits shared by the disk and database drivers and
//! the tagged `PrimaryDriver` the ghost service routes through.
//! Implementations live in ghostfs-infra.

pub mod driver;
pub mod primary;
