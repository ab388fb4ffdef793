//! File-change notifications.
//!
//! Provides a `FileEventBus` that distributes `FileChanged` messages to all
//! subscribers via a `tokio::sync::broadcast` channel.

pub mod bus;

pub use bus::FileEventBus;
