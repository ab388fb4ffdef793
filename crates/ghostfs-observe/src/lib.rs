//! Logging and trace export for the ghost file store.

pub mod tracing_setup;
