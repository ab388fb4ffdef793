//! Shared domain types for the ghost file store.
//!
//! This crate contains the types every layer speaks: scopes and canonical
//! paths, driver modes, revisions and sync markers, pending-change reports,
//! configuration, and the error taxonomy.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod config;
pub mod error;
pub mod event;
pub mod revision;
pub mod scope;
pub mod sync;
