//! Ghost service logic and storage driver trait definitions.
//!
//! This crate defines the "ports" (driver traits) that the infrastructure
//! layer implements, plus everything that sits on top of them: the content
//! cache, the revision ledger, path matching, disk-to-database sync and the
//! scoped ghost facade. It depends only on `ghostfs-types` -- never on
//! `ghostfs-infra` or any database/IO crate.

pub mod cache;
pub mod event;
pub mod ghost;
pub mod service;
pub mod storage;

#[cfg(test)]
pub(crate) mod testing;
