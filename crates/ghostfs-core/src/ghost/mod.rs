//! Ghost: scope-bound virtual file store.
//!
//! - `matcher`: glob filtering for listings
//! - `ledger`: pending-change queries over the revision ledger
//! - `sync`: disk → database reconciliation
//! - `scoped`: the per-scope read/write handle
//! - `service`: the facade owning drivers, cache and scope registry

pub mod ledger;
pub mod matcher;
pub mod scoped;
pub mod service;
pub mod sync;

pub use matcher::{ListingOptions, PathMatcher};
pub use scoped::{ScopedGhost, UpsertOptions};
pub use service::{GhostService, ScopeRegistry};
pub use sync::SyncEngine;
