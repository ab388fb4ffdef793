//! Content cache and cross-node invalidation.

pub mod broadcast;
pub mod content;

pub use broadcast::{ChannelBroadcaster, CoherentCache, InvalidationBroadcaster, LocalOnly};
pub use content::{CacheKey, CacheStats, CachedValue, ContentCache, Representation};
