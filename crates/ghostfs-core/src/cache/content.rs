//! In-memory content cache keyed by canonical path and representation.
//!
//! A file can be cached as raw bytes, as decoded UTF-8 text and as a parsed
//! JSON value at the same time. Each representation is an independent entry,
//! but invalidation always evicts all three for a path.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use serde::Serialize;

/// The form a cached file is held in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Representation {
    Buffer,
    String,
    Object,
}

impl Representation {
    pub const ALL: [Representation; 3] = [
        Representation::Buffer,
        Representation::String,
        Representation::Object,
    ];
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub path: String,
    pub representation: Representation,
}

impl CacheKey {
    pub fn new(path: impl Into<String>, representation: Representation) -> Self {
        Self {
            path: path.into(),
            representation,
        }
    }

    pub fn buffer(path: &str) -> Self {
        Self::new(path, Representation::Buffer)
    }

    pub fn string(path: &str) -> Self {
        Self::new(path, Representation::String)
    }

    pub fn object(path: &str) -> Self {
        Self::new(path, Representation::Object)
    }
}

/// A cached file. Values are reference-counted so hits never copy content.
#[derive(Debug, Clone, PartialEq)]
pub enum CachedValue {
    Buffer(Arc<[u8]>),
    String(Arc<str>),
    Object {
        value: Arc<serde_json::Value>,
        /// Byte length of the source the value was parsed from.
        source_len: usize,
    },
}

impl CachedValue {
    /// Size charged against the max entry limit.
    pub fn size(&self) -> usize {
        match self {
            CachedValue::Buffer(b) => b.len(),
            CachedValue::String(s) => s.len(),
            CachedValue::Object { source_len, .. } => *source_len,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
}

/// Concurrent content cache.
///
/// No entry ever outlives a write to its path: the ghost layer invalidates
/// before it reports a mutation as done.
#[derive(Debug)]
pub struct ContentCache {
    entries: DashMap<CacheKey, CachedValue>,
    max_entry_bytes: u64,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl ContentCache {
    pub fn new(max_entry_bytes: u64) -> Self {
        Self {
            entries: DashMap::new(),
            max_entry_bytes,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn get(&self, key: &CacheKey) -> Option<CachedValue> {
        // Clone out of the guard so no shard lock is held by the caller.
        let hit = self.entries.get(key).map(|entry| entry.value().clone());
        match hit {
            Some(_) => self.hits.fetch_add(1, Ordering::Relaxed),
            None => self.misses.fetch_add(1, Ordering::Relaxed),
        };
        hit
    }

    /// Whether `key` is cached, without touching the hit counters.
    pub fn contains(&self, key: &CacheKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Store `value` under `key`. Returns false when the value is over the
    /// entry limit and was not stored.
    pub fn insert(&self, key: CacheKey, value: CachedValue) -> bool {
        if value.size() as u64 > self.max_entry_bytes {
            tracing::debug!(
                path = %key.path,
                size = value.size(),
                limit = self.max_entry_bytes,
                "value too large to cache"
            );
            return false;
        }
        self.entries.insert(key, value);
        true
    }

    /// Evict every representation of `path`.
    pub fn invalidate_path(&self, path: &str) {
        for representation in Representation::ALL {
            self.entries.remove(&CacheKey::new(path, representation));
        }
    }

    /// Evict every entry whose path starts with `prefix`.
    pub fn invalidate_prefix(&self, prefix: &str) {
        self.entries.retain(|key, _| !key.path.starts_with(prefix));
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.entries.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}
