//! Cross-node cache invalidation.
//!
//! Each node keeps its own `ContentCache`. Invalidations are applied locally
//! first and then handed to an `InvalidationBroadcaster` so peers sharing the
//! same database can evict the same entries.

use std::sync::Arc;

use ghostfs_types::event::CacheInvalidation;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use uuid::Uuid;

use super::content::ContentCache;

/// Publishes invalidations to other nodes.
///
/// Object-safe so the transport can be swapped at runtime.
pub trait InvalidationBroadcaster: Send + Sync {
    fn broadcast(&self, invalidation: CacheInvalidation);
}

/// Single-node deployments: nothing to tell.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalOnly;

impl InvalidationBroadcaster for LocalOnly {
    fn broadcast(&self, _invalidation: CacheInvalidation) {}
}

/// In-process transport over a `tokio::sync::broadcast` channel.
///
/// Several services built on one channel behave like peers in a cluster.
#[derive(Debug, Clone)]
pub struct ChannelBroadcaster {
    sender: broadcast::Sender<CacheInvalidation>,
}

impl ChannelBroadcaster {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CacheInvalidation> {
        self.sender.subscribe()
    }
}

impl InvalidationBroadcaster for ChannelBroadcaster {
    fn broadcast(&self, invalidation: CacheInvalidation) {
        let _ = self.sender.send(invalidation);
    }
}

/// Apply invalidations received from peers to `cache`.
///
/// Messages carrying `node_id` are this node's own and are skipped. A lagged
/// receiver clears the whole cache, since it can no longer tell what it
/// missed.
pub fn spawn_invalidation_listener(
    cache: Arc<ContentCache>,
    node_id: Uuid,
    mut rx: broadcast::Receiver<CacheInvalidation>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(inv) if inv.node_id == node_id => continue,
                Ok(inv) => {
                    for path in &inv.paths {
                        cache.invalidate_path(path);
                    }
                    for prefix in &inv.prefixes {
                        cache.invalidate_prefix(prefix);
                    }
                    tracing::trace!(
                        from = %inv.node_id,
                        paths = inv.paths.len(),
                        prefixes = inv.prefixes.len(),
                        "applied peer invalidation"
                    );
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "invalidation listener lagged, clearing cache");
                    cache.clear();
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}

/// A content cache whose invalidations reach every node.
#[derive(Clone)]
pub struct CoherentCache {
    cache: Arc<ContentCache>,
    broadcaster: Arc<dyn InvalidationBroadcaster>,
    node_id: Uuid,
}

impl CoherentCache {
    pub fn new(cache: Arc<ContentCache>, broadcaster: Arc<dyn InvalidationBroadcaster>) -> Self {
        Self {
            cache,
            broadcaster,
            node_id: Uuid::now_v7(),
        }
    }

    pub fn local(&self) -> &Arc<ContentCache> {
        &self.cache
    }

    pub fn node_id(&self) -> Uuid {
        self.node_id
    }

    /// Evict `paths` here, then tell the peers.
    pub fn invalidate<I, S>(&self, paths: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let paths: Vec<String> = paths.into_iter().map(Into::into).collect();
        if paths.is_empty() {
            return;
        }
        for path in &paths {
            self.cache.invalidate_path(path);
        }
        self.broadcaster
            .broadcast(CacheInvalidation::paths(self.node_id, paths));
    }

    pub fn invalidate_prefix(&self, prefix: &str) {
        self.cache.invalidate_prefix(prefix);
        self.broadcaster
            .broadcast(CacheInvalidation::prefix(self.node_id, prefix.to_string()));
    }
}

impl std::fmt::Debug for CoherentCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoherentCache")
            .field("node_id", &self.node_id)
            .field("entries", &self.cache.len())
            .finish()
    }
}
