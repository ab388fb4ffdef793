//! Broadcast event bus for distributing `FileChanged` to multiple subscribers.
//!
//! Built on `tokio::sync::broadcast`. Publishing with no active subscribers
//! is a no-op.

use ghostfs_types::event::FileChanged;
use tokio::sync::broadcast;

/// Default channel capacity for file-change events.
pub const DEFAULT_EVENT_CAPACITY: usize = 1024;

/// Multi-consumer bus for file-change events.
///
/// Cloning the bus clones the sender, so every clone publishes to the same
/// set of subscribers.
pub struct FileEventBus {
    sender: broadcast::Sender<FileChanged>,
}

impl FileEventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Create a new subscriber that will receive all future events.
    pub fn subscribe(&self) -> broadcast::Receiver<FileChanged> {
        self.sender.subscribe()
    }

    /// Publish a change for `path`. Dropped silently when nobody listens.
    pub fn publish(&self, path: impl Into<String>) {
        let _ = self.sender.send(FileChanged { path: path.into() });
    }

    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for FileEventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}

impl Clone for FileEventBus {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

impl std::fmt::Debug for FileEventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileEventBus")
            .field("receiver_count", &self.sender.receiver_count())
            .finish()
    }
}
