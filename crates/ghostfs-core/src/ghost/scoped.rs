//! Scope-bound ghost handles.
//!
//! A `ScopedGhost` binds one scope root to the shared service context. Every
//! call builds its canonical path per call, consults the cache, then goes to
//! the single active driver. Only `sync` and `sync_database_files_to_disk`
//! ever reach past it.

use std::path::Path;
use std::sync::Arc;

use futures_util::future::try_join_all;
use serde::de::DeserializeOwned;

use ghostfs_types::config::GhostConfig;
use ghostfs_types::error::GhostError;
use ghostfs_types::revision::{PendingChanges, SyncMarker};
use ghostfs_types::scope::{DriverMode, Scope, ScopedPath, join_path};
use ghostfs_types::sync::SyncReport;

use crate::cache::{CacheKey, CachedValue, CoherentCache};
use crate::event::FileEventBus;
use crate::ghost::ledger::RevisionLedger;
use crate::ghost::matcher::{ListingOptions, filter_listing};
use crate::ghost::sync::{SYNC_EXCLUDES, SyncEngine, sync_listing_options};
use crate::service::fs::FileSystem;
use crate::storage::driver::{RevisionStore, SYNC_MARKER_FILE, StorageDriver, SyncMarkerStore};
use crate::storage::primary::PrimaryDriver;

/// Options for a single write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpsertOptions {
    /// Append a ledger entry. Only the database driver keeps one.
    pub record_revision: bool,
}

impl Default for UpsertOptions {
    fn default() -> Self {
        Self {
            record_revision: true,
        }
    }
}

impl UpsertOptions {
    pub fn untracked() -> Self {
        Self {
            record_revision: false,
        }
    }
}

/// State shared by every scope of one service.
pub(crate) struct GhostContext<D, B> {
    pub(crate) primary: PrimaryDriver<D, B>,
    pub(crate) disk: Arc<D>,
    pub(crate) db: Arc<B>,
    pub(crate) cache: CoherentCache,
    pub(crate) ledger: RevisionLedger<B>,
    pub(crate) events: FileEventBus,
    pub(crate) config: GhostConfig,
}

impl<D, B> GhostContext<D, B>
where
    D: SyncMarkerStore,
    B: RevisionStore,
{
    pub(crate) fn mode(&self) -> DriverMode {
        self.primary.mode()
    }
}

pub struct ScopedGhost<D, B> {
    scope: Scope,
    ctx: Arc<GhostContext<D, B>>,
}

impl<D, B> ScopedGhost<D, B>
where
    D: SyncMarkerStore,
    B: RevisionStore,
{
    pub(crate) fn new(scope: Scope, ctx: Arc<GhostContext<D, B>>) -> Self {
        Self { scope, ctx }
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    pub fn root(&self) -> String {
        self.scope.root()
    }

    pub fn mode(&self) -> DriverMode {
        self.ctx.mode()
    }

    /// Canonical path of `folder/file` in this scope.
    pub fn path(&self, folder: &str, file: &str) -> Result<ScopedPath, GhostError> {
        ScopedPath::file(&self.scope, folder, file)
    }

    // --- reads ---

    /// Raw bytes of a file, served from cache when warm.
    pub async fn read_file_as_buffer(
        &self,
        folder: &str,
        file: &str,
    ) -> Result<Arc<[u8]>, GhostError> {
        let path = self.path(folder, file)?;
        self.load_buffer(path.as_str()).await
    }

    async fn load_buffer(&self, path: &str) -> Result<Arc<[u8]>, GhostError> {
        let key = CacheKey::buffer(path);
        if let Some(CachedValue::Buffer(bytes)) = self.ctx.cache.local().get(&key) {
            tracing::debug!(path, "buffer cache hit");
            return Ok(bytes);
        }

        let bytes: Arc<[u8]> = Arc::from(self.ctx.primary.read_file(path).await?);
        self.ctx
            .cache
            .local()
            .insert(key, CachedValue::Buffer(Arc::clone(&bytes)));
        Ok(bytes)
    }

    /// UTF-8 text of a file, decoded from the cached buffer.
    pub async fn read_file_as_string(
        &self,
        folder: &str,
        file: &str,
    ) -> Result<Arc<str>, GhostError> {
        let path = self.path(folder, file)?;
        let key = CacheKey::string(path.as_str());
        if let Some(CachedValue::String(text)) = self.ctx.cache.local().get(&key) {
            return Ok(text);
        }

        let bytes = self.load_buffer(path.as_str()).await?;
        let text: Arc<str> = Arc::from(String::from_utf8_lossy(&bytes).as_ref());
        self.ctx
            .cache
            .local()
            .insert(key, CachedValue::String(Arc::clone(&text)));
        Ok(text)
    }

    /// Parse a JSON file into `T`.
    ///
    /// The parsed JSON value is cached on its own key; a cold read shares the
    /// buffer entry, so buffer and object together cost one driver read.
    pub async fn read_file_as_object<T: DeserializeOwned>(
        &self,
        folder: &str,
        file: &str,
    ) -> Result<T, GhostError> {
        let path = self.path(folder, file)?;
        let key = CacheKey::object(path.as_str());

        let value = match self.ctx.cache.local().get(&key) {
            Some(CachedValue::Object { value, .. }) => value,
            _ => {
                let bytes = self.load_buffer(path.as_str()).await?;
                let value: serde_json::Value =
                    serde_json::from_slice(&bytes).map_err(|e| parse_error(&path, e))?;
                let value = Arc::new(value);
                self.ctx.cache.local().insert(
                    key,
                    CachedValue::Object {
                        value: Arc::clone(&value),
                        source_len: bytes.len(),
                    },
                );
                value
            }
        };

        serde::Deserialize::deserialize(&*value).map_err(|e| parse_error(&path, e))
    }

    /// Whether a file exists. A cached object or buffer counts as present.
    pub async fn file_exists(&self, folder: &str, file: &str) -> Result<bool, GhostError> {
        let path = self.path(folder, file)?;
        let cache = self.ctx.cache.local();
        if cache.contains(&CacheKey::object(path.as_str()))
            || cache.contains(&CacheKey::buffer(path.as_str()))
        {
            return Ok(true);
        }
        self.ctx.primary.file_exists(path.as_str()).await
    }

    /// Files under `folder`, relative to it, filtered by `pattern` and `options`.
    #[tracing::instrument(skip(self, options), fields(ghost.scope = %self.scope, ghost.driver = %self.mode()))]
    pub async fn directory_listing(
        &self,
        folder: &str,
        pattern: Option<&str>,
        options: &ListingOptions,
    ) -> Result<Vec<String>, GhostError> {
        let dir = ScopedPath::folder(&self.scope, folder)?;
        let files = self.ctx.primary.directory_listing(dir.as_str()).await?;
        filter_listing(files, pattern, options)
    }

    // --- writes ---

    pub async fn upsert_file(
        &self,
        folder: &str,
        file: &str,
        content: impl AsRef<[u8]>,
    ) -> Result<(), GhostError> {
        self.upsert_file_with(folder, file, content.as_ref(), UpsertOptions::default())
            .await
    }

    /// Create or overwrite a file.
    ///
    /// Content over the configured size limit is rejected before any driver
    /// call. Every cached representation of the path is evicted before this
    /// returns.
    #[tracing::instrument(skip(self, content), fields(ghost.scope = %self.scope, ghost.driver = %self.mode(), size = content.len()))]
    pub async fn upsert_file_with(
        &self,
        folder: &str,
        file: &str,
        content: &[u8],
        options: UpsertOptions,
    ) -> Result<(), GhostError> {
        let path = self.path(folder, file)?;
        let limit = self.ctx.config.file_size_limit(path.file_name());
        if content.len() as u64 > limit {
            return Err(GhostError::FileTooLarge {
                path: path.to_string(),
                size: content.len() as u64,
                limit,
            });
        }

        self.ctx
            .primary
            .upsert_file(path.as_str(), content, options.record_revision)
            .await?;
        self.changed([path.to_string()]);
        Ok(())
    }

    /// Write several files under `folder` concurrently.
    pub async fn upsert_files(
        &self,
        folder: &str,
        files: &[(String, Vec<u8>)],
        options: UpsertOptions,
    ) -> Result<(), GhostError> {
        try_join_all(
            files
                .iter()
                .map(|(name, content)| self.upsert_file_with(folder, name, content, options)),
        )
        .await?;
        Ok(())
    }

    #[tracing::instrument(skip(self), fields(ghost.scope = %self.scope, ghost.driver = %self.mode()))]
    pub async fn delete_file(&self, folder: &str, file: &str) -> Result<(), GhostError> {
        let path = self.path(folder, file)?;
        self.ctx.primary.delete_file(path.as_str(), true).await?;
        self.changed([path.to_string()]);
        Ok(())
    }

    pub async fn rename_file(
        &self,
        folder: &str,
        old_file: &str,
        new_file: &str,
    ) -> Result<(), GhostError> {
        let from = self.path(folder, old_file)?;
        let to = self.path(folder, new_file)?;
        self.ctx.primary.move_file(from.as_str(), to.as_str()).await?;
        self.changed([from.to_string(), to.to_string()]);
        Ok(())
    }

    /// Delete a folder and everything under it.
    pub async fn delete_folder(&self, folder: &str) -> Result<(), GhostError> {
        let dir = ScopedPath::folder(&self.scope, folder)?;
        self.ctx.primary.delete_dir(dir.as_str()).await?;
        self.ctx.cache.invalidate_prefix(&format!("{dir}/"));
        self.ctx.events.publish(dir.to_string());
        Ok(())
    }

    /// Drop every cached representation of a file.
    pub fn invalidate_file(&self, folder: &str, file: &str) -> Result<(), GhostError> {
        let path = self.path(folder, file)?;
        self.ctx.cache.invalidate([path.to_string()]);
        Ok(())
    }

    fn changed<const N: usize>(&self, paths: [String; N]) {
        self.ctx.cache.invalidate(paths.iter().cloned());
        for path in paths {
            self.ctx.events.publish(path);
        }
    }

    // --- ledger and sync ---

    pub async fn pending_changes(&self) -> Result<PendingChanges, GhostError> {
        self.ctx.ledger.pending_changes(&self.scope).await
    }

    pub async fn is_fully_synced(&self) -> Result<bool, GhostError> {
        self.ctx.ledger.is_fully_synced(&self.scope).await
    }

    /// Publish disk content into the database. Skipped under the disk driver.
    pub async fn sync(&self) -> Result<SyncReport, GhostError> {
        if !self.mode().is_database() {
            tracing::debug!(scope = %self.scope, "disk driver active, nothing to sync");
            return Ok(SyncReport::skipped(self.scope.clone()));
        }
        SyncEngine::new(
            Arc::clone(&self.ctx.disk),
            Arc::clone(&self.ctx.db),
            self.ctx.cache.clone(),
        )
        .sync(&self.scope)
        .await
    }

    /// Copy database files under `folder` onto disk. Returns the number copied.
    ///
    /// A no-op under the disk driver.
    pub async fn sync_database_files_to_disk(&self, folder: &str) -> Result<usize, GhostError> {
        if !self.mode().is_database() {
            return Ok(0);
        }
        let dir = ScopedPath::folder(&self.scope, folder)?;
        let files = self.ctx.db.directory_listing(dir.as_str()).await?;
        for relative in &files {
            let path = join_path(&[dir.as_str(), relative]);
            let content = self.ctx.db.read_file(&path).await?;
            self.ctx.disk.upsert_file(&path, &content, false).await?;
        }
        tracing::info!(scope = %self.scope, folder, copied = files.len(), "mirrored database files to disk");
        Ok(files.len())
    }

    // --- export / import ---

    /// Write every file of the scope into `dir`, plus the current ledger as
    /// `revisions.json`. Returns the number of files written.
    ///
    /// Committing the exported tree as the scope's disk content makes the
    /// ledger file disk's sync marker.
    pub async fn export_to_directory<F: FileSystem>(
        &self,
        fs: &F,
        dir: &Path,
        excludes: &[String],
    ) -> Result<usize, GhostError> {
        let mut options = ListingOptions::excluding(excludes.iter().cloned()).with_dot_files();
        options.excludes.push(SYNC_EXCLUDES[0].to_string());
        let files = self.directory_listing("", None, &options).await?;

        fs.create_dir_all(dir).await.map_err(|e| io_error(dir, e))?;
        for relative in &files {
            let path = join_path(&[&self.root(), relative]);
            let content = self.ctx.primary.read_file(&path).await?;
            let target = dir.join(relative);
            fs.write_bytes(&target, &content)
                .await
                .map_err(|e| io_error(&target, e))?;
        }

        let marker = SyncMarker::new(self.ctx.ledger.list(&self.scope).await?);
        let json = serde_json::to_vec_pretty(&marker)
            .map_err(|e| GhostError::Driver(format!("serialize {SYNC_MARKER_FILE}: {e}")))?;
        let target = dir.join(SYNC_MARKER_FILE);
        fs.write_bytes(&target, &json)
            .await
            .map_err(|e| io_error(&target, e))?;

        tracing::info!(scope = %self.scope, files = files.len(), revisions = marker.revisions.len(), "exported");
        Ok(files.len())
    }

    /// Upsert every file found under `dir` into the scope. Returns the number
    /// of files written. Sync markers and `node_modules` are skipped.
    pub async fn import_from_directory<F: FileSystem>(
        &self,
        fs: &F,
        dir: &Path,
    ) -> Result<usize, GhostError> {
        let files = filter_listing(
            fs.list_files(dir).await.map_err(|e| io_error(dir, e))?,
            None,
            &sync_listing_options(),
        )?;

        for relative in &files {
            let source = dir.join(relative);
            let content = fs.read_bytes(&source).await.map_err(|e| io_error(&source, e))?;
            self.upsert_file_with("", relative, &content, UpsertOptions::default())
                .await?;
        }
        tracing::info!(scope = %self.scope, files = files.len(), "imported");
        Ok(files.len())
    }
}

fn parse_error(path: &ScopedPath, e: serde_json::Error) -> GhostError {
    GhostError::Parse {
        path: path.to_string(),
        message: e.to_string(),
    }
}

fn io_error(path: &Path, e: std::io::Error) -> GhostError {
    GhostError::Driver(format!("{}: {e}", path.display()))
}
