//! The ghost service facade.
//!
//! `GhostService` owns everything one process needs: the active driver,
//! the content cache, the file-change bus and the registry of mounted scope
//! handles. The driver mode is fixed at construction.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::broadcast;

use ghostfs_types::config::GhostConfig;
use ghostfs_types::error::GhostError;
use ghostfs_types::event::FileChanged;
use ghostfs_types::revision::ServerWidePending;
use ghostfs_types::scope::{BotId, DriverMode, GLOBAL_ROOT, Scope};
use ghostfs_types::sync::SyncReport;

use crate::cache::{CacheStats, CoherentCache, ContentCache, InvalidationBroadcaster};
use crate::event::FileEventBus;
use crate::ghost::ledger::RevisionLedger;
use crate::ghost::scoped::{GhostContext, ScopedGhost};
use crate::storage::driver::{RevisionStore, SyncMarkerStore};
use crate::storage::primary::PrimaryDriver;

/// Mounted scope handles, owned by one service instance.
///
/// Bot handles are created on first use and dropped by `unmount`.
pub struct ScopeRegistry<D, B> {
    global: Arc<ScopedGhost<D, B>>,
    bots: Arc<ScopedGhost<D, B>>,
    mounted: DashMap<BotId, Arc<ScopedGhost<D, B>>>,
    ctx: Arc<GhostContext<D, B>>,
}

impl<D, B> ScopeRegistry<D, B>
where
    D: SyncMarkerStore,
    B: RevisionStore,
{
    fn new(ctx: Arc<GhostContext<D, B>>) -> Self {
        Self {
            global: Arc::new(ScopedGhost::new(Scope::Global, Arc::clone(&ctx))),
            bots: Arc::new(ScopedGhost::new(Scope::Bots, Arc::clone(&ctx))),
            mounted: DashMap::new(),
            ctx,
        }
    }

    fn bot(&self, id: BotId) -> Arc<ScopedGhost<D, B>> {
        let handle = self.mounted.entry(id.clone()).or_insert_with(|| {
            tracing::debug!(bot_id = %id, "mounting bot scope");
            Arc::new(ScopedGhost::new(Scope::Bot(id), Arc::clone(&self.ctx)))
        });
        Arc::clone(handle.value())
    }

    fn unmount(&self, id: &BotId) -> bool {
        self.mounted.remove(id).is_some()
    }

    fn mounted(&self) -> Vec<BotId> {
        let mut ids: Vec<BotId> = self.mounted.iter().map(|e| e.key().clone()).collect();
        ids.sort();
        ids
    }
}

pub struct GhostService<D, B> {
    ctx: Arc<GhostContext<D, B>>,
    registry: ScopeRegistry<D, B>,
}

impl<D, B> GhostService<D, B>
where
    D: SyncMarkerStore,
    B: RevisionStore,
{
    /// Build a service over both drivers with `mode` as the active one.
    pub fn new(
        disk: Arc<D>,
        db: Arc<B>,
        mode: DriverMode,
        config: GhostConfig,
        broadcaster: Arc<dyn InvalidationBroadcaster>,
    ) -> Self {
        let cache = CoherentCache::new(
            Arc::new(ContentCache::new(config.cache_max_entry_bytes)),
            broadcaster,
        );
        let ctx = Arc::new(GhostContext {
            primary: PrimaryDriver::select(mode, &disk, &db),
            ledger: RevisionLedger::new(Arc::clone(&db), mode),
            disk,
            db,
            cache,
            events: FileEventBus::default(),
            config,
        });
        tracing::info!(driver = %mode, node_id = %ctx.cache.node_id(), "ghost service created");
        Self {
            registry: ScopeRegistry::new(Arc::clone(&ctx)),
            ctx,
        }
    }

    /// Build a service and run the startup sync.
    ///
    /// Under the database driver, when `sync_on_startup` is set and the
    /// database holds no global files yet, disk content is synced into it
    /// for the global scope and then for every bot.
    pub async fn initialize(
        disk: Arc<D>,
        db: Arc<B>,
        mode: DriverMode,
        config: GhostConfig,
        broadcaster: Arc<dyn InvalidationBroadcaster>,
    ) -> Result<Self, GhostError> {
        let service = Self::new(disk, db, mode, config, broadcaster);
        service.startup_sync().await?;
        Ok(service)
    }

    async fn startup_sync(&self) -> Result<Vec<SyncReport>, GhostError> {
        if !self.mode().is_database() || !self.ctx.config.sync_on_startup {
            return Ok(Vec::new());
        }
        if !self.ctx.db.directory_listing(GLOBAL_ROOT).await?.is_empty() {
            tracing::debug!("database already populated, skipping startup sync");
            return Ok(Vec::new());
        }

        tracing::info!("database is empty, syncing disk content");
        let global = self.global().sync().await?;
        let bots = self.bots().sync().await?;
        Ok(vec![global, bots])
    }

    pub fn mode(&self) -> DriverMode {
        self.ctx.mode()
    }

    pub fn config(&self) -> &GhostConfig {
        &self.ctx.config
    }

    pub fn global(&self) -> Arc<ScopedGhost<D, B>> {
        Arc::clone(&self.registry.global)
    }

    /// Every bot at once, rooted at `data/bots`.
    pub fn bots(&self) -> Arc<ScopedGhost<D, B>> {
        Arc::clone(&self.registry.bots)
    }

    pub fn for_bot(&self, bot_id: &str) -> Result<Arc<ScopedGhost<D, B>>, GhostError> {
        Ok(self.registry.bot(BotId::parse(bot_id)?))
    }

    /// Drop a bot's handle and its cached content. Returns whether it was mounted.
    pub fn unmount_bot(&self, bot_id: &str) -> Result<bool, GhostError> {
        let id = BotId::parse(bot_id)?;
        let was_mounted = self.registry.unmount(&id);
        self.ctx
            .cache
            .local()
            .invalidate_prefix(&format!("{}/", Scope::Bot(id).root()));
        Ok(was_mounted)
    }

    pub fn mounted_bots(&self) -> Vec<BotId> {
        self.registry.mounted()
    }

    /// Pending changes for the global scope and each of `bot_ids`.
    pub async fn pending(&self, bot_ids: &[BotId]) -> Result<ServerWidePending, GhostError> {
        let mut report = ServerWidePending {
            global: self.global().pending_changes().await?,
            ..ServerWidePending::default()
        };
        for id in bot_ids {
            let pending = self.registry.bot(id.clone()).pending_changes().await?;
            report.bots.insert(id.to_string(), pending);
        }
        Ok(report)
    }

    /// Subscribe to changes made through any scope of this service.
    pub fn on_file_changed(&self) -> broadcast::Receiver<FileChanged> {
        self.ctx.events.subscribe()
    }

    pub fn cache(&self) -> &CoherentCache {
        &self.ctx.cache
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.ctx.cache.local().stats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::LocalOnly;
    use crate::testing::MemoryDriver;
    use ghostfs_types::revision::FileRevision;

    fn service(
        mode: DriverMode,
        disk: &Arc<MemoryDriver>,
        db: &Arc<MemoryDriver>,
    ) -> GhostService<MemoryDriver, MemoryDriver> {
        GhostService::new(
            Arc::clone(disk),
            Arc::clone(db),
            mode,
            GhostConfig::default(),
            Arc::new(LocalOnly),
        )
    }

    #[tokio::test]
    async fn for_bot_validates_and_reuses_handles() {
        let disk = Arc::new(MemoryDriver::new());
        let db = Arc::new(MemoryDriver::new());
        let svc = service(DriverMode::Disk, &disk, &db);

        assert!(matches!(svc.for_bot("../etc"), Err(GhostError::InvalidBotId(_))));

        let a = svc.for_bot("luna").unwrap();
        let b = svc.for_bot("luna").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(a.root(), "data/bots/luna");
        assert_eq!(svc.mounted_bots(), vec![BotId::parse("luna").unwrap()]);

        assert!(svc.unmount_bot("luna").unwrap());
        assert!(!svc.unmount_bot("luna").unwrap());
        assert!(svc.mounted_bots().is_empty());
    }

    #[tokio::test]
    async fn pending_covers_global_and_bots() {
        let disk = Arc::new(MemoryDriver::new());
        let db = Arc::new(MemoryDriver::new().with_revisions(vec![
            FileRevision::new("data/global/a/1.txt", "1"),
            FileRevision::new("data/bots/luna/flows/main.flow.json", "2"),
        ]));
        let svc = service(DriverMode::Database, &disk, &db);

        let pending = svc
            .pending(&[BotId::parse("luna").unwrap(), BotId::parse("sol").unwrap()])
            .await
            .unwrap();
        assert_eq!(pending.global.revision_count(), 1);
        assert_eq!(pending.bots["luna"].revision_count(), 1);
        assert!(pending.bots["sol"].is_empty());
        assert!(!pending.is_empty());
    }

    #[tokio::test]
    async fn pending_is_empty_under_disk_even_with_stale_ledger() {
        let disk = Arc::new(MemoryDriver::new());
        let db = Arc::new(
            MemoryDriver::new().with_revisions(vec![FileRevision::new("data/global/a/1.txt", "1")]),
        );
        let svc = service(DriverMode::Disk, &disk, &db);

        let pending = svc.pending(&[BotId::parse("luna").unwrap()]).await.unwrap();
        assert!(pending.is_empty());
        assert!(db.calls().is_empty());
    }

    #[tokio::test]
    async fn initialize_syncs_into_empty_database() {
        let disk = Arc::new(
            MemoryDriver::new()
                .with_file("data/global/config.json", "{}")
                .with_file("data/bots/luna/bot.config.json", r#"{"id":"luna"}"#),
        );
        let db = Arc::new(MemoryDriver::new());

        let svc = GhostService::initialize(
            Arc::clone(&disk),
            Arc::clone(&db),
            DriverMode::Database,
            GhostConfig::default(),
            Arc::new(LocalOnly),
        )
        .await
        .unwrap();

        assert_eq!(db.paths(), disk.paths());
        let config: serde_json::Value = svc
            .for_bot("luna")
            .unwrap()
            .read_file_as_object("", "bot.config.json")
            .await
            .unwrap();
        assert_eq!(config["id"], "luna");
    }

    #[tokio::test]
    async fn initialize_leaves_populated_database_alone() {
        let disk = Arc::new(MemoryDriver::new().with_file("data/global/new.json", "{}"));
        let db = Arc::new(MemoryDriver::new().with_file("data/global/existing.json", "{}"));

        GhostService::initialize(
            Arc::clone(&disk),
            Arc::clone(&db),
            DriverMode::Database,
            GhostConfig::default(),
            Arc::new(LocalOnly),
        )
        .await
        .unwrap();

        assert_eq!(db.paths(), vec!["data/global/existing.json".to_string()]);
        assert!(db.mutations().is_empty());
    }

    #[tokio::test]
    async fn initialize_under_disk_never_touches_database() {
        let disk = Arc::new(MemoryDriver::new().with_file("data/global/a.json", "{}"));
        let db = Arc::new(MemoryDriver::new());

        GhostService::initialize(
            Arc::clone(&disk),
            Arc::clone(&db),
            DriverMode::Disk,
            GhostConfig::default(),
            Arc::new(LocalOnly),
        )
        .await
        .unwrap();
        assert!(db.calls().is_empty());
    }

    #[tokio::test]
    async fn unmount_drops_cached_bot_content() {
        let disk = Arc::new(MemoryDriver::new().with_file("data/bots/luna/a.txt", "hi"));
        let db = Arc::new(MemoryDriver::new());
        let svc = service(DriverMode::Disk, &disk, &db);

        svc.for_bot("luna").unwrap().read_file_as_buffer("", "a.txt").await.unwrap();
        assert_eq!(svc.cache_stats().entries, 1);

        svc.unmount_bot("luna").unwrap();
        assert_eq!(svc.cache_stats().entries, 0);
    }
}
