//! Edit, export, sync cycle over the real disk and SQLite drivers.

use std::path::Path;
use std::sync::Arc;

use ghostfs_core::cache::LocalOnly;
use ghostfs_core::ghost::GhostService;
use ghostfs_core::storage::driver::{RevisionStore, StorageDriver};
use ghostfs_infra::filesystem::LocalFileSystem;
use ghostfs_infra::sqlite::{DatabasePool, SqliteStorageDriver};
use ghostfs_infra::storage::DiskStorageDriver;
use ghostfs_types::config::GhostConfig;
use ghostfs_types::error::GhostError;
use ghostfs_types::scope::DriverMode;
use tempfile::TempDir;

struct Harness {
    data_dir: TempDir,
    disk: Arc<DiskStorageDriver>,
    db: Arc<SqliteStorageDriver>,
}

async fn harness() -> Harness {
    let data_dir = TempDir::new().unwrap();
    let url = format!("sqlite://{}?mode=rwc", data_dir.path().join("ghost.db").display());
    let pool = DatabasePool::new(&url).await.unwrap();
    Harness {
        disk: Arc::new(DiskStorageDriver::new(data_dir.path())),
        db: Arc::new(SqliteStorageDriver::new(pool)),
        data_dir,
    }
}

async fn seed(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    tokio::fs::create_dir_all(path.parent().unwrap()).await.unwrap();
    tokio::fs::write(path, content).await.unwrap();
}

#[tokio::test]
async fn edit_export_sync_cycle() {
    let h = harness().await;
    seed(h.data_dir.path(), "data/global/config.json", r#"{"lang":"en"}"#).await;
    seed(h.data_dir.path(), "data/bots/luna/bot.config.json", r#"{"id":"luna"}"#).await;

    // Startup sync fills the empty database from disk.
    let svc = GhostService::initialize(
        Arc::clone(&h.disk),
        Arc::clone(&h.db),
        DriverMode::Database,
        GhostConfig::default(),
        Arc::new(LocalOnly),
    )
    .await
    .unwrap();
    assert_eq!(
        h.db.directory_listing("data/bots/luna").await.unwrap(),
        vec!["bot.config.json"]
    );

    // Edit through the database driver; disk stays untouched.
    let luna = svc.for_bot("luna").unwrap();
    luna.upsert_file("flows", "main.flow.json", r#"{"nodes":[]}"#)
        .await
        .unwrap();
    assert_eq!(luna.pending_changes().await.unwrap().revision_count(), 1);
    assert!(!h.data_dir.path().join("data/bots/luna/flows").exists());

    // Disk has not seen the edit yet.
    let err = luna.sync().await.unwrap_err();
    assert!(matches!(
        err,
        GhostError::SyncPrecondition { pending: 1, missing_on_disk: 1, .. }
    ));

    // Export the bot and commit the tree as its disk content.
    let bot_dir = h.data_dir.path().join("data/bots/luna");
    let written = luna
        .export_to_directory(&LocalFileSystem::new(), &bot_dir, &[])
        .await
        .unwrap();
    assert_eq!(written, 2);
    assert!(bot_dir.join("revisions.json").exists());

    let report = luna.sync().await.unwrap();
    assert_eq!(report.revisions_retired, 1);
    assert_eq!(report.files_upserted, 2);
    assert_eq!(report.files_deleted, 0);
    assert!(luna.is_fully_synced().await.unwrap());
    assert!(h.db.list_revisions("data/bots/luna").await.unwrap().is_empty());

    // The marker stays on disk; a second run changes nothing.
    let again = luna.sync().await.unwrap();
    assert!(!again.changed_ledger_or_file_set());

    let flow: serde_json::Value = luna
        .read_file_as_object("flows", "main.flow.json")
        .await
        .unwrap();
    assert_eq!(flow["nodes"], serde_json::json!([]));
}

#[tokio::test]
async fn sync_removes_database_files_deleted_on_disk() {
    let h = harness().await;
    seed(h.data_dir.path(), "data/global/keep.json", "{}").await;
    h.db.upsert_file("data/global/keep.json", b"{}", false).await.unwrap();
    h.db.upsert_file("data/global/stale.json", b"{}", false).await.unwrap();

    let svc = GhostService::new(
        Arc::clone(&h.disk),
        Arc::clone(&h.db),
        DriverMode::Database,
        GhostConfig::default(),
        Arc::new(LocalOnly),
    );
    let report = svc.global().sync().await.unwrap();

    assert_eq!(report.files_deleted, 1);
    assert_eq!(
        h.db.directory_listing("data/global").await.unwrap(),
        vec!["keep.json"]
    );
}

#[tokio::test]
async fn disk_mode_never_writes_the_database() {
    let h = harness().await;
    let svc = GhostService::initialize(
        Arc::clone(&h.disk),
        Arc::clone(&h.db),
        DriverMode::Disk,
        GhostConfig::default(),
        Arc::new(LocalOnly),
    )
    .await
    .unwrap();

    svc.global()
        .upsert_file("intents", "greet.json", "{}")
        .await
        .unwrap();

    assert!(h.data_dir.path().join("data/global/intents/greet.json").exists());
    assert!(h.db.directory_listing("data").await.unwrap().is_empty());
    assert!(h.db.list_revisions("data").await.unwrap().is_empty());
    assert!(svc.global().sync().await.unwrap().skipped);
}

#[cfg(unix)]
#[tokio::test]
async fn sync_keeps_symlinked_folders_and_aborts_on_walk_errors() {
    let h = harness().await;
    let shared = TempDir::new().unwrap();
    seed(shared.path(), "intents.json", "{}").await;
    seed(h.data_dir.path(), "data/global/a.json", "{}").await;
    std::os::unix::fs::symlink(shared.path(), h.data_dir.path().join("data/global/nlu")).unwrap();
    h.db.upsert_file("data/global/a.json", b"{}", false).await.unwrap();
    h.db.upsert_file("data/global/nlu/intents.json", b"{}", false).await.unwrap();

    let svc = GhostService::new(
        Arc::clone(&h.disk),
        Arc::clone(&h.db),
        DriverMode::Database,
        GhostConfig::default(),
        Arc::new(LocalOnly),
    );
    let report = svc.global().sync().await.unwrap();
    assert_eq!(report.files_deleted, 0);
    assert_eq!(
        h.db.directory_listing("data/global").await.unwrap(),
        vec!["a.json", "nlu/intents.json"]
    );

    std::os::unix::fs::symlink(
        h.data_dir.path().join("data/global"),
        shared.path().join("loop"),
    )
    .unwrap();
    let err = svc.global().sync().await.unwrap_err();
    assert!(matches!(err, GhostError::Driver(_)));
    assert_eq!(
        h.db.directory_listing("data/global").await.unwrap(),
        vec!["a.json", "nlu/intents.json"]
    );
}
