//! SQLite ghost driver.
//!
//! File contents live in `ghost_files`, keyed by canonical path. Tracked
//! writes and deletes append to `ghost_revisions` in the same transaction,
//! so the ledger never disagrees with the file table.

use chrono::{DateTime, Utc};
use sqlx::Row;
use uuid::Uuid;

use ghostfs_core::storage::driver::{RevisionStore, StorageDriver};
use ghostfs_types::error::GhostError;
use ghostfs_types::revision::FileRevision;

use super::pool::DatabasePool;

/// SQLite-backed storage driver with a revision ledger.
#[derive(Clone)]
pub struct SqliteStorageDriver {
    pool: DatabasePool,
}

impl SqliteStorageDriver {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DatabasePool {
        &self.pool
    }
}

/// `folder/`, or empty for the whole store.
fn folder_prefix(folder: &str) -> String {
    let folder = folder.trim_end_matches('/');
    if folder.is_empty() {
        String::new()
    } else {
        format!("{folder}/")
    }
}

fn query_error(e: sqlx::Error) -> GhostError {
    GhostError::Driver(e.to_string())
}

async fn append_revision<'c, E>(executor: E, path: &str, now: &str) -> Result<(), GhostError>
where
    E: sqlx::Executor<'c, Database = sqlx::Sqlite>,
{
    sqlx::query("INSERT INTO ghost_revisions (path, revision, created_at) VALUES (?, ?, ?)")
        .bind(path)
        .bind(Uuid::now_v7().to_string())
        .bind(now)
        .execute(executor)
        .await
        .map_err(query_error)?;
    Ok(())
}

impl StorageDriver for SqliteStorageDriver {
    async fn read_file(&self, path: &str) -> Result<Vec<u8>, GhostError> {
        let row = sqlx::query("SELECT content FROM ghost_files WHERE path = ?")
            .bind(path)
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(query_error)?;

        match row {
            Some(row) => row.try_get("content").map_err(query_error),
            None => Err(GhostError::not_found(path)),
        }
    }

    async fn upsert_file(
        &self,
        path: &str,
        content: &[u8],
        record_revision: bool,
    ) -> Result<(), GhostError> {
        let now = format_datetime(&Utc::now());
        let mut tx = self.pool.writer.begin().await.map_err(query_error)?;

        sqlx::query(
            r#"INSERT INTO ghost_files (path, content, size_bytes, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?)
               ON CONFLICT (path) DO UPDATE SET
                   content = excluded.content,
                   size_bytes = excluded.size_bytes,
                   updated_at = excluded.updated_at"#,
        )
        .bind(path)
        .bind(content)
        .bind(content.len() as i64)
        .bind(&now)
        .bind(&now)
        .execute(&mut *tx)
        .await
        .map_err(query_error)?;

        if record_revision {
            append_revision(&mut *tx, path, &now).await?;
        }

        tx.commit().await.map_err(query_error)?;
        tracing::debug!(path, size = content.len(), record_revision, "upserted ghost file");
        Ok(())
    }

    async fn delete_file(&self, path: &str, record_revision: bool) -> Result<(), GhostError> {
        let now = format_datetime(&Utc::now());
        let mut tx = self.pool.writer.begin().await.map_err(query_error)?;

        let result = sqlx::query("DELETE FROM ghost_files WHERE path = ?")
            .bind(path)
            .execute(&mut *tx)
            .await
            .map_err(query_error)?;

        if result.rows_affected() == 0 {
            return Err(GhostError::not_found(path));
        }

        if record_revision {
            append_revision(&mut *tx, path, &now).await?;
        }

        tx.commit().await.map_err(query_error)?;
        Ok(())
    }

    async fn file_exists(&self, path: &str) -> Result<bool, GhostError> {
        let row = sqlx::query("SELECT 1 FROM ghost_files WHERE path = ?")
            .bind(path)
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(query_error)?;
        Ok(row.is_some())
    }

    async fn directory_listing(&self, folder: &str) -> Result<Vec<String>, GhostError> {
        let prefix = folder_prefix(folder);
        let rows = sqlx::query(
            "SELECT path FROM ghost_files WHERE substr(path, 1, length(?)) = ? ORDER BY path",
        )
        .bind(&prefix)
        .bind(&prefix)
        .fetch_all(&self.pool.reader)
        .await
        .map_err(query_error)?;

        let mut files = Vec::with_capacity(rows.len());
        for row in &rows {
            let path: String = row.try_get("path").map_err(query_error)?;
            files.push(path[prefix.len()..].to_string());
        }
        Ok(files)
    }

    async fn move_file(&self, from: &str, to: &str) -> Result<(), GhostError> {
        let now = format_datetime(&Utc::now());
        let mut tx = self.pool.writer.begin().await.map_err(query_error)?;

        sqlx::query("DELETE FROM ghost_files WHERE path = ? AND path != ?")
            .bind(to)
            .bind(from)
            .execute(&mut *tx)
            .await
            .map_err(query_error)?;

        let result = sqlx::query("UPDATE ghost_files SET path = ?, updated_at = ? WHERE path = ?")
            .bind(to)
            .bind(&now)
            .bind(from)
            .execute(&mut *tx)
            .await
            .map_err(query_error)?;

        if result.rows_affected() == 0 {
            return Err(GhostError::not_found(from));
        }

        tx.commit().await.map_err(query_error)?;
        Ok(())
    }

    async fn delete_dir(&self, folder: &str) -> Result<(), GhostError> {
        let prefix = folder_prefix(folder);
        let result = sqlx::query("DELETE FROM ghost_files WHERE substr(path, 1, length(?)) = ?")
            .bind(&prefix)
            .bind(&prefix)
            .execute(&self.pool.writer)
            .await
            .map_err(query_error)?;
        tracing::debug!(folder, removed = result.rows_affected(), "deleted ghost folder");
        Ok(())
    }
}

impl RevisionStore for SqliteStorageDriver {
    async fn list_revisions(&self, prefix: &str) -> Result<Vec<FileRevision>, GhostError> {
        let prefix = folder_prefix(prefix);
        let rows = sqlx::query(
            r#"SELECT path, revision, created_at FROM ghost_revisions
               WHERE substr(path, 1, length(?)) = ?
               ORDER BY seq"#,
        )
        .bind(&prefix)
        .bind(&prefix)
        .fetch_all(&self.pool.reader)
        .await
        .map_err(query_error)?;

        let mut revisions = Vec::with_capacity(rows.len());
        for row in &rows {
            let revision_row = RevisionRow::from_row(row).map_err(query_error)?;
            revisions.push(revision_row.into_file_revision()?);
        }
        Ok(revisions)
    }

    async fn delete_revision(&self, revision: &FileRevision) -> Result<(), GhostError> {
        sqlx::query("DELETE FROM ghost_revisions WHERE path = ? AND revision = ?")
            .bind(&revision.path)
            .bind(&revision.revision)
            .execute(&self.pool.writer)
            .await
            .map_err(query_error)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Private Row types
// ---------------------------------------------------------------------------

struct RevisionRow {
    path: String,
    revision: String,
    created_at: String,
}

impl RevisionRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            path: row.try_get("path")?,
            revision: row.try_get("revision")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn into_file_revision(self) -> Result<FileRevision, GhostError> {
        Ok(FileRevision {
            path: self.path,
            revision: self.revision,
            created_at: Some(parse_datetime(&self.created_at)?),
        })
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn parse_datetime(s: &str) -> Result<DateTime<Utc>, GhostError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| GhostError::Driver(format!("invalid datetime: {e}")))
}

fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}
