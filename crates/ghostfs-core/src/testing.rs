//! In-memory recording driver for core tests.
//!
//! `MemoryDriver` implements every storage trait over a `BTreeMap`, records
//! each call it receives and can be told to fail once at a chosen call.

use std::collections::BTreeMap;
use std::sync::Mutex;

use ghostfs_types::error::GhostError;
use ghostfs_types::revision::{FileRevision, SyncMarker};
use ghostfs_types::scope::relative_to;

use crate::storage::driver::{RevisionStore, StorageDriver, SyncMarkerStore};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriverCall {
    Read(String),
    Upsert {
        path: String,
        content: Vec<u8>,
        record_revision: bool,
    },
    Delete {
        path: String,
        record_revision: bool,
    },
    Exists(String),
    List(String),
    Move {
        from: String,
        to: String,
    },
    DeleteDir(String),
    ListRevisions(String),
    DeleteRevision(FileRevision),
    ReadMarker(String),
}

impl DriverCall {
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            DriverCall::Upsert { .. }
                | DriverCall::Delete { .. }
                | DriverCall::Move { .. }
                | DriverCall::DeleteDir(_)
                | DriverCall::DeleteRevision(_)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailKind {
    Upsert,
    Delete,
    DeleteRevision,
}

#[derive(Debug)]
struct FailPoint {
    kind: FailKind,
    remaining_ok: usize,
}

#[derive(Debug, Default)]
struct State {
    files: BTreeMap<String, Vec<u8>>,
    revisions: Vec<FileRevision>,
    marker: SyncMarker,
    calls: Vec<DriverCall>,
    next_revision: u64,
    fail: Option<FailPoint>,
}

impl State {
    fn check_fail(&mut self, kind: FailKind) -> Result<(), GhostError> {
        match &mut self.fail {
            Some(point) if point.kind == kind => {
                if point.remaining_ok == 0 {
                    self.fail = None;
                    Err(GhostError::Driver(format!("injected {kind:?} failure")))
                } else {
                    point.remaining_ok -= 1;
                    Ok(())
                }
            }
            _ => Ok(()),
        }
    }

    fn record_revision(&mut self, path: &str) {
        self.next_revision += 1;
        self.revisions
            .push(FileRevision::new(path, self.next_revision.to_string()));
    }
}

#[derive(Debug, Default)]
pub struct MemoryDriver {
    state: Mutex<State>,
}

impl MemoryDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(self, path: &str, content: impl AsRef<[u8]>) -> Self {
        self.state
            .lock()
            .unwrap()
            .files
            .insert(path.to_string(), content.as_ref().to_vec());
        self
    }

    pub fn with_revisions(self, revisions: Vec<FileRevision>) -> Self {
        self.state.lock().unwrap().revisions.extend(revisions);
        self
    }

    pub fn with_marker(self, revisions: Vec<FileRevision>) -> Self {
        self.state.lock().unwrap().marker = SyncMarker::new(revisions);
        self
    }

    /// Let `remaining_ok` calls of `kind` succeed, then fail the next one once.
    pub fn fail_after(&self, kind: FailKind, remaining_ok: usize) {
        self.state.lock().unwrap().fail = Some(FailPoint { kind, remaining_ok });
    }

    pub fn calls(&self) -> Vec<DriverCall> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn mutations(&self) -> Vec<DriverCall> {
        self.calls().into_iter().filter(DriverCall::is_mutation).collect()
    }

    pub fn clear_calls(&self) {
        self.state.lock().unwrap().calls.clear();
    }

    pub fn read_count(&self, path: &str) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, DriverCall::Read(p) if p == path))
            .count()
    }

    pub fn file(&self, path: &str) -> Option<Vec<u8>> {
        self.state.lock().unwrap().files.get(path).cloned()
    }

    pub fn paths(&self) -> Vec<String> {
        self.state.lock().unwrap().files.keys().cloned().collect()
    }

    pub fn revisions(&self) -> Vec<FileRevision> {
        self.state.lock().unwrap().revisions.clone()
    }

    pub fn marker(&self) -> SyncMarker {
        self.state.lock().unwrap().marker.clone()
    }

    fn log(&self, call: DriverCall) {
        self.state.lock().unwrap().calls.push(call);
    }
}

fn under(root: &str, path: &str) -> bool {
    root.is_empty() || relative_to(root, path).is_some()
}

impl StorageDriver for MemoryDriver {
    async fn read_file(&self, path: &str) -> Result<Vec<u8>, GhostError> {
        self.log(DriverCall::Read(path.to_string()));
        self.file(path).ok_or_else(|| GhostError::not_found(path))
    }

    async fn upsert_file(
        &self,
        path: &str,
        content: &[u8],
        record_revision: bool,
    ) -> Result<(), GhostError> {
        self.log(DriverCall::Upsert {
            path: path.to_string(),
            content: content.to_vec(),
            record_revision,
        });
        let mut state = self.state.lock().unwrap();
        state.check_fail(FailKind::Upsert)?;
        state.files.insert(path.to_string(), content.to_vec());
        if record_revision {
            state.record_revision(path);
        }
        Ok(())
    }

    async fn delete_file(&self, path: &str, record_revision: bool) -> Result<(), GhostError> {
        self.log(DriverCall::Delete {
            path: path.to_string(),
            record_revision,
        });
        let mut state = self.state.lock().unwrap();
        state.check_fail(FailKind::Delete)?;
        if state.files.remove(path).is_none() {
            return Err(GhostError::not_found(path));
        }
        if record_revision {
            state.record_revision(path);
        }
        Ok(())
    }

    async fn file_exists(&self, path: &str) -> Result<bool, GhostError> {
        self.log(DriverCall::Exists(path.to_string()));
        Ok(self.state.lock().unwrap().files.contains_key(path))
    }

    async fn directory_listing(&self, folder: &str) -> Result<Vec<String>, GhostError> {
        self.log(DriverCall::List(folder.to_string()));
        let state = self.state.lock().unwrap();
        Ok(state
            .files
            .keys()
            .filter_map(|path| relative_to(folder, path))
            .collect())
    }

    async fn move_file(&self, from: &str, to: &str) -> Result<(), GhostError> {
        self.log(DriverCall::Move {
            from: from.to_string(),
            to: to.to_string(),
        });
        let mut state = self.state.lock().unwrap();
        let content = state
            .files
            .remove(from)
            .ok_or_else(|| GhostError::not_found(from))?;
        state.files.insert(to.to_string(), content);
        Ok(())
    }

    async fn delete_dir(&self, folder: &str) -> Result<(), GhostError> {
        self.log(DriverCall::DeleteDir(folder.to_string()));
        let mut state = self.state.lock().unwrap();
        state.files.retain(|path, _| relative_to(folder, path).is_none());
        Ok(())
    }
}

impl RevisionStore for MemoryDriver {
    async fn list_revisions(&self, prefix: &str) -> Result<Vec<FileRevision>, GhostError> {
        self.log(DriverCall::ListRevisions(prefix.to_string()));
        let state = self.state.lock().unwrap();
        Ok(state
            .revisions
            .iter()
            .filter(|r| under(prefix, &r.path))
            .cloned()
            .collect())
    }

    async fn delete_revision(&self, revision: &FileRevision) -> Result<(), GhostError> {
        self.log(DriverCall::DeleteRevision(revision.clone()));
        let mut state = self.state.lock().unwrap();
        state.check_fail(FailKind::DeleteRevision)?;
        state.revisions.retain(|r| r != revision);
        Ok(())
    }
}

impl SyncMarkerStore for MemoryDriver {
    async fn read_sync_marker(&self, root: &str) -> Result<SyncMarker, GhostError> {
        self.log(DriverCall::ReadMarker(root.to_string()));
        Ok(self.state.lock().unwrap().marker.scoped_to(root))
    }
}

/// In-memory `FileSystem` for export/import tests.
#[derive(Debug, Default)]
pub struct MemoryFileSystem {
    files: Mutex<BTreeMap<std::path::PathBuf, Vec<u8>>>,
}

impl MemoryFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(self, path: impl AsRef<std::path::Path>, content: impl AsRef<[u8]>) -> Self {
        self.files
            .lock()
            .unwrap()
            .insert(path.as_ref().to_path_buf(), content.as_ref().to_vec());
        self
    }

    pub fn get(&self, path: impl AsRef<std::path::Path>) -> Option<Vec<u8>> {
        self.files.lock().unwrap().get(path.as_ref()).cloned()
    }
}

impl crate::service::fs::FileSystem for MemoryFileSystem {
    async fn write_bytes(&self, path: &std::path::Path, content: &[u8]) -> std::io::Result<()> {
        self.files
            .lock()
            .unwrap()
            .insert(path.to_path_buf(), content.to_vec());
        Ok(())
    }

    async fn read_bytes(&self, path: &std::path::Path) -> std::io::Result<Vec<u8>> {
        self.get(path)
            .ok_or_else(|| std::io::Error::from(std::io::ErrorKind::NotFound))
    }

    async fn list_files(&self, dir: &std::path::Path) -> std::io::Result<Vec<String>> {
        let files = self.files.lock().unwrap();
        Ok(files
            .keys()
            .filter_map(|p| p.strip_prefix(dir).ok())
            .map(|p| p.to_string_lossy().replace('\\', "/"))
            .collect())
    }

    async fn exists(&self, path: &std::path::Path) -> bool {
        let files = self.files.lock().unwrap();
        files.keys().any(|p| p.starts_with(path))
    }

    async fn create_dir_all(&self, _path: &std::path::Path) -> std::io::Result<()> {
        Ok(())
    }
}
