//! Revision ledger types.
//!
//! A `FileRevision` is one tracked change recorded by the database driver.
//! A `SyncMarker` is disk's checkpoint of which revisions its content already
//! reflects. They share a shape but not a meaning, so they are separate types.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::scope::{normalize_path, relative_to};

/// Group name for revisions of files sitting directly under a scope root.
pub const ROOT_GROUP: &str = "root";

/// One tracked change to a path. The revision id is opaque and driver-assigned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileRevision {
    pub path: String,
    pub revision: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl FileRevision {
    pub fn new(path: impl Into<String>, revision: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            revision: revision.into(),
            created_at: None,
        }
    }

    /// Identity of a revision: normalized path plus revision id.
    pub fn key(&self) -> (String, String) {
        let path = normalize_path(&self.path).unwrap_or_else(|_| self.path.clone());
        (path, self.revision.clone())
    }
}

impl PartialEq for FileRevision {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for FileRevision {}

/// Disk's record of the ledger state it has caught up to.
///
/// Serialized as a bare JSON array so it can live in `revisions.json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SyncMarker {
    pub revisions: Vec<FileRevision>,
}

/// Outcome of comparing a sync marker with the database ledger.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MarkerComparison {
    /// In the ledger but absent from the marker: disk has not caught up.
    pub missing_on_disk: Vec<FileRevision>,
    /// In the marker but unknown to the ledger.
    pub unknown_on_disk: Vec<FileRevision>,
}

impl MarkerComparison {
    pub fn is_exact(&self) -> bool {
        self.missing_on_disk.is_empty() && self.unknown_on_disk.is_empty()
    }
}

impl SyncMarker {
    pub fn new(revisions: Vec<FileRevision>) -> Self {
        Self { revisions }
    }

    pub fn is_empty(&self) -> bool {
        self.revisions.is_empty()
    }

    /// Set comparison over `(path, revision)` pairs; order and duplicates are ignored.
    pub fn compare(&self, ledger: &[FileRevision]) -> MarkerComparison {
        let marker_keys: BTreeSet<_> = self.revisions.iter().map(FileRevision::key).collect();
        let ledger_keys: BTreeSet<_> = ledger.iter().map(FileRevision::key).collect();

        let missing_on_disk = dedup(
            ledger
                .iter()
                .filter(|r| !marker_keys.contains(&r.key()))
                .cloned(),
        );
        let unknown_on_disk = dedup(
            self.revisions
                .iter()
                .filter(|r| !ledger_keys.contains(&r.key()))
                .cloned(),
        );

        MarkerComparison {
            missing_on_disk,
            unknown_on_disk,
        }
    }

    /// Keep only revisions whose path lies under `root`.
    pub fn scoped_to(&self, root: &str) -> SyncMarker {
        SyncMarker::new(
            self.revisions
                .iter()
                .filter(|r| relative_to(root, &r.path).is_some())
                .cloned()
                .collect(),
        )
    }
}

fn dedup(revisions: impl Iterator<Item = FileRevision>) -> Vec<FileRevision> {
    let mut seen = BTreeSet::new();
    revisions.filter(|r| seen.insert(r.key())).collect()
}

/// Pending revisions grouped by the first folder beneath the scope root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PendingChanges {
    pub groups: BTreeMap<String, Vec<FileRevision>>,
}

impl PendingChanges {
    /// Group `revisions` by first segment relative to `root`.
    ///
    /// Files directly under the root land in [`ROOT_GROUP`]. Revisions outside
    /// the root are ignored. Insertion order is preserved within each group.
    pub fn group(root: &str, revisions: impl IntoIterator<Item = FileRevision>) -> Self {
        let mut groups: BTreeMap<String, Vec<FileRevision>> = BTreeMap::new();
        for revision in revisions {
            let Some(relative) = relative_to(root, &revision.path) else {
                continue;
            };
            let group = match relative.split_once('/') {
                Some((first, _)) => first.to_string(),
                None => ROOT_GROUP.to_string(),
            };
            groups.entry(group).or_default().push(revision);
        }
        Self { groups }
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn get(&self, group: &str) -> Option<&[FileRevision]> {
        self.groups.get(group).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn revision_count(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }
}

/// Pending changes for the global scope and a set of bots.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerWidePending {
    pub global: PendingChanges,
    pub bots: BTreeMap<String, PendingChanges>,
}

impl ServerWidePending {
    pub fn is_empty(&self) -> bool {
        self.global.is_empty() && self.bots.values().all(PendingChanges::is_empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_by_first_segment() {
        let r1 = FileRevision::new("./data/global/a/1.txt", "r1");
        let r2 = FileRevision::new("./data/global/a/2.txt", "r2");
        let r3 = FileRevision::new("./data/global/b/3.txt", "r3");

        let pending = PendingChanges::group("data/global", vec![r1, r2, r3]);
        assert_eq!(pending.len(), 2);
        assert_eq!(pending.get("a").unwrap().len(), 2);
        assert_eq!(pending.get("b").unwrap().len(), 1);
        assert!(pending.get("a").unwrap()[0].path.contains("1.txt"));
        assert_eq!(pending.get("a").unwrap()[0].revision, "r1");
        assert_eq!(pending.revision_count(), 3);
    }

    #[test]
    fn test_group_root_files_and_foreign_paths() {
        let pending = PendingChanges::group(
            "data/bots/luna",
            vec![
                FileRevision::new("data/bots/luna/bot.config.json", "r1"),
                FileRevision::new("data/bots/other/bot.config.json", "r2"),
            ],
        );
        assert_eq!(pending.len(), 1);
        assert_eq!(pending.get(ROOT_GROUP).unwrap().len(), 1);
    }

    #[test]
    fn test_marker_compare_exact() {
        let marker = SyncMarker::new(vec![
            FileRevision::new("data/global/a.json", "2"),
            FileRevision::new("./data/global/a.json", "1"),
        ]);
        let ledger = vec![
            FileRevision::new("data/global/a.json", "1"),
            FileRevision::new("data/global/a.json", "2"),
        ];
        assert!(marker.compare(&ledger).is_exact());
    }

    #[test]
    fn test_marker_compare_mismatch() {
        let marker = SyncMarker::new(vec![
            FileRevision::new("data/global/a.json", "1"),
            FileRevision::new("data/global/z.json", "9"),
        ]);
        let ledger = vec![
            FileRevision::new("data/global/a.json", "1"),
            FileRevision::new("data/global/b.json", "2"),
        ];
        let cmp = marker.compare(&ledger);
        assert!(!cmp.is_exact());
        assert_eq!(cmp.missing_on_disk, vec![FileRevision::new("data/global/b.json", "2")]);
        assert_eq!(cmp.unknown_on_disk, vec![FileRevision::new("data/global/z.json", "9")]);
    }

    #[test]
    fn test_marker_serializes_as_array() {
        let marker = SyncMarker::new(vec![FileRevision::new("data/global/a.json", "1")]);
        let json = serde_json::to_string(&marker).unwrap();
        assert_eq!(json, r#"[{"path":"data/global/a.json","revision":"1"}]"#);
        let back: SyncMarker = serde_json::from_str(&json).unwrap();
        assert_eq!(back, marker);
    }

    #[test]
    fn test_marker_scoped_to() {
        let marker = SyncMarker::new(vec![
            FileRevision::new("data/global/a.json", "1"),
            FileRevision::new("data/bots/luna/b.json", "2"),
        ]);
        let scoped = marker.scoped_to("data/bots");
        assert_eq!(scoped.revisions.len(), 1);
        assert_eq!(scoped.revisions[0].revision, "2");
    }
}
