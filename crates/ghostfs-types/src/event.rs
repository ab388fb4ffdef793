//! Events emitted by the ghost service.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A file under a scope was written, deleted or moved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileChanged {
    pub path: String,
}

/// A cache invalidation performed on one node, replayed on its peers.
///
/// `prefixes` evict every entry whose path starts with the prefix; `paths`
/// evict exact paths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheInvalidation {
    pub node_id: Uuid,
    #[serde(default)]
    pub paths: Vec<String>,
    #[serde(default)]
    pub prefixes: Vec<String>,
}

impl CacheInvalidation {
    pub fn paths(node_id: Uuid, paths: Vec<String>) -> Self {
        Self {
            node_id,
            paths,
            prefixes: Vec::new(),
        }
    }

    pub fn prefix(node_id: Uuid, prefix: String) -> Self {
        Self {
            node_id,
            paths: Vec::new(),
            prefixes: vec![prefix],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty() && self.prefixes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalidation_roundtrip_defaults() {
        let node = Uuid::now_v7();
        let json = format!(r#"{{"node_id":"{node}","paths":["data/global/a.json"]}}"#);
        let inv: CacheInvalidation = serde_json::from_str(&json).unwrap();
        assert_eq!(inv.node_id, node);
        assert_eq!(inv.paths, vec!["data/global/a.json"]);
        assert!(inv.prefixes.is_empty());
        assert!(!inv.is_empty());
    }

    #[test]
    fn test_empty_invalidation() {
        assert!(CacheInvalidation::paths(Uuid::now_v7(), Vec::new()).is_empty());
        assert!(!CacheInvalidation::prefix(Uuid::now_v7(), "data/".into()).is_empty());
    }
}
