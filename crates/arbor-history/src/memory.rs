use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use tracing::debug;

use arbor_types::Node;

use crate::commit::{Commit, CommitId, Snapshot, SnapshotId};
use crate::error::{HistoryError, HistoryResult};
use crate::traits::HistoryStore;

/// In-memory history store.
///
/// Intended for tests and embedding. Commits are held in recording
/// order behind a `RwLock`; snapshots serialize the recorded tree
/// through `serde_json`, which doubles as this store's (private)
/// payload format.
pub struct MemoryHistoryStore {
    inner: RwLock<Inner>,
}

#[derive(Default)]
struct Inner {
    /// All commits, in recording order (oldest first).
    commits: Vec<Commit>,
    snapshots: HashMap<CommitId, Snapshot>,
}

impl MemoryHistoryStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
        }
    }

    /// Record a commit of `root` under its kind and the given root name,
    /// snapshotting the whole tree. Returns the new commit.
    pub fn record_commit(&self, root_name: &str, root: &Node) -> HistoryResult<Commit> {
        let payload = serde_json::to_value(root).map_err(|e| {
            HistoryError::Unavailable(format!("cannot encode snapshot: {e}"))
        })?;

        let mut inner = self.inner.write().expect("lock poisoned");
        let version = inner
            .commits
            .iter()
            .filter(|c| c.kind == root.kind() && c.root_name == root_name)
            .count() as u64
            + 1;

        let commit = Commit {
            id: CommitId::generate(),
            kind: root.kind().to_string(),
            root_name: root_name.to_string(),
            version,
            timestamp: chrono::Utc::now(),
            snapshot: SnapshotId::generate(),
        };
        let snapshot = Snapshot {
            id: commit.snapshot,
            commit: commit.id,
            payload,
        };

        debug!(
            commit = %commit.id.short_id(),
            root = root_name,
            version,
            "recorded commit"
        );
        inner.snapshots.insert(commit.id, snapshot);
        inner.commits.push(commit.clone());
        Ok(commit)
    }

    /// Number of recorded commits.
    pub fn len(&self) -> usize {
        self.inner.read().expect("lock poisoned").commits.len()
    }

    /// Returns `true` if nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.inner.read().expect("lock poisoned").commits.is_empty()
    }

    /// Remove all recorded history.
    pub fn clear(&self) {
        let mut inner = self.inner.write().expect("lock poisoned");
        inner.commits.clear();
        inner.snapshots.clear();
    }
}

impl Default for MemoryHistoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HistoryStore for MemoryHistoryStore {
    async fn fetch_commit(
        &self,
        kind: &str,
        root_name: &str,
        version: Option<u64>,
    ) -> HistoryResult<Option<Commit>> {
        let inner = self.inner.read().expect("lock poisoned");
        let found = inner
            .commits
            .iter()
            .filter(|c| c.kind == kind && c.root_name == root_name)
            .filter(|c| version.map_or(true, |v| c.version == v))
            .next_back();
        Ok(found.cloned())
    }

    async fn log(
        &self,
        commit: &CommitId,
        limit: Option<usize>,
        chronological: bool,
    ) -> HistoryResult<Vec<Commit>> {
        let inner = self.inner.read().expect("lock poisoned");
        let anchor = inner
            .commits
            .iter()
            .find(|c| c.id == *commit)
            .ok_or(HistoryError::CommitNotFound(*commit))?;

        let mut history: Vec<Commit> = inner
            .commits
            .iter()
            .filter(|c| {
                c.kind == anchor.kind
                    && c.root_name == anchor.root_name
                    && c.version <= anchor.version
            })
            .cloned()
            .collect();
        // Recording order is oldest-first already.
        if !chronological {
            history.reverse();
        }
        if let Some(limit) = limit {
            history.truncate(limit);
        }
        Ok(history)
    }

    async fn fetch_snapshot(&self, commit: &CommitId) -> HistoryResult<Snapshot> {
        let inner = self.inner.read().expect("lock poisoned");
        inner
            .snapshots
            .get(commit)
            .cloned()
            .ok_or(HistoryError::SnapshotNotFound(*commit))
    }

    async fn load_from_snapshot(&self, snapshot: &Snapshot) -> HistoryResult<Node> {
        serde_json::from_value(snapshot.payload.clone()).map_err(|e| {
            HistoryError::CorruptSnapshot {
                commit: snapshot.commit,
                reason: e.to_string(),
            }
        })
    }
}

impl std::fmt::Debug for MemoryHistoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryHistoryStore")
            .field("commit_count", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named_root(name: &str) -> Node {
        let mut node = Node::new("panel");
        node.set("name", name).unwrap();
        node
    }

    #[tokio::test]
    async fn record_then_fetch_latest() {
        let store = MemoryHistoryStore::new();
        let root = named_root("canvas");
        store.record_commit("canvas", &root).unwrap();
        let edited = {
            let mut n = root.derive_copy();
            n.set("width", 300.0).unwrap();
            n
        };
        store.record_commit("canvas", &edited).unwrap();

        let latest = store
            .fetch_commit("panel", "canvas", None)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(latest.version, 2);
    }

    #[tokio::test]
    async fn fetch_commit_by_version() {
        let store = MemoryHistoryStore::new();
        let root = named_root("canvas");
        store.record_commit("canvas", &root).unwrap();
        store.record_commit("canvas", &root.derive_copy()).unwrap();

        let first = store
            .fetch_commit("panel", "canvas", Some(1))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(first.version, 1);
        assert!(store
            .fetch_commit("panel", "missing", None)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn log_orders_newest_first_by_default_flag() {
        let store = MemoryHistoryStore::new();
        let root = named_root("canvas");
        store.record_commit("canvas", &root).unwrap();
        store.record_commit("canvas", &root.derive_copy()).unwrap();
        let third = store
            .record_commit("canvas", &root.derive_copy())
            .unwrap();

        let newest_first = store.log(&third.id, None, false).await.unwrap();
        let versions: Vec<u64> = newest_first.iter().map(|c| c.version).collect();
        assert_eq!(versions, vec![3, 2, 1]);

        let oldest_first = store.log(&third.id, None, true).await.unwrap();
        let versions: Vec<u64> = oldest_first.iter().map(|c| c.version).collect();
        assert_eq!(versions, vec![1, 2, 3]);

        let limited = store.log(&third.id, Some(2), false).await.unwrap();
        assert_eq!(limited.len(), 2);
        assert_eq!(limited[0].version, 3);
    }

    #[tokio::test]
    async fn log_of_unknown_commit_fails() {
        let store = MemoryHistoryStore::new();
        let err = store
            .log(&CommitId::generate(), None, false)
            .await
            .unwrap_err();
        assert!(matches!(err, HistoryError::CommitNotFound(_)));
    }

    #[tokio::test]
    async fn snapshot_round_trips_the_tree() {
        let store = MemoryHistoryStore::new();
        let mut root = named_root("canvas");
        root.push_child(Node::new("label"));
        let commit = store.record_commit("canvas", &root).unwrap();

        let snapshot = store.fetch_snapshot(&commit.id).await.unwrap();
        let loaded = store.load_from_snapshot(&snapshot).await.unwrap();
        assert_eq!(loaded, root);
    }

    #[tokio::test]
    async fn corrupt_snapshot_is_reported() {
        let store = MemoryHistoryStore::new();
        let snapshot = Snapshot {
            id: SnapshotId::generate(),
            commit: CommitId::generate(),
            payload: serde_json::json!({"not": "a node"}),
        };
        let err = store.load_from_snapshot(&snapshot).await.unwrap_err();
        assert!(matches!(err, HistoryError::CorruptSnapshot { .. }));
    }
}
