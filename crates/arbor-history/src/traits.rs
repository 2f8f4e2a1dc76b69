use async_trait::async_trait;

use arbor_types::Node;

use crate::commit::{Commit, CommitId, Snapshot};
use crate::error::HistoryResult;

/// Async lookup service over a persistent version history.
///
/// All implementations must satisfy these invariants:
/// - Commits and snapshots are immutable once recorded.
/// - `log` returns commits of the same `(kind, root_name)` group as the
///   anchor commit, up to and including the anchor, ordered oldest-first
///   when `chronological` is true and newest-first otherwise.
/// - `load_from_snapshot` reconstructs exactly the tree that was
///   recorded; the payload format is the store's own business.
/// - Lookups never mutate store state.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Fetch a commit for a named root.
    ///
    /// With `version == None`, the latest commit for `(kind, root_name)`.
    /// Returns `Ok(None)` if the root has no recorded commits.
    async fn fetch_commit(
        &self,
        kind: &str,
        root_name: &str,
        version: Option<u64>,
    ) -> HistoryResult<Option<Commit>>;

    /// The commit history reachable from `commit`, ordered per
    /// `chronological`, truncated to `limit` entries when given.
    async fn log(
        &self,
        commit: &CommitId,
        limit: Option<usize>,
        chronological: bool,
    ) -> HistoryResult<Vec<Commit>>;

    /// Fetch the snapshot recorded for a commit.
    async fn fetch_snapshot(&self, commit: &CommitId) -> HistoryResult<Snapshot>;

    /// Reconstruct the node tree stored in a snapshot.
    async fn load_from_snapshot(&self, snapshot: &Snapshot) -> HistoryResult<Node>;
}
