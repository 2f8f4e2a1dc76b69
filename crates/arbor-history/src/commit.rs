use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier of a recorded commit (UUID v7, time-ordered).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CommitId(uuid::Uuid);

impl CommitId {
    /// Generate a new time-ordered commit id.
    pub fn generate() -> Self {
        Self(uuid::Uuid::now_v7())
    }

    /// Create from an existing UUID.
    pub fn from_uuid(uuid: uuid::Uuid) -> Self {
        Self(uuid)
    }

    /// Short representation (first 8 characters of the UUID).
    pub fn short_id(&self) -> String {
        self.0.to_string()[..8].to_string()
    }
}

impl fmt::Debug for CommitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CommitId({})", self.short_id())
    }
}

impl fmt::Display for CommitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a stored snapshot.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SnapshotId(uuid::Uuid);

impl SnapshotId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::now_v7())
    }

    pub fn short_id(&self) -> String {
        self.0.to_string()[..8].to_string()
    }
}

impl fmt::Debug for SnapshotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SnapshotId({})", self.short_id())
    }
}

/// One recorded version of a named root tree.
///
/// Commits are grouped by `(kind, root_name)`; `version` counts up
/// within a group. The snapshot holds the tree as it was at commit time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Commit {
    pub id: CommitId,
    /// Kind tag of the committed root node.
    pub kind: String,
    /// Name of the root this commit belongs to.
    pub root_name: String,
    /// Monotonically increasing version within `(kind, root_name)`.
    pub version: u64,
    pub timestamp: DateTime<Utc>,
    /// The snapshot recorded for this commit.
    pub snapshot: SnapshotId,
}

/// A stored tree payload.
///
/// The payload format belongs to the store, not to the merge core; the
/// core only ever hands a snapshot back to the store that produced it
/// (`load_from_snapshot`) and otherwise treats it as opaque.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub id: SnapshotId,
    pub commit: CommitId,
    pub payload: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commit_ids_are_time_ordered() {
        let first = CommitId::generate();
        let second = CommitId::generate();
        assert!(first <= second);
    }

    #[test]
    fn short_id_is_eight_characters() {
        assert_eq!(CommitId::generate().short_id().len(), 8);
        assert_eq!(SnapshotId::generate().short_id().len(), 8);
    }
}
