use thiserror::Error;

use crate::commit::CommitId;

/// Errors from history store operations.
///
/// Callers in the merge core treat *any* of these as "ancestor not
/// found": a failed lookup degrades to the synthetic empty ancestor and
/// is logged, never surfaced as a merge failure.
#[derive(Debug, Error)]
pub enum HistoryError {
    /// The store cannot be reached or refused the request.
    #[error("history store unavailable: {0}")]
    Unavailable(String),

    /// No commit recorded under the requested id.
    #[error("commit not found: {0}")]
    CommitNotFound(CommitId),

    /// The commit exists but its snapshot is missing.
    #[error("snapshot not found for commit {0}")]
    SnapshotNotFound(CommitId),

    /// The snapshot payload cannot be decoded into a node tree.
    #[error("corrupt snapshot for commit {commit}: {reason}")]
    CorruptSnapshot { commit: CommitId, reason: String },
}

/// Result alias for history store operations.
pub type HistoryResult<T> = Result<T, HistoryError>;
