use thiserror::Error;

use arbor_types::{NodeId, TypeError};

/// Errors from whole-tree merge operations.
///
/// History-store failures never appear here: they degrade to the
/// synthetic empty ancestor inside ancestor resolution. A failed merge
/// never returns a partially merged tree.
#[derive(Debug, Error)]
pub enum GraftError {
    /// An identity could not be resolved to a live node.
    #[error("node {0} is not in the working set")]
    NotANode(NodeId),

    /// The two roots (or a matched child pair) have different kind tags.
    #[error("cannot merge nodes of incompatible kinds: `{ours}` vs `{theirs}`")]
    IncompatibleKinds { ours: String, theirs: String },

    /// The external resolver rejected or failed; the whole merge aborts.
    #[error("manual resolution aborted: {0}")]
    ManualResolutionAborted(String),

    /// The Manual strategy was selected without configuring a resolver.
    #[error("manual strategy requires a conflict resolver")]
    ResolverMissing,

    /// Property-level shape violation, propagated fail-fast.
    #[error(transparent)]
    Merge(#[from] arbor_merge::MergeError),

    /// Node assembly violated a type invariant.
    #[error(transparent)]
    Type(#[from] TypeError),
}

/// Result alias for whole-tree merge operations.
pub type GraftResult<T> = Result<T, GraftError>;
