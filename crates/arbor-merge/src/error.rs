use std::fmt;

use thiserror::Error;

/// Which of the three merge arguments violated a shape precondition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MergeArg {
    Base,
    Ours,
    Theirs,
}

impl fmt::Display for MergeArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MergeArg::Base => write!(f, "base"),
            MergeArg::Ours => write!(f, "ours"),
            MergeArg::Theirs => write!(f, "theirs"),
        }
    }
}

/// Errors from property-level merge operations.
///
/// These are shape/precondition violations and always fail fast; an
/// unresolved value-level disagreement is never an error, it is a
/// [`arbor_types::MergeConflict`] in a successful result.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MergeError {
    /// The named argument is not object-shaped (neither map nor sequence).
    #[error("{0} argument must be a map or a sequence")]
    NotAnObject(MergeArg),

    /// A value was expected to stand in for a node but is not node-shaped.
    #[error("not a node: got a {0} value")]
    NotANode(&'static str),

    /// Two nodes of different kinds cannot be diffed or merged.
    #[error("cannot compare nodes of incompatible kinds: `{ours}` vs `{theirs}`")]
    IncompatibleKinds { ours: String, theirs: String },
}

/// Result alias for property-level merge operations.
pub type MergeResult<T> = Result<T, MergeError>;
