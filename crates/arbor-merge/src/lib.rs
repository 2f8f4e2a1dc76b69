//! Property-level three-way merge for Arbor.
//!
//! Given a common-ancestor property mapping and two independently
//! modified descendants, computes a merged mapping plus an explicit
//! list of unresolved [`arbor_types::MergeConflict`]s. Pure and synchronous: no I/O,
//! no shared state, inputs are never mutated except by the documented
//! in-place reducers.
//!
//! # Key Operations
//!
//! - [`extract`] — Project a node into its mergeable property mapping
//! - [`merge_properties`] / [`merge_properties_with`] — The three-way merge
//! - [`merge_properties_into_ours`] / [`merge_properties_into_theirs`] —
//!   In-place convenience reducers (documented deliberate mutation)
//! - [`merge_values`] — Dynamic entry point with shape preconditions
//! - [`diff_nodes`] — Read-only matching/differing partition of two nodes

pub mod diff;
pub mod error;
pub mod extract;
pub mod three_way;

pub use diff::{diff_nodes, NodeDiff};
pub use error::{MergeArg, MergeError, MergeResult};
pub use extract::{extract, extract_value};
pub use three_way::{
    merge_properties, merge_properties_into_ours, merge_properties_into_theirs,
    merge_properties_with, merge_values, MergeOutcome, ValueOutcome,
};
