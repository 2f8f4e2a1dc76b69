//! Whole-tree three-way merge for Arbor.
//!
//! [`TreeMerger`] orchestrates the merge of two independently modified
//! trees: it resolves their lowest common ancestor (live, or recovered
//! from historical snapshots through the [`arbor_history::HistoryStore`]
//! collaborator), matches corresponding child nodes across the two
//! versions by derivation lineage, three-way merges every matched
//! triple's properties, and reassembles the merged tree together with a
//! flat, ordered conflict list.
//!
//! Ancestor resolution and the manual conflict-resolution round trip
//! are the only suspension points; the structural merge itself is pure
//! and synchronous.
//!
//! # Key Types
//!
//! - [`TreeMerger`] — The orchestrator; builder-style configuration
//! - [`MergeStrategy`] — PreferOurs / PreferTheirs / Manual
//! - [`MergedTree`] — Merged root plus the full conflict list
//! - [`ConflictResolver`] — Async external resolver for the Manual strategy
//! - [`WorkingSet`] — Live-node lookup seam

pub mod error;
pub mod matching;
pub mod merger;
pub mod resolver;
pub mod strategy;
pub mod working_set;

pub use error::{GraftError, GraftResult};
pub use matching::{match_children, MatchedTriple};
pub use merger::{LcaOutcome, MergedTree, TreeMerger};
pub use resolver::{ConflictResolver, ResolverError};
pub use strategy::{MergeOverride, MergeStrategy};
pub use working_set::{MemoryWorkingSet, WorkingSet};
