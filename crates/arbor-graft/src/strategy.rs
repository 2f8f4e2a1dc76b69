use arbor_merge::MergeOutcome;
use arbor_types::Node;

use crate::error::GraftResult;

/// Policy governing how structural ambiguities (additions vs. removals)
/// and irreconcilable property conflicts are defaulted or escalated.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MergeStrategy {
    /// Ties favor the current side (ours).
    #[default]
    PreferOurs,
    /// Ties favor the incoming side (theirs).
    PreferTheirs,
    /// Every structural ambiguity and every property conflict is
    /// escalated to the configured [`crate::ConflictResolver`]; the
    /// merge suspends until it answers.
    Manual,
}

/// Per-kind merge override.
///
/// A node kind may special-case its own merge semantics. The tree
/// merger consults the registry (keyed by the resolved ancestor's kind)
/// before running the generic property merge; when an override is
/// registered, its outcome replaces the generic one entirely.
pub trait MergeOverride: Send + Sync {
    fn merge(&self, ancestor: &Node, ours: &Node, theirs: &Node) -> GraftResult<MergeOutcome>;
}
