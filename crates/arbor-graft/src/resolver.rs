use std::collections::BTreeMap;

use async_trait::async_trait;
use thiserror::Error;

use arbor_types::{MergeConflict, PropertyValue};

/// Failure reported by an external conflict resolver.
///
/// Any resolver failure — including the user cancelling an interactive
/// session — aborts the enclosing tree merge with
/// [`crate::GraftError::ManualResolutionAborted`]. There is no partial
/// result.
#[derive(Debug, Error)]
#[error("{reason}")]
pub struct ResolverError {
    pub reason: String,
}

impl ResolverError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// External conflict-resolution collaborator for the Manual strategy.
///
/// The merge hands over the conflicts collected for one node (each
/// exposing property name, base, ours, and theirs read-only) and
/// suspends until the resolver answers with a property → chosen-value
/// mapping. Conflicts the resolver does not answer keep their
/// provisional merged value and stay in the reported conflict list.
#[async_trait]
pub trait ConflictResolver: Send + Sync {
    async fn resolve(
        &self,
        conflicts: &[MergeConflict],
    ) -> Result<BTreeMap<String, PropertyValue>, ResolverError>;
}
