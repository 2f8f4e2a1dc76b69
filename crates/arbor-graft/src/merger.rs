//! The whole-tree merge orchestrator.
//!
//! [`TreeMerger`] wires the collaborators together: a [`WorkingSet`]
//! for live-node lookup, a [`HistoryStore`] for recovering ancestors
//! that are no longer live, an optional [`ConflictResolver`] for the
//! Manual strategy, and a per-kind override registry.
//!
//! Ancestor resolution degrades, never fails: a store error or an
//! unrecoverable ancestor falls back to a synthetic empty ancestor, so
//! the merge always proceeds (treating every differing property as a
//! both-added case).

use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tracing::{debug, warn};

use arbor_history::HistoryStore;
use arbor_merge::{extract, merge_properties, MergeOutcome};
use arbor_types::{Lineage, MergeConflict, Node, NodeId, PropertyMap, PropertySlot, PropertyValue};

use crate::error::{GraftError, GraftResult};
use crate::matching::{match_children, MatchedTriple};
use crate::resolver::ConflictResolver;
use crate::strategy::{MergeOverride, MergeStrategy};
use crate::working_set::WorkingSet;

/// The result of a whole-tree merge: a freshly derived merged root and
/// the flat conflict list, in visit order (a node's own property
/// conflicts before any of its children's).
#[derive(Clone, Debug, PartialEq)]
pub struct MergedTree {
    pub root: Node,
    pub conflicts: Vec<MergeConflict>,
}

impl MergedTree {
    pub fn is_clean(&self) -> bool {
        self.conflicts.is_empty()
    }
}

/// The outcome of ancestor resolution.
#[derive(Clone, Debug)]
pub struct LcaOutcome {
    /// The resolved common ancestor, synthetic when none was found.
    pub ancestor: Node,
    /// Whether the ancestor came out of the live working set.
    pub found_live: bool,
}

/// Orchestrates three-way merges of whole node trees.
///
/// Configured builder-style:
///
/// ```ignore
/// let merger = TreeMerger::new(&history, &working_set)
///     .with_strategy(MergeStrategy::Manual)
///     .with_resolver(&resolver);
/// let merged = merger.merge_trees(&ours, &theirs).await?;
/// ```
pub struct TreeMerger<'a> {
    history: &'a dyn HistoryStore,
    working_set: &'a dyn WorkingSet,
    resolver: Option<&'a dyn ConflictResolver>,
    strategy: MergeStrategy,
    overrides: BTreeMap<String, Arc<dyn MergeOverride>>,
}

impl<'a> TreeMerger<'a> {
    pub fn new(history: &'a dyn HistoryStore, working_set: &'a dyn WorkingSet) -> Self {
        Self {
            history,
            working_set,
            resolver: None,
            strategy: MergeStrategy::default(),
            overrides: BTreeMap::new(),
        }
    }

    pub fn with_strategy(mut self, strategy: MergeStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_resolver(mut self, resolver: &'a dyn ConflictResolver) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Register a per-kind merge override, consulted by ancestor kind.
    pub fn with_override(mut self, kind: impl Into<String>, hook: Arc<dyn MergeOverride>) -> Self {
        self.overrides.insert(kind.into(), hook);
        self
    }

    /// Merge two trees against their lowest common ancestor.
    ///
    /// Neither input is mutated; the merged root is a fresh derivation
    /// of ours's lineage. Conflicts are data, not errors: the result is
    /// complete even when the conflict list is non-empty.
    pub async fn merge_trees(&self, ours: &Node, theirs: &Node) -> GraftResult<MergedTree> {
        if ours.kind() != theirs.kind() {
            return Err(GraftError::IncompatibleKinds {
                ours: ours.kind().to_string(),
                theirs: theirs.kind().to_string(),
            });
        }
        if self.strategy == MergeStrategy::Manual && self.resolver.is_none() {
            return Err(GraftError::ResolverMissing);
        }

        let lca = self.find_lowest_common_ancestor(ours, theirs).await;
        debug!(
            ancestor = %lca.ancestor.id().short_id(),
            found_live = lca.found_live,
            synthetic = lca.ancestor.is_synthetic(),
            "resolved merge ancestor"
        );
        let (root, conflicts) = self.merge_node(ours, theirs, &lca.ancestor).await?;
        Ok(MergedTree { root, conflicts })
    }

    /// Merge and hand the result to a caller-supplied reducer.
    pub async fn merge_trees_with<R>(
        &self,
        ours: &Node,
        theirs: &Node,
        reducer: impl FnOnce(MergedTree) -> R,
    ) -> GraftResult<R> {
        Ok(reducer(self.merge_trees(ours, theirs).await?))
    }

    /// Merge, then write the result back onto `ours` in place: result
    /// properties `ours` does not already define are inserted, its
    /// pre-existing properties are left untouched, and its child list
    /// is replaced by the merged one. Returns the conflicts.
    ///
    /// This is a documented deliberate mutation of one of the inputs.
    pub async fn merge_trees_into_ours(
        &self,
        ours: &mut Node,
        theirs: &Node,
    ) -> GraftResult<Vec<MergeConflict>> {
        let snapshot = ours.clone();
        let merged = self.merge_trees(&snapshot, theirs).await?;
        for (name, slot) in merged.root.props() {
            ours.insert_missing(name, slot.clone());
        }
        ours.replace_children(merged.root.children().to_vec());
        Ok(merged.conflicts)
    }

    /// Symmetric counterpart of [`Self::merge_trees_into_ours`],
    /// writing back onto `theirs`.
    pub async fn merge_trees_into_theirs(
        &self,
        ours: &Node,
        theirs: &mut Node,
    ) -> GraftResult<Vec<MergeConflict>> {
        let snapshot = theirs.clone();
        let merged = self.merge_trees(ours, &snapshot).await?;
        for (name, slot) in merged.root.props() {
            theirs.insert_missing(name, slot.clone());
        }
        theirs.replace_children(merged.root.children().to_vec());
        Ok(merged.conflicts)
    }

    /// Merge two trees addressed by node identity.
    ///
    /// Both ids must resolve through the working set; a miss is
    /// [`GraftError::NotANode`].
    pub async fn merge_by_identity(
        &self,
        ours: &NodeId,
        theirs: &NodeId,
    ) -> GraftResult<MergedTree> {
        let ours_node = self
            .working_set
            .lookup(ours)
            .ok_or(GraftError::NotANode(*ours))?;
        let theirs_node = self
            .working_set
            .lookup(theirs)
            .ok_or(GraftError::NotANode(*theirs))?;
        self.merge_trees(&ours_node, &theirs_node).await
    }

    /// Resolve the lowest common ancestor of two nodes.
    ///
    /// The newest id of ours's lineage also present in theirs's lineage
    /// names the ancestor. It is looked up live first; a miss falls
    /// back to walking historical snapshots newest-first. When the two
    /// lineages share nothing, or the ancestor is unrecoverable, the
    /// merge proceeds against a synthetic empty ancestor.
    pub async fn find_lowest_common_ancestor(&self, ours: &Node, theirs: &Node) -> LcaOutcome {
        let shared = ours
            .lineage()
            .ids()
            .iter()
            .rev()
            .find(|id| theirs.lineage().contains(*id))
            .copied();
        let Some(lca_id) = shared else {
            debug!("no shared lineage; merging against a synthetic empty ancestor");
            return LcaOutcome {
                ancestor: Node::synthetic(),
                found_live: false,
            };
        };

        if let Some(node) = self.working_set.lookup(&lca_id) {
            return LcaOutcome {
                ancestor: node,
                found_live: true,
            };
        }

        match self.recover_from_history(ours, &lca_id).await {
            Some(node) => LcaOutcome {
                ancestor: node,
                found_live: false,
            },
            None => {
                warn!(
                    ancestor = %lca_id.short_id(),
                    "common ancestor unrecoverable; merging against a synthetic empty ancestor"
                );
                LcaOutcome {
                    ancestor: Node::synthetic(),
                    found_live: false,
                }
            }
        }
    }

    /// Walk recorded snapshots newest-first until one contains the
    /// ancestor id. Store failures degrade to `None`.
    async fn recover_from_history(&self, ours: &Node, lca_id: &NodeId) -> Option<Node> {
        let root_name = ours
            .name()
            .map(str::to_string)
            .unwrap_or_else(|| ours.lineage().origin().to_string());

        let commit = match self.history.fetch_commit(ours.kind(), &root_name, None).await {
            Ok(Some(commit)) => commit,
            Ok(None) => {
                debug!(root = %root_name, "no recorded history for root");
                return None;
            }
            Err(error) => {
                warn!(%error, root = %root_name, "history store failed fetching commit");
                return None;
            }
        };
        let log = match self.history.log(&commit.id, None, false).await {
            Ok(log) => log,
            Err(error) => {
                warn!(%error, "history store failed walking the log");
                return None;
            }
        };

        for entry in log {
            let snapshot = match self.history.fetch_snapshot(&entry.id).await {
                Ok(snapshot) => snapshot,
                Err(error) => {
                    warn!(%error, commit = %entry.id.short_id(), "history store failed fetching snapshot");
                    return None;
                }
            };
            let root = match self.history.load_from_snapshot(&snapshot).await {
                Ok(root) => root,
                Err(error) => {
                    warn!(%error, commit = %entry.id.short_id(), "snapshot failed to load");
                    return None;
                }
            };
            if let Some(found) = root.find_descendant(lca_id) {
                debug!(
                    commit = %entry.id.short_id(),
                    version = entry.version,
                    "recovered ancestor from snapshot"
                );
                return Some(found.clone());
            }
        }
        None
    }

    fn merge_node<'s>(
        &'s self,
        ours: &'s Node,
        theirs: &'s Node,
        ancestor: &'s Node,
    ) -> Pin<Box<dyn Future<Output = GraftResult<(Node, Vec<MergeConflict>)>> + Send + 's>> {
        Box::pin(async move {
            if ours.kind() != theirs.kind() {
                return Err(GraftError::IncompatibleKinds {
                    ours: ours.kind().to_string(),
                    theirs: theirs.kind().to_string(),
                });
            }

            let outcome = match self.overrides.get(ancestor.kind()) {
                Some(hook) => {
                    debug!(kind = ancestor.kind(), "dispatching to kind merge override");
                    hook.merge(ancestor, ours, theirs)?
                }
                None => merge_properties(&extract(ancestor), &extract(ours), &extract(theirs)),
            };
            let MergeOutcome {
                mut properties,
                mut conflicts,
            } = outcome;

            if self.strategy == MergeStrategy::Manual && !conflicts.is_empty() {
                let chosen = self.resolve_manually(&conflicts).await?;
                let mut answered = Vec::new();
                for (name, value) in chosen {
                    if set_path(&mut properties, &name, value) {
                        answered.push(name);
                    }
                }
                conflicts.retain(|c| !answered.contains(&c.property));
            }

            let triples = match_children(ours, theirs, ancestor);
            let decisions = self.structural_decisions(&triples).await?;

            let mut children = Vec::new();
            for triple in triples {
                let MatchedTriple {
                    ours: ours_child,
                    theirs: theirs_child,
                    ancestor: ancestor_child,
                } = triple;
                match (ours_child, theirs_child) {
                    (Some(oc), Some(tc)) => {
                        let anc = ancestor_child.unwrap_or_else(Node::synthetic);
                        let (child, child_conflicts) = self.merge_node(&oc, &tc, &anc).await?;
                        children.push(child);
                        conflicts.extend(child_conflicts);
                    }
                    (Some(oc), None) => {
                        if self.keep_one_sided(&oc, ancestor_child.as_ref(), Side::Ours, &decisions)
                        {
                            children.push(oc);
                        } else {
                            debug!(child = %oc.id().short_id(), "dropping child removed on their side");
                        }
                    }
                    (None, Some(tc)) => {
                        if self.keep_one_sided(&tc, ancestor_child.as_ref(), Side::Theirs, &decisions)
                        {
                            children.push(tc);
                        } else {
                            debug!(child = %tc.id().short_id(), "dropping child removed on our side");
                        }
                    }
                    (None, None) => {}
                }
            }

            let mut slots = BTreeMap::new();
            for (name, value) in properties {
                let slot = match ours.slot(&name) {
                    Some(existing) => PropertySlot {
                        value,
                        derived: existing.derived,
                        style: existing.style,
                    },
                    None => PropertySlot::plain(value),
                };
                slots.insert(name, slot);
            }
            let lineage = ours.lineage().derive(NodeId::generate());
            let node = Node::assemble(ours.kind(), lineage, slots, children)?;
            Ok((node, conflicts))
        })
    }

    /// Under the Manual strategy, escalate every one-sided child whose
    /// ancestor counterpart exists (removal vs. modification) and
    /// collect the resolver's batch answer for this node.
    async fn structural_decisions(
        &self,
        triples: &[MatchedTriple],
    ) -> GraftResult<BTreeMap<String, PropertyValue>> {
        if self.strategy != MergeStrategy::Manual {
            return Ok(BTreeMap::new());
        }
        let structural: Vec<MergeConflict> = triples
            .iter()
            .filter_map(structural_conflict)
            .collect();
        if structural.is_empty() {
            return Ok(BTreeMap::new());
        }
        self.resolve_manually(&structural).await
    }

    async fn resolve_manually(
        &self,
        conflicts: &[MergeConflict],
    ) -> GraftResult<BTreeMap<String, PropertyValue>> {
        let resolver = self.resolver.ok_or(GraftError::ResolverMissing)?;
        debug!(conflicts = conflicts.len(), "escalating conflicts to the external resolver");
        resolver
            .resolve(conflicts)
            .await
            .map_err(|e| GraftError::ManualResolutionAborted(e.reason))
    }

    /// Whether a one-sided child survives the merge.
    ///
    /// A child without an ancestor counterpart is a pure addition and
    /// is always kept. One with an ancestor counterpart was removed on
    /// the silent side; it is dropped only when the opposing strategy
    /// is selected and the child is an unmodified derivation of the
    /// ancestor child, or when a Manual decision answered `Null`.
    fn keep_one_sided(
        &self,
        child: &Node,
        ancestor_child: Option<&Node>,
        side: Side,
        decisions: &BTreeMap<String, PropertyValue>,
    ) -> bool {
        let Some(anc) = ancestor_child else {
            return true;
        };
        match self.strategy {
            MergeStrategy::PreferOurs => {
                !(side == Side::Theirs && unchanged_from(child, anc))
            }
            MergeStrategy::PreferTheirs => {
                !(side == Side::Ours && unchanged_from(child, anc))
            }
            MergeStrategy::Manual => !matches!(
                decisions.get(&structural_key(child)),
                Some(PropertyValue::Null)
            ),
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Side {
    Ours,
    Theirs,
}

/// A child counts as unchanged when its lineage is the ancestor
/// child's, or a single direct derivation of it.
fn unchanged_from(child: &Node, ancestor_child: &Node) -> bool {
    let c = child.lineage();
    let a = ancestor_child.lineage();
    c == a || (c.len() == a.len() + 1 && Lineage::longest_common_prefix(c, a) == a.len())
}

fn structural_key(child: &Node) -> String {
    format!("child:{}", child.id().short_id())
}

/// Surface a one-sided child as a conflict the resolver can decide.
/// The present side carries the child's mergeable properties as a map;
/// a `Null` answer drops the child, anything else keeps it.
fn structural_conflict(triple: &MatchedTriple) -> Option<MergeConflict> {
    let ancestor = triple.ancestor.as_ref()?;
    match (&triple.ours, &triple.theirs) {
        (Some(child), None) => Some(MergeConflict::new(
            structural_key(child),
            Some(PropertyValue::Map(extract(ancestor))),
            Some(PropertyValue::Map(extract(child))),
            None,
        )),
        (None, Some(child)) => Some(MergeConflict::new(
            structural_key(child),
            Some(PropertyValue::Map(extract(ancestor))),
            None,
            Some(PropertyValue::Map(extract(child))),
        )),
        _ => None,
    }
}

/// Write a resolver-chosen value at a (possibly nested) conflict path.
///
/// Paths use the conflict syntax: dotted map keys with bracketed
/// sequence indices (`"layout.spacing"`, `"tags[2]"`). Returns `false`
/// when the path does not navigate the merged mapping — including a
/// top-level name the mapping does not hold; every real conflict keeps
/// its key with a provisional value, so an unknown name can only be a
/// stray answer and is ignored rather than inserted.
fn set_path(map: &mut PropertyMap, path: &str, value: PropertyValue) -> bool {
    let (head, rest) = match path.find('.') {
        Some(pos) => (&path[..pos], Some(&path[pos + 1..])),
        None => (path, None),
    };
    let (name, indices) = match head.find('[') {
        Some(pos) => {
            let mut indices = Vec::new();
            for part in head[pos..].split('[').skip(1) {
                let Some(stripped) = part.strip_suffix(']') else {
                    return false;
                };
                let Ok(idx) = stripped.parse::<usize>() else {
                    return false;
                };
                indices.push(idx);
            }
            (&head[..pos], indices)
        }
        None => (head, Vec::new()),
    };
    if name.is_empty() {
        return false;
    }

    if rest.is_none() && indices.is_empty() {
        if !map.contains_key(name) {
            return false;
        }
        map.insert(name.to_string(), value);
        return true;
    }

    let Some(mut cursor) = map.get_mut(name) else {
        return false;
    };
    let walked = if rest.is_none() {
        indices.len() - 1
    } else {
        indices.len()
    };
    for idx in &indices[..walked] {
        match cursor {
            PropertyValue::Seq(seq) => match seq.get_mut(*idx) {
                Some(next) => cursor = next,
                None => return false,
            },
            _ => return false,
        }
    }
    match rest {
        None => {
            let last = indices[indices.len() - 1];
            match cursor {
                PropertyValue::Seq(seq) if last < seq.len() => {
                    seq[last] = value;
                    true
                }
                _ => false,
            }
        }
        Some(rest) => match cursor {
            PropertyValue::Map(inner) => set_path(inner, rest, value),
            _ => false,
        },
    }
}
