//! Two-node property diff: a read-only preview of what a merge would
//! have to reconcile.
//!
//! Partitions the extracted properties of two same-kind nodes into
//! entries that match and entries that differ. Interactive tooling uses
//! this to show a merge preview without running the merge.

use std::collections::BTreeMap;

use arbor_types::{Node, PropertyMap, PropertyValue};

use crate::error::{MergeError, MergeResult};
use crate::extract::extract;

/// The result of comparing two nodes' mergeable properties.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NodeDiff {
    /// Properties both nodes agree on.
    pub matching: PropertyMap,
    /// Properties the nodes disagree on (or only one defines):
    /// name → (ours, theirs).
    pub differing: BTreeMap<String, (Option<PropertyValue>, Option<PropertyValue>)>,
}

impl NodeDiff {
    /// Returns `true` if the two nodes agree on every property.
    pub fn is_identical(&self) -> bool {
        self.differing.is_empty()
    }
}

/// Compare the mergeable properties of two nodes of the same kind.
///
/// Fails with [`MergeError::IncompatibleKinds`] when the kind tags
/// differ, the same precondition the tree merger applies.
pub fn diff_nodes(ours: &Node, theirs: &Node) -> MergeResult<NodeDiff> {
    if ours.kind() != theirs.kind() {
        return Err(MergeError::IncompatibleKinds {
            ours: ours.kind().to_string(),
            theirs: theirs.kind().to_string(),
        });
    }

    let ours_props = extract(ours);
    let theirs_props = extract(theirs);
    let mut diff = NodeDiff::default();

    for (name, ours_val) in &ours_props {
        match theirs_props.get(name) {
            Some(theirs_val) if theirs_val == ours_val => {
                diff.matching.insert(name.clone(), ours_val.clone());
            }
            other => {
                diff.differing
                    .insert(name.clone(), (Some(ours_val.clone()), other.cloned()));
            }
        }
    }
    for (name, theirs_val) in &theirs_props {
        if !ours_props.contains_key(name) {
            diff.differing
                .insert(name.clone(), (None, Some(theirs_val.clone())));
        }
    }
    Ok(diff)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn panel(name: &str, width: f64) -> Node {
        let mut node = Node::new("panel");
        node.set("name", name).unwrap();
        node.set("width", width).unwrap();
        node
    }

    #[test]
    fn identical_nodes_have_no_differences() {
        let a = panel("box", 100.0);
        let b = a.derive_copy();
        let diff = diff_nodes(&a, &b).unwrap();
        assert!(diff.is_identical());
        assert_eq!(diff.matching.len(), 2);
    }

    #[test]
    fn changed_and_one_sided_properties_are_partitioned() {
        let a = panel("box", 100.0);
        let mut b = a.derive_copy();
        b.set("width", 120.0).unwrap();
        b.set("height", 50.0).unwrap();

        let diff = diff_nodes(&a, &b).unwrap();
        assert_eq!(diff.matching.len(), 1);
        assert!(diff.matching.contains_key("name"));
        assert_eq!(
            diff.differing["width"],
            (Some(100.0.into()), Some(120.0.into()))
        );
        assert_eq!(diff.differing["height"], (None, Some(50.0.into())));
    }

    #[test]
    fn derived_properties_are_ignored() {
        let mut a = panel("box", 100.0);
        a.set_derived("bounds", "a-side").unwrap();
        let mut b = panel("box", 100.0);
        b.set_derived("bounds", "b-side").unwrap();
        b.set("name", "box").unwrap();

        let diff = diff_nodes(&a, &b).unwrap();
        assert!(!diff.differing.contains_key("bounds"));
    }

    #[test]
    fn kind_mismatch_is_an_error() {
        let a = Node::new("panel");
        let b = Node::new("ellipse");
        assert_eq!(
            diff_nodes(&a, &b).unwrap_err(),
            MergeError::IncompatibleKinds {
                ours: "panel".into(),
                theirs: "ellipse".into()
            }
        );
    }
}
