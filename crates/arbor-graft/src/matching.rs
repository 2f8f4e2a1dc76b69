//! Lineage-based child matching.
//!
//! Children are matched across the two versions by shared lineage
//! *origin*, never by position or name: a child of ours corresponds to
//! the child of theirs that descends from the same original node. The
//! matched ancestor child is the one whose lineage contains the id at
//! which the two child lineages last agreed before diverging.

use arbor_types::{Lineage, Node};

/// One matched child slot across the three trees. Transient: created
/// per merge invocation and discarded after.
#[derive(Clone, Debug, PartialEq)]
pub struct MatchedTriple {
    pub ours: Option<Node>,
    pub theirs: Option<Node>,
    pub ancestor: Option<Node>,
}

impl MatchedTriple {
    /// Whether both sides still have this child.
    pub fn is_paired(&self) -> bool {
        self.ours.is_some() && self.theirs.is_some()
    }
}

/// Match the children of two nodes against an ancestor's children.
///
/// Emission order: ours's children first (in ours order, whether paired
/// or ours-only), then theirs-only children (in theirs order).
pub fn match_children(ours: &Node, theirs: &Node, ancestor: &Node) -> Vec<MatchedTriple> {
    let mut triples = Vec::new();
    let mut theirs_used = vec![false; theirs.children().len()];

    for ours_child in ours.children() {
        let paired = theirs.children().iter().enumerate().find(|(idx, tc)| {
            !theirs_used[*idx] && tc.lineage().shares_origin(ours_child.lineage())
        });

        match paired {
            Some((idx, theirs_child)) => {
                theirs_used[idx] = true;
                let deepest =
                    Lineage::last_common_id(ours_child.lineage(), theirs_child.lineage());
                let ancestor_child = deepest.and_then(|id| {
                    ancestor
                        .children()
                        .iter()
                        .find(|ac| ac.lineage().contains(&id))
                });
                triples.push(MatchedTriple {
                    ours: Some(ours_child.clone()),
                    theirs: Some(theirs_child.clone()),
                    ancestor: ancestor_child.cloned(),
                });
            }
            None => {
                triples.push(MatchedTriple {
                    ours: Some(ours_child.clone()),
                    theirs: None,
                    ancestor: ancestor_child_by_origin(ancestor, ours_child),
                });
            }
        }
    }

    for (idx, theirs_child) in theirs.children().iter().enumerate() {
        if !theirs_used[idx] {
            triples.push(MatchedTriple {
                ours: None,
                theirs: Some(theirs_child.clone()),
                ancestor: ancestor_child_by_origin(ancestor, theirs_child),
            });
        }
    }
    triples
}

fn ancestor_child_by_origin(ancestor: &Node, child: &Node) -> Option<Node> {
    ancestor
        .children()
        .iter()
        .find(|ac| ac.lineage().shares_origin(child.lineage()))
        .cloned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named(kind: &str, name: &str) -> Node {
        let mut node = Node::new(kind);
        node.set("name", name).unwrap();
        node
    }

    #[test]
    fn children_pair_by_origin_not_position() {
        let mut ancestor = named("panel", "root");
        ancestor.push_child(named("label", "first"));
        ancestor.push_child(named("label", "second"));

        let ours = ancestor.derive_copy();
        let mut theirs = ancestor.derive_copy();
        // Reverse theirs's child order; matching must not care.
        let mut reversed: Vec<Node> = theirs.children().to_vec();
        reversed.reverse();
        theirs.replace_children(reversed);

        let triples = match_children(&ours, &theirs, &ancestor);
        assert_eq!(triples.len(), 2);
        for triple in &triples {
            assert!(triple.is_paired());
            let o = triple.ours.as_ref().unwrap();
            let t = triple.theirs.as_ref().unwrap();
            assert!(o.lineage().shares_origin(t.lineage()));
            assert_eq!(
                triple.ancestor.as_ref().and_then(Node::name),
                o.name(),
            );
        }
    }

    #[test]
    fn unmatched_children_come_out_one_sided() {
        let mut ancestor = named("panel", "root");
        ancestor.push_child(named("label", "kept"));

        let mut ours = ancestor.derive_copy();
        ours.push_child(named("label", "ours-new"));
        let mut theirs = ancestor.derive_copy();
        theirs.push_child(named("label", "theirs-new"));

        let triples = match_children(&ours, &theirs, &ancestor);
        assert_eq!(triples.len(), 3);
        assert!(triples[0].is_paired());

        let ours_only = &triples[1];
        assert_eq!(ours_only.ours.as_ref().and_then(Node::name), Some("ours-new"));
        assert!(ours_only.theirs.is_none());
        assert!(ours_only.ancestor.is_none());

        let theirs_only = &triples[2];
        assert_eq!(
            theirs_only.theirs.as_ref().and_then(Node::name),
            Some("theirs-new")
        );
        assert!(theirs_only.ours.is_none());
    }

    #[test]
    fn ancestor_child_is_found_through_deeper_derivations() {
        let mut ancestor = named("panel", "root");
        ancestor.push_child(named("label", "x"));

        // Ours derives twice from the ancestor's child line.
        let once = ancestor.derive_copy();
        let ours = once.derive_copy();
        let theirs = ancestor.derive_copy();

        let triples = match_children(&ours, &theirs, &ancestor);
        assert_eq!(triples.len(), 1);
        assert_eq!(
            triples[0].ancestor.as_ref().and_then(Node::name),
            Some("x")
        );
    }

    #[test]
    fn removed_child_has_no_counterpart() {
        let mut ancestor = named("panel", "root");
        ancestor.push_child(named("label", "doomed"));

        let ours = ancestor.derive_copy();
        let mut theirs = ancestor.derive_copy();
        theirs.replace_children(Vec::new());

        let triples = match_children(&ours, &theirs, &ancestor);
        assert_eq!(triples.len(), 1);
        assert!(triples[0].theirs.is_none());
        // The ancestor still knows this child: removal vs. modification
        // is the strategy's call, not the matcher's.
        assert_eq!(
            triples[0].ancestor.as_ref().and_then(Node::name),
            Some("doomed")
        );
    }
}
