//! The tree node model consumed and produced by the merge engine.
//!
//! A [`Node`] is a tree element with a stable identity, an append-only
//! derivation [`Lineage`], a kind tag, a flat property table, and an
//! ordered child list. Property slots carry the two flags the extractor
//! filters on: `derived` (computed from other state) and `style` (part
//! of the styling cascade, excluded wholesale from merging).
//!
//! Invariant: a node's own id is always the newest entry of its own
//! lineage. All constructors enforce this.

use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::identity::{Lineage, NodeId};
use crate::value::PropertyValue;

/// Reserved name for the child list. Children are merged structurally,
/// never as an ordinary property, so this name is rejected at `set`
/// time and never emitted by extraction.
pub const CHILDREN_PROPERTY: &str = "children";

/// A property table entry: the value plus the flags extraction filters on.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PropertySlot {
    pub value: PropertyValue,
    /// Computed from other state; excluded from merging.
    pub derived: bool,
    /// Part of the styling cascade; excluded from merging.
    pub style: bool,
}

impl PropertySlot {
    /// An ordinary, mergeable property.
    pub fn plain(value: impl Into<PropertyValue>) -> Self {
        Self {
            value: value.into(),
            derived: false,
            style: false,
        }
    }

    /// A derived (computed) property.
    pub fn derived(value: impl Into<PropertyValue>) -> Self {
        Self {
            value: value.into(),
            derived: true,
            style: false,
        }
    }

    /// A styling-cascade property.
    pub fn style(value: impl Into<PropertyValue>) -> Self {
        Self {
            value: value.into(),
            derived: false,
            style: true,
        }
    }

    /// Whether the extractor includes this slot.
    pub fn is_mergeable(&self) -> bool {
        !self.derived && !self.style
    }
}

/// A tree element.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Node {
    id: NodeId,
    lineage: Lineage,
    kind: String,
    props: std::collections::BTreeMap<String, PropertySlot>,
    children: Vec<Node>,
}

impl Node {
    /// A brand-new node of the given kind; its lineage is just itself.
    pub fn new(kind: impl Into<String>) -> Self {
        let id = NodeId::generate();
        Self {
            id,
            lineage: Lineage::seed(id),
            kind: kind.into(),
            props: Default::default(),
            children: Vec::new(),
        }
    }

    /// A node whose identity continues an existing lineage. The node's
    /// id is the lineage's newest entry.
    pub fn with_lineage(kind: impl Into<String>, lineage: Lineage) -> Self {
        Self {
            id: lineage.newest(),
            lineage,
            kind: kind.into(),
            props: Default::default(),
            children: Vec::new(),
        }
    }

    /// Assemble a node from parts. Fails if the property table uses the
    /// reserved child-list name.
    pub fn assemble(
        kind: impl Into<String>,
        lineage: Lineage,
        props: std::collections::BTreeMap<String, PropertySlot>,
        children: Vec<Node>,
    ) -> Result<Self, TypeError> {
        if props.contains_key(CHILDREN_PROPERTY) {
            return Err(TypeError::ReservedProperty(CHILDREN_PROPERTY.into()));
        }
        Ok(Self {
            id: lineage.newest(),
            lineage,
            kind: kind.into(),
            props,
            children,
        })
    }

    /// The synthetic empty node used as an implicit "both sides are
    /// pure additions" ancestor when no common lineage exists.
    pub fn synthetic() -> Self {
        Self::new("")
    }

    pub fn is_synthetic(&self) -> bool {
        self.kind.is_empty()
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn lineage(&self) -> &Lineage {
        &self.lineage
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn props(&self) -> &std::collections::BTreeMap<String, PropertySlot> {
        &self.props
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    pub fn children_mut(&mut self) -> &mut Vec<Node> {
        &mut self.children
    }

    /// The node's `name` property, when it has a textual one.
    pub fn name(&self) -> Option<&str> {
        self.get("name").and_then(|v| v.as_text())
    }

    /// Set an ordinary property. Rejects the reserved child-list name.
    pub fn set(
        &mut self,
        name: impl Into<String>,
        value: impl Into<PropertyValue>,
    ) -> Result<(), TypeError> {
        self.insert_slot(name.into(), PropertySlot::plain(value))
    }

    /// Set a derived (computed) property.
    pub fn set_derived(
        &mut self,
        name: impl Into<String>,
        value: impl Into<PropertyValue>,
    ) -> Result<(), TypeError> {
        self.insert_slot(name.into(), PropertySlot::derived(value))
    }

    /// Set a styling-cascade property.
    pub fn set_style(
        &mut self,
        name: impl Into<String>,
        value: impl Into<PropertyValue>,
    ) -> Result<(), TypeError> {
        self.insert_slot(name.into(), PropertySlot::style(value))
    }

    fn insert_slot(&mut self, name: String, slot: PropertySlot) -> Result<(), TypeError> {
        if name == CHILDREN_PROPERTY {
            return Err(TypeError::ReservedProperty(name));
        }
        self.props.insert(name, slot);
        Ok(())
    }

    /// Insert a slot only if the node does not already define the name.
    /// Returns `true` if the slot was inserted. Used by the documented
    /// in-place merge reducers.
    pub fn insert_missing(&mut self, name: &str, slot: PropertySlot) -> bool {
        if name == CHILDREN_PROPERTY || self.props.contains_key(name) {
            return false;
        }
        self.props.insert(name.to_string(), slot);
        true
    }

    pub fn get(&self, name: &str) -> Option<&PropertyValue> {
        self.props.get(name).map(|slot| &slot.value)
    }

    pub fn slot(&self, name: &str) -> Option<&PropertySlot> {
        self.props.get(name)
    }

    pub fn push_child(&mut self, child: Node) {
        self.children.push(child);
    }

    /// Replace the whole child list. Used by the documented in-place
    /// merge reducers.
    pub fn replace_children(&mut self, children: Vec<Node>) {
        self.children = children;
    }

    /// Derive a copy of this subtree: every node gets a fresh id
    /// appended to its lineage, properties and structure are cloned.
    pub fn derive_copy(&self) -> Self {
        let id = NodeId::generate();
        Self {
            id,
            lineage: self.lineage.derive(id),
            kind: self.kind.clone(),
            props: self.props.clone(),
            children: self.children.iter().map(Node::derive_copy).collect(),
        }
    }

    /// Find this node or any descendant by id.
    pub fn find_descendant(&self, id: &NodeId) -> Option<&Node> {
        if self.id == *id {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find_descendant(id))
    }

    /// Whether this subtree contains a node with the given id.
    pub fn contains_id(&self, id: &NodeId) -> bool {
        self.find_descendant(id).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn own_id_is_newest_lineage_entry() {
        let node = Node::new("panel");
        assert_eq!(node.id(), node.lineage().newest());
        assert_eq!(node.lineage().len(), 1);
    }

    #[test]
    fn derive_copy_extends_lineage() {
        let original = Node::new("panel");
        let copy = original.derive_copy();

        assert_ne!(copy.id(), original.id());
        assert!(copy.lineage().contains(&original.id()));
        assert_eq!(copy.id(), copy.lineage().newest());
        assert_eq!(copy.lineage().origin(), original.id());
    }

    #[test]
    fn derive_copy_recurses_into_children() {
        let mut root = Node::new("panel");
        root.push_child(Node::new("label"));
        let copy = root.derive_copy();

        let child = &root.children()[0];
        let child_copy = &copy.children()[0];
        assert_ne!(child_copy.id(), child.id());
        assert_eq!(child_copy.lineage().origin(), child.id());
    }

    #[test]
    fn reserved_child_list_name_is_rejected() {
        let mut node = Node::new("panel");
        assert_eq!(
            node.set(CHILDREN_PROPERTY, 1.0),
            Err(TypeError::ReservedProperty(CHILDREN_PROPERTY.into()))
        );
        assert!(!node.insert_missing(CHILDREN_PROPERTY, PropertySlot::plain(1.0)));
    }

    #[test]
    fn insert_missing_leaves_existing_values_alone() {
        let mut node = Node::new("panel");
        node.set("width", 100.0).unwrap();

        assert!(!node.insert_missing("width", PropertySlot::plain(50.0)));
        assert!(node.insert_missing("height", PropertySlot::plain(80.0)));
        assert_eq!(node.get("width"), Some(&PropertyValue::Number(100.0)));
        assert_eq!(node.get("height"), Some(&PropertyValue::Number(80.0)));
    }

    #[test]
    fn find_descendant_includes_self_and_grandchildren() {
        let mut leaf = Node::new("label");
        leaf.set("name", "deep").unwrap();
        let leaf_id = leaf.id();

        let mut mid = Node::new("row");
        mid.push_child(leaf);
        let mut root = Node::new("panel");
        root.push_child(mid);

        assert!(root.contains_id(&root.id()));
        assert_eq!(
            root.find_descendant(&leaf_id).and_then(Node::name),
            Some("deep")
        );
        assert!(!root.contains_id(&NodeId::generate()));
    }

    #[test]
    fn serde_round_trip_preserves_identity() {
        let mut node = Node::new("panel");
        node.set("width", 100.0).unwrap();
        node.push_child(Node::new("label"));

        let json = serde_json::to_string(&node).unwrap();
        let back: Node = serde_json::from_str(&json).unwrap();
        assert_eq!(node, back);
        assert_eq!(back.id(), back.lineage().newest());
    }

    #[test]
    fn synthetic_node_is_empty() {
        let node = Node::synthetic();
        assert!(node.is_synthetic());
        assert!(node.props().is_empty());
        assert!(node.children().is_empty());
    }
}
