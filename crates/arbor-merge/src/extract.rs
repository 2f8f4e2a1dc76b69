//! Property extraction: project a node into the flat mapping of
//! mergeable properties.
//!
//! Derived (computed) properties and styling-cascade properties are
//! excluded; the child list is never a property at all (children are
//! merged structurally by the tree merger). Extraction is deterministic
//! and side-effect free: the same node always yields the same mapping.

use arbor_types::{Node, PropertyMap, PropertyValue};

use crate::error::{MergeError, MergeResult};

/// Extract the mergeable property mapping of a node.
pub fn extract(node: &Node) -> PropertyMap {
    node.props()
        .iter()
        .filter(|(_, slot)| slot.is_mergeable())
        .map(|(name, slot)| (name.clone(), slot.value.clone()))
        .collect()
}

/// Interpret a property value as a node-shaped mapping.
///
/// Nested map values stand in for nodes in recursive merges; anything
/// else lacks the required capability set and fails with
/// [`MergeError::NotANode`].
pub fn extract_value(value: &PropertyValue) -> MergeResult<PropertyMap> {
    match value {
        PropertyValue::Map(map) => Ok(map.clone()),
        other => Err(MergeError::NotANode(other.kind_name())),
    }
}
