use std::sync::RwLock;

use arbor_types::{Node, NodeId};

/// Lookup seam for live nodes.
///
/// "Live" means reachable in the caller's current working set of root
/// trees, as opposed to nodes that only exist inside historical
/// snapshots. Ancestor resolution tries the working set first; only a
/// miss triggers the history-store fallback.
pub trait WorkingSet: Send + Sync {
    /// Find a live node (in any root, at any depth) by id.
    fn lookup(&self, id: &NodeId) -> Option<Node>;
}

/// In-memory working set over a list of live root trees.
pub struct MemoryWorkingSet {
    roots: RwLock<Vec<Node>>,
}

impl MemoryWorkingSet {
    /// An empty working set (every lookup misses).
    pub fn new() -> Self {
        Self {
            roots: RwLock::new(Vec::new()),
        }
    }

    pub fn with_roots(roots: Vec<Node>) -> Self {
        Self {
            roots: RwLock::new(roots),
        }
    }

    /// Add a live root tree.
    pub fn insert(&self, root: Node) {
        self.roots.write().expect("lock poisoned").push(root);
    }

    /// Number of root trees.
    pub fn len(&self) -> usize {
        self.roots.read().expect("lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.read().expect("lock poisoned").is_empty()
    }
}

impl Default for MemoryWorkingSet {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkingSet for MemoryWorkingSet {
    fn lookup(&self, id: &NodeId) -> Option<Node> {
        let roots = self.roots.read().expect("lock poisoned");
        roots.iter().find_map(|r| r.find_descendant(id).cloned())
    }
}

impl std::fmt::Debug for MemoryWorkingSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryWorkingSet")
            .field("root_count", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_finds_nested_nodes() {
        let mut root = Node::new("panel");
        let child = Node::new("label");
        let child_id = child.id();
        root.push_child(child);

        let set = MemoryWorkingSet::with_roots(vec![root.clone()]);
        assert_eq!(set.lookup(&root.id()).map(|n| n.id()), Some(root.id()));
        assert_eq!(set.lookup(&child_id).map(|n| n.id()), Some(child_id));
        assert!(set.lookup(&NodeId::generate()).is_none());
    }

    #[test]
    fn lookup_scans_all_roots() {
        let first = Node::new("panel");
        let second = Node::new("panel");
        let set = MemoryWorkingSet::new();
        set.insert(first);
        set.insert(second.clone());

        assert!(set.lookup(&second.id()).is_some());
        assert_eq!(set.len(), 2);
    }
}
