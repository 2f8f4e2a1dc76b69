use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Stable identity of a node, unique within a single tree version.
///
/// Backed by a time-ordered UUID v7. A node keeps its id for its whole
/// life; deriving a copy mints a fresh id and records the old one in the
/// copy's [`Lineage`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(uuid::Uuid);

impl NodeId {
    /// Generate a new time-ordered node id (UUID v7).
    pub fn generate() -> Self {
        Self(uuid::Uuid::now_v7())
    }

    /// Create from an existing UUID.
    pub fn from_uuid(uuid: uuid::Uuid) -> Self {
        Self(uuid)
    }

    /// The underlying UUID.
    pub fn as_uuid(&self) -> &uuid::Uuid {
        &self.0
    }

    /// Short representation (first 8 characters of the UUID).
    pub fn short_id(&self) -> String {
        self.0.to_string()[..8].to_string()
    }

    /// Parse from a hyphenated UUID string.
    pub fn parse(s: &str) -> Result<Self, TypeError> {
        uuid::Uuid::parse_str(s)
            .map(Self)
            .map_err(|e| TypeError::InvalidId(e.to_string()))
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.short_id())
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Ordered derivation history of a node: the identity of every ancestor
/// the node was ever derived from, oldest first, the node's own id last.
///
/// Lineages are append-only. Copying or deriving a node extends its
/// lineage by the new id; nothing ever reorders or truncates one.
/// The first entry (the *origin*) identifies the line a node belongs to
/// and is what child matching keys on.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lineage {
    ids: Vec<NodeId>,
}

impl Lineage {
    /// A fresh lineage containing only the node's own id.
    pub fn seed(id: NodeId) -> Self {
        Self { ids: vec![id] }
    }

    /// Build from an explicit id list. Fails on an empty list.
    pub fn from_ids(ids: Vec<NodeId>) -> Result<Self, TypeError> {
        if ids.is_empty() {
            return Err(TypeError::EmptyLineage);
        }
        Ok(Self { ids })
    }

    /// The oldest ancestor id (first entry).
    pub fn origin(&self) -> NodeId {
        self.ids[0]
    }

    /// The owning node's own id (last entry).
    pub fn newest(&self) -> NodeId {
        self.ids[self.ids.len() - 1]
    }

    /// Extend the lineage for a derived copy: everything so far, plus
    /// the copy's fresh id.
    pub fn derive(&self, id: NodeId) -> Self {
        let mut ids = self.ids.clone();
        ids.push(id);
        Self { ids }
    }

    /// Whether `id` appears anywhere in this lineage.
    pub fn contains(&self, id: &NodeId) -> bool {
        self.ids.contains(id)
    }

    /// Whether two lineages start from the same origin id.
    pub fn shares_origin(&self, other: &Self) -> bool {
        self.origin() == other.origin()
    }

    /// Length of the shared prefix of two lineages.
    pub fn longest_common_prefix(a: &Self, b: &Self) -> usize {
        a.ids
            .iter()
            .zip(b.ids.iter())
            .take_while(|(x, y)| x == y)
            .count()
    }

    /// The id at the last position where the two lineages still agree,
    /// or `None` if they share no prefix at all.
    pub fn last_common_id(a: &Self, b: &Self) -> Option<NodeId> {
        let n = Self::longest_common_prefix(a, b);
        if n == 0 {
            None
        } else {
            Some(a.ids[n - 1])
        }
    }

    /// The full id list, oldest first.
    pub fn ids(&self) -> &[NodeId] {
        &self.ids
    }

    /// Number of ids in the lineage (always at least 1).
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Never true; kept so clippy's `len`-without-`is_empty` lint and
    /// callers iterating generically stay happy.
    pub fn is_empty(&self) -> bool {
        false
    }
}

impl fmt::Debug for Lineage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let short: Vec<String> = self.ids.iter().map(|id| id.short_id()).collect();
        write!(f, "Lineage[{}]", short.join(" -> "))
    }
}
