//! The frame registry.
//!
//! Insertion-ordered table of every discovered node, owned exclusively by
//! the root orchestrator and rebuilt from empty at the start of each
//! sweep — stale entries from a prior run never survive into a new one.

use frametree_core::{FrameId, FrameNode};

/// Insertion-ordered registry of discovered frame nodes.
///
/// Lookups are linear; real pages have tens of frames, not thousands, and
/// insertion order doubles as the tie-break order of the final result.
#[derive(Debug, Default)]
pub struct FrameRegistry {
    nodes: Vec<FrameNode>,
}

impl FrameRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every node (sweep start).
    pub fn reset(&mut self) {
        self.nodes.clear();
    }

    /// Insert a node. Rejects duplicates: the first registration of an id
    /// wins and `false` is returned for the rest.
    pub fn insert(&mut self, node: FrameNode) -> bool {
        if self.contains(&node.id) {
            return false;
        }
        self.nodes.push(node);
        true
    }

    /// Whether `id` is registered.
    pub fn contains(&self, id: &FrameId) -> bool {
        self.nodes.iter().any(|node| node.id == *id)
    }

    /// Shared access to a node.
    pub fn get(&self, id: &FrameId) -> Option<&FrameNode> {
        self.nodes.iter().find(|node| node.id == *id)
    }

    /// Mutable access to a node.
    pub fn get_mut(&mut self, id: &FrameId) -> Option<&mut FrameNode> {
        self.nodes.iter_mut().find(|node| node.id == *id)
    }

    /// Mark a node's subtree discovery complete. Returns `false` for
    /// unknown ids.
    pub fn mark_processed(&mut self, id: &FrameId) -> bool {
        match self.get_mut(id) {
            Some(node) => {
                node.processed = true;
                true
            }
            None => false,
        }
    }

    /// Discovery quiescence predicate: every non-root node processed.
    ///
    /// The root is exempt on purpose — it never receives a merge for its
    /// own id, it only reports its children. This replaces the historical
    /// "0 or 1 unprocessed nodes remain" threshold with the condition that
    /// threshold was approximating.
    pub fn all_non_root_processed(&self) -> bool {
        self.nodes
            .iter()
            .filter(|node| !node.id.is_root())
            .all(|node| node.processed)
    }

    /// Number of non-root nodes still awaiting their subtree report.
    pub fn unprocessed_count(&self) -> usize {
        self.nodes
            .iter()
            .filter(|node| !node.id.is_root() && !node.processed)
            .count()
    }

    /// Ids of every registered node, in insertion order.
    pub fn ids(&self) -> Vec<FrameId> {
        self.nodes.iter().map(|node| node.id.clone()).collect()
    }

    /// Number of registered nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterate nodes in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &FrameNode> {
        self.nodes.iter()
    }

    /// Drain the registry into the final result order: deepest nodes
    /// first so consumers can splice child content into parents, stable
    /// so equal depths keep insertion order.
    pub fn take_sorted(&mut self) -> Vec<FrameNode> {
        let mut nodes = std::mem::take(&mut self.nodes);
        nodes.sort_by(|a, b| b.depth().cmp(&a.depth()));
        nodes
    }
}
