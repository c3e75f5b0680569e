//! Subtree membership over Euler-tour intervals.
//!
//! Descendant tests are integer-range containment on the entry/exit
//! timestamps recorded by the forest build, so they cost O(1) regardless
//! of depth.

use std::sync::Arc;

use crate::error::ForestResult;
use crate::forest::Forest;
use crate::NodeId;

/// Descendant tests and redundant-node pruning over a [`Forest`].
///
/// Cloning is cheap; the forest is shared.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use canopy_forest::{Edge, Forest, SubtreeIndex};
///
/// let forest = Forest::from_edges([Edge::root(1), Edge::child(2, 1), Edge::root(3)]).unwrap();
/// let subtree = SubtreeIndex::build(Arc::new(forest));
///
/// assert!(subtree.is_descendant_or_self(2, 1).unwrap());
/// assert_eq!(subtree.prune_redundant(&[2, 3, 1]).unwrap(), vec![1, 3]);
/// ```
#[derive(Debug, Clone)]
pub struct SubtreeIndex {
    forest: Arc<Forest>,
}

impl SubtreeIndex {
    /// Wraps a forest; the intervals were computed when it was built.
    pub fn build(forest: Arc<Forest>) -> Self {
        Self { forest }
    }

    /// Returns the forest this index was built from.
    pub fn forest(&self) -> &Arc<Forest> {
        &self.forest
    }

    /// Returns true if `node` lies in the subtree rooted at `ancestor`,
    /// `node == ancestor` included.
    pub fn is_descendant_or_self(&self, node: NodeId, ancestor: NodeId) -> ForestResult<bool> {
        let slots = self.forest.resolve(&[node, ancestor])?;
        Ok(self.contains_slot(slots[1], slots[0]))
    }

    /// Returns true if `node` lies strictly below `ancestor`.
    pub fn is_strict_descendant(&self, node: NodeId, ancestor: NodeId) -> ForestResult<bool> {
        Ok(node != ancestor && self.is_descendant_or_self(node, ancestor)?)
    }

    /// Returns true if `node` is a strict descendant of any member of
    /// `candidates`. The node itself appearing in `candidates` does not count.
    pub fn descendant_of_any(&self, node: NodeId, candidates: &[NodeId]) -> ForestResult<bool> {
        let mut ids = Vec::with_capacity(candidates.len() + 1);
        ids.push(node);
        ids.extend_from_slice(candidates);
        let slots = self.forest.resolve(&ids)?;

        let target = slots[0];
        Ok(slots[1..]
            .iter()
            .any(|&candidate| candidate != target && self.contains_slot(candidate, target)))
    }

    /// Reduces a node set to its root-most members.
    ///
    /// A member is dropped when it is a strict descendant of another
    /// member; repeated ids collapse to one. Output is in preorder.
    /// Every unknown id is reported in a single `UnknownNode` error.
    pub fn prune_redundant(&self, ids: &[NodeId]) -> ForestResult<Vec<NodeId>> {
        Ok(self
            .prune_slots(ids)?
            .into_iter()
            .map(|slot| self.forest.node_id(slot))
            .collect())
    }

    /// Slot-level form of [`prune_redundant`](Self::prune_redundant).
    ///
    /// Sorting by entry puts every ancestor before its descendants, and
    /// kept intervals are pairwise disjoint, so comparing against the last
    /// kept interval is enough.
    pub fn prune_slots(&self, ids: &[NodeId]) -> ForestResult<Vec<u32>> {
        let mut slots = self.forest.resolve(ids)?;
        slots.sort_unstable_by_key(|&slot| self.forest.entry(slot));
        slots.dedup();

        let mut kept: Vec<u32> = Vec::with_capacity(slots.len());
        for slot in slots {
            match kept.last() {
                Some(&last) if self.forest.entry(slot) <= self.forest.exit(last) => {}
                _ => kept.push(slot),
            }
        }
        Ok(kept)
    }

    /// Returns `id` and all of its descendants in preorder.
    pub fn subtree(&self, id: NodeId) -> ForestResult<Vec<NodeId>> {
        let slot = self.forest.resolve(&[id])?[0];
        Ok(self
            .forest
            .subtree_slots(slot)
            .iter()
            .map(|&s| self.forest.node_id(s))
            .collect())
    }

    /// Returns the number of nodes in the subtree rooted at `id`.
    pub fn subtree_size(&self, id: NodeId) -> ForestResult<usize> {
        let slot = self.forest.resolve(&[id])?[0];
        Ok((self.forest.exit(slot) - self.forest.entry(slot)) as usize + 1)
    }

    #[inline]
    fn contains_slot(&self, ancestor: u32, node: u32) -> bool {
        let entry = self.forest.entry(node);
        self.forest.entry(ancestor) <= entry && entry <= self.forest.exit(ancestor)
    }
}
