//! Binary-lifting ancestor table for lowest common ancestor queries.
//!
//! `up[k][v]` holds the 2^k-th ancestor of slot `v`. Jumps that would pass
//! a root saturate at that root, so two slots of the same tree always
//! agree once both have been lifted far enough.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use canopy_forest::{AncestryIndex, Edge, Forest};
//!
//! let forest = Arc::new(
//!     Forest::from_edges([Edge::root(1), Edge::child(2, 1), Edge::child(3, 1)]).unwrap(),
//! );
//! let ancestry = AncestryIndex::build(forest);
//!
//! let lca = ancestry.lca(2, 3).unwrap();
//! assert_eq!((lca.root_id, lca.lca_id, lca.depth), (Some(1), Some(1), Some(1)));
//! assert_eq!(ancestry.ancestor_path(3).unwrap(), vec![1, 3]);
//! ```

use std::sync::Arc;

use tracing::{debug, instrument};

use crate::error::ForestResult;
use crate::forest::Forest;
use crate::NodeId;

/// Result of a common ancestor query.
///
/// All fields are `None` when the two nodes belong to different trees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CommonAncestor {
    /// Root of the shared tree.
    pub root_id: Option<NodeId>,
    /// Lowest common ancestor.
    pub lca_id: Option<NodeId>,
    /// Depth of the lowest common ancestor, roots counting as 1.
    pub depth: Option<u32>,
}

impl CommonAncestor {
    /// Creates a result for two nodes sharing a tree.
    pub fn new(root_id: NodeId, lca_id: NodeId, depth: u32) -> Self {
        Self {
            root_id: Some(root_id),
            lca_id: Some(lca_id),
            depth: Some(depth),
        }
    }

    /// Creates the result for two nodes on unrelated trees.
    pub fn disjoint() -> Self {
        Self::default()
    }

    /// Returns true if the nodes were on different trees.
    pub fn is_disjoint(&self) -> bool {
        self.lca_id.is_none()
    }
}

/// Ancestry queries over a [`Forest`].
#[derive(Debug, Clone)]
pub struct AncestryIndex {
    forest: Arc<Forest>,
    /// `up[k][slot]` = 2^k-th ancestor, saturating at the root.
    up: Vec<Vec<u32>>,
}

impl AncestryIndex {
    /// Builds the ancestor table in O(n log d), d being the maximum depth.
    #[instrument(level = "debug", skip_all, fields(nodes = forest.len()))]
    pub fn build(forest: Arc<Forest>) -> Self {
        let node_count = forest.len() as u32;
        let max_depth = forest.stats().max_depth;
        // Longest jump ever needed is max_depth - 1.
        let levels = ((u32::BITS - max_depth.leading_zeros()) as usize).max(1);

        let mut up: Vec<Vec<u32>> = Vec::with_capacity(levels);
        up.push(
            (0..node_count)
                .map(|slot| forest.parent_slot(slot).unwrap_or(slot))
                .collect(),
        );
        for k in 1..levels {
            let prev = &up[k - 1];
            let next: Vec<u32> = prev.iter().map(|&mid| prev[mid as usize]).collect();
            up.push(next);
        }

        debug!(levels, "built ancestor table");

        Self { forest, up }
    }

    /// Returns the forest this index was built from.
    pub fn forest(&self) -> &Arc<Forest> {
        &self.forest
    }

    /// Returns the number of levels in the ancestor table.
    pub fn levels(&self) -> usize {
        self.up.len()
    }

    /// Returns the depth of a node; roots have depth 1.
    pub fn depth(&self, id: NodeId) -> ForestResult<u32> {
        self.forest.depth(id)
    }

    /// Returns the path from the root down to `id`, both inclusive.
    pub fn ancestor_path(&self, id: NodeId) -> ForestResult<Vec<NodeId>> {
        let mut path = self.ancestors(id)?;
        path.reverse();
        path.push(id);
        Ok(path)
    }

    /// Returns the strict ancestors of `id`, nearest first.
    pub fn ancestors(&self, id: NodeId) -> ForestResult<Vec<NodeId>> {
        let slot = self.resolve_one(id)?;
        let mut result = Vec::with_capacity(self.forest.depth_at(slot) as usize - 1);
        let mut current = self.forest.parent_slot(slot);
        while let Some(parent) = current {
            result.push(self.forest.node_id(parent));
            current = self.forest.parent_slot(parent);
        }
        Ok(result)
    }

    /// Returns the `k`-th ancestor of `id` (`k = 0` is the node itself).
    ///
    /// Returns `None` when `k` reaches above the root.
    pub fn kth_ancestor(&self, id: NodeId, k: u32) -> ForestResult<Option<NodeId>> {
        let slot = self.resolve_one(id)?;
        if k >= self.forest.depth_at(slot) {
            return Ok(None);
        }
        Ok(Some(self.forest.node_id(self.lift(slot, k))))
    }

    /// Finds the lowest common ancestor of `a` and `b`.
    ///
    /// Nodes on different trees yield [`CommonAncestor::disjoint`]. Unknown
    /// ids fail with `UnknownNode` listing both arguments if both are
    /// unknown.
    pub fn lca(&self, a: NodeId, b: NodeId) -> ForestResult<CommonAncestor> {
        let slots = self.forest.resolve(&[a, b])?;
        let (mut x, mut y) = (slots[0], slots[1]);

        let root = self.forest.root_slot(x);
        if root != self.forest.root_slot(y) {
            return Ok(CommonAncestor::disjoint());
        }

        let (dx, dy) = (self.forest.depth_at(x), self.forest.depth_at(y));
        if dx > dy {
            x = self.lift(x, dx - dy);
        } else if dy > dx {
            y = self.lift(y, dy - dx);
        }

        if x != y {
            for level in self.up.iter().rev() {
                let (ux, uy) = (level[x as usize], level[y as usize]);
                if ux != uy {
                    x = ux;
                    y = uy;
                }
            }
            x = self.up[0][x as usize];
        }

        Ok(CommonAncestor::new(
            self.forest.node_id(root),
            self.forest.node_id(x),
            self.forest.depth_at(x),
        ))
    }

    /// Jumps `distance` levels up from `slot`.
    #[inline]
    fn lift(&self, mut slot: u32, distance: u32) -> u32 {
        for (k, level) in self.up.iter().enumerate() {
            if distance >> k & 1 == 1 {
                slot = level[slot as usize];
            }
        }
        slot
    }

    fn resolve_one(&self, id: NodeId) -> ForestResult<u32> {
        Ok(self.forest.resolve(&[id])?[0])
    }
}
