//! Forest construction from flat `(id, parent_id)` edge lists.
//!
//! Every node id is registered to a dense `u32` slot so the derived
//! structure lives in flat vectors. A single iterative DFS per tree assigns
//! depths and Euler-tour timestamps: node B lies in the subtree of node A
//! iff `entry[A] <= entry[B] <= exit[A]`, and that subtree occupies the
//! contiguous preorder range `entry[A]..=exit[A]`.

use std::collections::HashMap;
use std::time::Instant;

use tracing::{debug, instrument};

use crate::error::{ForestError, ForestResult};
use crate::stats::ForestStats;
use crate::NodeId;

/// A node row: its id and optional parent id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Edge {
    /// Node id, unique within one edge list.
    pub id: NodeId,
    /// Parent id, `None` for roots.
    #[cfg_attr(feature = "serde", serde(default))]
    pub parent_id: Option<NodeId>,
}

impl Edge {
    /// Creates a root edge.
    pub fn root(id: NodeId) -> Self {
        Self {
            id,
            parent_id: None,
        }
    }

    /// Creates an edge attaching `id` below `parent_id`.
    pub fn child(id: NodeId, parent_id: NodeId) -> Self {
        Self {
            id,
            parent_id: Some(parent_id),
        }
    }
}

impl From<(NodeId, Option<NodeId>)> for Edge {
    fn from((id, parent_id): (NodeId, Option<NodeId>)) -> Self {
        Self { id, parent_id }
    }
}

/// Accumulates edges and validates them into a [`Forest`].
///
/// # Example
///
/// ```rust
/// use canopy_forest::{Edge, ForestBuilder};
///
/// let mut builder = ForestBuilder::new();
/// builder.add(Edge::root(1));
/// builder.add(Edge::child(2, 1));
///
/// let forest = builder.build().unwrap();
/// assert_eq!(forest.len(), 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ForestBuilder {
    edges: Vec<Edge>,
}

impl ForestBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a builder with pre-allocated capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            edges: Vec::with_capacity(capacity),
        }
    }

    /// Adds one edge.
    pub fn add(&mut self, edge: Edge) -> &mut Self {
        self.edges.push(edge);
        self
    }

    /// Returns the number of edges added so far.
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    /// Returns true if no edges were added.
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Validates the edges and builds the forest.
    ///
    /// Checks run in order: slot capacity, duplicate ids, dangling parents,
    /// cycles. The first failing check is reported and nothing is built.
    #[instrument(level = "debug", skip(self), fields(edges = self.edges.len()))]
    pub fn build(self) -> ForestResult<Forest> {
        let start = Instant::now();
        let edges = self.edges;
        let node_count = edges.len();
        check_slot_capacity(node_count)?;

        let mut slots: HashMap<NodeId, u32> = HashMap::with_capacity(node_count);
        let mut ids: Vec<NodeId> = Vec::with_capacity(node_count);
        for edge in &edges {
            if slots.insert(edge.id, ids.len() as u32).is_some() {
                return Err(ForestError::DuplicateId(edge.id));
            }
            ids.push(edge.id);
        }

        let mut parent: Vec<Option<u32>> = Vec::with_capacity(node_count);
        for edge in &edges {
            let parent_slot = match edge.parent_id {
                None => None,
                Some(parent_id) => match slots.get(&parent_id) {
                    Some(&slot) => Some(slot),
                    None => {
                        return Err(ForestError::DanglingParent {
                            id: edge.id,
                            parent_id,
                        })
                    }
                },
            };
            parent.push(parent_slot);
        }

        detect_cycles(&ids, &parent)?;

        let mut children: Vec<Vec<u32>> = vec![Vec::new(); node_count];
        let mut roots: Vec<u32> = Vec::new();
        for (slot, parent_slot) in parent.iter().enumerate() {
            match parent_slot {
                Some(p) => children[*p as usize].push(slot as u32),
                None => roots.push(slot as u32),
            }
        }

        let tour = EulerTour::walk(&roots, &children);

        let leaf_count = children.iter().filter(|c| c.is_empty()).count();
        let max_depth = tour.depth.iter().copied().max().unwrap_or(0);
        let avg_depth = if node_count > 0 {
            tour.depth.iter().map(|&d| d as f64).sum::<f64>() / node_count as f64
        } else {
            0.0
        };

        let stats = ForestStats {
            node_count,
            root_count: roots.len(),
            leaf_count,
            max_depth,
            avg_depth,
            build_time_ms: start.elapsed().as_millis() as u64,
        };

        debug!(
            nodes = stats.node_count,
            roots = stats.root_count,
            max_depth = stats.max_depth,
            "built forest"
        );

        Ok(Forest {
            slots,
            ids,
            parent,
            children,
            roots,
            root_of: tour.root_of,
            depth: tour.depth,
            entry: tour.entry,
            exit: tour.exit,
            preorder: tour.preorder,
            stats,
        })
    }
}

impl Extend<Edge> for ForestBuilder {
    fn extend<I: IntoIterator<Item = Edge>>(&mut self, iter: I) {
        self.edges.extend(iter);
    }
}

impl FromIterator<Edge> for ForestBuilder {
    fn from_iter<I: IntoIterator<Item = Edge>>(iter: I) -> Self {
        Self {
            edges: iter.into_iter().collect(),
        }
    }
}

/// Slots are `u32`; an edge list too long to number is rejected up front.
fn check_slot_capacity(node_count: usize) -> ForestResult<()> {
    match u32::try_from(node_count) {
        Ok(_) => Ok(()),
        Err(_) => Err(ForestError::TooManyNodes { count: node_count }),
    }
}

/// Rejects parent chains that loop back on themselves.
///
/// Each chain walk marks its nodes as on-chain; reaching an on-chain node
/// is a cycle, reaching a finished node ends the walk. Every node is
/// pushed onto a chain at most once across all walks.
fn detect_cycles(ids: &[NodeId], parent: &[Option<u32>]) -> ForestResult<()> {
    #[derive(Clone, Copy, PartialEq, Eq)]
    enum Mark {
        Unvisited,
        OnChain,
        Done,
    }

    let mut marks = vec![Mark::Unvisited; parent.len()];
    let mut chain: Vec<u32> = Vec::new();

    for start in 0..parent.len() {
        if marks[start] != Mark::Unvisited {
            continue;
        }

        let mut current = Some(start as u32);
        while let Some(slot) = current {
            match marks[slot as usize] {
                Mark::Done => break,
                Mark::OnChain => return Err(ForestError::CycleDetected(ids[slot as usize])),
                Mark::Unvisited => {
                    marks[slot as usize] = Mark::OnChain;
                    chain.push(slot);
                    current = parent[slot as usize];
                }
            }
        }

        for slot in chain.drain(..) {
            marks[slot as usize] = Mark::Done;
        }
    }

    Ok(())
}

/// Per-slot output of the depth-first walk.
struct EulerTour {
    root_of: Vec<u32>,
    depth: Vec<u32>,
    entry: Vec<u32>,
    exit: Vec<u32>,
    preorder: Vec<u32>,
}

impl EulerTour {
    fn walk(roots: &[u32], children: &[Vec<u32>]) -> Self {
        let node_count = children.len();
        let mut tour = Self {
            root_of: vec![0; node_count],
            depth: vec![0; node_count],
            entry: vec![0; node_count],
            exit: vec![0; node_count],
            preorder: Vec::with_capacity(node_count),
        };

        // (slot, index of the next child to visit)
        let mut stack: Vec<(u32, usize)> = Vec::new();

        for &root in roots {
            tour.visit(root, root, 1);
            stack.push((root, 0));

            while let Some(top) = stack.len().checked_sub(1) {
                let (slot, next) = stack[top];
                match children[slot as usize].get(next) {
                    Some(&child) => {
                        stack[top].1 += 1;
                        let depth = tour.depth[slot as usize] + 1;
                        tour.visit(child, root, depth);
                        stack.push((child, 0));
                    }
                    None => {
                        tour.exit[slot as usize] = tour.preorder.len() as u32 - 1;
                        stack.pop();
                    }
                }
            }
        }

        tour
    }

    fn visit(&mut self, slot: u32, root: u32, depth: u32) {
        let s = slot as usize;
        self.root_of[s] = root;
        self.depth[s] = depth;
        self.entry[s] = self.preorder.len() as u32;
        self.preorder.push(slot);
    }
}

/// An immutable, validated forest.
///
/// Built by [`ForestBuilder`] or [`Forest::from_edges`]. Public accessors
/// take external ids; `slot`, `resolve`, `id_at` and `preorder_range`
/// expose the dense slot view the indexes are built on.
#[derive(Debug, Clone)]
pub struct Forest {
    /// External id -> dense slot.
    slots: HashMap<NodeId, u32>,
    /// Dense slot -> external id.
    ids: Vec<NodeId>,
    parent: Vec<Option<u32>>,
    /// Children in edge-list order.
    children: Vec<Vec<u32>>,
    /// Roots in edge-list order.
    roots: Vec<u32>,
    root_of: Vec<u32>,
    /// Roots have depth 1.
    depth: Vec<u32>,
    entry: Vec<u32>,
    /// Largest entry timestamp inside the subtree.
    exit: Vec<u32>,
    preorder: Vec<u32>,
    stats: ForestStats,
}

impl Forest {
    /// Validates and builds a forest from an edge list.
    pub fn from_edges<I: IntoIterator<Item = Edge>>(edges: I) -> ForestResult<Self> {
        edges.into_iter().collect::<ForestBuilder>().build()
    }

    /// Returns an empty forest.
    pub fn empty() -> Self {
        Self {
            slots: HashMap::new(),
            ids: Vec::new(),
            parent: Vec::new(),
            children: Vec::new(),
            roots: Vec::new(),
            root_of: Vec::new(),
            depth: Vec::new(),
            entry: Vec::new(),
            exit: Vec::new(),
            preorder: Vec::new(),
            stats: ForestStats::default(),
        }
    }

    /// Returns the number of nodes.
    #[inline]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Returns true if the forest has no nodes.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Returns true if the node exists.
    #[inline]
    pub fn contains(&self, id: NodeId) -> bool {
        self.slots.contains_key(&id)
    }

    /// Returns an iterator over all node ids in edge-list order.
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.ids.iter().copied()
    }

    /// Returns the root ids in edge-list order.
    pub fn roots(&self) -> Vec<NodeId> {
        self.roots.iter().map(|&s| self.ids[s as usize]).collect()
    }

    /// Returns the parent of a node, `None` for roots.
    pub fn parent(&self, id: NodeId) -> ForestResult<Option<NodeId>> {
        let slot = self.require(id)?;
        Ok(self.parent[slot as usize].map(|p| self.ids[p as usize]))
    }

    /// Returns the direct children of a node in edge-list order.
    pub fn children(&self, id: NodeId) -> ForestResult<Vec<NodeId>> {
        let slot = self.require(id)?;
        Ok(self.children[slot as usize]
            .iter()
            .map(|&c| self.ids[c as usize])
            .collect())
    }

    /// Returns the root of the tree containing a node.
    pub fn root_of(&self, id: NodeId) -> ForestResult<NodeId> {
        let slot = self.require(id)?;
        Ok(self.node_id(self.root_slot(slot)))
    }

    /// Returns the depth of a node; roots have depth 1.
    pub fn depth(&self, id: NodeId) -> ForestResult<u32> {
        let slot = self.require(id)?;
        Ok(self.depth_at(slot))
    }

    /// Returns build statistics.
    pub fn stats(&self) -> &ForestStats {
        &self.stats
    }

    // =========================================================================
    // Slot-level view
    // =========================================================================

    /// Returns the dense slot of a node id.
    #[inline]
    pub fn slot(&self, id: NodeId) -> Option<u32> {
        self.slots.get(&id).copied()
    }

    /// Resolves ids to slots, reporting every unknown id at once.
    ///
    /// Output slots keep input order, repeated ids included.
    pub fn resolve(&self, ids: &[NodeId]) -> ForestResult<Vec<u32>> {
        let mut resolved = Vec::with_capacity(ids.len());
        let mut unknown = Vec::new();
        for &id in ids {
            match self.slot(id) {
                Some(slot) => resolved.push(slot),
                None => unknown.push(id),
            }
        }
        if unknown.is_empty() {
            Ok(resolved)
        } else {
            Err(ForestError::unknown(unknown))
        }
    }

    /// Returns the external id stored at a slot, `None` if out of range.
    #[inline]
    pub fn id_at(&self, slot: u32) -> Option<NodeId> {
        self.ids.get(slot as usize).copied()
    }

    /// Returns the slot and all of its descendants in preorder, `None` if
    /// out of range.
    pub fn preorder_range(&self, slot: u32) -> Option<&[u32]> {
        let from = *self.entry.get(slot as usize)? as usize;
        let to = *self.exit.get(slot as usize)? as usize;
        self.preorder.get(from..=to)
    }

    // Unchecked accessors; callers pass slots obtained from `slot`/`resolve`.

    #[inline]
    pub(crate) fn node_id(&self, slot: u32) -> NodeId {
        self.ids[slot as usize]
    }

    #[inline]
    pub(crate) fn parent_slot(&self, slot: u32) -> Option<u32> {
        self.parent[slot as usize]
    }

    #[inline]
    pub(crate) fn root_slot(&self, slot: u32) -> u32 {
        self.root_of[slot as usize]
    }

    /// Roots have depth 1.
    #[inline]
    pub(crate) fn depth_at(&self, slot: u32) -> u32 {
        self.depth[slot as usize]
    }

    /// Preorder entry timestamp.
    #[inline]
    pub(crate) fn entry(&self, slot: u32) -> u32 {
        self.entry[slot as usize]
    }

    /// Largest entry timestamp within the subtree.
    #[inline]
    pub(crate) fn exit(&self, slot: u32) -> u32 {
        self.exit[slot as usize]
    }

    #[inline]
    pub(crate) fn subtree_slots(&self, slot: u32) -> &[u32] {
        &self.preorder[self.entry(slot) as usize..=self.exit(slot) as usize]
    }

    fn require(&self, id: NodeId) -> ForestResult<u32> {
        self.slot(id)
            .ok_or_else(|| ForestError::UnknownNode { ids: vec![id] })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Creates the test forest:
    /// ```text
    /// 10            50
    ///  |-- 20        |-- 60
    ///  |    |-- 40
    ///  |-- 30
    /// ```
    fn create_test_forest() -> Forest {
        Forest::from_edges([
            Edge::root(10),
            Edge::child(20, 10),
            Edge::child(30, 10),
            Edge::child(40, 20),
            Edge::root(50),
            Edge::child(60, 50),
        ])
        .unwrap()
    }

    #[test]
    fn test_build_counts() {
        let forest = create_test_forest();
        assert_eq!(forest.len(), 6);
        assert_eq!(forest.roots(), vec![10, 50]);
        assert_eq!(forest.stats().root_count, 2);
        assert_eq!(forest.stats().leaf_count, 3);
        assert_eq!(forest.stats().max_depth, 3);
    }

    #[test]
    fn test_depth_and_root() {
        let forest = create_test_forest();
        assert_eq!(forest.depth(10).unwrap(), 1);
        assert_eq!(forest.depth(20).unwrap(), 2);
        assert_eq!(forest.depth(40).unwrap(), 3);
        assert_eq!(forest.root_of(40).unwrap(), 10);
        assert_eq!(forest.root_of(60).unwrap(), 50);
    }

    #[test]
    fn test_children_keep_input_order() {
        let forest = create_test_forest();
        assert_eq!(forest.children(10).unwrap(), vec![20, 30]);
        assert!(forest.children(40).unwrap().is_empty());
        assert_eq!(forest.parent(40).unwrap(), Some(20));
        assert_eq!(forest.parent(10).unwrap(), None);
    }

    #[test]
    fn test_euler_intervals_nest() {
        let forest = create_test_forest();
        let root = forest.slot(10).unwrap();
        let deep = forest.slot(40).unwrap();
        let other = forest.slot(60).unwrap();

        assert!(forest.entry(root) <= forest.entry(deep));
        assert!(forest.entry(deep) <= forest.exit(root));
        assert!(forest.entry(other) > forest.exit(root));

        let subtree: Vec<NodeId> = forest
            .preorder_range(root)
            .unwrap()
            .iter()
            .filter_map(|&s| forest.id_at(s))
            .collect();
        assert_eq!(subtree, vec![10, 20, 40, 30]);
    }

    #[test]
    fn test_duplicate_id() {
        let err =
            Forest::from_edges([Edge::root(1), Edge::child(2, 1), Edge::root(2)]).unwrap_err();
        assert_eq!(err, ForestError::DuplicateId(2));
    }

    #[test]
    fn test_dangling_parent() {
        let err = Forest::from_edges([Edge::root(1), Edge::child(2, 7)]).unwrap_err();
        assert_eq!(
            err,
            ForestError::DanglingParent {
                id: 2,
                parent_id: 7
            }
        );
    }

    #[test]
    fn test_self_parent_is_cycle() {
        let err = Forest::from_edges([Edge::root(1), Edge::child(2, 2)]).unwrap_err();
        assert_eq!(err, ForestError::CycleDetected(2));
    }

    #[test]
    fn test_long_cycle_detected() {
        let err = Forest::from_edges([
            Edge::root(1),
            Edge::child(2, 4),
            Edge::child(3, 2),
            Edge::child(4, 3),
        ])
        .unwrap_err();
        assert!(matches!(err, ForestError::CycleDetected(id) if [2, 3, 4].contains(&id)));
    }

    #[test]
    fn test_chain_into_cycle_reports_cycle_member() {
        // 5 hangs below a 2-cycle but is not part of it
        let err = Forest::from_edges([
            Edge::child(5, 6),
            Edge::child(6, 7),
            Edge::child(7, 6),
        ])
        .unwrap_err();
        assert!(matches!(err, ForestError::CycleDetected(id) if id == 6 || id == 7));
    }

    #[test]
    fn test_empty_forest() {
        let forest = Forest::from_edges(Vec::new()).unwrap();
        assert!(forest.is_empty());
        assert!(forest.roots().is_empty());
        assert_eq!(forest.stats().max_depth, 0);
        assert!(Forest::empty().is_empty());
    }

    #[test]
    fn test_unknown_node_accessors() {
        let forest = create_test_forest();
        assert_eq!(
            forest.depth(999).unwrap_err(),
            ForestError::UnknownNode { ids: vec![999] }
        );
        assert!(!forest.contains(999));
    }

    #[test]
    fn test_resolve_reports_all_unknown() {
        let forest = create_test_forest();
        let err = forest.resolve(&[10, 7, 20, 8, 7]).unwrap_err();
        assert_eq!(err.unknown_ids(), &[7, 8]);

        let slots = forest.resolve(&[20, 10]).unwrap();
        assert_eq!(forest.id_at(slots[0]), Some(20));
        assert_eq!(forest.id_at(slots[1]), Some(10));
    }

    #[test]
    fn test_out_of_range_slots_are_none() {
        let forest = Forest::from_edges([Edge::root(1)]).unwrap();
        assert_eq!(forest.id_at(0), Some(1));
        assert_eq!(forest.id_at(3), None);
        assert_eq!(forest.preorder_range(0), Some(&[0][..]));
        assert_eq!(forest.preorder_range(5), None);
        assert_eq!(Forest::empty().id_at(0), None);
        assert_eq!(Forest::empty().preorder_range(0), None);
    }

    #[test]
    fn test_slot_capacity() {
        assert!(check_slot_capacity(0).is_ok());
        assert!(check_slot_capacity(u32::MAX as usize).is_ok());
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn test_slot_capacity_overflow_is_rejected() {
        let count = u32::MAX as usize + 1;
        assert_eq!(
            check_slot_capacity(count),
            Err(ForestError::TooManyNodes { count })
        );
    }

    #[test]
    fn test_deep_chain_does_not_recurse() {
        let mut builder = ForestBuilder::with_capacity(100_000);
        builder.add(Edge::root(0));
        for id in 1..100_000 {
            builder.add(Edge::child(id, id - 1));
        }
        let forest = builder.build().unwrap();
        assert_eq!(forest.depth(99_999).unwrap(), 100_000);
        assert_eq!(forest.stats().leaf_count, 1);
    }
}
