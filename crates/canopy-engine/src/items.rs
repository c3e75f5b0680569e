//! Item-to-node attachments and subtree aggregation.
//!
//! Aggregation prunes the request first and only then scans subtrees, so
//! each node is visited at most once per request. Pruning afterwards would
//! count items under a shared ancestor once per redundant request node.

use std::collections::HashMap;

use canopy_forest::{ForestResult, NodeId, SubtreeIndex};
use tracing::{debug, instrument};

use crate::error::{EngineError, EngineResult};
use crate::ItemId;

/// An item row: its id and the node it belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ItemAttachment {
    /// Item id, unique within one load.
    pub id: ItemId,
    /// Owning node.
    pub node_id: NodeId,
}

impl ItemAttachment {
    /// Creates an attachment.
    pub fn new(id: ItemId, node_id: NodeId) -> Self {
        Self { id, node_id }
    }
}

impl From<(ItemId, NodeId)> for ItemAttachment {
    fn from((id, node_id): (ItemId, NodeId)) -> Self {
        Self { id, node_id }
    }
}

/// Items grouped by owning node, queried through a [`SubtreeIndex`].
#[derive(Debug, Clone)]
pub struct ItemAggregator {
    subtree: SubtreeIndex,
    /// Items per node slot, in attachment order.
    by_slot: Vec<Vec<ItemId>>,
    owners: HashMap<ItemId, NodeId>,
}

impl ItemAggregator {
    /// Groups attachments by node.
    ///
    /// Fails on a repeated item id or an attachment to an unknown node.
    #[instrument(level = "debug", skip_all)]
    pub fn build<I>(subtree: SubtreeIndex, items: I) -> EngineResult<Self>
    where
        I: IntoIterator<Item = ItemAttachment>,
    {
        let forest = subtree.forest();
        let mut by_slot: Vec<Vec<ItemId>> = vec![Vec::new(); forest.len()];
        let mut owners: HashMap<ItemId, NodeId> = HashMap::new();

        for item in items {
            let slot = forest
                .slot(item.node_id)
                .ok_or(EngineError::UnknownItemNode {
                    item_id: item.id,
                    node_id: item.node_id,
                })?;
            if owners.insert(item.id, item.node_id).is_some() {
                return Err(EngineError::DuplicateItemId(item.id));
            }
            by_slot[slot as usize].push(item.id);
        }

        debug!(items = owners.len(), "grouped items by node");

        Ok(Self {
            subtree,
            by_slot,
            owners,
        })
    }

    /// Returns the subtree index used for pruning.
    pub fn subtree(&self) -> &SubtreeIndex {
        &self.subtree
    }

    /// Returns the number of items.
    pub fn item_count(&self) -> usize {
        self.owners.len()
    }

    /// Returns the node an item is attached to.
    pub fn node_of(&self, item: ItemId) -> Option<NodeId> {
        self.owners.get(&item).copied()
    }

    /// Returns the items attached directly to `node`, in attachment order.
    pub fn items_at(&self, node: NodeId) -> ForestResult<&[ItemId]> {
        let slot = self.subtree.forest().resolve(&[node])?[0];
        Ok(&self.by_slot[slot as usize])
    }

    /// Returns every item attached to the given nodes or their descendants,
    /// sorted ascending.
    pub fn items_under(&self, nodes: &[NodeId]) -> ForestResult<Vec<ItemId>> {
        let kept = self.subtree.prune_slots(nodes)?;
        Ok(self.collect(&kept, false))
    }

    /// Gathers the items of already-pruned subtrees, sorted ascending.
    ///
    /// `kept` must hold pairwise unrelated slots, as returned by
    /// [`SubtreeIndex::prune_slots`]; subtrees of a forest are then
    /// disjoint, so no item appears twice. Out-of-range slots contribute
    /// nothing.
    pub(crate) fn collect(&self, kept: &[u32], parallel: bool) -> Vec<ItemId> {
        let mut items = if parallel {
            self.collect_parallel(kept)
        } else {
            kept.iter()
                .flat_map(|&slot| self.subtree_items(slot))
                .collect::<Vec<_>>()
        };
        items.sort_unstable();
        items
    }

    fn subtree_items(&self, slot: u32) -> impl Iterator<Item = ItemId> + '_ {
        self.subtree
            .forest()
            .preorder_range(slot)
            .unwrap_or_default()
            .iter()
            .flat_map(|&s| self.by_slot[s as usize].iter().copied())
    }

    #[cfg(feature = "parallel")]
    fn collect_parallel(&self, kept: &[u32]) -> Vec<ItemId> {
        use rayon::prelude::*;

        kept.par_iter()
            .flat_map_iter(|&slot| self.subtree_items(slot))
            .collect()
    }

    #[cfg(not(feature = "parallel"))]
    fn collect_parallel(&self, kept: &[u32]) -> Vec<ItemId> {
        kept.iter()
            .flat_map(|&slot| self.subtree_items(slot))
            .collect()
    }
}
