//! Load-once query facade.

use std::sync::atomic::AtomicU64;
use std::sync::Arc;
use std::time::Instant;

use canopy_forest::{
    AncestryIndex, CommonAncestor, Edge, Forest, ForestBuilder, ForestError, ForestStats, NodeId,
    SubtreeIndex,
};
use parking_lot::{Mutex, RwLock};
use tracing::{debug, instrument, trace};

use crate::cache::{CacheKey, ResultCache};
use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::items::{ItemAggregator, ItemAttachment};
use crate::stats::{QueryCounters, QueryStats};
use crate::ItemId;

/// Counts of what a successful load indexed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LoadSummary {
    /// Number of nodes loaded.
    pub node_count: usize,
    /// Number of trees.
    pub root_count: usize,
    /// Number of items loaded.
    pub item_count: usize,
    /// Depth of the deepest node, roots counting as 1.
    pub max_depth: u32,
    /// Load generation, incremented by every successful load.
    pub generation: u64,
}

/// Every index derived from one load. Immutable once built.
#[derive(Debug)]
struct Snapshot {
    generation: u64,
    ancestry: AncestryIndex,
    items: ItemAggregator,
}

impl Snapshot {
    fn build<N, I>(generation: u64, nodes: N, items: I) -> EngineResult<Self>
    where
        N: IntoIterator<Item = Edge>,
        I: IntoIterator<Item = ItemAttachment>,
    {
        let forest = Arc::new(nodes.into_iter().collect::<ForestBuilder>().build()?);
        let ancestry = AncestryIndex::build(Arc::clone(&forest));
        let items = ItemAggregator::build(SubtreeIndex::build(forest), items)?;
        Ok(Self {
            generation,
            ancestry,
            items,
        })
    }

    fn forest(&self) -> &Forest {
        self.ancestry.forest()
    }

    fn summary(&self) -> LoadSummary {
        let stats = self.forest().stats();
        LoadSummary {
            node_count: stats.node_count,
            root_count: stats.root_count,
            item_count: self.items.item_count(),
            max_depth: stats.max_depth,
            generation: self.generation,
        }
    }
}

/// Query facade over one loaded hierarchy.
///
/// The engine starts empty. [`load`](Self::load) builds every index off to
/// the side and swaps it in only when all validation passed;
/// [`clear`](Self::clear) drops it again. Queries run against an immutable
/// snapshot, so any number of them may run in parallel with each other and
/// with a concurrent load or clear; they observe either the old or the new
/// state, never a partial one.
///
/// # Example
///
/// ```rust
/// use canopy_engine::{HierarchyEngine, ItemAttachment};
/// use canopy_forest::Edge;
///
/// let engine = HierarchyEngine::new();
/// engine
///     .load(
///         [Edge::root(1), Edge::child(2, 1), Edge::child(3, 1)],
///         [ItemAttachment::new(10, 2), ItemAttachment::new(11, 3)],
///     )
///     .unwrap();
///
/// let lca = engine.common_ancestor(2, 3).unwrap();
/// assert_eq!(lca.lca_id, Some(1));
/// assert_eq!(engine.items_under(&[1, 2]).unwrap(), vec![10, 11]);
///
/// engine.clear();
/// assert!(!engine.is_loaded());
/// ```
pub struct HierarchyEngine {
    config: EngineConfig,
    state: RwLock<Option<Arc<Snapshot>>>,
    /// Serialises `load` and `clear`; holds the last issued generation.
    writer: Mutex<u64>,
    cache: Option<ResultCache>,
    counters: QueryCounters,
}

impl HierarchyEngine {
    /// Creates an empty engine with default configuration.
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    /// Creates an empty engine with custom configuration.
    pub fn with_config(config: EngineConfig) -> Self {
        let cache = config.cache.clone().map(ResultCache::new);
        Self {
            config,
            state: RwLock::new(None),
            writer: Mutex::new(0),
            cache,
            counters: QueryCounters::default(),
        }
    }

    /// Returns a reference to the engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Validates and indexes a full node and item list.
    ///
    /// Fails with `AlreadyLoaded` unless the engine is empty. Any structural
    /// error (duplicate ids, dangling references, cycles) aborts the load
    /// and leaves the engine unchanged.
    #[instrument(level = "debug", skip_all)]
    pub fn load<N, I>(&self, nodes: N, items: I) -> EngineResult<LoadSummary>
    where
        N: IntoIterator<Item = Edge>,
        I: IntoIterator<Item = ItemAttachment>,
    {
        let start = Instant::now();
        let mut generation = self.writer.lock();

        if self.state.read().is_some() {
            debug!("load rejected: data already present");
            return Err(EngineError::AlreadyLoaded);
        }

        let snapshot = match Snapshot::build(*generation + 1, nodes, items) {
            Ok(snapshot) => snapshot,
            Err(err) => {
                debug!(error = %err, "load rejected");
                return Err(err);
            }
        };

        *generation += 1;
        let summary = snapshot.summary();
        *self.state.write() = Some(Arc::new(snapshot));

        debug!(
            generation = summary.generation,
            nodes = summary.node_count,
            items = summary.item_count,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "loaded hierarchy"
        );
        Ok(summary)
    }

    /// Discards all loaded data and cached results. Idempotent.
    #[instrument(level = "debug", skip_all)]
    pub fn clear(&self) {
        let _gate = self.writer.lock();
        let previous = self.state.write().take();
        if let Some(cache) = &self.cache {
            cache.clear();
        }
        debug!(had_data = previous.is_some(), "cleared hierarchy");
    }

    /// Returns true if a hierarchy is loaded.
    pub fn is_loaded(&self) -> bool {
        self.state.read().is_some()
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Finds the shared root, lowest common ancestor and its depth.
    ///
    /// Nodes on different trees yield an all-`None` result. Unknown ids
    /// fail with `UnknownNode` listing each unknown argument.
    pub fn common_ancestor(&self, a: NodeId, b: NodeId) -> EngineResult<CommonAncestor> {
        let result = match self.snapshot() {
            Some(snapshot) => snapshot.ancestry.lca(a, b).map_err(EngineError::from),
            None => Err(ForestError::unknown([a, b]).into()),
        };
        self.record(&result, &self.counters.ancestor_queries);
        result
    }

    /// Returns every item attached to the given nodes or their descendants,
    /// sorted ascending.
    ///
    /// Nodes covered by another requested node are pruned before any
    /// subtree is scanned. An empty request yields an empty result.
    pub fn items_under(&self, nodes: &[NodeId]) -> EngineResult<Vec<ItemId>> {
        let result = self.aggregate(nodes);
        self.record(&result, &self.counters.item_queries);
        result
    }

    /// Returns the path from the root down to `node`, both inclusive.
    pub fn ancestor_path(&self, node: NodeId) -> EngineResult<Vec<NodeId>> {
        let snapshot = self.require_snapshot(&[node])?;
        Ok(snapshot.ancestry.ancestor_path(node)?)
    }

    /// Returns the depth of `node`; roots have depth 1.
    pub fn depth(&self, node: NodeId) -> EngineResult<u32> {
        let snapshot = self.require_snapshot(&[node])?;
        Ok(snapshot.ancestry.depth(node)?)
    }

    /// Returns the number of loaded nodes.
    pub fn node_count(&self) -> usize {
        self.snapshot().map_or(0, |s| s.forest().len())
    }

    /// Returns the number of loaded items.
    pub fn item_count(&self) -> usize {
        self.snapshot().map_or(0, |s| s.items.item_count())
    }

    /// Returns build statistics of the loaded forest.
    pub fn forest_stats(&self) -> Option<ForestStats> {
        self.snapshot().map(|s| s.forest().stats().clone())
    }

    /// Returns query statistics.
    pub fn stats(&self) -> QueryStats {
        self.counters.snapshot()
    }

    /// Resets query statistics.
    pub fn reset_stats(&self) {
        self.counters.reset();
    }

    /// Returns the number of cached results.
    pub fn cache_len(&self) -> usize {
        self.cache.as_ref().map_or(0, ResultCache::len)
    }

    fn aggregate(&self, nodes: &[NodeId]) -> EngineResult<Vec<ItemId>> {
        if nodes.is_empty() {
            return Ok(Vec::new());
        }
        let snapshot = self.require_snapshot(nodes)?;
        let kept = snapshot.items.subtree().prune_slots(nodes)?;
        trace!(requested = nodes.len(), kept = kept.len(), "pruned request");

        let Some(cache) = &self.cache else {
            return self.check_limit(snapshot.items.collect(&kept, self.config.parallel));
        };

        let forest = snapshot.forest();
        let key = CacheKey::new(
            snapshot.generation,
            kept.iter().filter_map(|&slot| forest.id_at(slot)).collect(),
        );
        if let Some(cached) = cache.get(&key) {
            QueryCounters::bump(&self.counters.cache_hits);
            return Ok(cached.as_ref().clone());
        }

        QueryCounters::bump(&self.counters.cache_misses);
        let items = self.check_limit(snapshot.items.collect(&kept, self.config.parallel))?;
        cache.put(key, Arc::new(items.clone()));
        Ok(items)
    }

    fn check_limit(&self, items: Vec<ItemId>) -> EngineResult<Vec<ItemId>> {
        match self.config.max_results {
            Some(limit) if items.len() > limit => Err(EngineError::ResultTooLarge {
                count: items.len(),
                limit,
            }),
            _ => Ok(items),
        }
    }

    /// Clones the current snapshot out so the lock is held only briefly.
    fn snapshot(&self) -> Option<Arc<Snapshot>> {
        self.state.read().clone()
    }

    /// An empty engine knows no node at all.
    fn require_snapshot(&self, ids: &[NodeId]) -> EngineResult<Arc<Snapshot>> {
        self.snapshot()
            .ok_or_else(|| ForestError::unknown(ids.iter().copied()).into())
    }

    fn record<T>(&self, result: &EngineResult<T>, counter: &AtomicU64) {
        match result {
            Ok(_) => QueryCounters::bump(counter),
            Err(err) if err.is_unknown_node() => {
                QueryCounters::bump(&self.counters.unknown_node_errors)
            }
            Err(_) => {}
        }
    }
}

impl Default for HierarchyEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for HierarchyEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HierarchyEngine")
            .field("loaded", &self.is_loaded())
            .field("nodes", &self.node_count())
            .field("items", &self.item_count())
            .field("config", &self.config)
            .finish()
    }
}
