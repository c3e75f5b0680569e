//! Result caching for subtree item queries.
//!
//! Entries are keyed by the load generation plus the pruned node list, so
//! two requests that differ only by redundant or repeated nodes share one
//! entry, and nothing computed against an earlier load can be served after
//! a reload.

use std::num::NonZeroUsize;
use std::sync::Arc;

use canopy_forest::NodeId;
use lru::LruCache;
use parking_lot::Mutex;

use crate::config::CacheConfig;
use crate::ItemId;

/// Cache key: load generation and root-most request nodes in preorder.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    generation: u64,
    nodes: Vec<NodeId>,
}

impl CacheKey {
    /// Creates a key for a pruned node list.
    pub fn new(generation: u64, nodes: Vec<NodeId>) -> Self {
        Self { generation, nodes }
    }
}

/// Thread-safe LRU cache of `items_under` results.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use canopy_engine::{CacheConfig, CacheKey, ResultCache};
///
/// let cache = ResultCache::new(CacheConfig::default());
/// cache.put(CacheKey::new(1, vec![2, 3]), Arc::new(vec![10, 11]));
///
/// assert_eq!(cache.get(&CacheKey::new(1, vec![2, 3])).as_deref(), Some(&vec![10, 11]));
/// assert!(cache.get(&CacheKey::new(2, vec![2, 3])).is_none());
/// ```
pub struct ResultCache {
    inner: Mutex<LruCache<CacheKey, Arc<Vec<ItemId>>>>,
}

impl ResultCache {
    /// Creates a cache; a zero capacity is raised to one entry.
    pub fn new(config: CacheConfig) -> Self {
        let capacity = NonZeroUsize::new(config.max_entries).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Gets a cached result, promoting it to most-recently-used.
    pub fn get(&self, key: &CacheKey) -> Option<Arc<Vec<ItemId>>> {
        self.inner.lock().get(key).cloned()
    }

    /// Stores a result, evicting the least recently used entry when full.
    pub fn put(&self, key: CacheKey, items: Arc<Vec<ItemId>>) {
        self.inner.lock().put(key, items);
    }

    /// Returns the number of cached results.
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// Returns true if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the maximum number of entries.
    pub fn capacity(&self) -> usize {
        self.inner.lock().cap().get()
    }

    /// Drops every entry.
    pub fn clear(&self) {
        self.inner.lock().clear();
    }
}

impl std::fmt::Debug for ResultCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultCache")
            .field("entries", &self.len())
            .field("capacity", &self.capacity())
            .finish()
    }
}
