//! Query statistics for the hierarchy engine.

use std::sync::atomic::{AtomicU64, Ordering};

/// Statistics about engine usage since construction or the last reset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryStats {
    /// Number of `common_ancestor` calls answered.
    pub ancestor_queries: u64,
    /// Number of `items_under` calls answered.
    pub item_queries: u64,
    /// Number of queries rejected for unknown node ids.
    pub unknown_node_errors: u64,
    /// Number of `items_under` results served from the cache.
    pub cache_hits: u64,
    /// Number of `items_under` results computed with caching enabled.
    pub cache_misses: u64,
}

impl QueryStats {
    /// Returns the cache hit rate as a percentage.
    pub fn cache_hit_rate(&self) -> f64 {
        let total = self.cache_hits + self.cache_misses;
        if total == 0 {
            0.0
        } else {
            (self.cache_hits as f64 / total as f64) * 100.0
        }
    }
}

impl std::fmt::Display for QueryStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Query Statistics:")?;
        writeln!(f, "  Ancestor queries: {}", self.ancestor_queries)?;
        writeln!(f, "  Item queries:     {}", self.item_queries)?;
        writeln!(f, "  Unknown node:     {}", self.unknown_node_errors)?;
        writeln!(f, "  Cache hits:       {}", self.cache_hits)?;
        writeln!(f, "  Cache misses:     {}", self.cache_misses)?;
        writeln!(f, "  Hit rate:         {:.1}%", self.cache_hit_rate())?;
        Ok(())
    }
}

/// Atomic counters behind [`QueryStats`].
#[derive(Debug, Default)]
pub(crate) struct QueryCounters {
    pub(crate) ancestor_queries: AtomicU64,
    pub(crate) item_queries: AtomicU64,
    pub(crate) unknown_node_errors: AtomicU64,
    pub(crate) cache_hits: AtomicU64,
    pub(crate) cache_misses: AtomicU64,
}

impl QueryCounters {
    pub(crate) fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> QueryStats {
        QueryStats {
            ancestor_queries: self.ancestor_queries.load(Ordering::Relaxed),
            item_queries: self.item_queries.load(Ordering::Relaxed),
            unknown_node_errors: self.unknown_node_errors.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
        }
    }

    pub(crate) fn reset(&self) {
        for counter in [
            &self.ancestor_queries,
            &self.item_queries,
            &self.unknown_node_errors,
            &self.cache_hits,
            &self.cache_misses,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}
