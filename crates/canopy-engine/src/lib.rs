//! # canopy-engine
//!
//! Load-once query engine over a forest of nodes with attached items.
//!
//! This crate wraps the [`canopy_forest`] indexes behind a thread-safe
//! facade that answers two questions:
//!
//! - **Common ancestor**: for two nodes, the shared root, the lowest common
//!   ancestor and its depth (roots count as depth 1)
//! - **Items under**: every item attached to a set of nodes or any of their
//!   descendants, with redundant request nodes pruned first
//!
//! ## Quick Start
//!
//! ```rust
//! use canopy_engine::{Edge, HierarchyEngine, ItemAttachment};
//!
//! //        1
//! //      /   \
//! //     2     3 (item 20)
//! //    / \
//! //   4   5 (item 30)
//! let engine = HierarchyEngine::new();
//! let summary = engine
//!     .load(
//!         [
//!             Edge::root(1),
//!             Edge::child(2, 1),
//!             Edge::child(3, 1),
//!             Edge::child(4, 2),
//!             Edge::child(5, 2),
//!         ],
//!         [ItemAttachment::new(20, 3), ItemAttachment::new(30, 5)],
//!     )
//!     .unwrap();
//! assert_eq!(summary.node_count, 5);
//!
//! let lca = engine.common_ancestor(4, 5).unwrap();
//! assert_eq!((lca.root_id, lca.lca_id, lca.depth), (Some(1), Some(2), Some(2)));
//!
//! assert_eq!(engine.items_under(&[2, 5]).unwrap(), vec![30]);
//! ```
//!
//! ## With Configuration
//!
//! ```rust
//! use canopy_engine::{CacheConfig, EngineConfig, HierarchyEngine};
//!
//! let config = EngineConfig::builder()
//!     .with_cache(CacheConfig { max_entries: 10_000 })
//!     .with_max_results(1_000_000)
//!     .build();
//!
//! let engine = HierarchyEngine::with_config(config);
//! assert!(!engine.is_loaded());
//! ```
//!
//! ## Feature Flags
//!
//! - `parallel` - Aggregates pruned subtrees on the rayon thread pool when
//!   [`EngineConfig::parallel`] is set; without the feature that setting
//!   falls back to the sequential scan
//! - `serde` - Derives `Serialize`/`Deserialize` on input rows and results

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod cache;
mod config;
mod engine;
mod error;
mod items;
mod stats;

pub use cache::{CacheKey, ResultCache};
pub use config::{CacheConfig, EngineConfig, EngineConfigBuilder};
pub use engine::{HierarchyEngine, LoadSummary};
pub use error::{EngineError, EngineResult};
pub use items::{ItemAggregator, ItemAttachment};
pub use stats::QueryStats;

// Re-export the forest types that appear in this crate's API
pub use canopy_forest::{CommonAncestor, Edge, ForestError, ForestStats, NodeId};

/// Externally assigned item identifier.
pub type ItemId = i64;
