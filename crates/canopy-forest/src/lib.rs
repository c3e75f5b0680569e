//! # canopy-forest
//!
//! Validated forests of `(id, parent_id)` records with precomputed indexes
//! for ancestry and subtree queries.
//!
//! This crate provides:
//! - **Forest Builder**: validate a flat edge list (duplicates, dangling
//!   parents, cycles) and derive children, depths and Euler-tour intervals
//! - **Ancestry Index**: binary-lifting table for O(log n) lowest common
//!   ancestor queries and k-th ancestor jumps
//! - **Subtree Index**: O(1) descendant tests and redundant-node pruning
//!   over entry/exit intervals
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use canopy_forest::{AncestryIndex, Edge, Forest, SubtreeIndex};
//!
//! //      1
//! //    /   \
//! //   2     3
//! //  / \
//! // 4   5
//! let forest = Arc::new(
//!     Forest::from_edges([
//!         Edge::root(1),
//!         Edge::child(2, 1),
//!         Edge::child(3, 1),
//!         Edge::child(4, 2),
//!         Edge::child(5, 2),
//!     ])
//!     .unwrap(),
//! );
//!
//! let ancestry = AncestryIndex::build(Arc::clone(&forest));
//! let lca = ancestry.lca(4, 5).unwrap();
//! assert_eq!(lca.lca_id, Some(2));
//! assert_eq!(lca.depth, Some(2));
//!
//! let subtree = SubtreeIndex::build(forest);
//! assert_eq!(subtree.prune_redundant(&[4, 2, 3]).unwrap(), vec![2, 3]);
//! ```
//!
//! ## Depth convention
//!
//! Roots have depth 1. The depth reported for a common ancestor is the
//! number of nodes shared by the two root-to-node paths.

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod ancestry;
mod error;
mod forest;
mod stats;
mod subtree;

pub use ancestry::{AncestryIndex, CommonAncestor};
pub use error::{ForestError, ForestResult};
pub use forest::{Edge, Forest, ForestBuilder};
pub use stats::ForestStats;
pub use subtree::SubtreeIndex;

/// Externally assigned node identifier.
pub type NodeId = i64;
