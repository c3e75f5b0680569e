//! Error types for the query engine.

use canopy_forest::{ForestError, NodeId};
use thiserror::Error;

use crate::ItemId;

/// Errors that can occur while loading or querying the engine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// Structural error in the node list, or an unknown node in a query.
    #[error(transparent)]
    Forest(#[from] ForestError),

    /// The same item id was supplied more than once.
    #[error("duplicate item id: {0}")]
    DuplicateItemId(ItemId),

    /// An item is attached to a node that is not part of the load.
    #[error("item {item_id} references missing node {node_id}")]
    UnknownItemNode {
        /// The item carrying the bad reference.
        item_id: ItemId,
        /// The node id that matched no node.
        node_id: NodeId,
    },

    /// `load` was called while data is present.
    #[error("data already loaded; clear the engine before loading again")]
    AlreadyLoaded,

    /// Result set exceeds the configured limit.
    #[error("result set too large: {count} exceeds limit {limit}")]
    ResultTooLarge {
        /// Number of results found.
        count: usize,
        /// Configured limit.
        limit: usize,
    },
}

impl EngineError {
    /// Returns the offending ids of an unknown-node error, or an empty slice.
    ///
    /// Callers formatting a bad-request response use this to list every
    /// invalid id at once.
    pub fn unknown_ids(&self) -> &[NodeId] {
        match self {
            Self::Forest(err) => err.unknown_ids(),
            _ => &[],
        }
    }

    /// Returns true if the error was caused by the query input rather than
    /// by the loaded data or the engine state.
    pub fn is_unknown_node(&self) -> bool {
        matches!(self, Self::Forest(ForestError::UnknownNode { .. }))
    }
}

/// Result type for engine operations.
pub type EngineResult<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_forest_is_transparent() {
        let err: EngineError = ForestError::CycleDetected(3).into();
        assert_eq!(err.to_string(), "cycle detected through node 3");
    }

    #[test]
    fn test_error_display_unknown_item_node() {
        let err = EngineError::UnknownItemNode {
            item_id: 8,
            node_id: 42,
        };
        assert_eq!(err.to_string(), "item 8 references missing node 42");
    }

    #[test]
    fn test_error_display_result_too_large() {
        let err = EngineError::ResultTooLarge {
            count: 150,
            limit: 100,
        };
        assert_eq!(err.to_string(), "result set too large: 150 exceeds limit 100");
    }

    #[test]
    fn test_unknown_ids() {
        let err: EngineError = ForestError::unknown([5, 9]).into();
        assert!(err.is_unknown_node());
        assert_eq!(err.unknown_ids(), &[5, 9]);
        assert!(EngineError::AlreadyLoaded.unknown_ids().is_empty());
        assert!(!EngineError::AlreadyLoaded.is_unknown_node());
    }
}
