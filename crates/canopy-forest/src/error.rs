//! Error types for forest construction and queries.

use std::collections::HashSet;

use thiserror::Error;

use crate::NodeId;

/// Errors raised while building a forest or querying its indexes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ForestError {
    /// The same node id was supplied more than once.
    #[error("duplicate node id: {0}")]
    DuplicateId(NodeId),

    /// A node names a parent that is not part of the edge list.
    #[error("node {id} references missing parent {parent_id}")]
    DanglingParent {
        /// The node carrying the bad reference.
        id: NodeId,
        /// The parent id that matched no node.
        parent_id: NodeId,
    },

    /// Following parent links from a node returned to that chain.
    #[error("cycle detected through node {0}")]
    CycleDetected(NodeId),

    /// The edge list holds more nodes than dense `u32` slots can address.
    #[error("too many nodes: {count} exceeds the slot limit {}", u32::MAX)]
    TooManyNodes {
        /// Number of edges supplied.
        count: usize,
    },

    /// One or more queried ids are not part of the forest.
    #[error("unknown node ids: {}", join_ids(.ids))]
    UnknownNode {
        /// Every unknown id in the request, first-seen order.
        ids: Vec<NodeId>,
    },
}

impl ForestError {
    /// Creates an `UnknownNode` error, dropping repeated ids.
    pub fn unknown<I: IntoIterator<Item = NodeId>>(ids: I) -> Self {
        let mut seen: HashSet<NodeId> = HashSet::new();
        let unique = ids.into_iter().filter(|id| seen.insert(*id)).collect();
        Self::UnknownNode { ids: unique }
    }

    /// Returns the offending ids of an `UnknownNode` error, or an empty slice.
    pub fn unknown_ids(&self) -> &[NodeId] {
        match self {
            Self::UnknownNode { ids } => ids,
            _ => &[],
        }
    }
}

fn join_ids(ids: &[NodeId]) -> String {
    ids.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Result type for forest operations.
pub type ForestResult<T> = std::result::Result<T, ForestError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_duplicate() {
        let err = ForestError::DuplicateId(7);
        assert_eq!(err.to_string(), "duplicate node id: 7");
    }

    #[test]
    fn test_error_display_dangling_parent() {
        let err = ForestError::DanglingParent {
            id: 4,
            parent_id: 99,
        };
        assert_eq!(err.to_string(), "node 4 references missing parent 99");
    }

    #[test]
    fn test_error_display_unknown_lists_all_ids() {
        let err = ForestError::unknown([12, 40, 12]);
        assert_eq!(err.to_string(), "unknown node ids: 12, 40");
        assert_eq!(err.unknown_ids(), &[12, 40]);
    }

    #[test]
    fn test_unknown_dedups_large_requests_in_order() {
        let ids = (0..200_000).chain((0..200_000).rev());
        let err = ForestError::unknown(ids);
        assert_eq!(err.unknown_ids().len(), 200_000);
        assert_eq!(err.unknown_ids()[..3], [0, 1, 2]);
        assert_eq!(err.unknown_ids().last(), Some(&199_999));
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn test_error_display_too_many_nodes() {
        let err = ForestError::TooManyNodes { count: 5_000_000_000 };
        assert_eq!(
            err.to_string(),
            "too many nodes: 5000000000 exceeds the slot limit 4294967295"
        );
    }

    #[test]
    fn test_unknown_ids_empty_for_other_variants() {
        assert!(ForestError::CycleDetected(1).unknown_ids().is_empty());
    }
}
