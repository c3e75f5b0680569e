//! Cross-checks of the indexes against naive path walking.

use std::sync::Arc;

use canopy_forest::{
    AncestryIndex, CommonAncestor, Edge, Forest, ForestError, NodeId, SubtreeIndex,
};
use rstest::{fixture, rstest};

/// Two trees, the first one deep and lopsided:
/// ```text
///        1                     20
///      /   \                  /  \
///     2     3               21    22
///    / \     \                      \
///   4   5     6                      23
///      / \     \
///     7   8     9
///    /     \
///   10      11
///            \
///             12
/// ```
fn edges() -> Vec<Edge> {
    vec![
        Edge::root(1),
        Edge::child(2, 1),
        Edge::child(3, 1),
        Edge::child(4, 2),
        Edge::child(5, 2),
        Edge::child(6, 3),
        Edge::child(7, 5),
        Edge::child(8, 5),
        Edge::child(9, 6),
        Edge::child(10, 7),
        Edge::child(11, 8),
        Edge::child(12, 11),
        Edge::root(20),
        Edge::child(21, 20),
        Edge::child(22, 20),
        Edge::child(23, 22),
    ]
}

struct Indexes {
    forest: Arc<Forest>,
    ancestry: AncestryIndex,
    subtree: SubtreeIndex,
}

#[fixture]
fn indexes() -> Indexes {
    let forest = Arc::new(Forest::from_edges(edges()).unwrap());
    Indexes {
        ancestry: AncestryIndex::build(Arc::clone(&forest)),
        subtree: SubtreeIndex::build(Arc::clone(&forest)),
        forest,
    }
}

/// Walks parent pointers, root first.
fn naive_path(forest: &Forest, id: NodeId) -> Vec<NodeId> {
    let mut path = vec![id];
    let mut current = id;
    while let Some(parent) = forest.parent(current).unwrap() {
        path.push(parent);
        current = parent;
    }
    path.reverse();
    path
}

/// Common prefix of the two root paths.
fn naive_common_ancestor(forest: &Forest, a: NodeId, b: NodeId) -> CommonAncestor {
    let (path_a, path_b) = (naive_path(forest, a), naive_path(forest, b));
    let shared: Vec<NodeId> = path_a
        .iter()
        .zip(path_b.iter())
        .take_while(|(x, y)| x == y)
        .map(|(x, _)| *x)
        .collect();
    match shared.last() {
        Some(&lca) => CommonAncestor::new(path_a[0], lca, shared.len() as u32),
        None => CommonAncestor::disjoint(),
    }
}

#[rstest]
fn test_lca_matches_path_prefix_for_every_pair(indexes: Indexes) {
    let ids: Vec<NodeId> = indexes.forest.node_ids().collect();
    for &a in &ids {
        for &b in &ids {
            assert_eq!(
                indexes.ancestry.lca(a, b).unwrap(),
                naive_common_ancestor(&indexes.forest, a, b),
                "lca({a}, {b})"
            );
        }
    }
}

#[rstest]
fn test_self_lca_is_self(indexes: Indexes) {
    for id in indexes.forest.node_ids() {
        let root = indexes.forest.root_of(id).unwrap();
        let depth = indexes.forest.depth(id).unwrap();
        assert_eq!(
            indexes.ancestry.lca(id, id).unwrap(),
            CommonAncestor::new(root, id, depth)
        );
    }
}

#[rstest]
fn test_lca_lies_on_both_paths(indexes: Indexes) {
    let ids: Vec<NodeId> = indexes.forest.node_ids().collect();
    for &a in &ids {
        for &b in &ids {
            let result = indexes.ancestry.lca(a, b).unwrap();
            let Some(lca) = result.lca_id else { continue };
            let path_a = indexes.ancestry.ancestor_path(a).unwrap();
            let path_b = indexes.ancestry.ancestor_path(b).unwrap();
            assert!(path_a.contains(&lca) && path_b.contains(&lca));
            assert!(indexes.subtree.is_descendant_or_self(a, lca).unwrap());
            assert!(indexes.subtree.is_descendant_or_self(b, lca).unwrap());
        }
    }
}

#[rstest]
#[case(10, 12, CommonAncestor::new(1, 5, 3))]
#[case(10, 9, CommonAncestor::new(1, 1, 1))]
#[case(12, 8, CommonAncestor::new(1, 8, 4))]
#[case(21, 23, CommonAncestor::new(20, 20, 1))]
#[case(12, 23, CommonAncestor::disjoint())]
fn test_lca_cases(
    indexes: Indexes,
    #[case] a: NodeId,
    #[case] b: NodeId,
    #[case] expected: CommonAncestor,
) {
    assert_eq!(indexes.ancestry.lca(a, b).unwrap(), expected);
    assert_eq!(indexes.ancestry.lca(b, a).unwrap(), expected);
}

#[rstest]
fn test_descendant_check_matches_paths(indexes: Indexes) {
    let ids: Vec<NodeId> = indexes.forest.node_ids().collect();
    for &node in &ids {
        let path = naive_path(&indexes.forest, node);
        for &ancestor in &ids {
            assert_eq!(
                indexes.subtree.is_descendant_or_self(node, ancestor).unwrap(),
                path.contains(&ancestor),
                "is_descendant_or_self({node}, {ancestor})"
            );
        }
    }
}

#[rstest]
fn test_prune_keeps_only_uncovered_members(indexes: Indexes) {
    let request = [12, 5, 9, 23, 7, 3, 12, 21];
    let pruned = indexes.subtree.prune_redundant(&request).unwrap();

    assert_eq!(pruned, vec![5, 3, 21, 23]);
    for &id in &request {
        let covered = pruned
            .iter()
            .any(|&kept| indexes.subtree.is_descendant_or_self(id, kept).unwrap());
        assert!(covered, "{id} not covered");
    }
    assert_eq!(indexes.subtree.prune_redundant(&pruned).unwrap(), pruned);
}

#[rstest]
fn test_unknown_ids_reported_together(indexes: Indexes) {
    let err = indexes.subtree.prune_redundant(&[1, 77, 2, 88]).unwrap_err();
    assert_eq!(err, ForestError::UnknownNode { ids: vec![77, 88] });
    assert!(err.to_string().contains("77, 88"));
}

#[rstest]
#[case(vec![Edge::root(1), Edge::child(1, 1)], ForestError::DuplicateId(1))]
#[case(vec![Edge::root(1), Edge::child(2, 3)], ForestError::DanglingParent { id: 2, parent_id: 3 })]
#[case(vec![Edge::child(1, 1)], ForestError::CycleDetected(1))]
fn test_invalid_edge_lists(#[case] edges: Vec<Edge>, #[case] expected: ForestError) {
    assert_eq!(Forest::from_edges(edges).unwrap_err(), expected);
}

#[test]
fn test_input_order_does_not_affect_answers() {
    let mut reversed = edges();
    reversed.reverse();
    let forest = Arc::new(Forest::from_edges(reversed).unwrap());
    let ancestry = AncestryIndex::build(Arc::clone(&forest));

    assert_eq!(ancestry.lca(10, 12).unwrap(), CommonAncestor::new(1, 5, 3));
    assert_eq!(forest.roots(), vec![20, 1]);
}

#[cfg(feature = "serde")]
#[test]
fn test_serde_edge_and_result() {
    let edge: Edge = serde_json::from_str(r#"{"id": 4}"#).unwrap();
    assert_eq!(edge, Edge::root(4));

    let json = serde_json::to_string(&CommonAncestor::disjoint()).unwrap();
    assert_eq!(json, r#"{"root_id":null,"lca_id":null,"depth":null}"#);
}
