//! Property tests for `DependencyGraph::sort`.
//!
//! Acyclic inputs are generated by drawing edges between random labels and
//! always pointing them from the smaller label to the larger one, then
//! inserting the nodes in a shuffled order.

use modulith_graph::{DependencyGraph, GraphError};
use proptest::prelude::*;

const MAX_NODES: usize = 24;

fn acyclic_input() -> impl Strategy<Value = (Vec<usize>, Vec<(usize, usize)>)> {
    (1..MAX_NODES).prop_flat_map(|n| {
        let order = Just((0..n).collect::<Vec<_>>()).prop_shuffle();
        let edges = prop::collection::vec((0..n, 0..n), 0..(n * 3))
            .prop_map(|pairs| {
                pairs
                    .into_iter()
                    .filter(|(a, b)| a != b)
                    .map(|(a, b)| (a.min(b), a.max(b)))
                    .collect::<Vec<_>>()
            });
        (order, edges)
    })
}

fn build(order: &[usize], edges: &[(usize, usize)]) -> DependencyGraph<usize> {
    let mut graph = DependencyGraph::new();
    graph.add_nodes(order.iter().copied()).unwrap();
    for &(from, to) in edges {
        graph.add_edge(from, to).unwrap();
    }
    graph
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn acyclic_sort_is_a_linear_extension((order, edges) in acyclic_input()) {
        let sorted = build(&order, &edges).sort().unwrap();

        let mut as_set = sorted.clone();
        as_set.sort_unstable();
        prop_assert_eq!(as_set, (0..order.len()).collect::<Vec<_>>());

        let position = |node: usize| sorted.iter().position(|n| *n == node).unwrap();
        for (from, to) in edges {
            prop_assert!(position(from) < position(to));
        }
    }

    #[test]
    fn sort_is_deterministic((order, edges) in acyclic_input()) {
        let first = build(&order, &edges).sort().unwrap();
        let second = build(&order, &edges).sort().unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn back_edge_is_always_detected(
        (order, edges) in acyclic_input(),
        pick in any::<prop::sample::Index>(),
    ) {
        prop_assume!(!edges.is_empty());
        let mut graph = build(&order, &edges);
        let (from, to) = edges[pick.index(edges.len())];
        graph.add_edge(to, from).unwrap();

        let before = graph.edge_count();
        let result = graph.sort();
        prop_assert!(matches!(result, Err(GraphError::Cycle(_))));
        prop_assert_eq!(graph.edge_count(), before);
    }
}
