//! Directed dependency graph with a deterministic topological sort.
//!
//! A [`DependencyGraph`] holds a set of nodes and "comes before" edges between
//! them. [`DependencyGraph::sort`] returns one linear order satisfying every
//! edge, or a [`GraphError::Cycle`] describing a concrete cycle.
//!
//! # Determinism
//!
//! When several nodes are ready at the same time, the one inserted first is
//! emitted first. Sorting the same nodes (inserted in the same order) with the
//! same edges always yields the same sequence.
//!
//! # Example
//!
//! ```
//! use modulith_graph::{DependencyGraph, GraphError};
//!
//! let mut graph = DependencyGraph::new();
//! graph.add_nodes([1, 2, 3]).unwrap();
//! graph.add_edge(3, 1).unwrap();
//! assert_eq!(graph.sort().unwrap(), vec![2, 3, 1]);
//!
//! graph.add_edge(1, 3).unwrap();
//! assert!(matches!(graph.sort(), Err(GraphError::Cycle(_))));
//! ```

use core::cmp::Reverse;
use core::fmt::Debug;
use core::hash::Hash;
use hashbrown::{HashMap, HashSet};
use std::collections::BinaryHeap;

// ─────────────────────────────────────────────────────────────────────────────
// GraphError
// ─────────────────────────────────────────────────────────────────────────────

/// Errors produced while building or sorting a [`DependencyGraph`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError<T: Debug> {
    /// An edge references a node that was never added.
    #[error("unknown node {0:?}")]
    UnknownNode(T),
    /// A node was added twice.
    #[error("node {0:?} was already added")]
    DuplicateNode(T),
    /// An edge would make a node depend on itself.
    #[error("node {0:?} cannot be ordered before itself")]
    SelfLoop(T),
    /// A positional dependency referenced an index past the end of the graph.
    #[error("node index {index} is out of bounds for a graph of {len} nodes")]
    IndexOutOfBounds {
        /// The offending index.
        index: usize,
        /// Number of nodes in the graph.
        len: usize,
    },
    /// The edges contain a directed cycle, listed in edge order.
    #[error("cycle detected: {}", format_cycle(.0))]
    Cycle(Vec<T>),
}

fn format_cycle<T: Debug>(cycle: &[T]) -> String {
    let mut parts: Vec<String> = cycle.iter().map(|node| format!("{node:?}")).collect();
    if let Some(first) = parts.first().cloned() {
        parts.push(first);
    }
    parts.join(" -> ")
}

// ─────────────────────────────────────────────────────────────────────────────
// DependencyGraph
// ─────────────────────────────────────────────────────────────────────────────

/// A set of nodes plus ordering constraints between them.
///
/// Nodes are identified by value and remembered by insertion index, which is
/// also the tie-break used by [`sort`](Self::sort).
#[derive(Debug, Clone)]
pub struct DependencyGraph<T> {
    /// Nodes in insertion order.
    nodes: Vec<T>,
    /// Node value -> insertion index.
    index: HashMap<T, usize>,
    /// Outgoing edges: nodes that must come after the key.
    successors: Vec<Vec<usize>>,
    /// Incoming edges: nodes that must come before the key.
    predecessors: Vec<Vec<usize>>,
    /// Distinct edges, so repeated declarations are idempotent.
    edges: HashSet<(usize, usize)>,
}

impl<T> Default for DependencyGraph<T> {
    fn default() -> Self {
        Self {
            nodes: Vec::new(),
            index: HashMap::new(),
            successors: Vec::new(),
            predecessors: Vec::new(),
            edges: HashSet::new(),
        }
    }
}

impl<T: Clone + Eq + Hash + Debug> DependencyGraph<T> {
    /// Creates an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty graph with room for `capacity` nodes.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(capacity),
            index: HashMap::with_capacity(capacity),
            successors: Vec::with_capacity(capacity),
            predecessors: Vec::with_capacity(capacity),
            edges: HashSet::new(),
        }
    }

    /// Adds a single node and returns its insertion index.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::DuplicateNode`] if the value is already present.
    pub fn add_node(&mut self, value: T) -> Result<usize, GraphError<T>> {
        if self.index.contains_key(&value) {
            return Err(GraphError::DuplicateNode(value));
        }
        Ok(self.insert_node(value))
    }

    /// Adds every value in `values`, in iteration order.
    ///
    /// The batch is validated before anything is inserted, so a rejected call
    /// leaves the graph unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::DuplicateNode`] if a value is already present or
    /// appears twice in the batch.
    pub fn add_nodes<I>(&mut self, values: I) -> Result<(), GraphError<T>>
    where
        I: IntoIterator<Item = T>,
    {
        let values: Vec<T> = values.into_iter().collect();

        {
            let mut seen: HashSet<&T> = HashSet::with_capacity(values.len());
            for value in &values {
                if self.index.contains_key(value) || !seen.insert(value) {
                    return Err(GraphError::DuplicateNode(value.clone()));
                }
            }
        }

        for value in values {
            self.insert_node(value);
        }
        Ok(())
    }

    fn insert_node(&mut self, value: T) -> usize {
        let idx = self.nodes.len();
        self.index.insert(value.clone(), idx);
        self.nodes.push(value);
        self.successors.push(Vec::new());
        self.predecessors.push(Vec::new());
        idx
    }

    /// Records that `from` must come before `to`.
    ///
    /// Adding the same edge twice has no further effect.
    ///
    /// # Errors
    ///
    /// - [`GraphError::UnknownNode`] if either endpoint was never added
    /// - [`GraphError::SelfLoop`] if `from == to`
    pub fn add_edge(&mut self, from: T, to: T) -> Result<(), GraphError<T>> {
        let Some(from_idx) = self.index_of(&from) else {
            return Err(GraphError::UnknownNode(from));
        };
        let Some(to_idx) = self.index_of(&to) else {
            return Err(GraphError::UnknownNode(to));
        };
        if from_idx == to_idx {
            return Err(GraphError::SelfLoop(from));
        }

        self.link(from_idx, to_idx);
        Ok(())
    }

    /// Records that the node at index `dependent` depends on the node at
    /// index `dependency`, i.e. `dependency` must come first.
    ///
    /// Indices are insertion indices, which makes this convenient when the
    /// constraints were declared against a list of values.
    ///
    /// # Errors
    ///
    /// - [`GraphError::IndexOutOfBounds`] if either index is not a node
    /// - [`GraphError::SelfLoop`] if both indices are equal
    pub fn add_index_dependency(
        &mut self,
        dependent: usize,
        dependency: usize,
    ) -> Result<(), GraphError<T>> {
        let len = self.nodes.len();
        for index in [dependent, dependency] {
            if index >= len {
                return Err(GraphError::IndexOutOfBounds { index, len });
            }
        }
        if dependent == dependency {
            return Err(GraphError::SelfLoop(self.nodes[dependent].clone()));
        }

        self.link(dependency, dependent);
        Ok(())
    }

    fn link(&mut self, from: usize, to: usize) {
        if self.edges.insert((from, to)) {
            self.successors[from].push(to);
            self.predecessors[to].push(from);
        }
    }

    /// Returns the number of nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if the graph has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns the number of distinct edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Returns true if `value` is a node of this graph.
    #[must_use]
    pub fn contains(&self, value: &T) -> bool {
        self.index.contains_key(value)
    }

    /// Returns the nodes in insertion order.
    #[must_use]
    pub fn nodes(&self) -> &[T] {
        &self.nodes
    }

    /// Returns the insertion index of `value`.
    #[must_use]
    pub fn index_of(&self, value: &T) -> Option<usize> {
        self.index.get(value).copied()
    }

    /// Nodes that must come after `value`, in edge insertion order.
    pub fn successors(&self, value: &T) -> impl Iterator<Item = &T> {
        self.neighbours(value, &self.successors)
    }

    /// Nodes that must come before `value`, in edge insertion order.
    pub fn predecessors(&self, value: &T) -> impl Iterator<Item = &T> {
        self.neighbours(value, &self.predecessors)
    }

    fn neighbours<'a>(
        &'a self,
        value: &T,
        adjacency: &'a [Vec<usize>],
    ) -> impl Iterator<Item = &'a T> {
        let indices: &[usize] = match self.index_of(value) {
            Some(idx) => &adjacency[idx],
            None => &[],
        };
        indices.iter().map(|&idx| &self.nodes[idx])
    }

    /// Computes a linear order in which every edge points forward.
    ///
    /// Uses Kahn's algorithm. Among nodes with no unresolved predecessors the
    /// earliest inserted one is emitted first. The graph itself is not
    /// modified, so a failed sort has no side effects.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Cycle`] with one concrete cycle if the edges
    /// cannot be satisfied.
    pub fn sort(&self) -> Result<Vec<T>, GraphError<T>> {
        let n = self.nodes.len();
        let mut in_degree: Vec<usize> = self.predecessors.iter().map(Vec::len).collect();

        let mut ready: BinaryHeap<Reverse<usize>> = in_degree
            .iter()
            .enumerate()
            .filter(|(_, deg)| **deg == 0)
            .map(|(idx, _)| Reverse(idx))
            .collect();

        let mut order: Vec<usize> = Vec::with_capacity(n);
        while let Some(Reverse(idx)) = ready.pop() {
            order.push(idx);
            for &next in &self.successors[idx] {
                in_degree[next] -= 1;
                if in_degree[next] == 0 {
                    ready.push(Reverse(next));
                }
            }
        }

        if order.len() != n {
            return Err(GraphError::Cycle(self.extract_cycle(&in_degree)));
        }

        Ok(order.into_iter().map(|idx| self.nodes[idx].clone()).collect())
    }

    /// Finds one cycle among the nodes Kahn's algorithm could not emit.
    ///
    /// Every unemitted node still has an unemitted predecessor, so walking
    /// predecessors from any of them must revisit a node.
    fn extract_cycle(&self, in_degree: &[usize]) -> Vec<T> {
        let Some(start) = in_degree.iter().position(|deg| *deg > 0) else {
            return Vec::new();
        };

        let mut position: HashMap<usize, usize> = HashMap::new();
        let mut path: Vec<usize> = Vec::new();
        let mut current = start;

        let mut cycle = loop {
            if let Some(&pos) = position.get(&current) {
                break path.split_off(pos);
            }
            position.insert(current, path.len());
            path.push(current);

            let Some(prev) = self.predecessors[current]
                .iter()
                .copied()
                .find(|&p| in_degree[p] > 0)
            else {
                break path;
            };
            current = prev;
        };

        // The walk followed edges backwards.
        cycle.reverse();
        if let Some(min_pos) = cycle
            .iter()
            .enumerate()
            .min_by_key(|(_, idx)| **idx)
            .map(|(pos, _)| pos)
        {
            cycle.rotate_left(min_pos);
        }

        cycle.into_iter().map(|idx| self.nodes[idx].clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph_of(nodes: &[&'static str]) -> DependencyGraph<&'static str> {
        let mut graph = DependencyGraph::new();
        graph.add_nodes(nodes.iter().copied()).unwrap();
        graph
    }

    #[test]
    fn empty_graph_sorts_to_empty_order() {
        let graph: DependencyGraph<u32> = DependencyGraph::new();
        assert!(graph.is_empty());
        assert_eq!(graph.sort().unwrap(), Vec::<u32>::new());
    }

    #[test]
    fn isolated_nodes_keep_insertion_order() {
        let graph = graph_of(&["c", "a", "b"]);
        assert_eq!(graph.sort().unwrap(), vec!["c", "a", "b"]);
    }

    #[test]
    fn edges_are_respected() {
        let mut graph = graph_of(&["commands", "users", "database"]);
        graph.add_edge("database", "users").unwrap();
        graph.add_edge("database", "commands").unwrap();
        graph.add_edge("users", "commands").unwrap();

        assert_eq!(graph.sort().unwrap(), vec!["database", "users", "commands"]);
    }

    #[test]
    fn ties_prefer_earlier_insertion() {
        // "b" and "c" both become ready once "a" is emitted; "c" was added first.
        let mut graph = graph_of(&["c", "b", "a"]);
        graph.add_edge("a", "c").unwrap();
        graph.add_edge("a", "b").unwrap();

        assert_eq!(graph.sort().unwrap(), vec!["a", "c", "b"]);
    }

    #[test]
    fn add_node_rejects_duplicates() {
        let mut graph = graph_of(&["a"]);
        assert_eq!(graph.add_node("a"), Err(GraphError::DuplicateNode("a")));
        assert_eq!(graph.add_node("b"), Ok(1));
    }

    #[test]
    fn add_nodes_rejects_duplicates_without_partial_insert() {
        let mut graph = graph_of(&["a"]);

        let result = graph.add_nodes(["b", "c", "b"]);
        assert_eq!(result, Err(GraphError::DuplicateNode("b")));
        assert_eq!(graph.len(), 1);

        let result = graph.add_nodes(["d", "a"]);
        assert_eq!(result, Err(GraphError::DuplicateNode("a")));
        assert!(!graph.contains(&"d"));
    }

    #[test]
    fn add_nodes_takes_owned_values() {
        let mut graph: DependencyGraph<String> = DependencyGraph::new();
        graph
            .add_nodes(["users".to_owned(), "database".to_owned()])
            .unwrap();
        graph
            .add_edge("database".to_owned(), "users".to_owned())
            .unwrap();

        assert_eq!(
            graph.add_nodes(["metrics".to_owned(), "users".to_owned()]),
            Err(GraphError::DuplicateNode("users".to_owned()))
        );
        assert_eq!(graph.len(), 2);
        assert_eq!(graph.sort().unwrap(), ["database", "users"]);
    }

    #[test]
    fn add_edge_rejects_unknown_nodes() {
        let mut graph = graph_of(&["a"]);
        assert_eq!(graph.add_edge("a", "x"), Err(GraphError::UnknownNode("x")));
        assert_eq!(graph.add_edge("y", "a"), Err(GraphError::UnknownNode("y")));
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn add_edge_rejects_self_loop() {
        let mut graph = graph_of(&["a"]);
        assert_eq!(graph.add_edge("a", "a"), Err(GraphError::SelfLoop("a")));
    }

    #[test]
    fn duplicate_edges_are_idempotent() {
        let mut graph = graph_of(&["a", "b"]);
        graph.add_edge("a", "b").unwrap();
        graph.add_edge("a", "b").unwrap();

        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.predecessors(&"b").count(), 1);
        assert_eq!(graph.sort().unwrap(), vec!["a", "b"]);
    }

    #[test]
    fn neighbour_queries() {
        let mut graph = graph_of(&["a", "b", "c"]);
        graph.add_edge("a", "b").unwrap();
        graph.add_edge("a", "c").unwrap();

        assert_eq!(graph.successors(&"a").copied().collect::<Vec<_>>(), ["b", "c"]);
        assert_eq!(graph.predecessors(&"c").copied().collect::<Vec<_>>(), ["a"]);
        assert_eq!(graph.successors(&"missing").count(), 0);
    }

    #[test]
    fn cycle_reports_concrete_path() {
        let mut graph = graph_of(&["a", "b", "c", "d"]);
        graph.add_edge("a", "b").unwrap();
        graph.add_edge("b", "c").unwrap();
        graph.add_edge("c", "b").unwrap();
        graph.add_edge("c", "d").unwrap();

        assert_eq!(graph.sort(), Err(GraphError::Cycle(vec!["b", "c"])));
    }

    #[test]
    fn cycle_display_closes_the_loop() {
        let err: GraphError<&str> = GraphError::Cycle(vec!["x", "y"]);
        assert_eq!(err.to_string(), r#"cycle detected: "x" -> "y" -> "x""#);
    }

    #[test]
    fn failed_sort_leaves_graph_untouched() {
        let mut graph = graph_of(&["a", "b"]);
        graph.add_edge("a", "b").unwrap();
        graph.add_edge("b", "a").unwrap();

        assert!(graph.sort().is_err());
        assert_eq!(graph.len(), 2);
        assert_eq!(graph.edge_count(), 2);
        assert!(graph.sort().is_err());
    }

    #[test]
    fn index_dependency_orders_dependency_first() {
        let mut graph = graph_of(&["a", "b"]);
        graph.add_index_dependency(0, 1).unwrap();
        assert_eq!(graph.sort().unwrap(), vec!["b", "a"]);
    }

    #[test]
    fn index_dependency_bounds_checked() {
        let mut graph = graph_of(&["a", "b"]);
        assert_eq!(
            graph.add_index_dependency(0, 2),
            Err(GraphError::IndexOutOfBounds { index: 2, len: 2 })
        );
        assert_eq!(
            graph.add_index_dependency(1, 1),
            Err(GraphError::SelfLoop("b"))
        );
    }
}
