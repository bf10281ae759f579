//! Dependency ordering primitives for Modulith.
//!
//! `modulith_graph` knows nothing about modules. It orders opaque node values
//! under "must come before" constraints and reports cycles instead of
//! producing partial orders.
//!
//! # Core Concepts
//!
//! - [`DependencyGraph`] - Nodes plus ordering edges, sorted with [`DependencyGraph::sort`]
//! - [`GraphError`] - Unknown nodes, duplicates, self loops and cycles
//!
//! # Example
//!
//! ```
//! use modulith_graph::DependencyGraph;
//!
//! let mut graph = DependencyGraph::new();
//! graph.add_nodes(["commands", "database", "users"]).unwrap();
//! graph.add_edge("database", "users").unwrap();
//! graph.add_edge("users", "commands").unwrap();
//!
//! assert_eq!(graph.sort().unwrap(), vec!["database", "users", "commands"]);
//! ```
//!
//! # Architecture
//!
//! - **`modulith_graph`**: ordering algorithm (this crate)
//! - **`modulith_system`**: module registry, lifecycle orchestration, manager
//! - **`modulith_core_modules`**: infrastructure modules (tracing, config)

/// Dependency graph and topological sort.
pub mod graph;

pub use graph::{DependencyGraph, GraphError};
