//! Dependency graph construction
//!
//! Wraps a `petgraph::DiGraph` keyed by node identity. Nodes are interned on
//! first sight, so adding the same edge twice leaves a single edge, and every
//! edge endpoint is guaranteed to be a node.

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use std::collections::HashMap;

use crate::extract::DependencyEdge;

/// Edges of the demonstration graph used when an export has no dependencies
pub const SAMPLE_EDGES: [(&str, &str); 10] = [
    ("main.py", "utils.py"),
    ("main.py", "config.py"),
    ("utils.py", "helpers.py"),
    ("config.py", "validators.py"),
    ("api.py", "models.py"),
    ("api.py", "utils.py"),
    ("models.py", "database.py"),
    ("database.py", "config.py"),
    ("tests.py", "main.py"),
    ("tests.py", "api.py"),
];

/// Where a graph's edges came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphOrigin {
    /// Built from extracted edges
    Extracted,
    /// Extraction found nothing; the demonstration graph was substituted
    Sample,
}

/// Directed dependency graph over unique string identities
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    /// The underlying graph (private to keep `index` in sync)
    inner: DiGraph<String, ()>,
    index: HashMap<String, NodeIndex>,
}

impl DependencyGraph {
    /// Create a new empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from extracted edges, substituting the sample graph when
    /// there are none
    pub fn build(edges: &[DependencyEdge]) -> (Self, GraphOrigin) {
        if edges.is_empty() {
            tracing::info!("no dependencies found in data, using sample graph");
            return (Self::sample(), GraphOrigin::Sample);
        }

        let mut graph = Self::new();
        for edge in edges {
            graph.add_edge(&edge.source, &edge.target);
        }
        tracing::info!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "built dependency graph"
        );
        (graph, GraphOrigin::Extracted)
    }

    /// The fixed demonstration graph (9 nodes, 10 edges)
    pub fn sample() -> Self {
        let mut graph = Self::new();
        for (source, target) in SAMPLE_EDGES {
            graph.add_edge(source, target);
        }
        graph
    }

    /// Add a node if it is not already present
    pub fn add_node(&mut self, id: &str) -> NodeIndex {
        if let Some(&idx) = self.index.get(id) {
            return idx;
        }
        let idx = self.inner.add_node(id.to_string());
        self.index.insert(id.to_string(), idx);
        idx
    }

    /// Add an edge (and its endpoints); re-adding an existing edge is a no-op
    pub fn add_edge(&mut self, source: &str, target: &str) {
        let from = self.add_node(source);
        let to = self.add_node(target);
        self.inner.update_edge(from, to, ());
    }

    /// Get the number of nodes in the graph
    pub fn node_count(&self) -> usize {
        self.inner.node_count()
    }

    /// Get the number of edges in the graph
    pub fn edge_count(&self) -> usize {
        self.inner.edge_count()
    }

    /// Node identities in insertion order
    pub fn nodes(&self) -> impl Iterator<Item = &str> {
        self.inner.node_weights().map(String::as_str)
    }

    /// Get all node indices in the graph
    pub fn node_indices(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.inner.node_indices()
    }

    /// Identity of a node index
    pub fn node_id(&self, idx: NodeIndex) -> Option<&str> {
        self.inner.node_weight(idx).map(String::as_str)
    }

    /// Find a node by its identity
    pub fn find_node_by_id(&self, id: &str) -> Option<NodeIndex> {
        self.index.get(id).copied()
    }

    /// Edge endpoints as node indices, in insertion order
    pub fn edge_endpoints(&self) -> impl Iterator<Item = (NodeIndex, NodeIndex)> + '_ {
        self.inner.edge_references().map(|e| (e.source(), e.target()))
    }

    pub fn contains_edge(&self, source: &str, target: &str) -> bool {
        match (self.find_node_by_id(source), self.find_node_by_id(target)) {
            (Some(s), Some(t)) => self.inner.contains_edge(s, t),
            _ => false,
        }
    }

    pub fn in_degree(&self, idx: NodeIndex) -> usize {
        self.inner.edges_directed(idx, Direction::Incoming).count()
    }

    pub fn out_degree(&self, idx: NodeIndex) -> usize {
        self.inner.edges_directed(idx, Direction::Outgoing).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn edges(pairs: &[(&str, &str)]) -> Vec<DependencyEdge> {
        pairs.iter().map(|(s, t)| DependencyEdge::new(*s, *t)).collect()
    }

    #[test]
    fn test_node_set_equals_endpoints() {
        let input = edges(&[("a", "b"), ("b", "c"), ("d", "a")]);
        let (graph, origin) = DependencyGraph::build(&input);

        let nodes: BTreeSet<_> = graph.nodes().collect();
        let endpoints: BTreeSet<_> = input
            .iter()
            .flat_map(|e| [e.source.as_str(), e.target.as_str()])
            .collect();

        assert_eq!(origin, GraphOrigin::Extracted);
        assert_eq!(nodes, endpoints);
        assert_eq!(graph.edge_count(), 3);
    }

    #[test]
    fn test_duplicate_edges_collapse() {
        let (graph, _) = DependencyGraph::build(&edges(&[("a", "b"), ("a", "b"), ("b", "a")]));

        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 2);
        assert!(graph.contains_edge("a", "b"));
        assert!(graph.contains_edge("b", "a"));
    }

    #[test]
    fn test_self_loops_are_kept() {
        let (graph, _) = DependencyGraph::build(&edges(&[("a", "a")]));

        assert_eq!(graph.node_count(), 1);
        assert_eq!(graph.edge_count(), 1);
        let a = graph.find_node_by_id("a").unwrap();
        assert_eq!(graph.in_degree(a), 1);
        assert_eq!(graph.out_degree(a), 1);
    }

    #[test]
    fn test_empty_edges_use_sample_graph() {
        for _ in 0..2 {
            let (graph, origin) = DependencyGraph::build(&[]);

            assert_eq!(origin, GraphOrigin::Sample);
            // Ten edges over nine distinct modules
            assert_eq!(graph.node_count(), 9);
            assert_eq!(graph.edge_count(), 10);
            for (source, target) in SAMPLE_EDGES {
                assert!(graph.contains_edge(source, target));
            }
        }
    }

    #[test]
    fn test_degrees() {
        let (graph, _) = DependencyGraph::build(&edges(&[("a", "b"), ("a", "c"), ("c", "b")]));
        let a = graph.find_node_by_id("a").unwrap();
        let b = graph.find_node_by_id("b").unwrap();

        assert_eq!(graph.out_degree(a), 2);
        assert_eq!(graph.in_degree(a), 0);
        assert_eq!(graph.in_degree(b), 2);
    }
}
