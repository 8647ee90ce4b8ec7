//! Summary statistics for an indexed influence graph.
//!
//! # Statistics Provided
//!
//! - **node_count** / **edge_count**: distinct nodes and deduplicated
//!   directed edges.
//! - **self_loop_count**: nodes with an edge to themselves.
//! - **density**: `edge_count / (node_count * (node_count - 1))`, 0.0 for
//!   graphs with fewer than two nodes.
//! - **weakly_connected_component_count**: components when direction is
//!   ignored.
//! - **max_in_degree** / **max_out_degree**.
//! - **content_hash**: BLAKE3 of the deduplicated edge set in node order.
//!   Two runs over the same edge list in the same order hash identically.

use petgraph::{algo::connected_components, graph::DiGraph};
use serde::Serialize;
use tracing::instrument;

use crate::graph::index::AdjacencyIndex;

/// Summary statistics for an [`AdjacencyIndex`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphStats {
    pub node_count: usize,
    pub edge_count: usize,
    pub self_loop_count: usize,
    /// Ranges from 0.0 (no edges) to 1.0 (every ordered pair connected).
    pub density: f64,
    pub weakly_connected_component_count: usize,
    pub max_in_degree: usize,
    pub max_out_degree: usize,
    /// `blake3:<hex>` digest of the edge set.
    pub content_hash: String,
}

impl GraphStats {
    /// Compute statistics from an [`AdjacencyIndex`].
    #[must_use]
    #[instrument(skip(index))]
    pub fn from_index(index: &AdjacencyIndex) -> Self {
        let node_count = index.node_count();
        let edge_count = index.edge_count();

        let max_in_degree = index
            .node_ids()
            .map(|id| index.in_degree_of(id))
            .max()
            .unwrap_or(0);
        let max_out_degree = index
            .node_ids()
            .map(|id| index.out_degree_of(id))
            .max()
            .unwrap_or(0);

        Self {
            node_count,
            edge_count,
            self_loop_count: index.self_loop_count(),
            density: compute_density(node_count, edge_count),
            weakly_connected_component_count: connected_components(&to_digraph(index)),
            max_in_degree,
            max_out_degree,
            content_hash: content_hash(index),
        }
    }
}

/// Mirror the index into a petgraph [`DiGraph`].
///
/// Node `i` of the returned graph is the node with [`NodeId::index`] `i`,
/// weighted by its id string.
///
/// [`NodeId::index`]: crate::graph::index::NodeId::index
#[must_use]
pub fn to_digraph(index: &AdjacencyIndex) -> DiGraph<&str, ()> {
    let mut graph = DiGraph::with_capacity(index.node_count(), index.edge_count());
    let handles: Vec<_> = index
        .node_ids()
        .map(|id| graph.add_node(index.name(id)))
        .collect();

    for src in index.node_ids() {
        for dst in index.successors_of(src) {
            graph.add_edge(handles[src.index()], handles[dst.index()], ());
        }
    }
    graph
}

/// BLAKE3 hash of the edge set, stable for a given node order.
#[must_use]
pub fn content_hash(index: &AdjacencyIndex) -> String {
    let mut hasher = blake3::Hasher::new();
    for (source, target) in index.edges() {
        hasher.update(source.as_bytes());
        hasher.update(b"\x00");
        hasher.update(target.as_bytes());
        hasher.update(b"\x00");
    }
    format!("blake3:{}", hasher.finalize())
}

#[allow(clippy::cast_precision_loss)]
fn compute_density(node_count: usize, edge_count: usize) -> f64 {
    if node_count < 2 {
        return 0.0;
    }
    let max_edges = (node_count * (node_count - 1)) as f64;
    edge_count as f64 / max_edges
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_graph_stats() {
        let index = AdjacencyIndex::build(Vec::<(String, String)>::new());
        let stats = GraphStats::from_index(&index);
        assert_eq!(stats.node_count, 0);
        assert_eq!(stats.edge_count, 0);
        assert!(stats.density.abs() < f64::EPSILON);
        assert_eq!(stats.weakly_connected_component_count, 0);
        assert!(stats.content_hash.starts_with("blake3:"));
    }

    #[test]
    fn two_components_and_self_loop() {
        let index = AdjacencyIndex::build([("A", "B"), ("C", "B"), ("X", "Y"), ("Y", "Y")]);
        let stats = GraphStats::from_index(&index);
        assert_eq!(stats.node_count, 5);
        assert_eq!(stats.edge_count, 4);
        assert_eq!(stats.self_loop_count, 1);
        assert_eq!(stats.weakly_connected_component_count, 2);
        assert_eq!(stats.max_in_degree, 2);
        assert_eq!(stats.max_out_degree, 1);
        assert!((stats.density - 4.0 / 20.0).abs() < 1e-12);
    }

    #[test]
    fn hash_ignores_duplicate_edges() {
        let a = AdjacencyIndex::build([("A", "B"), ("B", "C")]);
        let b = AdjacencyIndex::build([("A", "B"), ("A", "B"), ("B", "C")]);
        let c = AdjacencyIndex::build([("A", "B"), ("B", "D")]);
        assert_eq!(content_hash(&a), content_hash(&b));
        assert_ne!(content_hash(&a), content_hash(&c));
    }

    #[test]
    fn digraph_mirror_keeps_node_positions() {
        let index = AdjacencyIndex::build([("B", "A"), ("A", "C")]);
        let graph = to_digraph(&index);
        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.edge_count(), 2);
        let weights: Vec<&str> = graph.node_weights().copied().collect();
        assert_eq!(weights, index.nodes());
    }
}
