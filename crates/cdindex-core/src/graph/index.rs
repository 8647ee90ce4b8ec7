//! Set-based adjacency index over a directed edge list.
//!
//! # Overview
//!
//! [`AdjacencyIndex`] is the only graph representation the disruption engine
//! reads. It is built once from a sequence of `(source, target)` pairs and is
//! immutable afterwards.
//!
//! ## Node Order
//!
//! Nodes are numbered in first-seen order across both edge endpoints: for an
//! edge `A → B`, `A` is numbered before `B` if neither was seen yet. The
//! number is the node's [`NodeId`] and its row position in every output
//! table, so this order is part of the output contract.
//!
//! ## Duplicates and Self-Loops
//!
//! Repeated edges collapse into one. Self-loops (`A → A`) are recorded like
//! any other edge: `A` becomes its own successor and predecessor.
//!
//! ## Invariant
//!
//! `n ∈ successors(m)` if and only if `m ∈ predecessors(n)`.

#![allow(clippy::module_name_repetitions)]

use std::collections::{HashMap, HashSet};

use tracing::instrument;

use crate::error::ErrorCode;

// ---------------------------------------------------------------------------
// NodeId
// ---------------------------------------------------------------------------

/// Dense node handle: the node's position in first-seen order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// Position of the node in [`AdjacencyIndex::nodes`].
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Precondition violations raised by string-keyed index queries.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IndexError {
    /// The queried node id never appeared as an edge endpoint.
    #[error("node `{0}` is not present in the adjacency index")]
    UnknownNode(String),
}

impl IndexError {
    /// Stable error code for this failure.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::UnknownNode(_) => ErrorCode::UnknownNode,
        }
    }
}

// ---------------------------------------------------------------------------
// AdjacencyIndex
// ---------------------------------------------------------------------------

/// Per-node successor and predecessor sets with a stable node ordering.
#[derive(Debug, Clone, Default)]
pub struct AdjacencyIndex {
    names: Vec<String>,
    node_map: HashMap<String, NodeId>,
    successors: Vec<HashSet<NodeId>>,
    predecessors: Vec<HashSet<NodeId>>,
    edge_count: usize,
}

impl AdjacencyIndex {
    /// Build a directed index from `(source, target)` pairs.
    ///
    /// Direction is kept exactly as supplied. Never fails: any string is a
    /// valid node id.
    #[must_use]
    #[instrument(skip_all)]
    pub fn build<I, A, B>(edges: I) -> Self
    where
        I: IntoIterator<Item = (A, B)>,
        A: AsRef<str>,
        B: AsRef<str>,
    {
        let mut index = Self::default();
        for (source, target) in edges {
            let src = index.intern(source.as_ref());
            let dst = index.intern(target.as_ref());
            index.insert_edge(src, dst);
        }
        tracing::debug!(
            nodes = index.node_count(),
            edges = index.edge_count,
            "built directed adjacency index"
        );
        index
    }

    /// Build an index where every pair implies both directions.
    ///
    /// `A B` inserts `A → B` and `B → A`; a self-loop inserts a single edge.
    /// Node order is the same first-seen order as [`build`](Self::build).
    #[must_use]
    #[instrument(skip_all)]
    pub fn build_undirected<I, A, B>(edges: I) -> Self
    where
        I: IntoIterator<Item = (A, B)>,
        A: AsRef<str>,
        B: AsRef<str>,
    {
        let mut index = Self::default();
        for (source, target) in edges {
            let a = index.intern(source.as_ref());
            let b = index.intern(target.as_ref());
            index.insert_edge(a, b);
            index.insert_edge(b, a);
        }
        tracing::debug!(
            nodes = index.node_count(),
            edges = index.edge_count,
            "built undirected adjacency index"
        );
        index
    }

    /// Number of distinct nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.names.len()
    }

    /// Number of distinct directed edges (self-loops included).
    #[must_use]
    pub const fn edge_count(&self) -> usize {
        self.edge_count
    }

    /// Number of nodes that carry a self-loop.
    #[must_use]
    pub fn self_loop_count(&self) -> usize {
        self.node_ids()
            .filter(|&id| self.successors[id.0].contains(&id))
            .count()
    }

    /// Returns `true` if no edge was ever inserted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Node ids in stable first-seen order.
    #[must_use]
    pub fn nodes(&self) -> &[String] {
        &self.names
    }

    /// Iterate node handles in stable first-seen order.
    pub fn node_ids(&self) -> impl ExactSizeIterator<Item = NodeId> + '_ {
        (0..self.names.len()).map(NodeId)
    }

    /// Look up the handle for a node id.
    #[must_use]
    pub fn node_id(&self, node: &str) -> Option<NodeId> {
        self.node_map.get(node).copied()
    }

    /// Return the node id string for a handle.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not handed out by this index.
    #[must_use]
    pub fn name(&self, id: NodeId) -> &str {
        &self.names[id.0]
    }

    /// Successors (out-neighbors) of `node`.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::UnknownNode`] if `node` is not in the index.
    pub fn successors(&self, node: &str) -> Result<HashSet<&str>, IndexError> {
        let id = self.require(node)?;
        Ok(self.names_of(self.successors_of(id)))
    }

    /// Predecessors (in-neighbors) of `node`.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::UnknownNode`] if `node` is not in the index.
    pub fn predecessors(&self, node: &str) -> Result<HashSet<&str>, IndexError> {
        let id = self.require(node)?;
        Ok(self.names_of(self.predecessors_of(id)))
    }

    /// Out-degree of `node`.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::UnknownNode`] if `node` is not in the index.
    pub fn out_degree(&self, node: &str) -> Result<usize, IndexError> {
        self.require(node).map(|id| self.out_degree_of(id))
    }

    /// In-degree of `node`.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::UnknownNode`] if `node` is not in the index.
    pub fn in_degree(&self, node: &str) -> Result<usize, IndexError> {
        self.require(node).map(|id| self.in_degree_of(id))
    }

    /// Successor handles of `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not handed out by this index.
    #[must_use]
    pub fn successors_of(&self, id: NodeId) -> &HashSet<NodeId> {
        &self.successors[id.0]
    }

    /// Predecessor handles of `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not handed out by this index.
    #[must_use]
    pub fn predecessors_of(&self, id: NodeId) -> &HashSet<NodeId> {
        &self.predecessors[id.0]
    }

    #[must_use]
    pub fn out_degree_of(&self, id: NodeId) -> usize {
        self.successors[id.0].len()
    }

    #[must_use]
    pub fn in_degree_of(&self, id: NodeId) -> usize {
        self.predecessors[id.0].len()
    }

    /// Returns `true` if the directed edge `source → target` exists.
    #[must_use]
    pub fn contains_edge(&self, source: &str, target: &str) -> bool {
        match (self.node_id(source), self.node_id(target)) {
            (Some(src), Some(dst)) => self.successors[src.0].contains(&dst),
            _ => false,
        }
    }

    /// Iterate deduplicated edges, grouped by source in node order and with
    /// targets in node order within each group.
    pub fn edges(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.node_ids().flat_map(move |src| {
            let mut targets: Vec<NodeId> = self.successors[src.0].iter().copied().collect();
            targets.sort_unstable();
            targets
                .into_iter()
                .map(move |dst| (self.name(src), self.name(dst)))
        })
    }

    // -- internal -----------------------------------------------------------

    fn intern(&mut self, node: &str) -> NodeId {
        if let Some(&id) = self.node_map.get(node) {
            return id;
        }
        let id = NodeId(self.names.len());
        self.names.push(node.to_string());
        self.node_map.insert(node.to_string(), id);
        self.successors.push(HashSet::new());
        self.predecessors.push(HashSet::new());
        id
    }

    fn insert_edge(&mut self, src: NodeId, dst: NodeId) {
        if self.successors[src.0].insert(dst) {
            self.predecessors[dst.0].insert(src);
            self.edge_count += 1;
        }
    }

    fn require(&self, node: &str) -> Result<NodeId, IndexError> {
        self.node_id(node)
            .ok_or_else(|| IndexError::UnknownNode(node.to_string()))
    }

    fn names_of(&self, ids: &HashSet<NodeId>) -> HashSet<&str> {
        ids.iter().map(|&id| self.name(id)).collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn set<'a>(items: &[&'a str]) -> HashSet<&'a str> {
        items.iter().copied().collect()
    }

    #[test]
    fn empty_edge_list_produces_empty_index() {
        let index = AdjacencyIndex::build(Vec::<(String, String)>::new());
        assert!(index.is_empty());
        assert_eq!(index.node_count(), 0);
        assert_eq!(index.edge_count(), 0);
        assert!(index.nodes().is_empty());
    }

    #[test]
    fn nodes_follow_first_seen_order_across_endpoints() {
        let index = AdjacencyIndex::build([("C", "A"), ("B", "A"), ("A", "D")]);
        assert_eq!(index.nodes(), ["C", "A", "B", "D"]);
        assert_eq!(index.node_id("B").map(NodeId::index), Some(2));
    }

    #[test]
    fn duplicate_edges_collapse() {
        let index = AdjacencyIndex::build([("A", "B"), ("A", "B"), ("A", "B")]);
        assert_eq!(index.edge_count(), 1);
        assert_eq!(index.out_degree("A"), Ok(1));
        assert_eq!(index.in_degree("B"), Ok(1));
    }

    #[test]
    fn endpoint_only_nodes_have_degrees() {
        let index = AdjacencyIndex::build([("A", "B"), ("C", "B")]);
        assert_eq!(index.in_degree("B"), Ok(2));
        assert_eq!(index.out_degree("B"), Ok(0));
        assert_eq!(index.in_degree("A"), Ok(0));
        assert_eq!(index.out_degree("A"), Ok(1));
        assert_eq!(index.predecessors("B"), Ok(set(&["A", "C"])));
        assert_eq!(index.successors("B"), Ok(HashSet::new()));
    }

    #[test]
    fn self_loop_is_recorded() {
        let index = AdjacencyIndex::build([("A", "A"), ("A", "B")]);
        assert_eq!(index.edge_count(), 2);
        assert_eq!(index.self_loop_count(), 1);
        assert_eq!(index.successors("A"), Ok(set(&["A", "B"])));
        assert_eq!(index.predecessors("A"), Ok(set(&["A"])));
    }

    #[test]
    fn unknown_node_is_a_precondition_violation() {
        let index = AdjacencyIndex::build([("A", "B")]);
        let err = index.in_degree("Z").expect_err("Z is not indexed");
        assert_eq!(err, IndexError::UnknownNode("Z".to_string()));
        assert_eq!(err.code(), ErrorCode::UnknownNode);
        assert!(index.successors("Z").is_err());
        assert!(index.predecessors("Z").is_err());
        assert!(index.out_degree("Z").is_err());
    }

    #[test]
    fn undirected_build_inserts_both_directions() {
        let index = AdjacencyIndex::build_undirected([("A", "B"), ("B", "C"), ("C", "C")]);
        assert_eq!(index.nodes(), ["A", "B", "C"]);
        // A-B and B-C doubled, C-C once.
        assert_eq!(index.edge_count(), 5);
        assert!(index.contains_edge("A", "B"));
        assert!(index.contains_edge("B", "A"));
        assert_eq!(index.in_degree("B"), Ok(2));
        assert_eq!(index.out_degree("B"), Ok(2));
        assert_eq!(index.self_loop_count(), 1);
    }

    #[test]
    fn successor_and_predecessor_sets_mirror_each_other() {
        let index = AdjacencyIndex::build([
            ("A", "B"),
            ("B", "C"),
            ("C", "A"),
            ("A", "C"),
            ("D", "D"),
        ]);
        for m in index.node_ids() {
            for &n in index.successors_of(m) {
                assert!(index.predecessors_of(n).contains(&m));
            }
            for &p in index.predecessors_of(m) {
                assert!(index.successors_of(p).contains(&m));
            }
        }
    }

    #[test]
    fn edges_iterate_in_node_order() {
        let index = AdjacencyIndex::build([("B", "C"), ("A", "C"), ("B", "A"), ("B", "C")]);
        let edges: Vec<_> = index.edges().collect();
        assert_eq!(edges, vec![("B", "C"), ("B", "A"), ("A", "C")]);
    }
}
