//! Graph input and indexing.
//!
//! # Pipeline
//!
//! ```text
//! edge-list file / artist dataset
//!        ↓  edgelist::load_edge_file() / dataset::influence_edges()
//! Vec<(source, target)>
//!        ↓  index::AdjacencyIndex::build() or build_undirected()
//! AdjacencyIndex (successor/predecessor sets, first-seen node order)
//!        ↓  stats::GraphStats::from_index()
//! GraphStats (counts, density, components, content hash)
//! ```
//!
//! ## Typical Usage
//!
//! ```rust,ignore
//! use cdindex_core::graph::{edgelist::load_edge_file, index::AdjacencyIndex};
//!
//! let edges = load_edge_file(Path::new("edges.txt"))?;
//! let index = AdjacencyIndex::build(edges);
//! println!("nodes={} edges={}", index.node_count(), index.edge_count());
//! ```

pub mod edgelist;
pub mod index;
pub mod stats;

pub use edgelist::{Edge, LoadError, load_edge_file, read_edges};
pub use index::{AdjacencyIndex, IndexError, NodeId};
pub use stats::GraphStats;
