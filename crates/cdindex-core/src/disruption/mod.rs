//! Disruption (CD) index computation.
//!
//! [`engine::compute`] turns an [`AdjacencyIndex`](crate::graph::AdjacencyIndex)
//! into a [`DisruptionReport`] with one [`DisruptionRecord`] per node, in the
//! index's node order.

pub mod engine;
pub mod record;

pub use engine::{ComputeOptions, DisruptionReport, ReportSummary, classify, compute, compute_node};
pub use record::{DisruptionCounts, DisruptionRecord, Outcome};
