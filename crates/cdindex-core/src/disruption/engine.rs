//! Disruption engine: per-node classification over an [`AdjacencyIndex`].
//!
//! # Algorithm
//!
//! For a node `n` with successors `O` and predecessors `P`:
//!
//! ```text
//! ni = |{ p ∈ P : O ∩ successors(p) = ∅ }|
//! nj = |{ p ∈ P : O ∩ successors(p) ≠ ∅ }|
//! C  = ⋃ predecessors(o) for o ∈ O
//! nk = |{ c ∈ C : c ≠ n and n ∉ successors(c) }|
//! cd = (ni - nj) / (ni + nj + nk)         undefined when the sum is 0
//! ```
//!
//! Every predecessor lands in exactly one bucket, so `ni + nj = in_degree(n)`.
//! A node with a self-loop is its own predecessor and is classified like any
//! other predecessor, but never counts toward `nk`.
//!
//! # Degree Filter
//!
//! Nodes with `in_degree < min_in` or `out_degree < min_out` keep their
//! degrees and get [`Outcome::Filtered`] instead of counts.
//!
//! # Parallelism
//!
//! Each node reads only the immutable index and produces its own record, so
//! the parallel path is a rayon map over node ids followed by an ordered
//! collect. Both paths return identical reports.

use std::collections::HashSet;
use std::time::{Duration, Instant};

use rayon::prelude::*;
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::disruption::record::{DisruptionCounts, DisruptionRecord, Outcome};
use crate::graph::index::{AdjacencyIndex, IndexError, NodeId};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Options for [`compute`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComputeOptions {
    /// Minimum in-degree for a node to be scored. Default: 1.
    pub min_in: usize,
    /// Minimum out-degree for a node to be scored. Default: 0.
    pub min_out: usize,
    /// Run the per-node loop on the rayon pool. Default: false.
    pub parallel: bool,
    /// Abort remaining nodes once this much time has passed. Default: none.
    pub deadline: Option<Duration>,
}

impl Default for ComputeOptions {
    fn default() -> Self {
        Self {
            min_in: 1,
            min_out: 0,
            parallel: false,
            deadline: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// Ordered records for every node of an index.
#[derive(Debug, Clone, PartialEq)]
pub struct DisruptionReport {
    /// One record per node, in [`AdjacencyIndex::nodes`] order.
    pub records: Vec<DisruptionRecord>,
    /// `true` if the deadline cut the run short.
    pub partial: bool,
}

/// Outcome tallies for a [`DisruptionReport`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReportSummary {
    pub nodes: usize,
    pub scored: usize,
    pub filtered: usize,
    pub skipped: usize,
    /// Scored nodes whose denominator was zero.
    pub undefined_cd: usize,
    pub partial: bool,
}

impl DisruptionReport {
    /// Look up the record for a node id.
    #[must_use]
    pub fn get(&self, node: &str) -> Option<&DisruptionRecord> {
        self.records.iter().find(|r| r.node == node)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Tally outcomes across all records.
    #[must_use]
    pub fn summary(&self) -> ReportSummary {
        let mut summary = ReportSummary {
            nodes: self.records.len(),
            scored: 0,
            filtered: 0,
            skipped: 0,
            undefined_cd: 0,
            partial: self.partial,
        };
        for record in &self.records {
            match record.outcome {
                Outcome::Scored(counts) => {
                    summary.scored += 1;
                    if counts.cd().is_none() {
                        summary.undefined_cd += 1;
                    }
                }
                Outcome::Filtered => summary.filtered += 1,
                Outcome::Skipped => summary.skipped += 1,
            }
        }
        summary
    }
}

// ---------------------------------------------------------------------------
// Computation
// ---------------------------------------------------------------------------

/// Compute a record for every node of `index`, in node order.
#[must_use]
#[instrument(skip(index), fields(nodes = index.node_count()))]
pub fn compute(index: &AdjacencyIndex, options: &ComputeOptions) -> DisruptionReport {
    let started = Instant::now();
    let cutoff = options
        .deadline
        .and_then(|deadline| started.checked_add(deadline));

    let visit = |id: NodeId| {
        if cutoff.is_some_and(|cutoff| Instant::now() >= cutoff) {
            return DisruptionRecord {
                node: index.name(id).to_string(),
                in_degree: index.in_degree_of(id),
                out_degree: index.out_degree_of(id),
                outcome: Outcome::Skipped,
            };
        }
        record_for(index, id, options.min_in, options.min_out)
    };

    let records: Vec<DisruptionRecord> = if options.parallel {
        let ids: Vec<NodeId> = index.node_ids().collect();
        ids.par_iter().map(|&id| visit(id)).collect()
    } else {
        index.node_ids().map(visit).collect()
    };

    let partial = records
        .iter()
        .any(|r| matches!(r.outcome, Outcome::Skipped));
    let report = DisruptionReport { records, partial };

    let summary = report.summary();
    if partial {
        warn!(
            skipped = summary.skipped,
            "deadline reached, remaining nodes skipped"
        );
    }
    info!(
        scored = summary.scored,
        filtered = summary.filtered,
        undefined_cd = summary.undefined_cd,
        elapsed_ms = started.elapsed().as_millis(),
        "disruption computed"
    );

    report
}

/// Compute the record for a single node.
///
/// # Errors
///
/// Returns [`IndexError::UnknownNode`] if `node` is not in `index`.
pub fn compute_node(
    index: &AdjacencyIndex,
    node: &str,
    min_in: usize,
    min_out: usize,
) -> Result<DisruptionRecord, IndexError> {
    let id = index
        .node_id(node)
        .ok_or_else(|| IndexError::UnknownNode(node.to_string()))?;
    Ok(record_for(index, id, min_in, min_out))
}

/// Classify the neighborhood of `node` into `ni`, `nj` and `nk`.
///
/// Ignores the degree filter.
///
/// # Panics
///
/// Panics if `node` was not handed out by `index`.
#[must_use]
pub fn classify(index: &AdjacencyIndex, node: NodeId) -> DisruptionCounts {
    let outgoing = index.successors_of(node);

    let mut counts = DisruptionCounts::default();
    for &pred in index.predecessors_of(node) {
        if outgoing.is_disjoint(index.successors_of(pred)) {
            counts.ni += 1;
        } else {
            counts.nj += 1;
        }
    }

    // Everyone citing at least one of our successors.
    let citers: HashSet<NodeId> = outgoing
        .iter()
        .flat_map(|&succ| index.predecessors_of(succ).iter().copied())
        .collect();

    counts.nk = citers
        .into_iter()
        .filter(|&other| other != node && !index.successors_of(other).contains(&node))
        .count();

    counts
}

fn record_for(index: &AdjacencyIndex, id: NodeId, min_in: usize, min_out: usize) -> DisruptionRecord {
    let in_degree = index.in_degree_of(id);
    let out_degree = index.out_degree_of(id);

    let outcome = if in_degree < min_in || out_degree < min_out {
        Outcome::Filtered
    } else {
        Outcome::Scored(classify(index, id))
    };

    DisruptionRecord {
        node: index.name(id).to_string(),
        in_degree,
        out_degree,
        outcome,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
