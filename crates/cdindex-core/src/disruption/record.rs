//! Per-node disruption records.

use serde::Serialize;

/// The three counts behind a node's disruption index.
///
/// - `ni`: predecessors whose successors do not overlap the node's successors.
/// - `nj`: predecessors whose successors do overlap the node's successors.
/// - `nk`: nodes that cite one of the node's successors without citing the
///   node itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct DisruptionCounts {
    pub ni: usize,
    pub nj: usize,
    pub nk: usize,
}

impl DisruptionCounts {
    /// `ni + nj + nk`.
    #[must_use]
    pub const fn denominator(&self) -> usize {
        self.ni + self.nj + self.nk
    }

    /// The disruption index `(ni - nj) / (ni + nj + nk)`.
    ///
    /// Returns `None` when the denominator is zero; this is a defined
    /// degenerate value, not an error.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn cd(&self) -> Option<f64> {
        let denom = self.denominator();
        if denom == 0 {
            return None;
        }
        Some((self.ni as f64 - self.nj as f64) / denom as f64)
    }
}

/// What the engine produced for a node besides its degrees.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The node passed the degree filter and was classified.
    Scored(DisruptionCounts),
    /// The node failed the degree filter; its counts are undefined.
    Filtered,
    /// The run hit its deadline before reaching this node.
    Skipped,
}

/// One output row: a node, its degrees, and its disruption outcome.
#[derive(Debug, Clone, PartialEq)]
pub struct DisruptionRecord {
    pub node: String,
    pub in_degree: usize,
    pub out_degree: usize,
    pub outcome: Outcome,
}

impl DisruptionRecord {
    /// Counts for a scored node, `None` otherwise.
    #[must_use]
    pub const fn counts(&self) -> Option<DisruptionCounts> {
        match self.outcome {
            Outcome::Scored(counts) => Some(counts),
            Outcome::Filtered | Outcome::Skipped => None,
        }
    }

    #[must_use]
    pub const fn is_scored(&self) -> bool {
        matches!(self.outcome, Outcome::Scored(_))
    }

    #[must_use]
    pub fn ni(&self) -> Option<usize> {
        self.counts().map(|c| c.ni)
    }

    #[must_use]
    pub fn nj(&self) -> Option<usize> {
        self.counts().map(|c| c.nj)
    }

    #[must_use]
    pub fn nk(&self) -> Option<usize> {
        self.counts().map(|c| c.nk)
    }

    /// Disruption index; `None` for unscored nodes and zero denominators.
    #[must_use]
    pub fn cd(&self) -> Option<f64> {
        self.counts().and_then(|c| c.cd())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cd_of_exclusive_citers_is_one() {
        let counts = DisruptionCounts { ni: 2, nj: 0, nk: 0 };
        assert_eq!(counts.cd(), Some(1.0));
    }

    #[test]
    fn cd_of_overlapping_citers_is_minus_one() {
        let counts = DisruptionCounts { ni: 0, nj: 3, nk: 0 };
        assert_eq!(counts.cd(), Some(-1.0));
    }

    #[test]
    fn zero_denominator_is_undefined() {
        assert_eq!(DisruptionCounts::default().cd(), None);
    }

    #[test]
    fn filtered_record_has_no_counts() {
        let record = DisruptionRecord {
            node: "A".to_string(),
            in_degree: 0,
            out_degree: 4,
            outcome: Outcome::Filtered,
        };
        assert!(!record.is_scored());
        assert_eq!(record.ni(), None);
        assert_eq!(record.nj(), None);
        assert_eq!(record.nk(), None);
        assert_eq!(record.cd(), None);
        assert_eq!(record.out_degree, 4);
    }
}
