use std::collections::HashSet;

use cdindex_core::disruption::{ComputeOptions, Outcome, compute, compute_node};
use cdindex_core::graph::AdjacencyIndex;
use cdindex_core::table::ResultTable;
use proptest::prelude::*;

/// Edge lists over a small alphabet so neighborhoods overlap often.
fn arb_edges() -> impl Strategy<Value = Vec<(String, String)>> {
    prop::collection::vec((0u8..12, 0u8..12), 0..60).prop_map(|pairs| {
        pairs
            .into_iter()
            .map(|(a, b)| (format!("n{a}"), format!("n{b}")))
            .collect()
    })
}

fn arb_options() -> impl Strategy<Value = ComputeOptions> {
    (0usize..4, 0usize..4).prop_map(|(min_in, min_out)| ComputeOptions {
        min_in,
        min_out,
        ..ComputeOptions::default()
    })
}

proptest! {
    #![proptest_config(proptest::test_runner::Config::with_cases(512))]

    #[test]
    fn buckets_partition_predecessors(edges in arb_edges()) {
        let index = AdjacencyIndex::build(edges);
        let options = ComputeOptions { min_in: 0, ..ComputeOptions::default() };
        for record in compute(&index, &options).records {
            let counts = record.counts().expect("nothing filtered at min_in 0");
            prop_assert_eq!(counts.ni + counts.nj, record.in_degree);
        }
    }

    #[test]
    fn cd_stays_in_unit_range(edges in arb_edges(), options in arb_options()) {
        let index = AdjacencyIndex::build(edges);
        for record in compute(&index, &options).records {
            if let Some(cd) = record.cd() {
                prop_assert!((-1.0..=1.0).contains(&cd), "cd {} for {}", cd, record.node);
            }
        }
    }

    #[test]
    fn filter_matches_degrees(edges in arb_edges(), options in arb_options()) {
        let index = AdjacencyIndex::build(edges);
        for record in compute(&index, &options).records {
            let excluded = record.in_degree < options.min_in || record.out_degree < options.min_out;
            prop_assert_eq!(excluded, record.outcome == Outcome::Filtered);
            if excluded {
                prop_assert!(record.ni().is_none() && record.cd().is_none());
            }
        }
    }

    #[test]
    fn one_row_per_distinct_node_in_first_seen_order(edges in arb_edges()) {
        let mut seen = HashSet::new();
        let mut expected = Vec::new();
        for (source, target) in &edges {
            for node in [source, target] {
                if seen.insert(node.clone()) {
                    expected.push(node.clone());
                }
            }
        }

        let index = AdjacencyIndex::build(edges);
        let table = ResultTable::from_report(compute(&index, &ComputeOptions::default()));
        let nodes: Vec<String> = table.records().iter().map(|r| r.node.clone()).collect();
        prop_assert_eq!(nodes, expected);
        prop_assert_eq!(table.to_delimited_text(',').len(), table.len() + 1);
    }

    #[test]
    fn parallel_run_is_identical(edges in arb_edges(), options in arb_options()) {
        let index = AdjacencyIndex::build(edges);
        let sequential = compute(&index, &options);
        let parallel = compute(&index, &ComputeOptions { parallel: true, ..options });
        prop_assert_eq!(sequential, parallel);
    }

    #[test]
    fn single_node_matches_full_run(edges in arb_edges(), options in arb_options()) {
        let index = AdjacencyIndex::build(edges);
        let report = compute(&index, &options);
        for record in &report.records {
            let single = compute_node(&index, &record.node, options.min_in, options.min_out)
                .expect("node exists");
            prop_assert_eq!(&single, record);
        }
    }

    #[test]
    fn undirected_degrees_are_symmetric(edges in arb_edges()) {
        let index = AdjacencyIndex::build_undirected(edges);
        for node in index.nodes() {
            prop_assert_eq!(
                index.in_degree(node).expect("known"),
                index.out_degree(node).expect("known")
            );
        }
    }
}
