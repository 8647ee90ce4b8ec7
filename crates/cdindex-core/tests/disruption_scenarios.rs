//! Known-topology regression tests for the disruption index.
//!
//! Each test uses a hand-crafted graph whose counts were worked out by hand
//! and are hardcoded, so any change to classification or ordering shows up.

use std::path::Path;

use cdindex_core::disruption::{ComputeOptions, DisruptionCounts, Outcome, compute};
use cdindex_core::graph::{AdjacencyIndex, read_edges};
use cdindex_core::table::{ResultTable, TableFormat};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn index_of(edges: &[(&str, &str)]) -> AdjacencyIndex {
    AdjacencyIndex::build(edges.iter().copied())
}

fn scored(ni: usize, nj: usize, nk: usize) -> Outcome {
    Outcome::Scored(DisruptionCounts { ni, nj, nk })
}

fn csv_lines(text: &str, directed: bool) -> Vec<String> {
    let edges = read_edges(text.as_bytes(), Path::new("<test>")).expect("edge list parses");
    let index = if directed {
        AdjacencyIndex::build(edges)
    } else {
        AdjacencyIndex::build_undirected(edges)
    };
    let report = compute(&index, &ComputeOptions::default());
    ResultTable::from_report(report).to_delimited_text(',')
}

// ===========================================================================
// Scenario A: empty graph
// ===========================================================================

#[test]
fn empty_input_gives_header_only() {
    let lines = csv_lines("", true);
    assert_eq!(lines, vec!["node,ni,nj,nk,cd,in_degree,out_degree"]);
}

// ===========================================================================
// Scenario B: two exclusive citers of a sink
//
//   A → B ← C
// ===========================================================================

#[test]
fn two_citers_of_a_sink() {
    let report = compute(&index_of(&[("A", "B"), ("C", "B")]), &ComputeOptions::default());
    let b = report.get("B").expect("B present");
    assert_eq!((b.in_degree, b.out_degree), (2, 0));
    assert_eq!(b.outcome, scored(2, 0, 0));
    assert_eq!(b.cd(), Some(1.0));
}

// ===========================================================================
// Scenario C: predecessor fan-out does not matter for a sink
//
//   A → B, C → B, A → D, D → B
// ===========================================================================

#[test]
fn sink_score_ignores_predecessor_fan_out() {
    let report = compute(
        &index_of(&[("A", "B"), ("C", "B"), ("A", "D"), ("D", "B")]),
        &ComputeOptions::default(),
    );

    let b = report.get("B").expect("B present");
    assert_eq!(b.in_degree, 3);
    assert_eq!(b.outcome, scored(3, 0, 0));
    assert_eq!(b.cd(), Some(1.0));

    // D cites B; its citer A also cites B (nj), while C cites B without D (nk).
    let d = report.get("D").expect("D present");
    assert_eq!((d.in_degree, d.out_degree), (1, 1));
    assert_eq!(d.outcome, scored(0, 1, 1));
    assert_eq!(d.cd(), Some(-0.5));
}

#[test]
fn scenario_c_table_layout() {
    let lines = csv_lines("A B\nC B\nA D\nD B\n", true);
    assert_eq!(
        lines,
        vec![
            "node,ni,nj,nk,cd,in_degree,out_degree",
            "A,NaN,NaN,NaN,NaN,0,2",
            "B,3,0,0,1.0,3,0",
            "C,NaN,NaN,NaN,NaN,0,1",
            "D,0,1,1,-0.5,1,1",
        ]
    );
}

// ===========================================================================
// Scenario D: degree filter
// ===========================================================================

#[test]
fn filtered_source_keeps_degrees() {
    let report = compute(&index_of(&[("S", "T"), ("S", "U")]), &ComputeOptions::default());
    let s = report.get("S").expect("S present");
    assert_eq!(s.outcome, Outcome::Filtered);
    assert_eq!((s.in_degree, s.out_degree), (0, 2));
    assert!(s.ni().is_none() && s.nj().is_none() && s.nk().is_none() && s.cd().is_none());
}

#[test]
fn lowering_min_in_scores_sources() {
    let options = ComputeOptions {
        min_in: 0,
        ..ComputeOptions::default()
    };
    // S has no citers; T is also cited by X, who never cites S.
    let report = compute(&index_of(&[("S", "T"), ("X", "T")]), &options);
    let s = report.get("S").expect("S present");
    assert_eq!(s.outcome, scored(0, 0, 1));
    assert_eq!(s.cd(), Some(0.0));
}

// ===========================================================================
// Undirected input
// ===========================================================================

#[test]
fn undirected_chain() {
    // A - B - C as both directions.
    // B: O = P = {A, C}. A's successors {B} miss O, same for C → ni = 2.
    //    C = preds(A) ∪ preds(C) = {B}, excluded as self → nk = 0.
    // A: O = P = {B}. B's successors {A, C} miss O → ni = 1.
    //    preds(B) = {A, C}; C does not cite A → nk = 1.
    let lines = csv_lines("A B\nB C\n", false);
    assert_eq!(
        lines,
        vec![
            "node,ni,nj,nk,cd,in_degree,out_degree",
            "A,1,0,1,0.5,1,1",
            "B,2,0,0,1.0,2,2",
            "C,1,0,1,0.5,1,1",
        ]
    );
}

// ===========================================================================
// Output formats
// ===========================================================================

#[test]
fn json_and_csv_agree_on_rows() {
    let index = index_of(&[("A", "B"), ("C", "B"), ("A", "D"), ("D", "B")]);
    let table = ResultTable::from_report(compute(&index, &ComputeOptions::default()));

    let json: serde_json::Value =
        serde_json::from_str(&table.render(TableFormat::Json).expect("json")).expect("parse");
    let rows = json.as_array().expect("array");
    assert_eq!(rows.len(), table.len());
    let nodes: Vec<&str> = rows.iter().filter_map(|r| r["node"].as_str()).collect();
    assert_eq!(nodes, ["A", "B", "C", "D"]);
    assert_eq!(rows[3]["cd"], -0.5);
}
