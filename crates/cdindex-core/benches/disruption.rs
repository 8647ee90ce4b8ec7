use std::hint::black_box;

use cdindex_core::disruption::{ComputeOptions, compute};
use cdindex_core::graph::AdjacencyIndex;
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// (name, nodes, mean out-degree)
const TIERS: [(&str, usize, usize); 3] = [("small", 500, 4), ("medium", 5_000, 8), ("large", 20_000, 12)];

/// Citation-like graph: each node cites earlier nodes, favoring recent ones.
fn synthetic_edges(nodes: usize, out_degree: usize, seed: u64) -> Vec<(String, String)> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut edges = Vec::with_capacity(nodes * out_degree);
    for node in 1..nodes {
        let window = node.min(nodes / 10 + 1);
        for _ in 0..rng.gen_range(0..=out_degree * 2) {
            let cited = node - rng.gen_range(1..=window);
            edges.push((format!("p{node}"), format!("p{cited}")));
        }
    }
    edges
}

fn bench_compute(c: &mut Criterion) {
    let mut group = c.benchmark_group("disruption.compute");
    group.sample_size(10);

    for (name, nodes, out_degree) in TIERS {
        let index = AdjacencyIndex::build(synthetic_edges(nodes, out_degree, 0xCD_u64 + nodes as u64));
        group.throughput(Throughput::Elements(index.node_count() as u64));

        group.bench_with_input(BenchmarkId::new("sequential", name), &index, |b, index| {
            b.iter(|| black_box(compute(index, &ComputeOptions::default())));
        });

        let parallel = ComputeOptions {
            parallel: true,
            ..ComputeOptions::default()
        };
        group.bench_with_input(BenchmarkId::new("parallel", name), &index, |b, index| {
            b.iter(|| black_box(compute(index, &parallel)));
        });
    }

    group.finish();
}

fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("disruption.index");

    for (name, nodes, out_degree) in TIERS {
        let edges = synthetic_edges(nodes, out_degree, 0xB1_u64 + nodes as u64);
        group.throughput(Throughput::Elements(edges.len() as u64));

        group.bench_with_input(BenchmarkId::new("directed", name), &edges, |b, edges| {
            b.iter(|| black_box(AdjacencyIndex::build(edges.iter().map(|(s, t)| (s, t)))));
        });
        group.bench_with_input(BenchmarkId::new("undirected", name), &edges, |b, edges| {
            b.iter(|| {
                black_box(AdjacencyIndex::build_undirected(
                    edges.iter().map(|(s, t)| (s, t)),
                ))
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_compute, bench_build);
criterion_main!(benches);
