//! Performance benchmarks for merge and extraction.
//!
//! Run with: `cargo bench --bench merge`
//!
//! ## Workloads
//!
//! | Operation | Input | Notes |
//! |-----------|-------|-------|
//! | Identity lookup | 100k domains | Hot path of every merged vertex |
//! | Slice merge | 10k vertices, 50k edges | Plain-text snapshot on disk |
//! | Extraction | 10k nodes, 50k edges | n_hop 1 around one seed |
//! | Sampling | 50k edges | Budget 5k, 1% labeled |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::fmt::Write as _;
use tempfile::TempDir;

use temporal_webgraph::{
    Edge, EdgeSampler, ExtractionPolicy, IdentityStore, Node, NodeId, SliceInput,
    SubnetworkExtractor, TemporalGraph, TemporalMerger, TimeMarker,
};

const NODES: u64 = 10_000;
const EDGES: usize = 50_000;

fn random_edges(seed: u64) -> Vec<(u64, u64)> {
    let mut rng = SmallRng::seed_from_u64(seed);
    (0..EDGES)
        .map(|_| (rng.gen_range(0..NODES), rng.gen_range(0..NODES)))
        .collect()
}

fn write_snapshot(dir: &TempDir) -> SliceInput {
    let mut vertices = String::new();
    for i in 0..NODES {
        let _ = writeln!(vertices, "{i}\tdomain{i}.example.com");
    }
    let mut edges = String::new();
    for (src, dst) in random_edges(7) {
        let _ = writeln!(edges, "{src} {dst}");
    }
    let v = dir.path().join("vertices.txt");
    let e = dir.path().join("edges.txt");
    std::fs::write(&v, vertices).unwrap();
    std::fs::write(&e, edges).unwrap();
    SliceInput::new(v, e, TimeMarker::new(20240101))
}

fn bench_identity(c: &mut Criterion) {
    let domains: Vec<String> = (0..100_000).map(|i| format!("d{i}.org")).collect();
    let mut group = c.benchmark_group("identity");
    group.throughput(Throughput::Elements(domains.len() as u64));
    group.bench_function("lookup_or_create", |b| {
        b.iter(|| {
            let mut store = IdentityStore::new();
            for d in &domains {
                black_box(store.lookup_or_create(d, TimeMarker::new(1)));
            }
            store
        })
    });
    group.finish();
}

fn bench_merge(c: &mut Criterion) {
    let dir = TempDir::new().unwrap();
    let input = write_snapshot(&dir);
    let merger = TemporalMerger::new();

    let mut group = c.benchmark_group("merge");
    group.throughput(Throughput::Elements(EDGES as u64));
    group.sample_size(10);
    group.bench_function("add_slice", |b| {
        b.iter(|| {
            let mut graph = TemporalGraph::new();
            merger.add_slice(&mut graph, black_box(&input)).unwrap();
            graph
        })
    });
    group.finish();
}

fn bench_extract(c: &mut Criterion) {
    let t = TimeMarker::new(1);
    let nodes: Vec<Node> = (0..NODES)
        .map(|i| Node::domain(NodeId::new(i), format!("domain{i}.example.com"), t))
        .collect();
    let edges: Vec<Edge> = random_edges(11)
        .into_iter()
        .map(|(s, d)| Edge::hyperlink(NodeId::new(s), NodeId::new(d), t))
        .collect();

    let mut group = c.benchmark_group("extract");
    for n_hop in [0u32, 1] {
        let extractor = SubnetworkExtractor::new(nodes.clone(), edges.clone(), ExtractionPolicy::new(n_hop));
        group.bench_with_input(BenchmarkId::new("n_hop", n_hop), &extractor, |b, ex| {
            b.iter(|| ex.extract(black_box("domain42.example.com"), None))
        });
    }
    group.finish();
}

fn bench_sample(c: &mut Criterion) {
    let t = TimeMarker::new(1);
    let edges: Vec<Edge> = random_edges(13)
        .into_iter()
        .map(|(s, d)| Edge::hyperlink(NodeId::new(s), NodeId::new(d), t))
        .collect();
    let labeled: Vec<NodeId> = (0..NODES).step_by(100).map(NodeId::new).collect();

    let mut group = c.benchmark_group("sample");
    group.throughput(Throughput::Elements(edges.len() as u64));
    group.bench_function("reservoir_5k", |b| {
        b.iter(|| {
            let mut sampler = EdgeSampler::seeded(labeled.iter().copied(), 5_000, 42);
            sampler.sample(edges.iter().copied())
        })
    });
    group.finish();
}

criterion_group!(benches, bench_identity, bench_merge, bench_extract, bench_sample);
criterion_main!(benches);
