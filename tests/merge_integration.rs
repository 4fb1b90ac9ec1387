//! Integration tests for the temporal merge.
//!
//! These tests drive the merger over gzip snapshot fixtures and verify
//! idempotence, id stability, overlap accounting and persistence.

use flate2::write::GzEncoder;
use flate2::Compression;
use proptest::prelude::*;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use tempfile::TempDir;

use temporal_webgraph::store::{EDGES_TABLE, MANIFEST_FILE, NODES_TABLE};
use temporal_webgraph::{
    normalize_domain, EdgeSampler, FreshReason, LoadStatus, MergeError, NodeId, ReaderError,
    SliceInput, SliceOutcome, TemporalGraph, TemporalMerger, TimeMarker,
};

// ─────────────────────────────────────────────────────────────────────────────
// Test Helpers
// ─────────────────────────────────────────────────────────────────────────────

fn write_gz(path: &Path, body: &str) {
    let file = File::create(path).unwrap();
    let mut enc = GzEncoder::new(file, Compression::default());
    enc.write_all(body.as_bytes()).unwrap();
    enc.finish().unwrap();
}

/// Write a slice directory with `vertices.txt.gz` / `edges.txt.gz`.
fn slice(root: &TempDir, name: &str, vertices: &str, edges: &str, marker: i64) -> SliceInput {
    let dir = root.path().join(name);
    fs::create_dir_all(&dir).unwrap();
    let input = SliceInput::from_slice_dir(&dir, TimeMarker::new(marker));
    write_gz(&input.vertices_path, vertices);
    write_gz(&input.edges_path, edges);
    input
}

fn merged(outcome: SliceOutcome) -> temporal_webgraph::SliceReport {
    match outcome {
        SliceOutcome::Merged(report) => report,
        SliceOutcome::Skipped { time_marker } => panic!("slice {time_marker} unexpectedly skipped"),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Idempotence and id stability
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_merging_same_slice_twice_is_noop() {
    let root = TempDir::new().unwrap();
    let input = slice(&root, "s1", "0\ta.com\n1\tb.com\n2\tc.com\n", "0 1\n1 2\n", 20140310);
    let merger = TemporalMerger::new();

    let mut once = TemporalGraph::new();
    merger.add_slice(&mut once, &input).unwrap();

    let mut twice = TemporalGraph::new();
    merger.add_slice(&mut twice, &input).unwrap();
    let second = merger.add_slice(&mut twice, &input).unwrap();

    assert_eq!(second, SliceOutcome::Skipped { time_marker: TimeMarker::new(20140310) });
    assert_eq!(once, twice);
}

#[test]
fn test_ids_are_stable_and_monotonic_across_slices() {
    let root = TempDir::new().unwrap();
    let s1 = slice(&root, "s1", "0\ta.com\n1\tb.com\n", "0 1\n", 1);
    // Local numbering differs; b.com must keep its id.
    let s2 = slice(&root, "s2", "5\tc.com\n9\tB.COM\n", "5 9\n", 2);
    let merger = TemporalMerger::new();
    let mut graph = TemporalGraph::new();

    merger.add_slice(&mut graph, &s1).unwrap();
    let b_before = graph.identity().get("b.com").unwrap().id;
    merger.add_slice(&mut graph, &s2).unwrap();

    let identity = graph.identity();
    assert_eq!(identity.get("b.com").unwrap().id, b_before);
    assert_eq!(identity.get("a.com").unwrap().id, NodeId::new(0));
    assert_eq!(identity.get("c.com").unwrap().id, NodeId::new(2));
    assert_eq!(identity.get("b.com").unwrap().time_marker, Some(TimeMarker::new(2)));
    assert_eq!(identity.get("a.com").unwrap().time_marker, Some(TimeMarker::new(1)));

    let last = graph.edges().last().unwrap();
    assert_eq!(last.pair(), (NodeId::new(2), b_before));
    assert_eq!(last.time_marker, TimeMarker::new(2));
}

// ─────────────────────────────────────────────────────────────────────────────
// Overlap and soft errors
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_overlap_disjoint_slices_is_zero() {
    let root = TempDir::new().unwrap();
    let s1 = slice(&root, "s1", "0\ta.com\n1\tb.com\n", "0 1\n", 1);
    let s2 = slice(&root, "s2", "0\tc.com\n1\td.com\n", "0 1\n", 2);
    let merger = TemporalMerger::new();
    let mut graph = TemporalGraph::new();

    assert_eq!(merged(merger.add_slice(&mut graph, &s1).unwrap()).overlap_with_existing, 0);
    let report = merged(merger.add_slice(&mut graph, &s2).unwrap());
    assert_eq!(report.overlap_with_existing, 0);
    assert_eq!(report.new_nodes, 2);
}

#[test]
fn test_overlap_one_shared_domain() {
    let root = TempDir::new().unwrap();
    let s1 = slice(&root, "s1", "0\ta.com\n1\tb.com\n", "0 1\n", 1);
    let s2 = slice(&root, "s2", "0\thttp://www.b.com:80/\n1\tc.com\n", "0 1\n", 2);
    let merger = TemporalMerger::new();
    let mut graph = TemporalGraph::new();

    merger.add_slice(&mut graph, &s1).unwrap();
    let report = merged(merger.add_slice(&mut graph, &s2).unwrap());

    assert_eq!(report.overlap_with_existing, 1);
    assert_eq!(report.new_nodes, 1);
    assert_eq!(report.slice_nodes, 2);
    let c = graph.identity().get("c.com").unwrap().id;
    assert_eq!(report.new_ids().collect::<Vec<_>>(), vec![c]);
    assert_eq!(graph.slice_reports().len(), 2);
}

#[test]
fn test_undeclared_endpoints_and_bad_lines_are_counted() {
    let root = TempDir::new().unwrap();
    let input = slice(
        &root,
        "s1",
        "0\ta.com\nnot-a-line\n1\tb.com\n",
        "0 1\n0 7\nzz top\n1 0\n",
        1,
    );
    let mut graph = TemporalGraph::new();
    let report = merged(TemporalMerger::new().add_slice(&mut graph, &input).unwrap());

    assert_eq!(report.edges_added, 2);
    assert_eq!(report.dropped_edges, 1);
    assert_eq!(report.skipped_vertex_lines, 1);
    assert_eq!(report.skipped_edge_lines, 1);
    assert_eq!(graph.num_edges(), 2);
}

#[test]
fn test_corrupt_snapshot_leaves_graph_unchanged() {
    let root = TempDir::new().unwrap();
    let good = slice(&root, "s1", "0\ta.com\n", "", 1);
    let bad = slice(&root, "s2", "0\tb.com\n1\tc.com\n", "0 1\n", 2);
    fs::write(&bad.edges_path, b"\x1f\x8b truncated").unwrap();

    let merger = TemporalMerger::new();
    let mut graph = TemporalGraph::new();
    merger.add_slice(&mut graph, &good).unwrap();
    let before = graph.clone();

    let err = merger.add_slice(&mut graph, &bad).unwrap_err();
    assert!(matches!(err, MergeError::Reader(ReaderError::Read { .. })));
    assert_eq!(graph, before);
    assert!(graph.identity().get("b.com").is_none());
}

// ─────────────────────────────────────────────────────────────────────────────
// Persistence
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_persist_reload_then_continue() {
    let root = TempDir::new().unwrap();
    let store_dir = root.path().join("temporal");
    let s1 = slice(&root, "s1", "0\ta.com\n1\tb.com\n", "0 1\n", 1);
    let s2 = slice(&root, "s2", "0\tb.com\n1\tc.com\n", "0 1\n", 2);
    let merger = TemporalMerger::new();

    let (first, _) = merger.merge_into_dir(&store_dir, [&s1]).unwrap();
    assert!(store_dir.join(NODES_TABLE).exists());
    assert!(store_dir.join(EDGES_TABLE).exists());
    assert!(store_dir.join(MANIFEST_FILE).exists());

    // Re-running with the already merged slice is a no-op.
    let (again, outcomes) = merger.merge_into_dir(&store_dir, [&s1, &s2]).unwrap();
    assert!(outcomes[0].is_skipped());
    assert_eq!(again.identity().get("a.com").unwrap().id, first.identity().get("a.com").unwrap().id);
    assert_eq!(again.identity().get("c.com").unwrap().id, NodeId::new(2));
    assert_eq!(again.num_edges(), 2);

    let (reloaded, status) = TemporalGraph::load(&store_dir).unwrap();
    assert_eq!(status, LoadStatus::Loaded { nodes: 3, edges: 2 });
    assert_eq!(reloaded, again);
}

#[test]
fn test_missing_and_malformed_tables_start_fresh() {
    let root = TempDir::new().unwrap();
    let (_, status) = TemporalGraph::load(root.path()).unwrap();
    assert_eq!(status, LoadStatus::Fresh(FreshReason::Missing));

    fs::write(root.path().join(NODES_TABLE), "domain,node_id,time_id\n").unwrap();
    fs::write(root.path().join(EDGES_TABLE), "src,dst,time_id,edge_type\n1,2,3,teleport\n").unwrap();
    let (graph, status) = TemporalGraph::load(root.path()).unwrap();
    assert!(matches!(status, LoadStatus::Fresh(FreshReason::Malformed(_))));
    assert_eq!(graph.num_edges(), 0);
}

// ─────────────────────────────────────────────────────────────────────────────
// Properties
// ─────────────────────────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn prop_url_forms_normalize_to_host(
        host in "[a-z][a-z0-9]{0,8}(\\.[a-z][a-z0-9]{0,8}){1,3}",
        port in proptest::option::of(1u16..=65535),
        upper in any::<bool>(),
    ) {
        prop_assume!(!host.starts_with("www."));
        let port_part = port.map(|p| format!(":{p}")).unwrap_or_default();
        let raw = format!("http://www.{host}{port_part}/path?q=1");
        let raw = if upper { raw.to_uppercase() } else { raw };

        prop_assert_eq!(normalize_domain(&raw), host.clone());
        prop_assert_eq!(normalize_domain(&host), host);
    }

    #[test]
    fn prop_normalize_is_total_and_lowercase(raw in "\\PC{0,40}") {
        let out = normalize_domain(&raw);
        prop_assert!(!out.bytes().any(|b| b.is_ascii_uppercase()));
    }

    #[test]
    fn prop_sampler_respects_budget(
        n in 0usize..400,
        max_edges in 0usize..64,
        labeled_every in 1usize..20,
        seed in any::<u64>(),
    ) {
        let edges: Vec<(i64, i64)> = (0..n as i64).map(|i| (i, i + 1)).collect();
        let labeled: Vec<i64> = (0..n as i64).step_by(labeled_every).collect();
        let labeled_edges = edges
            .iter()
            .filter(|(s, d)| labeled.contains(s) || labeled.contains(d))
            .count();

        let result = EdgeSampler::seeded(labeled, max_edges, seed).sample(edges.clone());

        prop_assert!(result.edges.len() <= max_edges);
        prop_assert_eq!(result.edges.len(), n.min(max_edges));
        prop_assert_eq!(result.labeled_kept, labeled_edges.min(max_edges));
        if labeled_edges >= max_edges {
            prop_assert_eq!(result.reservoir_kept, 0);
        }
    }
}
