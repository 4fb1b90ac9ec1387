//! Web Graph Pipeline Binary
//!
//! Runs the batch pipeline:
//! - Load the persisted temporal graph (or start fresh)
//! - Merge the configured slices strictly in order
//! - Persist the merged tables
//! - Optionally sample a bounded edge set and extract seed subnetworks
//!
//! ## Configuration
//!
//! Environment variables:
//! - `WEBGRAPH_TEMPORAL_DIR`: merged tables directory (default: data/crawl-data/temporal)
//! - `WEBGRAPH_SLICES_ROOT`: directory holding slice directories (default: data/crawl-data)
//! - `WEBGRAPH_SLICES`: comma-separated `name:YYYYMMDD` slices to merge
//! - `WEBGRAPH_SUBNETWORK_DIR`: extraction output (default: data/crawl-data/sub-networks)
//! - `WEBGRAPH_LABELS`: `domain,pc1` label CSV; empty disables extraction
//! - `WEBGRAPH_N_HOP`: extraction hop count (default: 1)
//! - `WEBGRAPH_MAX_EDGES`: edge budget; enables sampling
//! - `WEBGRAPH_SAMPLE_SEED`: sampling seed (default: 42)
//! - `RUST_LOG`: Log level filter (default: info)
//! - `LOG_FORMAT`: "json" for structured logs, "pretty" for development (default: json)
//!
//! ## Usage
//!
//! ```bash
//! WEBGRAPH_SLICES=CC-MAIN-2014-10:20140310 LOG_FORMAT=pretty cargo run --bin webgraph_pipeline
//! ```

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use tracing::{info, warn};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

use temporal_webgraph::atlas::{DegreeStats, SliceOverlapAnalyzer};
use temporal_webgraph::store::tables::write_edge_rows;
use temporal_webgraph::{
    EdgeSampler, LabelTable, PipelineConfig, SliceOutcome, SubnetworkExtractor, TemporalMerger,
};

/// File written by the sampling step inside the temporal directory.
const SAMPLED_EDGES_FILE: &str = "sampled_edges.csv";

/// Initialize the tracing subscriber with JSON or pretty format
fn init_tracing() {
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "json".to_string());

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "webgraph_pipeline=info,temporal_webgraph=info".into());

    if log_format == "pretty" {
        // Pretty format for local development
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_span_events(FmtSpan::CLOSE))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_current_span(true)
                    .flatten_event(true),
            )
            .init();
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let config = PipelineConfig::from_env()?;
    info!(
        temporal_dir = %config.temporal_dir.display(),
        slices = config.slices.len(),
        n_hop = config.n_hop,
        max_edges = ?config.max_edges,
        "Starting web graph pipeline"
    );

    let inputs = config.slice_inputs();
    let (graph, outcomes) = TemporalMerger::new().merge_into_dir(&config.temporal_dir, &inputs)?;

    let skipped = outcomes.iter().filter(|o| o.is_skipped()).count();
    let new_nodes: u64 = outcomes
        .iter()
        .filter_map(SliceOutcome::report)
        .map(|r| r.new_nodes)
        .sum();
    info!(
        merged = outcomes.len() - skipped,
        skipped,
        new_nodes,
        nodes = graph.num_nodes(),
        edges = graph.num_edges(),
        "Merge finished"
    );

    let nodes = graph.nodes();
    let degrees = DegreeStats::compute(&nodes, graph.edges());
    info!(
        isolated = degrees.isolated,
        max_in_degree = degrees.max_in_degree,
        max_out_degree = degrees.max_out_degree,
        mean_degree = degrees.mean_degree,
        "Degree statistics"
    );
    let overlap = SliceOverlapAnalyzer::new().compute(graph.edges());
    for edge in &overlap.edges {
        info!(
            slice_a = %edge.slice_a,
            slice_b = %edge.slice_b,
            shared_nodes = edge.shared_nodes,
            jaccard = edge.jaccard,
            "Slice overlap"
        );
    }

    let labels = match &config.labels_path {
        Some(path) if path.exists() => Some(LabelTable::read(path)?),
        Some(path) => {
            warn!(path = %path.display(), "Label file not found, skipping sampling priority and extraction");
            None
        }
        None => None,
    };

    if let Some(max_edges) = config.max_edges {
        let labeled = labels
            .as_ref()
            .map(|table| graph.identity().resolve_labels(table.domains()))
            .unwrap_or_default();
        let mut sampler = EdgeSampler::seeded(labeled, max_edges, config.sample_seed);
        let sample = sampler.sample(graph.edges().iter().copied());

        let path = config.temporal_dir.join(SAMPLED_EDGES_FILE);
        write_sample(&path, &sample.edges)?;
        info!(
            path = %path.display(),
            labeled_kept = sample.labeled_kept,
            reservoir_kept = sample.reservoir_kept,
            "Wrote sampled edges"
        );
    }

    if let Some(labels) = labels {
        let extractor = SubnetworkExtractor::new(nodes, graph.edges().to_vec(), config.extraction_policy());
        extractor.extract_all(&labels, &config.subnetwork_dir)?;
    }

    info!("Pipeline complete");
    Ok(())
}

fn write_sample(path: &Path, edges: &[temporal_webgraph::Edge]) -> Result<(), Box<dyn std::error::Error>> {
    let file = File::create(path)?;
    write_edge_rows(BufWriter::new(file), edges)?;
    Ok(())
}
