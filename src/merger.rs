//! Temporal merger: folds one crawl snapshot into the running graph.
//!
//! ## Algorithm
//!
//! 1. Skip the slice if its time marker is already merged
//! 2. Open both snapshot files (any failure aborts before reading)
//! 3. Stream vertices, resolving each domain to its existing global id or a
//!    provisional one (`next_id + pending`), building the local → global map
//! 4. Stream edges, re-keying both endpoints through the local map; edges
//!    with an undeclared endpoint are dropped and counted
//! 5. Commit: create the pending domains in first-seen order (so they
//!    receive exactly their provisional ids), refresh last-seen markers,
//!    append the staged edges and record the slice report
//!
//! Nothing touches the graph before step 5, so a read failure in steps 2-4
//! leaves it unchanged.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use crate::reader::{read_edges, read_vertices, ReaderError};
use crate::store::{IdentityStore, LoadStatus, StoreError, TemporalGraph};
use crate::types::{Edge, NodeId, SliceInput, SliceOutcome, SliceReport};

/// Error type for merge operations.
///
/// Returned only for fatal I/O. Malformed lines, dropped edges and
/// already-merged slices are reported in [`SliceOutcome`].
#[derive(Debug, thiserror::Error)]
pub enum MergeError {
    /// A snapshot file could not be opened or read.
    #[error("Snapshot error: {0}")]
    Reader(#[from] ReaderError),
    /// Persisted tables could not be loaded or written.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Merges snapshots into a [`TemporalGraph`].
///
/// Single-writer: callers must serialize `add_slice` calls against one graph.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemporalMerger;

/// Slice domains resolved against the identity store but not yet committed.
struct StagedIdentities<'a> {
    identity: &'a IdentityStore,
    /// Distinct slice domains in first-seen order, with their resolved id.
    domains: Vec<(String, NodeId)>,
    by_domain: HashMap<String, NodeId>,
    pending: u64,
}

impl<'a> StagedIdentities<'a> {
    fn new(identity: &'a IdentityStore) -> Self {
        Self {
            identity,
            domains: Vec::new(),
            by_domain: HashMap::new(),
            pending: 0,
        }
    }

    fn resolve(&mut self, domain: String) -> NodeId {
        if let Some(id) = self.by_domain.get(&domain) {
            return *id;
        }
        let id = match self.identity.get(&domain) {
            Some(entry) => entry.id,
            None => {
                let id = NodeId::new(self.identity.next_id().as_u64() + self.pending);
                self.pending += 1;
                id
            }
        };
        self.by_domain.insert(domain.clone(), id);
        self.domains.push((domain, id));
        id
    }
}

impl TemporalMerger {
    /// Create a merger.
    pub fn new() -> Self {
        Self
    }

    /// Merge one slice into `graph`.
    ///
    /// Returns [`SliceOutcome::Skipped`] if the marker is already present.
    /// On error the graph is left exactly as it was.
    pub fn add_slice(&self, graph: &mut TemporalGraph, input: &SliceInput) -> Result<SliceOutcome, MergeError> {
        let time_marker = input.time_marker;
        if graph.has_time_marker(time_marker) {
            tracing::info!(time_marker = %time_marker, "Slice already merged, skipping");
            return Ok(SliceOutcome::Skipped { time_marker });
        }

        let mut vertices = read_vertices(&input.vertices_path)?;
        let mut edges = read_edges(&input.edges_path)?;

        let watermark = graph.identity().next_id();
        let mut staged = StagedIdentities::new(graph.identity());
        let mut local_to_global: HashMap<i64, NodeId> = HashMap::new();

        for record in vertices.by_ref() {
            let (local_id, domain) = record?;
            let global = staged.resolve(domain);
            local_to_global.insert(local_id, global);
        }

        let mut staged_edges = Vec::new();
        let mut dropped_edges = 0u64;
        for record in edges.by_ref() {
            let (local_src, local_dst) = record?;
            match (local_to_global.get(&local_src), local_to_global.get(&local_dst)) {
                (Some(&src), Some(&dst)) => staged_edges.push(Edge::hyperlink(src, dst, time_marker)),
                _ => dropped_edges += 1,
            }
        }

        let slice_ids: HashSet<NodeId> = staged.domains.iter().map(|(_, id)| *id).collect();
        let overlap = slice_ids
            .iter()
            .filter(|id| IdentityStore::is_known_before(**id, watermark))
            .count() as u64;
        let new_nodes = staged.pending;
        let domains = staged.domains;

        // Commit.
        let identity = graph.identity_mut();
        for (domain, provisional) in &domains {
            let id = identity.lookup_or_create(domain, time_marker);
            debug_assert_eq!(id, *provisional);
        }

        let report = SliceReport {
            time_marker,
            vertices_read: vertices.records_read(),
            slice_nodes: slice_ids.len() as u64,
            new_nodes,
            first_new_id: (new_nodes > 0).then_some(watermark),
            overlap_with_existing: overlap,
            edges_added: staged_edges.len() as u64,
            dropped_edges,
            skipped_vertex_lines: vertices.skipped_lines(),
            skipped_edge_lines: edges.skipped_lines(),
        };

        graph.extend_edges(staged_edges);
        graph.record_slice(report.clone());

        tracing::info!(
            time_marker = %time_marker,
            slice_nodes = report.slice_nodes,
            new_nodes = report.new_nodes,
            overlap = report.overlap_with_existing,
            edges_added = report.edges_added,
            dropped_edges = report.dropped_edges,
            skipped_lines = report.skipped_lines(),
            "Merged slice"
        );

        Ok(SliceOutcome::Merged(report))
    }

    /// Merge slices strictly in the given order.
    ///
    /// Stops at the first fatal error; slices merged before it stay merged.
    pub fn add_slices<'i, I>(&self, graph: &mut TemporalGraph, inputs: I) -> Result<Vec<SliceOutcome>, MergeError>
    where
        I: IntoIterator<Item = &'i SliceInput>,
    {
        inputs
            .into_iter()
            .map(|input| self.add_slice(graph, input))
            .collect()
    }

    /// Load the graph persisted in `dir`, merge `inputs` and persist it back.
    ///
    /// Nothing is persisted if any slice fails.
    pub fn merge_into_dir<'i, I>(
        &self,
        dir: impl AsRef<Path>,
        inputs: I,
    ) -> Result<(TemporalGraph, Vec<SliceOutcome>), MergeError>
    where
        I: IntoIterator<Item = &'i SliceInput>,
    {
        let dir = dir.as_ref();
        let (mut graph, status) = TemporalGraph::load(dir)?;
        if let LoadStatus::Fresh(reason) = &status {
            tracing::info!(dir = %dir.display(), reason = ?reason, "Starting a new temporal graph");
        }
        let outcomes = self.add_slices(&mut graph, inputs)?;
        graph.persist(dir)?;
        Ok((graph, outcomes))
    }
}
