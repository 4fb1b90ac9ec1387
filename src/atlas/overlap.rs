//! Pairwise slice overlap.
//!
//! Computes how many nodes two merged slices have in common, based on the
//! endpoints of each slice's hyperlink edges.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::hash::Hasher;
use xxhash_rust::xxh64::Xxh64;

use crate::types::{Edge, EdgeType, NodeId, TimeMarker};

/// An edge in the slice overlap graph.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SliceOverlapEdge {
    /// Earlier slice.
    pub slice_a: TimeMarker,
    /// Later slice.
    pub slice_b: TimeMarker,
    /// Number of shared nodes.
    pub shared_nodes: usize,
    /// Jaccard similarity: |A ∩ B| / |A ∪ B|.
    pub jaccard: f64,
}

impl SliceOverlapEdge {
    /// Create an overlap edge with `slice_a < slice_b`.
    pub fn new(a: TimeMarker, b: TimeMarker, shared_nodes: usize, jaccard: f64) -> Self {
        let (slice_a, slice_b) = if a <= b { (a, b) } else { (b, a) };
        Self {
            slice_a,
            slice_b,
            shared_nodes,
            jaccard,
        }
    }
}

/// Overlap between all pairs of merged slices.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SliceOverlapGraph {
    /// Pairs with at least one shared node, sorted by `(slice_a, slice_b)`.
    pub edges: Vec<SliceOverlapEdge>,
    /// Node count per slice.
    pub slice_sizes: BTreeMap<TimeMarker, usize>,
    /// Content hash for integrity verification.
    pub graph_hash: String,
}

impl SliceOverlapGraph {
    /// Overlap edges involving a slice.
    pub fn edges_for_slice(&self, slice: TimeMarker) -> Vec<&SliceOverlapEdge> {
        self.edges
            .iter()
            .filter(|e| e.slice_a == slice || e.slice_b == slice)
            .collect()
    }
}

/// Analyzer for computing slice overlaps.
#[derive(Debug, Clone, Copy)]
pub struct SliceOverlapAnalyzer {
    /// Minimum Jaccard similarity to include an edge.
    pub min_jaccard: f64,
}

impl SliceOverlapAnalyzer {
    /// Create an analyzer that keeps every non-empty overlap.
    pub fn new() -> Self {
        Self { min_jaccard: 0.0 }
    }

    /// Create an analyzer with a minimum Jaccard threshold.
    pub fn with_min_jaccard(min_jaccard: f64) -> Self {
        Self { min_jaccard }
    }

    /// Compute the overlap graph from an edge table.
    pub fn compute(&self, edges: &[Edge]) -> SliceOverlapGraph {
        let mut slices: BTreeMap<TimeMarker, BTreeSet<NodeId>> = BTreeMap::new();
        for edge in edges.iter().filter(|e| e.edge_type == EdgeType::Hyperlink) {
            let nodes = slices.entry(edge.time_marker).or_default();
            nodes.insert(edge.src);
            nodes.insert(edge.dst);
        }

        let ordered: Vec<(&TimeMarker, &BTreeSet<NodeId>)> = slices.iter().collect();
        let mut overlap = Vec::new();
        for i in 0..ordered.len() {
            for j in (i + 1)..ordered.len() {
                let (a, nodes_a) = ordered[i];
                let (b, nodes_b) = ordered[j];

                let shared = nodes_a.intersection(nodes_b).count();
                if shared == 0 {
                    continue;
                }
                let union_size = nodes_a.len() + nodes_b.len() - shared;
                let jaccard = shared as f64 / union_size as f64;
                if jaccard >= self.min_jaccard {
                    overlap.push(SliceOverlapEdge::new(*a, *b, shared, jaccard));
                }
            }
        }

        let mut hasher = Xxh64::new(0);
        for edge in &overlap {
            hasher.write(&edge.slice_a.as_i64().to_le_bytes());
            hasher.write(&edge.slice_b.as_i64().to_le_bytes());
            hasher.write(&(edge.shared_nodes as u64).to_le_bytes());
            hasher.write(&edge.jaccard.to_bits().to_le_bytes());
        }
        let graph_hash = format!("{:016x}", hasher.finish());
        SliceOverlapGraph {
            edges: overlap,
            slice_sizes: slices.iter().map(|(t, nodes)| (*t, nodes.len())).collect(),
            graph_hash,
        }
    }
}

impl Default for SliceOverlapAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}
