//! Subnetwork extraction result.

use serde::{Deserialize, Serialize};

use super::edge::Edge;
use super::node::{Node, NodeId};

/// Induced subgraph reachable from one seed domain within the hop budget.
///
/// Vertices are sorted by id; edges are deduplicated on `(src, dst)` and
/// sorted, so the same inputs always yield the same result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubnetworkResult {
    /// Base domain the seed set was matched against.
    pub seed_domain: String,
    /// Label score attached to the seed, if any.
    pub score: Option<f64>,
    /// Node ids that matched the seed predicate.
    pub seed_ids: Vec<NodeId>,
    /// Vertices whose id was reached.
    pub vertices: Vec<Node>,
    /// Structural edges, one per `(src, dst)` pair.
    pub edges: Vec<Edge>,
    /// Expansion rounds actually performed.
    pub rounds: u32,
}

impl SubnetworkResult {
    /// Number of vertices.
    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    /// Number of edges.
    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    /// Whether a node id is part of the vertex set.
    pub fn contains_node(&self, id: NodeId) -> bool {
        self.vertices.binary_search_by(|n| n.id.cmp(&id)).is_ok()
    }

    /// Vertex ids in ascending order.
    pub fn vertex_ids(&self) -> Vec<NodeId> {
        self.vertices.iter().map(|n| n.id).collect()
    }

    /// Edge pairs in ascending order.
    pub fn edge_pairs(&self) -> Vec<(u64, u64)> {
        self.edges
            .iter()
            .map(|e| (e.src.as_u64(), e.dst.as_u64()))
            .collect()
    }
}
