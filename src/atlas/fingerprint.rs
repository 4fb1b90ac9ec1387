//! Graph fingerprint for deterministic dataset versioning.
//!
//! A `GraphFingerprint` captures the state of the merged graph at persist
//! time. Downstream artifacts (subnetworks, samples) can record its
//! `fingerprint_id` to prove which merged graph they were computed from.

use serde::{Deserialize, Serialize};
use std::hash::Hasher;
use xxhash_rust::xxh64::Xxh64;

use crate::types::{Edge, Node};
use crate::WEBGRAPH_SCHEMA_VERSION;

/// A deterministic fingerprint of the merged graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphFingerprint {
    /// Unique identifier (xxh64 of all components).
    pub fingerprint_id: String,
    /// Total number of nodes (domains and articles).
    pub node_count: u64,
    /// Total number of edges.
    pub edge_count: u64,
    /// Largest time marker on any edge.
    pub max_time_marker: i64,
    /// Schema version used for types.
    pub schema_version: String,
    /// Hash of `(id, domain_or_url)` pairs in id order.
    pub node_hash: String,
    /// Hash of edges in canonical order.
    pub edge_hash: String,
}

impl GraphFingerprint {
    /// Compute a fingerprint from nodes and edges.
    ///
    /// Input order does not matter: both sequences are sorted before hashing.
    pub fn compute(nodes: &[Node], edges: &[Edge]) -> Self {
        let mut node_keys: Vec<(u64, &str)> = nodes
            .iter()
            .map(|n| (n.id.as_u64(), n.domain_or_url.as_str()))
            .collect();
        node_keys.sort_unstable();

        let mut hasher = Xxh64::new(0);
        for (id, name) in &node_keys {
            hasher.write(&id.to_le_bytes());
            hasher.write(name.as_bytes());
            hasher.write(&[0]);
        }
        let node_hash = format!("{:016x}", hasher.finish());

        let mut sorted_edges: Vec<&Edge> = edges.iter().collect();
        sorted_edges.sort_unstable();

        let mut hasher = Xxh64::new(0);
        for edge in &sorted_edges {
            hasher.write(&edge.src.as_u64().to_le_bytes());
            hasher.write(&edge.dst.as_u64().to_le_bytes());
            hasher.write(&edge.time_marker.as_i64().to_le_bytes());
            hasher.write(edge.edge_type.to_string().as_bytes());
        }
        let edge_hash = format!("{:016x}", hasher.finish());

        let node_count = nodes.len() as u64;
        let edge_count = edges.len() as u64;
        let max_time_marker = edges
            .iter()
            .map(|e| e.time_marker.as_i64())
            .max()
            .unwrap_or(0);

        let mut hasher = Xxh64::new(0);
        hasher.write(&node_count.to_le_bytes());
        hasher.write(&edge_count.to_le_bytes());
        hasher.write(&max_time_marker.to_le_bytes());
        hasher.write(WEBGRAPH_SCHEMA_VERSION.as_bytes());
        hasher.write(&[0]);
        hasher.write(node_hash.as_bytes());
        hasher.write(edge_hash.as_bytes());
        let fingerprint_id = format!("{:016x}", hasher.finish());

        Self {
            fingerprint_id,
            node_count,
            edge_count,
            max_time_marker,
            schema_version: WEBGRAPH_SCHEMA_VERSION.to_string(),
            node_hash,
            edge_hash,
        }
    }

    /// Verify that this fingerprint matches the given graph content.
    pub fn verify(&self, nodes: &[Node], edges: &[Edge]) -> bool {
        Self::compute(nodes, edges).fingerprint_id == self.fingerprint_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{NodeId, TimeMarker};

    fn sample() -> (Vec<Node>, Vec<Edge>) {
        let t = TimeMarker::new(20240101);
        let nodes = vec![
            Node::domain(NodeId::new(0), "a.com", t),
            Node::domain(NodeId::new(1), "b.com", t),
            Node::domain(NodeId::new(2), "c.com", t),
        ];
        let edges = vec![
            Edge::hyperlink(NodeId::new(0), NodeId::new(1), t),
            Edge::hyperlink(NodeId::new(1), NodeId::new(2), t),
        ];
        (nodes, edges)
    }

    #[test]
    fn test_fingerprint_determinism() {
        let (nodes, edges) = sample();
        let f1 = GraphFingerprint::compute(&nodes, &edges);
        let f2 = GraphFingerprint::compute(&nodes, &edges);
        assert_eq!(f1, f2);
        assert_eq!(f1.node_count, 3);
        assert_eq!(f1.edge_count, 2);
        assert_eq!(f1.max_time_marker, 20240101);
    }

    #[test]
    fn test_fingerprint_order_independence() {
        let (mut nodes, mut edges) = sample();
        let f1 = GraphFingerprint::compute(&nodes, &edges);
        nodes.reverse();
        edges.reverse();
        let f2 = GraphFingerprint::compute(&nodes, &edges);
        assert_eq!(f1.fingerprint_id, f2.fingerprint_id);
    }

    #[test]
    fn test_fingerprint_changes_on_new_edge() {
        let (nodes, mut edges) = sample();
        let before = GraphFingerprint::compute(&nodes, &edges);
        edges.push(Edge::hyperlink(NodeId::new(2), NodeId::new(0), TimeMarker::new(20240202)));
        assert!(!before.verify(&nodes, &edges));
    }
}
