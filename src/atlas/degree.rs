//! Degree statistics over the edge table.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::types::{Edge, Node, NodeId};

/// Number of hubs reported by default.
pub const DEFAULT_TOP_HUBS: usize = 10;

/// Degree of one node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeDegree {
    /// Node id.
    pub id: NodeId,
    /// Incoming edges.
    pub in_degree: u64,
    /// Outgoing edges.
    pub out_degree: u64,
}

impl NodeDegree {
    /// In plus out degree.
    pub fn total(&self) -> u64 {
        self.in_degree + self.out_degree
    }
}

/// Summary of the degree distribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DegreeStats {
    /// Nodes considered (table nodes plus edge endpoints).
    pub num_nodes: usize,
    /// Edges counted, duplicates included.
    pub num_edges: usize,
    /// Nodes with no incident edge.
    pub isolated: usize,
    /// Largest in-degree.
    pub max_in_degree: u64,
    /// Largest out-degree.
    pub max_out_degree: u64,
    /// Mean total degree.
    pub mean_degree: f64,
    /// Highest total-degree nodes, ties broken by id.
    pub top_hubs: Vec<NodeDegree>,
}

impl DegreeStats {
    /// Compute statistics with [`DEFAULT_TOP_HUBS`] hubs.
    pub fn compute(nodes: &[Node], edges: &[Edge]) -> Self {
        Self::compute_with_top(nodes, edges, DEFAULT_TOP_HUBS)
    }

    /// Compute statistics reporting `top` hubs.
    pub fn compute_with_top(nodes: &[Node], edges: &[Edge], top: usize) -> Self {
        let mut degrees: BTreeMap<NodeId, NodeDegree> = nodes
            .iter()
            .map(|n| {
                (
                    n.id,
                    NodeDegree {
                        id: n.id,
                        in_degree: 0,
                        out_degree: 0,
                    },
                )
            })
            .collect();

        for edge in edges {
            degrees
                .entry(edge.src)
                .or_insert(NodeDegree {
                    id: edge.src,
                    in_degree: 0,
                    out_degree: 0,
                })
                .out_degree += 1;
            degrees
                .entry(edge.dst)
                .or_insert(NodeDegree {
                    id: edge.dst,
                    in_degree: 0,
                    out_degree: 0,
                })
                .in_degree += 1;
        }

        let num_nodes = degrees.len();
        let isolated = degrees.values().filter(|d| d.total() == 0).count();
        let max_in_degree = degrees.values().map(|d| d.in_degree).max().unwrap_or(0);
        let max_out_degree = degrees.values().map(|d| d.out_degree).max().unwrap_or(0);
        let mean_degree = if num_nodes == 0 {
            0.0
        } else {
            (2 * edges.len()) as f64 / num_nodes as f64
        };

        let mut hubs: Vec<NodeDegree> = degrees.into_values().filter(|d| d.total() > 0).collect();
        hubs.sort_by(|a, b| b.total().cmp(&a.total()).then(a.id.cmp(&b.id)));
        hubs.truncate(top);

        Self {
            num_nodes,
            num_edges: edges.len(),
            isolated,
            max_in_degree,
            max_out_degree,
            mean_degree,
            top_hubs: hubs,
        }
    }
}
