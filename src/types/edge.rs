//! Edge types for the temporal web graph.

use serde::{Deserialize, Serialize};

use super::node::NodeId;
use super::slice::TimeMarker;

/// Type of edge in the temporal graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EdgeType {
    /// Hyperlink between two domains, taken from a crawl snapshot.
    #[serde(rename = "hyperlinks")]
    Hyperlink,
    /// Domain to article containment.
    #[serde(rename = "contains")]
    Contains,
}

impl EdgeType {
    /// Parse edge type from its persisted name.
    pub fn parse_name(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "hyperlinks" | "hyperlink" | "" => Some(Self::Hyperlink),
            "contains" => Some(Self::Contains),
            _ => None,
        }
    }
}

impl Default for EdgeType {
    fn default() -> Self {
        Self::Hyperlink
    }
}

impl std::fmt::Display for EdgeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Hyperlink => write!(f, "hyperlinks"),
            Self::Contains => write!(f, "contains"),
        }
    }
}

/// Edge in the temporal graph.
///
/// Edges are append-only and duplicates are permitted.
/// Implements `Ord` for deterministic ordering: (src, dst, time_marker, edge_type).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    /// Source node.
    pub src: NodeId,
    /// Destination node.
    pub dst: NodeId,
    /// Slice the edge was observed in.
    pub time_marker: TimeMarker,
    /// Type of edge.
    pub edge_type: EdgeType,
}

impl Edge {
    /// Create a new edge.
    pub fn new(src: NodeId, dst: NodeId, time_marker: TimeMarker, edge_type: EdgeType) -> Self {
        Self {
            src,
            dst,
            time_marker,
            edge_type,
        }
    }

    /// Create a hyperlink edge.
    pub fn hyperlink(src: NodeId, dst: NodeId, time_marker: TimeMarker) -> Self {
        Self::new(src, dst, time_marker, EdgeType::Hyperlink)
    }

    /// Create a domain to article containment edge.
    pub fn contains(domain: NodeId, article: NodeId, time_marker: TimeMarker) -> Self {
        Self::new(domain, article, time_marker, EdgeType::Contains)
    }

    /// Structural key, ignoring time and type.
    pub fn pair(&self) -> (NodeId, NodeId) {
        (self.src, self.dst)
    }

    /// Whether either endpoint is `id`.
    pub fn touches(&self, id: NodeId) -> bool {
        self.src == id || self.dst == id
    }
}

// Canonical ordering: src, then dst, then time_marker, then edge_type
impl PartialOrd for Edge {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Edge {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.src
            .cmp(&other.src)
            .then_with(|| self.dst.cmp(&other.dst))
            .then_with(|| self.time_marker.cmp(&other.time_marker))
            .then_with(|| self.edge_type.cmp(&other.edge_type))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(raw: u64) -> NodeId {
        NodeId::new(raw)
    }

    #[test]
    fn test_edge_ordering() {
        let t = TimeMarker::new(20240101);
        let e1 = Edge::hyperlink(id(1), id(2), t);
        let e2 = Edge::hyperlink(id(1), id(3), t);
        let e3 = Edge::hyperlink(id(2), id(3), t);

        assert!(e1 < e2);
        assert!(e1 < e3);
        assert!(e2 < e3);
    }

    #[test]
    fn test_edge_time_breaks_ties() {
        let e1 = Edge::hyperlink(id(1), id(2), TimeMarker::new(20230101));
        let e2 = Edge::hyperlink(id(1), id(2), TimeMarker::new(20240101));
        assert!(e1 < e2);
        assert_eq!(e1.pair(), e2.pair());
    }

    #[test]
    fn test_edge_type_parsing() {
        assert_eq!(EdgeType::parse_name("hyperlinks"), Some(EdgeType::Hyperlink));
        assert_eq!(EdgeType::parse_name("Contains"), Some(EdgeType::Contains));
        assert_eq!(EdgeType::parse_name(""), Some(EdgeType::Hyperlink));
        assert_eq!(EdgeType::parse_name("reply"), None);
        assert_eq!(EdgeType::default().to_string(), "hyperlinks");
    }

    #[test]
    fn test_touches() {
        let e = Edge::contains(id(5), id(9), TimeMarker::new(1));
        assert!(e.touches(id(5)));
        assert!(e.touches(id(9)));
        assert!(!e.touches(id(1)));
    }
}
