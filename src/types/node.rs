//! Node types for the temporal web graph.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::slice::TimeMarker;

/// Global identifier of a node in the merged graph.
///
/// Assigned once, on first sighting, from a monotonically increasing
/// counter. Never reused or renumbered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(u64);

impl NodeId {
    /// Create a node id from its raw value.
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Get the raw value.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for NodeId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

/// Kind of node stored in the node table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    /// A canonical registrable domain.
    Domain,
    /// An article page attached to a domain by a `contains` edge.
    Article,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Domain => write!(f, "domain"),
            Self::Article => write!(f, "article"),
        }
    }
}

/// A node of the merged graph.
///
/// Domain nodes carry the last slice that mentioned them; article nodes
/// have no time marker and instead keep their crawl date and text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Node {
    /// Global id.
    pub id: NodeId,
    /// Canonical domain, or the article URL for article nodes.
    pub domain_or_url: String,
    /// Last-seen slice (domain nodes only).
    pub time_marker: Option<TimeMarker>,
    /// Node kind.
    pub kind: NodeKind,
    /// Crawl date of an article.
    pub date: Option<String>,
    /// Extracted text of an article.
    pub text: Option<String>,
}

impl Node {
    /// Create a domain node.
    pub fn domain(id: NodeId, domain: impl Into<String>, time_marker: TimeMarker) -> Self {
        Self {
            id,
            domain_or_url: domain.into(),
            time_marker: Some(time_marker),
            kind: NodeKind::Domain,
            date: None,
            text: None,
        }
    }

    /// Create an article node.
    pub fn article(
        id: NodeId,
        url: impl Into<String>,
        date: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            id,
            domain_or_url: url.into(),
            time_marker: None,
            kind: NodeKind::Article,
            date: Some(date.into()),
            text: Some(text.into()),
        }
    }

    /// Whether this is a domain node.
    pub fn is_domain(&self) -> bool {
        self.kind == NodeKind::Domain
    }
}

// Canonical ordering is by id alone.
impl PartialOrd for Node {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Node {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.id
            .cmp(&other.id)
            .then_with(|| self.domain_or_url.cmp(&other.domain_or_url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_constructors() {
        let d = Node::domain(NodeId::new(3), "example.com", TimeMarker::new(20240101));
        assert!(d.is_domain());
        assert_eq!(d.time_marker, Some(TimeMarker::new(20240101)));
        assert!(d.date.is_none());

        let a = Node::article(NodeId::new(4), "https://example.com/a", "2024-01-01", "hi");
        assert!(!a.is_domain());
        assert!(a.time_marker.is_none());
        assert_eq!(a.text.as_deref(), Some("hi"));
    }

    #[test]
    fn test_node_ordering_by_id() {
        let a = Node::domain(NodeId::new(2), "b.com", TimeMarker::new(1));
        let b = Node::domain(NodeId::new(10), "a.com", TimeMarker::new(1));
        assert!(a < b);
    }
}
