//! Row shapes of the persisted node and edge tables.
//!
//! ```text
//! temporal_nodes.csv   domain,node_id,time_id[,date,text]
//! temporal_edges.csv   src,dst,time_id,edge_type
//! ```
//!
//! Domain rows leave `date,text` empty; the two article columns are only
//! written when the graph holds article nodes. In a table with article
//! columns, a row without `time_id` is an article even if its date and text
//! are empty. Edge rows written by older
//! tooling may lack `edge_type`, in which case it defaults to `hyperlinks`.

use serde::{Deserialize, Serialize};
use std::io::{Read, Write};

use crate::types::{Edge, EdgeType, Node, NodeId, NodeKind, TimeMarker};

/// File name of the persisted node table.
pub const NODES_TABLE: &str = "temporal_nodes.csv";

/// File name of the persisted edge table.
pub const EDGES_TABLE: &str = "temporal_edges.csv";

/// One row of the node table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRow {
    /// Canonical domain, or URL for article rows.
    pub domain: String,
    /// Global id.
    pub node_id: u64,
    /// Last-seen marker (domain rows).
    #[serde(default)]
    pub time_id: Option<i64>,
    /// Article crawl date.
    #[serde(default)]
    pub date: Option<String>,
    /// Article text.
    #[serde(default)]
    pub text: Option<String>,
}

/// Domain-only row shape, used when the graph has no articles.
#[derive(Debug, Serialize)]
struct DomainRow<'a> {
    domain: &'a str,
    node_id: u64,
    time_id: Option<i64>,
}

impl NodeRow {
    /// Whether the row describes an article node.
    pub fn is_article(&self) -> bool {
        self.date.is_some() || self.text.is_some()
    }

    /// Empty article columns read back as `None`; restore them for rows
    /// that carry no marker.
    fn with_article_columns(mut self) -> Self {
        if self.time_id.is_none() {
            self.date.get_or_insert_with(String::new);
            self.text.get_or_insert_with(String::new);
        }
        self
    }

    /// Convert into a graph node.
    pub fn into_node(self) -> Node {
        let kind = if self.is_article() {
            NodeKind::Article
        } else {
            NodeKind::Domain
        };
        Node {
            id: NodeId::new(self.node_id),
            domain_or_url: self.domain,
            time_marker: self.time_id.map(TimeMarker::new),
            kind,
            date: self.date,
            text: self.text,
        }
    }
}

impl From<&Node> for NodeRow {
    fn from(node: &Node) -> Self {
        Self {
            domain: node.domain_or_url.clone(),
            node_id: node.id.as_u64(),
            time_id: node.time_marker.map(|t| t.as_i64()),
            date: node.date.clone(),
            text: node.text.clone(),
        }
    }
}

/// One row of the edge table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeRow {
    /// Source id.
    pub src: u64,
    /// Destination id.
    pub dst: u64,
    /// Slice marker.
    pub time_id: i64,
    /// Edge type, `hyperlinks` when absent or empty.
    #[serde(default, deserialize_with = "edge_type_or_default")]
    pub edge_type: EdgeType,
}

fn edge_type_or_default<'de, D>(deserializer: D) -> Result<EdgeType, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?.unwrap_or_default();
    EdgeType::parse_name(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("unknown edge type {raw:?}")))
}

impl From<EdgeRow> for Edge {
    fn from(row: EdgeRow) -> Self {
        Edge::new(
            NodeId::new(row.src),
            NodeId::new(row.dst),
            TimeMarker::new(row.time_id),
            row.edge_type,
        )
    }
}

impl From<&Edge> for EdgeRow {
    fn from(edge: &Edge) -> Self {
        Self {
            src: edge.src.as_u64(),
            dst: edge.dst.as_u64(),
            time_id: edge.time_marker.as_i64(),
            edge_type: edge.edge_type,
        }
    }
}

/// Read every node row.
pub fn read_node_rows<R: Read>(reader: R) -> Result<Vec<NodeRow>, csv::Error> {
    let mut rdr = csv::Reader::from_reader(reader);
    let with_articles = rdr.headers()?.iter().any(|h| h == "date");
    rdr.deserialize::<NodeRow>()
        .map(|row| {
            row.map(|row| if with_articles { row.with_article_columns() } else { row })
        })
        .collect()
}

/// Read every edge row.
pub fn read_edge_rows<R: Read>(reader: R) -> Result<Vec<EdgeRow>, csv::Error> {
    csv::Reader::from_reader(reader).deserialize().collect()
}

/// Write nodes in the persisted table shape.
///
/// The header is always written, even for an empty table.
pub fn write_node_rows<W: Write>(writer: W, nodes: &[Node]) -> Result<(), csv::Error> {
    let with_articles = nodes.iter().any(|n| n.kind == NodeKind::Article);
    let mut out = csv::WriterBuilder::new().has_headers(false).from_writer(writer);

    if with_articles {
        out.write_record(["domain", "node_id", "time_id", "date", "text"])?;
        for node in nodes {
            out.serialize(NodeRow::from(node))?;
        }
    } else {
        out.write_record(["domain", "node_id", "time_id"])?;
        for node in nodes {
            out.serialize(DomainRow {
                domain: &node.domain_or_url,
                node_id: node.id.as_u64(),
                time_id: node.time_marker.map(|t| t.as_i64()),
            })?;
        }
    }
    out.flush()?;
    Ok(())
}

/// Write edges in the persisted table shape.
pub fn write_edge_rows<'a, W, I>(writer: W, edges: I) -> Result<(), csv::Error>
where
    W: Write,
    I: IntoIterator<Item = &'a Edge>,
{
    let mut out = csv::WriterBuilder::new().has_headers(false).from_writer(writer);
    out.write_record(["src", "dst", "time_id", "edge_type"])?;
    for edge in edges {
        out.serialize(EdgeRow::from(edge))?;
    }
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_only_table_has_three_columns() {
        let nodes = vec![Node::domain(NodeId::new(0), "a.com", TimeMarker::new(20240101))];
        let mut buf = Vec::new();
        write_node_rows(&mut buf, &nodes).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text, "domain,node_id,time_id\na.com,0,20240101\n");
    }

    #[test]
    fn test_article_rows_extend_columns() {
        let nodes = vec![
            Node::domain(NodeId::new(0), "a.com", TimeMarker::new(1)),
            Node::article(NodeId::new(1), "https://a.com/x", "2024-01-01", "hello, world"),
        ];
        let mut buf = Vec::new();
        write_node_rows(&mut buf, &nodes).unwrap();

        let rows = read_node_rows(buf.as_slice()).unwrap();
        assert_eq!(rows.len(), 2);
        assert!(!rows[0].is_article());
        assert_eq!(rows[0].date, None);
        assert!(rows[1].is_article());
        assert_eq!(rows[1].time_id, None);
        assert_eq!(rows[1].text.as_deref(), Some("hello, world"));
        assert_eq!(rows[1].clone().into_node().kind, NodeKind::Article);
    }

    #[test]
    fn test_empty_article_row_stays_article() {
        let nodes = vec![
            Node::domain(NodeId::new(0), "a.com", TimeMarker::new(1)),
            Node::article(NodeId::new(1), "https://a.com/x", "", ""),
        ];
        let mut buf = Vec::new();
        write_node_rows(&mut buf, &nodes).unwrap();
        assert!(String::from_utf8(buf.clone()).unwrap().contains("https://a.com/x,1,,,"));

        let rows = read_node_rows(buf.as_slice()).unwrap();
        assert!(!rows[0].is_article());
        assert!(rows[1].is_article());
        let node = rows[1].clone().into_node();
        assert_eq!(node.kind, NodeKind::Article);
        assert_eq!(node.date.as_deref(), Some(""));
    }

    #[test]
    fn test_edge_rows_default_type() {
        let legacy = "src,dst,time_id\n1,2,20140310\n";
        let rows = read_edge_rows(legacy.as_bytes()).unwrap();
        assert_eq!(rows[0].edge_type, EdgeType::Hyperlink);

        let empty = "src,dst,time_id,edge_type\n1,2,20140310,\n3,4,20140310,contains\n";
        let rows = read_edge_rows(empty.as_bytes()).unwrap();
        assert_eq!(rows[0].edge_type, EdgeType::Hyperlink);
        assert_eq!(rows[1].edge_type, EdgeType::Contains);

        let edge: Edge = rows[0].into();
        assert_eq!(edge.pair(), (NodeId::new(1), NodeId::new(2)));
    }

    #[test]
    fn test_edge_table_shape() {
        let edges = vec![
            Edge::hyperlink(NodeId::new(1), NodeId::new(2), TimeMarker::new(7)),
            Edge::contains(NodeId::new(1), NodeId::new(9), TimeMarker::new(7)),
        ];
        let mut buf = Vec::new();
        write_edge_rows(&mut buf, &edges).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text, "src,dst,time_id,edge_type\n1,2,7,hyperlinks\n1,9,7,contains\n");
    }

    #[test]
    fn test_malformed_row_is_error() {
        let bad = "src,dst,time_id,edge_type\n1,notanumber,7,hyperlinks\n";
        assert!(read_edge_rows(bad.as_bytes()).is_err());
    }
}
