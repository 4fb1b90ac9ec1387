//! Subnetwork extraction around labeled seed domains.
//!
//! ## Algorithm
//!
//! 1. `seen` = ids of nodes whose domain matches the seed predicate
//!    ([`contains_base_domain`]); no match means no output for this seed
//! 2. `frontier = seen`
//! 3. Repeat `n_hop + 1` times or until the frontier is empty:
//!    - select every edge with an endpoint in the frontier
//!    - `next = endpoints(selected) - seen`, `seen ∪= next`, `frontier = next`
//! 4. Vertices are the node rows whose id is in `seen`; edges are the
//!    selected edges deduplicated on `(src, dst)`
//!
//! The extractor is read-only, so it can serve many seeds concurrently.
//! Output is sorted and contains no randomness.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::config::ExtractionPolicy;
use crate::labels::LabelTable;
use crate::normalize::reverse_labels;
use crate::store::tables::{self, EDGES_TABLE, NODES_TABLE};
use crate::types::{Edge, Node, NodeId, SubnetworkResult};

/// File name of a subnetwork's vertex table.
pub const SUB_VERTICES_FILE: &str = "vertices.csv";

/// File name of a subnetwork's edge table.
pub const SUB_EDGES_FILE: &str = "edges.csv";

/// File name of the extraction summary written next to the subnetworks.
pub const SUMMARY_FILE: &str = "extraction_summary.json";

/// Error type for extraction.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    /// A table or output file could not be opened, created or written.
    #[error("I/O error on {path}: {source}")]
    Io {
        /// Affected path.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },
    /// A table could not be parsed or written.
    #[error("Table error on {path}: {source}")]
    Csv {
        /// Affected path.
        path: PathBuf,
        /// Underlying error.
        source: csv::Error,
    },
    /// The summary could not be encoded.
    #[error("Cannot write summary {path}: {source}")]
    Summary {
        /// Affected path.
        path: PathBuf,
        /// Underlying error.
        source: serde_json::Error,
    },
}

impl ExtractError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    fn csv(path: &Path, source: csv::Error) -> Self {
        Self::Csv {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Whether `candidate` names `base_domain` or one of its subdomains.
///
/// Matches either forward label order (`base_domain` as a whole-label
/// suffix, e.g. `news.nasa.org` for `nasa.org`) or reversed label order
/// (reversed `base_domain` as a whole-label prefix, e.g. `org.nasa.news`).
/// Comparison is case-insensitive.
///
/// The two orders are not symmetric: `www.nasa.org.com.io.to` and
/// `to.io.org.nasa.www` both fail even though each contains `nasa.org` in
/// one of the orders. Treat this as a seed filter, not an equivalence.
pub fn contains_base_domain(candidate: &str, base_domain: &str) -> bool {
    let candidate = candidate.trim().to_ascii_lowercase();
    let base = base_domain.trim().to_ascii_lowercase();
    if base.is_empty() {
        return false;
    }

    let forward = candidate == base || candidate.ends_with(&format!(".{base}"));
    if forward {
        return true;
    }

    let reversed = reverse_labels(&base);
    candidate == reversed || candidate.starts_with(&format!("{reversed}."))
}

/// Output directory name for a seed domain (`nasa.org` → `sub_vertices_domain_nasa_org`).
pub fn seed_dir_name(base_domain: &str) -> String {
    let sanitized: String = base_domain
        .trim()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    format!("sub_vertices_domain_{sanitized}")
}

/// Read the persisted node and edge tables from `dir`.
pub fn load_tables(dir: impl AsRef<Path>) -> Result<(Vec<Node>, Vec<Edge>), ExtractError> {
    let dir = dir.as_ref();

    let nodes_path = dir.join(NODES_TABLE);
    let file = File::open(&nodes_path).map_err(|e| ExtractError::io(&nodes_path, e))?;
    let nodes = tables::read_node_rows(BufReader::new(file))
        .map_err(|e| ExtractError::csv(&nodes_path, e))?
        .into_iter()
        .map(|row| row.into_node())
        .collect();

    let edges_path = dir.join(EDGES_TABLE);
    let file = File::open(&edges_path).map_err(|e| ExtractError::io(&edges_path, e))?;
    let edges = tables::read_edge_rows(BufReader::new(file))
        .map_err(|e| ExtractError::csv(&edges_path, e))?
        .into_iter()
        .map(Edge::from)
        .collect();

    Ok((nodes, edges))
}

/// One written subnetwork.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubnetworkSummary {
    /// Seed base domain.
    pub seed_domain: String,
    /// Label score.
    pub score: Option<f64>,
    /// Output directory.
    pub dir: PathBuf,
    /// Vertex count.
    pub vertices: usize,
    /// Edge count.
    pub edges: usize,
}

/// Summary of an [`SubnetworkExtractor::extract_all`] run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionSummary {
    /// Hash of the extraction parameters.
    pub params_hash: String,
    /// Hop count used.
    pub n_hop: u32,
    /// Labels processed.
    pub seeds_total: usize,
    /// Labels without any matching node.
    pub seeds_unmatched: usize,
    /// Written subnetworks, in label order.
    pub subnetworks: Vec<SubnetworkSummary>,
}

/// Read-only extractor over a node table and an edge table.
#[derive(Debug, Clone)]
pub struct SubnetworkExtractor {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    adjacency: HashMap<NodeId, Vec<usize>>,
    policy: ExtractionPolicy,
}

impl SubnetworkExtractor {
    /// Build an extractor. Nodes are sorted by id and edges indexed by endpoint.
    pub fn new(mut nodes: Vec<Node>, edges: Vec<Edge>, policy: ExtractionPolicy) -> Self {
        nodes.sort();

        let mut adjacency: HashMap<NodeId, Vec<usize>> = HashMap::new();
        for (idx, edge) in edges.iter().enumerate() {
            adjacency.entry(edge.src).or_default().push(idx);
            if edge.dst != edge.src {
                adjacency.entry(edge.dst).or_default().push(idx);
            }
        }

        Self {
            nodes,
            edges,
            adjacency,
            policy,
        }
    }

    /// Build an extractor from the persisted tables in `dir`.
    pub fn from_dir(dir: impl AsRef<Path>, policy: ExtractionPolicy) -> Result<Self, ExtractError> {
        let (nodes, edges) = load_tables(dir)?;
        Ok(Self::new(nodes, edges, policy))
    }

    /// Extraction policy.
    pub fn policy(&self) -> ExtractionPolicy {
        self.policy
    }

    /// Extract the subnetwork of one seed domain.
    ///
    /// Returns `None` when no node matches the seed.
    pub fn extract(&self, base_domain: &str, score: Option<f64>) -> Option<SubnetworkResult> {
        let seed_ids: Vec<NodeId> = self
            .nodes
            .iter()
            .filter(|n| contains_base_domain(&n.domain_or_url, base_domain))
            .map(|n| n.id)
            .collect();
        if seed_ids.is_empty() {
            return None;
        }

        let mut seen: HashSet<NodeId> = seed_ids.iter().copied().collect();
        let mut frontier: BTreeSet<NodeId> = seed_ids.iter().copied().collect();
        let mut selected: BTreeSet<usize> = BTreeSet::new();
        let mut rounds = 0u32;

        for _ in 0..=self.policy.n_hop {
            if frontier.is_empty() {
                break;
            }
            rounds += 1;

            let mut next = BTreeSet::new();
            for id in &frontier {
                for &idx in self.adjacency.get(id).into_iter().flatten() {
                    selected.insert(idx);
                    let edge = &self.edges[idx];
                    for endpoint in [edge.src, edge.dst] {
                        if !seen.contains(&endpoint) {
                            next.insert(endpoint);
                        }
                    }
                }
            }
            seen.extend(next.iter().copied());
            frontier = next;
        }

        let vertices: Vec<Node> = self
            .nodes
            .iter()
            .filter(|n| seen.contains(&n.id))
            .cloned()
            .collect();

        let mut edges: Vec<Edge> = selected.into_iter().map(|idx| self.edges[idx]).collect();
        edges.sort();
        edges.dedup_by_key(|e| e.pair());

        tracing::debug!(
            seed = base_domain,
            seeds = seed_ids.len(),
            vertices = vertices.len(),
            edges = edges.len(),
            rounds,
            "Extracted subnetwork"
        );

        Some(SubnetworkResult {
            seed_domain: base_domain.to_string(),
            score,
            seed_ids,
            vertices,
            edges,
            rounds,
        })
    }

    /// Extract and write a subnetwork for every label.
    ///
    /// Each matched seed gets `out_dir/<seed_dir_name>/{vertices,edges}.csv`;
    /// the run summary is written to `out_dir/extraction_summary.json`.
    pub fn extract_all(&self, labels: &LabelTable, out_dir: impl AsRef<Path>) -> Result<ExtractionSummary, ExtractError> {
        let out_dir = out_dir.as_ref();
        fs::create_dir_all(out_dir).map_err(|e| ExtractError::io(out_dir, e))?;

        let params_hash = self.policy.params_hash().map_err(|source| ExtractError::Summary {
            path: out_dir.join(SUMMARY_FILE),
            source,
        })?;
        let mut summary = ExtractionSummary {
            params_hash,
            n_hop: self.policy.n_hop,
            seeds_total: 0,
            seeds_unmatched: 0,
            subnetworks: Vec::new(),
        };

        for label in labels.iter() {
            summary.seeds_total += 1;
            let Some(result) = self.extract(&label.domain, label.score) else {
                summary.seeds_unmatched += 1;
                continue;
            };
            let dir = out_dir.join(seed_dir_name(&label.domain));
            write_subnetwork(&result, &dir)?;
            summary.subnetworks.push(SubnetworkSummary {
                seed_domain: result.seed_domain,
                score: result.score,
                dir,
                vertices: result.vertices.len(),
                edges: result.edges.len(),
            });
        }

        let summary_path = out_dir.join(SUMMARY_FILE);
        let file = File::create(&summary_path).map_err(|e| ExtractError::io(&summary_path, e))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, &summary).map_err(|source| ExtractError::Summary {
            path: summary_path.clone(),
            source,
        })?;
        writer.flush().map_err(|e| ExtractError::io(&summary_path, e))?;

        tracing::info!(
            out_dir = %out_dir.display(),
            seeds = summary.seeds_total,
            unmatched = summary.seeds_unmatched,
            written = summary.subnetworks.len(),
            n_hop = summary.n_hop,
            params_hash = %summary.params_hash,
            "Subnetwork extraction complete"
        );
        Ok(summary)
    }
}

/// Write one subnetwork's vertex and edge tables into `dir`.
pub fn write_subnetwork(result: &SubnetworkResult, dir: &Path) -> Result<(), ExtractError> {
    fs::create_dir_all(dir).map_err(|e| ExtractError::io(dir, e))?;

    let vertices_path = dir.join(SUB_VERTICES_FILE);
    let file = File::create(&vertices_path).map_err(|e| ExtractError::io(&vertices_path, e))?;
    tables::write_node_rows(BufWriter::new(file), &result.vertices)
        .map_err(|e| ExtractError::csv(&vertices_path, e))?;

    let edges_path = dir.join(SUB_EDGES_FILE);
    let file = File::create(&edges_path).map_err(|e| ExtractError::io(&edges_path, e))?;
    tables::write_edge_rows(BufWriter::new(file), &result.edges).map_err(|e| ExtractError::csv(&edges_path, e))?;

    Ok(())
}
