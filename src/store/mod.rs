//! Persisted temporal graph: identity store, edge table and merge manifest.
//!
//! ## Layout
//!
//! ```text
//! <dir>/temporal_nodes.csv     domain,node_id,time_id[,date,text]
//! <dir>/temporal_edges.csv     src,dst,time_id,edge_type
//! <dir>/merge_manifest.json    merged markers, slice reports, fingerprint
//! ```
//!
//! Loading never fails on missing or malformed tables: the graph starts
//! empty and the caller is told why. Any other I/O error is surfaced.

pub mod identity;
pub mod tables;

use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::atlas::fingerprint::GraphFingerprint;
use crate::types::{Edge, EdgeType, Node, NodeId, SliceReport, TimeMarker};
use crate::WEBGRAPH_SCHEMA_VERSION;

pub use identity::{ArticleEntry, DomainEntry, IdentityStore};
pub use tables::{EdgeRow, NodeRow, EDGES_TABLE, NODES_TABLE};

/// File name of the merge manifest.
pub const MANIFEST_FILE: &str = "merge_manifest.json";

/// Error type for persisted-table operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Filesystem error other than a missing table.
    #[error("I/O error on {path}: {source}")]
    Io {
        /// Affected path.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },
    /// Table could not be encoded.
    #[error("Cannot write table {path}: {source}")]
    Csv {
        /// Affected path.
        path: PathBuf,
        /// Underlying error.
        source: csv::Error,
    },
    /// Manifest could not be encoded.
    #[error("Cannot write manifest {path}: {source}")]
    Manifest {
        /// Affected path.
        path: PathBuf,
        /// Underlying error.
        source: serde_json::Error,
    },
}

impl StoreError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Why a load started from an empty graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FreshReason {
    /// One or both tables do not exist.
    Missing,
    /// A table exists but could not be parsed.
    Malformed(String),
}

/// Outcome of [`TemporalGraph::load`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadStatus {
    /// Existing tables were loaded.
    Loaded {
        /// Nodes restored.
        nodes: usize,
        /// Edges restored.
        edges: usize,
    },
    /// Nothing usable was found; the graph is empty.
    Fresh(FreshReason),
}

impl LoadStatus {
    /// Whether the load produced an empty graph.
    pub fn is_fresh(&self) -> bool {
        matches!(self, Self::Fresh(_))
    }
}

/// Sidecar recording merge bookkeeping that the tables cannot express.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeManifest {
    /// Schema version of the persisted files.
    pub schema_version: String,
    /// Next id the identity store will assign.
    pub next_id: u64,
    /// Markers of all merged slices.
    pub time_markers: Vec<TimeMarker>,
    /// Reports of merged slices, in merge order.
    pub slices: Vec<SliceReport>,
    /// Fingerprint of the persisted tables.
    pub fingerprint: Option<GraphFingerprint>,
}

/// The running merge state: identity store plus append-only edge table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemporalGraph {
    identity: IdentityStore,
    edges: Vec<Edge>,
    slice_reports: Vec<SliceReport>,
}

impl TemporalGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// The identity store.
    pub fn identity(&self) -> &IdentityStore {
        &self.identity
    }

    /// Mutable access to the identity store.
    pub fn identity_mut(&mut self) -> &mut IdentityStore {
        &mut self.identity
    }

    /// The edge table, in append order.
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Append edges to the edge table.
    pub fn extend_edges<I: IntoIterator<Item = Edge>>(&mut self, edges: I) {
        self.edges.extend(edges);
    }

    /// Reports of merged slices, in merge order.
    pub fn slice_reports(&self) -> &[SliceReport] {
        &self.slice_reports
    }

    /// Record the report of a merged slice and mark its time marker.
    pub fn record_slice(&mut self, report: SliceReport) {
        self.identity.mark_time_marker(report.time_marker);
        self.slice_reports.push(report);
    }

    /// Whether a slice with this marker is already merged.
    pub fn has_time_marker(&self, time_marker: TimeMarker) -> bool {
        self.identity.has_time_marker(time_marker)
    }

    /// All nodes, domains first, each group ordered by id.
    pub fn nodes(&self) -> Vec<Node> {
        self.identity.nodes()
    }

    /// Total node count.
    pub fn num_nodes(&self) -> usize {
        self.identity.num_domains() + self.identity.num_articles()
    }

    /// Total edge count.
    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    /// Fingerprint of the current content.
    pub fn fingerprint(&self) -> GraphFingerprint {
        GraphFingerprint::compute(&self.nodes(), &self.edges)
    }

    /// Manifest describing the current state.
    pub fn manifest(&self) -> MergeManifest {
        MergeManifest {
            schema_version: WEBGRAPH_SCHEMA_VERSION.to_string(),
            next_id: self.identity.next_id().as_u64(),
            time_markers: self.identity.time_markers().collect(),
            slices: self.slice_reports.clone(),
            fingerprint: Some(self.fingerprint()),
        }
    }

    /// Load a graph persisted in `dir`.
    ///
    /// Missing or malformed tables yield an empty graph with
    /// [`LoadStatus::Fresh`]. Permission and read failures are errors.
    pub fn load(dir: impl AsRef<Path>) -> Result<(Self, LoadStatus), StoreError> {
        let dir = dir.as_ref();
        let nodes_path = dir.join(NODES_TABLE);
        let edges_path = dir.join(EDGES_TABLE);

        let (Some(nodes_file), Some(edges_file)) = (open_optional(&nodes_path)?, open_optional(&edges_path)?) else {
            tracing::warn!(dir = %dir.display(), "No persisted tables found, starting fresh");
            return Ok((Self::new(), LoadStatus::Fresh(FreshReason::Missing)));
        };

        let node_rows = match classify(&nodes_path, tables::read_node_rows(BufReader::new(nodes_file)))? {
            Ok(rows) => rows,
            Err(reason) => return Ok((Self::new(), LoadStatus::Fresh(reason))),
        };
        let edge_rows = match classify(&edges_path, tables::read_edge_rows(BufReader::new(edges_file)))? {
            Ok(rows) => rows,
            Err(reason) => return Ok((Self::new(), LoadStatus::Fresh(reason))),
        };

        let mut graph = Self::new();
        let mut duplicates = 0usize;
        for row in node_rows {
            let restored = if row.is_article() {
                graph.identity.restore_article(
                    row.domain,
                    NodeId::new(row.node_id),
                    row.date.unwrap_or_default(),
                    row.text.unwrap_or_default(),
                )
            } else {
                graph.identity.restore_domain(
                    row.domain,
                    NodeId::new(row.node_id),
                    row.time_id.map(TimeMarker::new),
                )
            };
            if !restored {
                duplicates += 1;
            }
        }

        graph.edges = edge_rows.into_iter().map(Edge::from).collect();
        for edge in &graph.edges {
            if edge.edge_type == EdgeType::Hyperlink {
                graph.identity.mark_time_marker(edge.time_marker);
            }
        }

        match read_manifest(&dir.join(MANIFEST_FILE))? {
            Some(manifest) => {
                for marker in &manifest.time_markers {
                    graph.identity.mark_time_marker(*marker);
                }
                graph.identity.reserve_ids_below(NodeId::new(manifest.next_id));
                graph.slice_reports = manifest.slices;
            }
            None => {
                tracing::debug!(dir = %dir.display(), "No merge manifest, markers recovered from tables");
            }
        }

        if duplicates > 0 {
            tracing::warn!(duplicates, "Duplicate node rows ignored on load");
        }

        let status = LoadStatus::Loaded {
            nodes: graph.num_nodes(),
            edges: graph.num_edges(),
        };
        tracing::info!(
            dir = %dir.display(),
            nodes = graph.num_nodes(),
            edges = graph.num_edges(),
            slices = graph.identity.time_markers().count(),
            "Loaded existing temporal graph"
        );
        Ok((graph, status))
    }

    /// Persist the graph into `dir`.
    ///
    /// Every file is first written to a temporary sibling; the real files are
    /// only replaced once all writes succeeded.
    pub fn persist(&self, dir: impl AsRef<Path>) -> Result<(), StoreError> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir).map_err(|e| StoreError::io(dir, e))?;

        let nodes_path = dir.join(NODES_TABLE);
        let edges_path = dir.join(EDGES_TABLE);
        let manifest_path = dir.join(MANIFEST_FILE);
        let nodes = self.nodes();

        let staged = [
            tmp_path(&nodes_path),
            tmp_path(&edges_path),
            tmp_path(&manifest_path),
        ];

        let result = (|| {
            write_file(&staged[0], |w| {
                tables::write_node_rows(w, &nodes).map_err(|source| StoreError::Csv {
                    path: nodes_path.clone(),
                    source,
                })
            })?;
            write_file(&staged[1], |w| {
                tables::write_edge_rows(w, &self.edges).map_err(|source| StoreError::Csv {
                    path: edges_path.clone(),
                    source,
                })
            })?;
            let manifest = self.manifest();
            write_file(&staged[2], |w| {
                serde_json::to_writer_pretty(w, &manifest).map_err(|source| StoreError::Manifest {
                    path: manifest_path.clone(),
                    source,
                })
            })
        })();

        if let Err(e) = result {
            for path in &staged {
                let _ = fs::remove_file(path);
            }
            return Err(e);
        }

        for (tmp, target) in staged.iter().zip([&nodes_path, &edges_path, &manifest_path]) {
            fs::rename(tmp, target).map_err(|e| StoreError::io(target, e))?;
        }

        tracing::info!(
            dir = %dir.display(),
            nodes = nodes.len(),
            edges = self.edges.len(),
            "Persisted temporal graph"
        );
        Ok(())
    }
}

/// Open a file, mapping "not found" to `None`.
fn open_optional(path: &Path) -> Result<Option<File>, StoreError> {
    match File::open(path) {
        Ok(file) => Ok(Some(file)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(StoreError::io(path, e)),
    }
}

/// Split a csv result into fatal I/O errors and recoverable malformation.
fn classify<T>(path: &Path, result: Result<T, csv::Error>) -> Result<Result<T, FreshReason>, StoreError> {
    match result {
        Ok(value) => Ok(Ok(value)),
        Err(e) if e.is_io_error() => match e.into_kind() {
            csv::ErrorKind::Io(io) => Err(StoreError::io(path, io)),
            other => Ok(Err(FreshReason::Malformed(format!("{other:?}")))),
        },
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "Persisted table is malformed, starting fresh"
            );
            Ok(Err(FreshReason::Malformed(e.to_string())))
        }
    }
}

/// Read the manifest; missing or unparsable manifests are ignored.
fn read_manifest(path: &Path) -> Result<Option<MergeManifest>, StoreError> {
    let Some(file) = open_optional(path)? else {
        return Ok(None);
    };
    match serde_json::from_reader(BufReader::new(file)) {
        Ok(manifest) => Ok(Some(manifest)),
        Err(e) if e.is_io() => Err(StoreError::io(path, e.into())),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Ignoring unreadable merge manifest");
            Ok(None)
        }
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

fn write_file<F>(path: &Path, body: F) -> Result<(), StoreError>
where
    F: FnOnce(&mut BufWriter<File>) -> Result<(), StoreError>,
{
    let file = File::create(path).map_err(|e| StoreError::io(path, e))?;
    let mut writer = BufWriter::new(file);
    body(&mut writer)?;
    writer.flush().map_err(|e| StoreError::io(path, e))?;
    writer
        .get_ref()
        .sync_all()
        .map_err(|e| StoreError::io(path, e))
}
