//! Pipeline configuration.
//!
//! Defaults mirror the on-disk layout of a crawl workspace:
//!
//! ```text
//! data/crawl-data/<slice>/vertices.txt.gz
//! data/crawl-data/<slice>/edges.txt.gz
//! data/crawl-data/temporal/          merged tables
//! data/crawl-data/sub-networks/      one directory per seed domain
//! data/dqr/domain_pc1.csv            credibility labels
//! ```
//!
//! Every field can be overridden from `WEBGRAPH_*` environment variables.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::canonical::canonical_hash_hex;
use crate::types::{SliceInput, TimeMarker};

/// Error type for configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// An environment variable could not be parsed.
    #[error("Invalid value for {var}: {value:?}")]
    InvalidVar {
        /// Variable name.
        var: &'static str,
        /// Offending value.
        value: String,
    },
    /// A slice entry is not `name:YYYYMMDD`.
    #[error("Invalid slice entry {0:?}, expected name:YYYYMMDD")]
    InvalidSlice(String),
}

/// One slice directory and its time marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SliceSpec {
    /// Directory name under `slices_root`.
    pub name: String,
    /// Time marker of the slice.
    pub time_marker: TimeMarker,
}

impl SliceSpec {
    /// Parse `name:YYYYMMDD`.
    pub fn parse(entry: &str) -> Result<Self, ConfigError> {
        let invalid = || ConfigError::InvalidSlice(entry.to_string());
        let (name, marker) = entry.trim().rsplit_once(':').ok_or_else(invalid)?;
        let name = name.trim();
        if name.is_empty() {
            return Err(invalid());
        }
        let marker: i64 = marker.trim().parse().map_err(|_| invalid())?;
        Ok(Self {
            name: name.to_string(),
            time_marker: TimeMarker::new(marker),
        })
    }
}

/// Subnetwork extraction parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionPolicy {
    /// Extra expansion rounds after the first one around the seeds.
    pub n_hop: u32,
}

impl Default for ExtractionPolicy {
    fn default() -> Self {
        Self { n_hop: 1 }
    }
}

impl ExtractionPolicy {
    /// Create a policy.
    pub fn new(n_hop: u32) -> Self {
        Self { n_hop }
    }

    /// Deterministic hash of the parameters, recorded with extraction output.
    pub fn params_hash(&self) -> Result<String, serde_json::Error> {
        canonical_hash_hex(self)
    }
}

/// Configuration of the batch pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Directory of the persisted temporal tables.
    pub temporal_dir: PathBuf,
    /// Directory holding one sub-directory per slice.
    pub slices_root: PathBuf,
    /// Slices to merge, in order.
    pub slices: Vec<SliceSpec>,
    /// Output root of subnetwork extraction.
    pub subnetwork_dir: PathBuf,
    /// Credibility label table; extraction is skipped when unset.
    pub labels_path: Option<PathBuf>,
    /// Hop count for extraction.
    pub n_hop: u32,
    /// Edge budget for sampling; sampling is skipped when unset.
    pub max_edges: Option<usize>,
    /// Seed of the sampling RNG.
    pub sample_seed: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            temporal_dir: PathBuf::from("data/crawl-data/temporal"),
            slices_root: PathBuf::from("data/crawl-data"),
            slices: Vec::new(),
            subnetwork_dir: PathBuf::from("data/crawl-data/sub-networks"),
            labels_path: Some(PathBuf::from("data/dqr/domain_pc1.csv")),
            n_hop: ExtractionPolicy::default().n_hop,
            max_edges: None,
            sample_seed: 42,
        }
    }
}

impl PipelineConfig {
    /// Load configuration from environment variables.
    ///
    /// - `WEBGRAPH_TEMPORAL_DIR`, `WEBGRAPH_SLICES_ROOT`, `WEBGRAPH_SUBNETWORK_DIR`
    /// - `WEBGRAPH_SLICES`: comma-separated `name:YYYYMMDD` entries
    /// - `WEBGRAPH_LABELS`: label CSV path (empty disables extraction)
    /// - `WEBGRAPH_N_HOP`, `WEBGRAPH_MAX_EDGES`, `WEBGRAPH_SAMPLE_SEED`
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build from an arbitrary variable lookup (used by `from_env`).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&'static str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(dir) = lookup("WEBGRAPH_TEMPORAL_DIR") {
            config.temporal_dir = PathBuf::from(dir);
        }
        if let Some(dir) = lookup("WEBGRAPH_SLICES_ROOT") {
            config.slices_root = PathBuf::from(dir);
        }
        if let Some(dir) = lookup("WEBGRAPH_SUBNETWORK_DIR") {
            config.subnetwork_dir = PathBuf::from(dir);
        }
        if let Some(path) = lookup("WEBGRAPH_LABELS") {
            config.labels_path = (!path.trim().is_empty()).then(|| PathBuf::from(path));
        }
        if let Some(slices) = lookup("WEBGRAPH_SLICES") {
            config.slices = slices
                .split(',')
                .filter(|entry| !entry.trim().is_empty())
                .map(SliceSpec::parse)
                .collect::<Result<_, _>>()?;
        }
        if let Some(n_hop) = parse_var(&lookup, "WEBGRAPH_N_HOP")? {
            config.n_hop = n_hop;
        }
        if let Some(max_edges) = parse_var(&lookup, "WEBGRAPH_MAX_EDGES")? {
            config.max_edges = Some(max_edges);
        }
        if let Some(seed) = parse_var(&lookup, "WEBGRAPH_SAMPLE_SEED")? {
            config.sample_seed = seed;
        }

        Ok(config)
    }

    /// Snapshot inputs of the configured slices, in order.
    pub fn slice_inputs(&self) -> Vec<SliceInput> {
        self.slices
            .iter()
            .map(|spec| SliceInput::from_slice_dir(self.slices_root.join(&spec.name), spec.time_marker))
            .collect()
    }

    /// Extraction policy derived from this configuration.
    pub fn extraction_policy(&self) -> ExtractionPolicy {
        ExtractionPolicy::new(self.n_hop)
    }
}

fn parse_var<F, T>(lookup: &F, var: &'static str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&'static str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(var) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidVar { var, value }),
    }
}
