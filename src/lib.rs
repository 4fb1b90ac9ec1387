//! # temporal-webgraph
//!
//! Incremental temporal merge of web-crawl domain graphs.
//!
//! Each crawl snapshot numbers its domains locally. This crate folds
//! snapshots into one growable graph with stable global ids, then carves
//! bounded neighborhoods around labeled seed domains.
//!
//! ## Architecture
//!
//! ```text
//! SnapshotReader → TemporalMerger → TemporalGraph (IdentityStore + edges)
//!                                          ↓ persist / load
//!                          temporal_nodes.csv, temporal_edges.csv
//!                                          ↓
//!                    EdgeSampler / SubnetworkExtractor / atlas stats
//! ```
//!
//! ## Determinism Guarantees
//!
//! - Global ids are assigned once, monotonically, and never reused
//! - Re-merging an already merged time marker is a no-op
//! - Same tables + same policy → identical subnetworks
//! - Sampling is reproducible for a fixed seed

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod types;
pub mod normalize;
pub mod reader;
pub mod store;
pub mod merger;
pub mod article;
pub mod sampler;
pub mod labels;
pub mod extract;
pub mod atlas;
pub mod config;
pub mod canonical;

// Re-exports
pub use types::{
    Edge, EdgeType, Node, NodeId, NodeKind, SliceInput, SliceOutcome, SliceReport,
    SubnetworkResult, TimeMarker,
};
pub use normalize::normalize_domain;
pub use reader::{read_edges, read_vertices, EdgeStream, ReaderError, VertexStream};
pub use store::{
    FreshReason, IdentityStore, LoadStatus, MergeManifest, StoreError, TemporalGraph,
};
pub use merger::{MergeError, TemporalMerger};
pub use article::{ArticleMergeReport, ArticleMerger, ArticleRecord};
pub use sampler::{EdgeSampler, SampleEdge, SampleResult};
pub use labels::{Label, LabelError, LabelTable};
pub use extract::{
    contains_base_domain, seed_dir_name, ExtractError, ExtractionSummary, SubnetworkExtractor,
};
pub use atlas::{DegreeStats, GraphFingerprint, SliceOverlapAnalyzer, SliceOverlapEdge};
pub use config::{ConfigError, ExtractionPolicy, PipelineConfig, SliceSpec};
pub use canonical::{canonical_hash, canonical_hash_hex};

/// Schema version of persisted tables and manifests.
/// Increment on breaking changes to any persisted shape.
pub const WEBGRAPH_SCHEMA_VERSION: &str = "1.0.0";
