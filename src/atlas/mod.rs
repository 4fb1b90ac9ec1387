//! Atlas: reproducible structure computed over the merged graph.
//!
//! 1. **Fingerprint**: deterministic identity of the persisted graph
//! 2. **Overlap**: shared nodes between pairs of merged slices
//! 3. **Degree**: degree distribution and hub nodes
//!
//! ```text
//! TemporalGraph → fingerprint → merge_manifest.json
//!        ↓
//!   edge table → SliceOverlapAnalyzer / DegreeStats
//! ```

pub mod fingerprint;
pub mod overlap;
pub mod degree;

// Re-exports
pub use fingerprint::GraphFingerprint;
pub use overlap::{SliceOverlapAnalyzer, SliceOverlapEdge, SliceOverlapGraph};
pub use degree::{DegreeStats, NodeDegree};
