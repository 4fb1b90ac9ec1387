//! Slice types: time markers, slice inputs and merge reports.
//!
//! A slice is one crawl snapshot, keyed by its time marker. The marker is a
//! date-based integer (`YYYYMMDD`) derived from the crawl metadata.

use chrono::{Datelike, NaiveDate};
use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use super::node::NodeId;

/// File name of a slice's vertex list inside its directory.
pub const VERTICES_FILE: &str = "vertices.txt.gz";

/// File name of a slice's edge list inside its directory.
pub const EDGES_FILE: &str = "edges.txt.gz";

/// Time marker identifying a slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TimeMarker(i64);

impl TimeMarker {
    /// Create a time marker from its raw value.
    pub fn new(raw: i64) -> Self {
        Self(raw)
    }

    /// Get the raw value.
    pub fn as_i64(&self) -> i64 {
        self.0
    }

    /// Build a `YYYYMMDD` marker from a calendar date.
    pub fn from_date(date: NaiveDate) -> Self {
        Self(date.year() as i64 * 10_000 + date.month() as i64 * 100 + date.day() as i64)
    }

    /// Extract a marker from a line carrying a `WARC-Date: YYYY-MM-DD...` header.
    ///
    /// Returns `None` when the line has no such header or the date is not a
    /// valid calendar date.
    pub fn from_warc_date_line(line: &str) -> Option<Self> {
        let caps = warc_date_regex().captures(line)?;
        let year: i32 = caps.get(1)?.as_str().parse().ok()?;
        let month: u32 = caps.get(2)?.as_str().parse().ok()?;
        let day: u32 = caps.get(3)?.as_str().parse().ok()?;
        NaiveDate::from_ymd_opt(year, month, day).map(Self::from_date)
    }

    /// Scan a WAT/WARC text stream for the first `WARC-Date` header.
    ///
    /// Lines that are not valid UTF-8 are skipped. Read errors are returned.
    pub fn scan_warc_dates<R: BufRead>(reader: R) -> std::io::Result<Option<Self>> {
        for line in reader.split(b'\n') {
            let line = line?;
            let Ok(text) = std::str::from_utf8(&line) else {
                continue;
            };
            if let Some(marker) = Self::from_warc_date_line(text) {
                return Ok(Some(marker));
            }
        }
        Ok(None)
    }
}

fn warc_date_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"WARC-Date:\s*(\d{4})-(\d{2})-(\d{2})").expect("WARC date pattern is valid")
    })
}

impl fmt::Display for TimeMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for TimeMarker {
    fn from(raw: i64) -> Self {
        Self(raw)
    }
}

/// Location of one slice's snapshot files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SliceInput {
    /// Vertex list (`local_id \t raw_domain`).
    pub vertices_path: PathBuf,
    /// Edge list (`local_src local_dst`).
    pub edges_path: PathBuf,
    /// Time marker of the slice.
    pub time_marker: TimeMarker,
}

impl SliceInput {
    /// Create a slice input from explicit paths.
    pub fn new(
        vertices_path: impl Into<PathBuf>,
        edges_path: impl Into<PathBuf>,
        time_marker: TimeMarker,
    ) -> Self {
        Self {
            vertices_path: vertices_path.into(),
            edges_path: edges_path.into(),
            time_marker,
        }
    }

    /// Resolve the standard snapshot files inside a slice directory.
    pub fn from_slice_dir(dir: impl AsRef<Path>, time_marker: TimeMarker) -> Self {
        let dir = dir.as_ref();
        Self::new(dir.join(VERTICES_FILE), dir.join(EDGES_FILE), time_marker)
    }
}

/// Counters produced by merging one slice.
///
/// Soft conditions (malformed lines, dropped edges) are accumulated here
/// instead of failing the merge.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SliceReport {
    /// Time marker of the merged slice.
    pub time_marker: TimeMarker,
    /// Well-formed vertex lines read.
    pub vertices_read: u64,
    /// Distinct canonical domains in the slice.
    pub slice_nodes: u64,
    /// Global ids created by this slice.
    pub new_nodes: u64,
    /// First id created by this slice; the new ids are contiguous from here.
    #[serde(default)]
    pub first_new_id: Option<NodeId>,
    /// Slice nodes that were already known before the merge.
    pub overlap_with_existing: u64,
    /// Edges appended to the edge table.
    pub edges_added: u64,
    /// Edges whose endpoint was not declared in the slice's vertex list.
    pub dropped_edges: u64,
    /// Malformed vertex lines skipped.
    pub skipped_vertex_lines: u64,
    /// Malformed edge lines skipped.
    pub skipped_edge_lines: u64,
}

impl Default for TimeMarker {
    fn default() -> Self {
        Self(0)
    }
}

impl SliceReport {
    /// Total malformed lines skipped across both files.
    pub fn skipped_lines(&self) -> u64 {
        self.skipped_vertex_lines + self.skipped_edge_lines
    }

    /// Global ids created by this slice.
    pub fn new_ids(&self) -> impl Iterator<Item = NodeId> {
        let first = self.first_new_id.map_or(0, |id| id.as_u64());
        let count = if self.first_new_id.is_some() { self.new_nodes } else { 0 };
        (first..first + count).map(NodeId::new)
    }
}

/// Result of an `add_slice` call that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SliceOutcome {
    /// The slice was folded into the graph.
    Merged(SliceReport),
    /// The time marker was already present; nothing changed.
    Skipped {
        /// The already-present marker.
        time_marker: TimeMarker,
    },
}

impl SliceOutcome {
    /// Whether the slice was skipped as already present.
    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped { .. })
    }

    /// The merge report, if the slice was merged.
    pub fn report(&self) -> Option<&SliceReport> {
        match self {
            Self::Merged(report) => Some(report),
            Self::Skipped { .. } => None,
        }
    }
}
