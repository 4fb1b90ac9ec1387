//! Streaming readers for crawl snapshot files.
//!
//! A snapshot is two line-oriented files:
//!
//! ```text
//! vertices.txt.gz   local_id \t raw_domain [\t ignored columns...]
//! edges.txt.gz      local_src <whitespace> local_dst
//! ```
//!
//! Files ending in `.gz` are decoded as (possibly multi-member) gzip; other
//! files are read as plain text. Both readers are lazy, finite and
//! non-restartable: each call opens the file once and yields records as it
//! goes. Malformed lines are skipped and counted, never fatal. Invalid UTF-8
//! is replaced rather than rejected.

use flate2::read::MultiGzDecoder;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use crate::normalize::normalize_domain;

/// Error type for snapshot reading.
#[derive(Debug, thiserror::Error)]
pub enum ReaderError {
    /// The snapshot file could not be opened.
    #[error("Cannot open snapshot file {path}: {source}")]
    Open {
        /// File path.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },
    /// Reading failed part way through (truncated or corrupt stream).
    #[error("Cannot read snapshot file {path}: {source}")]
    Read {
        /// File path.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },
}

/// Open a snapshot file as a buffered line source.
fn open_lines(path: &Path) -> Result<LineSource, ReaderError> {
    let file = File::open(path).map_err(|source| ReaderError::Open {
        path: path.to_path_buf(),
        source,
    })?;

    let is_gzip = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("gz"))
        .unwrap_or(false);

    let inner: Box<dyn BufRead + Send> = if is_gzip {
        Box::new(BufReader::new(MultiGzDecoder::new(file)))
    } else {
        Box::new(BufReader::new(file))
    };

    Ok(LineSource {
        path: path.to_path_buf(),
        inner,
        buf: Vec::with_capacity(256),
        done: false,
    })
}

/// Raw line iterator shared by both record streams.
struct LineSource {
    path: PathBuf,
    inner: Box<dyn BufRead + Send>,
    buf: Vec<u8>,
    done: bool,
}

impl LineSource {
    /// Next line with the terminator removed, `None` at end of input.
    fn next_line(&mut self) -> Option<Result<String, ReaderError>> {
        if self.done {
            return None;
        }
        self.buf.clear();
        match self.inner.read_until(b'\n', &mut self.buf) {
            Ok(0) => {
                self.done = true;
                None
            }
            Ok(_) => {
                let line = String::from_utf8_lossy(&self.buf);
                Some(Ok(line.trim_end_matches(['\n', '\r']).to_string()))
            }
            Err(source) => {
                self.done = true;
                Some(Err(ReaderError::Read {
                    path: self.path.clone(),
                    source,
                }))
            }
        }
    }
}

/// Parse one vertex line into `(local_id, normalized_domain)`.
///
/// The line must carry at least two tab-separated fields: an integer id and a
/// non-empty domain. Trailing columns (e.g. host counts) are ignored.
pub fn parse_vertex_line(line: &str) -> Option<(i64, String)> {
    let mut fields = line.split('\t');
    let local_id = fields.next()?.trim().parse::<i64>().ok()?;
    let raw_domain = fields.next()?.trim();
    if raw_domain.is_empty() {
        return None;
    }
    Some((local_id, normalize_domain(raw_domain)))
}

/// Parse one edge line into `(local_src, local_dst)`.
///
/// Exactly two whitespace-separated integers are required.
pub fn parse_edge_line(line: &str) -> Option<(i64, i64)> {
    let mut fields = line.split_whitespace();
    let src = fields.next()?.parse::<i64>().ok()?;
    let dst = fields.next()?.parse::<i64>().ok()?;
    if fields.next().is_some() {
        return None;
    }
    Some((src, dst))
}

/// Lazy stream of `(local_id, normalized_domain)` records.
pub struct VertexStream {
    lines: LineSource,
    read: u64,
    skipped: u64,
}

impl VertexStream {
    /// Records yielded so far.
    pub fn records_read(&self) -> u64 {
        self.read
    }

    /// Malformed lines skipped so far.
    pub fn skipped_lines(&self) -> u64 {
        self.skipped
    }

    /// Path being read.
    pub fn path(&self) -> &Path {
        &self.lines.path
    }
}

impl Iterator for VertexStream {
    type Item = Result<(i64, String), ReaderError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = match self.lines.next_line()? {
                Ok(line) => line,
                Err(e) => return Some(Err(e)),
            };
            if line.trim().is_empty() {
                continue;
            }
            match parse_vertex_line(&line) {
                Some(record) => {
                    self.read += 1;
                    return Some(Ok(record));
                }
                None => self.skipped += 1,
            }
        }
    }
}

/// Lazy stream of `(local_src, local_dst)` records.
pub struct EdgeStream {
    lines: LineSource,
    read: u64,
    skipped: u64,
}

impl EdgeStream {
    /// Records yielded so far.
    pub fn records_read(&self) -> u64 {
        self.read
    }

    /// Malformed lines skipped so far.
    pub fn skipped_lines(&self) -> u64 {
        self.skipped
    }

    /// Path being read.
    pub fn path(&self) -> &Path {
        &self.lines.path
    }
}

impl Iterator for EdgeStream {
    type Item = Result<(i64, i64), ReaderError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = match self.lines.next_line()? {
                Ok(line) => line,
                Err(e) => return Some(Err(e)),
            };
            if line.trim().is_empty() {
                continue;
            }
            match parse_edge_line(&line) {
                Some(record) => {
                    self.read += 1;
                    return Some(Ok(record));
                }
                None => self.skipped += 1,
            }
        }
    }
}

/// Open a vertex snapshot for streaming.
pub fn read_vertices(path: impl AsRef<Path>) -> Result<VertexStream, ReaderError> {
    Ok(VertexStream {
        lines: open_lines(path.as_ref())?,
        read: 0,
        skipped: 0,
    })
}

/// Open an edge snapshot for streaming.
pub fn read_edges(path: impl AsRef<Path>) -> Result<EdgeStream, ReaderError> {
    Ok(EdgeStream {
        lines: open_lines(path.as_ref())?,
        read: 0,
        skipped: 0,
    })
}
