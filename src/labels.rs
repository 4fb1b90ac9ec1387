//! Credibility label table (`domain,pc1`).

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

/// Error type for label loading.
#[derive(Debug, thiserror::Error)]
pub enum LabelError {
    /// The label file could not be opened.
    #[error("Cannot open label file {path}: {source}")]
    Io {
        /// File path.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },
    /// A row could not be parsed.
    #[error("Malformed label file {path}: {source}")]
    Csv {
        /// File path.
        path: PathBuf,
        /// Underlying error.
        source: csv::Error,
    },
}

/// One labeled domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Label {
    /// Base domain as written in the label source.
    pub domain: String,
    /// Credibility score.
    #[serde(rename = "pc1", default)]
    pub score: Option<f64>,
}

/// Labels in file order. Extra columns are ignored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LabelTable {
    labels: Vec<Label>,
}

impl LabelTable {
    /// Build a table from labels.
    pub fn new(labels: Vec<Label>) -> Self {
        Self { labels }
    }

    /// Read a label CSV file.
    pub fn read(path: impl AsRef<Path>) -> Result<Self, LabelError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| LabelError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_reader(BufReader::new(file)).map_err(|source| LabelError::Csv {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parse label rows from any reader.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, csv::Error> {
        let labels = csv::Reader::from_reader(reader)
            .deserialize::<Label>()
            .filter(|row| !matches!(row, Ok(label) if label.domain.trim().is_empty()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { labels })
    }

    /// Iterate labels in file order.
    pub fn iter(&self) -> impl Iterator<Item = &Label> {
        self.labels.iter()
    }

    /// Label domains in file order.
    pub fn domains(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(|l| l.domain.as_str())
    }

    /// Number of labels.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}
