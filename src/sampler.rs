//! Bounded-budget edge sampling with priority for labeled domains.
//!
//! Edges touching a labeled node are kept unconditionally (up to the
//! budget). All other edges feed a fixed-capacity reservoir (Algorithm R):
//! the k-th such edge is stored directly while the reservoir has room, and
//! afterwards replaces a uniformly chosen slot with probability
//! `capacity / k`. The final set is the labeled edges followed by a uniform
//! draw of as many reservoir entries as the remaining budget allows.
//!
//! The random source is explicit so that runs are reproducible.

use rand::rngs::SmallRng;
use rand::seq::index;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;
use std::hash::Hash;
use std::path::Path;

use crate::reader::{read_edges, ReaderError};
use crate::types::{Edge, NodeId};

/// An edge the sampler can classify by its endpoints.
pub trait SampleEdge {
    /// Node key type.
    type Key: Eq + Hash;

    /// `(src, dst)` endpoints.
    fn endpoints(&self) -> (Self::Key, Self::Key);
}

impl SampleEdge for Edge {
    type Key = NodeId;

    fn endpoints(&self) -> (NodeId, NodeId) {
        self.pair()
    }
}

/// Raw snapshot edge with local ids.
impl SampleEdge for (i64, i64) {
    type Key = i64;

    fn endpoints(&self) -> (i64, i64) {
        *self
    }
}

/// Result of a sampling pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleResult<E> {
    /// Selected edges: labeled first, then reservoir entries.
    pub edges: Vec<E>,
    /// Labeled edges seen in the input.
    pub labeled_seen: u64,
    /// Non-labeled edges seen in the input.
    pub other_seen: u64,
    /// Labeled edges in `edges`.
    pub labeled_kept: usize,
    /// Reservoir edges in `edges`.
    pub reservoir_kept: usize,
}

/// Bounded edge sampler.
#[derive(Debug, Clone)]
pub struct EdgeSampler<K, R> {
    labeled: HashSet<K>,
    max_edges: usize,
    rng: R,
}

impl<K: Eq + Hash> EdgeSampler<K, SmallRng> {
    /// Create a sampler with a seeded [`SmallRng`].
    pub fn seeded<I: IntoIterator<Item = K>>(labeled: I, max_edges: usize, seed: u64) -> Self {
        Self::new(labeled, max_edges, SmallRng::seed_from_u64(seed))
    }
}

impl<K: Eq + Hash, R: Rng> EdgeSampler<K, R> {
    /// Create a sampler over a labeled node set and an edge budget.
    pub fn new<I: IntoIterator<Item = K>>(labeled: I, max_edges: usize, rng: R) -> Self {
        Self {
            labeled: labeled.into_iter().collect(),
            max_edges,
            rng,
        }
    }

    /// Edge budget.
    pub fn max_edges(&self) -> usize {
        self.max_edges
    }

    /// Number of labeled nodes.
    pub fn num_labeled(&self) -> usize {
        self.labeled.len()
    }

    fn is_labeled<E: SampleEdge<Key = K>>(&self, edge: &E) -> bool {
        let (src, dst) = edge.endpoints();
        self.labeled.contains(&src) || self.labeled.contains(&dst)
    }

    /// Sample from an edge stream.
    pub fn sample<E, I>(&mut self, edges: I) -> SampleResult<E>
    where
        E: SampleEdge<Key = K>,
        I: IntoIterator<Item = E>,
    {
        let cap = self.max_edges;
        let mut labeled = Vec::new();
        let mut reservoir: Vec<E> = Vec::with_capacity(cap.min(1 << 20));
        let mut labeled_seen = 0u64;
        let mut other_seen = 0u64;

        for edge in edges {
            if self.is_labeled(&edge) {
                labeled_seen += 1;
                // Anything past the budget would be truncated anyway.
                if labeled.len() < cap {
                    labeled.push(edge);
                }
                continue;
            }

            other_seen += 1;
            if reservoir.len() < cap {
                reservoir.push(edge);
            } else {
                let j = self.rng.gen_range(0..other_seen);
                if j < cap as u64 {
                    reservoir[j as usize] = edge;
                }
            }
        }

        // Reservoir slots still follow stream order, so shrink by a uniform draw.
        let remaining = cap - labeled.len();
        if remaining < reservoir.len() {
            let mut picks = index::sample(&mut self.rng, reservoir.len(), remaining).into_vec();
            picks.sort_unstable();
            let mut slots: Vec<Option<E>> = reservoir.into_iter().map(Some).collect();
            reservoir = picks.into_iter().filter_map(|i| slots[i].take()).collect();
        }
        let labeled_kept = labeled.len();
        let reservoir_kept = reservoir.len();
        labeled.extend(reservoir);

        tracing::debug!(
            labeled_seen,
            other_seen,
            labeled_kept,
            reservoir_kept,
            max_edges = cap,
            "Sampled edges"
        );

        SampleResult {
            edges: labeled,
            labeled_seen,
            other_seen,
            labeled_kept,
            reservoir_kept,
        }
    }
}

impl<R: Rng> EdgeSampler<i64, R> {
    /// Sample a streamed edge snapshot whose labeled set holds local ids.
    pub fn sample_file(&mut self, path: impl AsRef<Path>) -> Result<SampleResult<(i64, i64)>, ReaderError> {
        let mut stream = read_edges(path)?;
        let mut error = None;
        let result = self.sample(stream.by_ref().map_while(|record| match record {
            Ok(edge) => Some(edge),
            Err(e) => {
                error = Some(e);
                None
            }
        }));
        match error {
            Some(e) => Err(e),
            None => Ok(result),
        }
    }
}
