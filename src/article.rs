//! Article-level merge: attaches crawled pages to known domains.
//!
//! Each record's host is normalized and matched against the longest suffix
//! already present in the identity store. Matched pages become `Article`
//! nodes in the shared id space and are linked from their domain with a
//! `contains` edge carrying the domain's last-seen marker.

use serde::{Deserialize, Serialize};

use crate::normalize::normalize_domain;
use crate::store::TemporalGraph;
use crate::types::Edge;

/// One extracted page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleRecord {
    /// Page URL.
    pub url: String,
    /// Crawl date as reported by the archive.
    pub date: String,
    /// Extracted text.
    pub text: String,
}

impl ArticleRecord {
    /// Create a record.
    pub fn new(url: impl Into<String>, date: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            date: date.into(),
            text: text.into(),
        }
    }
}

/// Counters of an article merge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleMergeReport {
    /// Records attached to a known domain.
    pub matched: u64,
    /// Records whose host matched no known domain.
    pub unmatched: u64,
    /// Article nodes created.
    pub new_articles: u64,
}

/// Attaches article records to a [`TemporalGraph`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ArticleMerger;

impl ArticleMerger {
    /// Create an article merger.
    pub fn new() -> Self {
        Self
    }

    /// Merge article records into `graph`.
    pub fn merge<I>(&self, graph: &mut TemporalGraph, records: I) -> ArticleMergeReport
    where
        I: IntoIterator<Item = ArticleRecord>,
    {
        let mut report = ArticleMergeReport::default();
        let mut edges = Vec::new();

        for record in records {
            let url = record.url.trim();
            let host = normalize_domain(url);
            let Some(domain) = graph
                .identity()
                .longest_known_suffix(&host)
                .map(|(_, entry)| *entry)
            else {
                report.unmatched += 1;
                continue;
            };

            let (article_id, created) =
                graph
                    .identity_mut()
                    .lookup_or_create_article(url, &record.date, &record.text);
            if created {
                report.new_articles += 1;
            }
            report.matched += 1;
            edges.push(Edge::contains(
                domain.id,
                article_id,
                domain.time_marker.unwrap_or_default(),
            ));
        }

        graph.extend_edges(edges);
        tracing::info!(
            matched = report.matched,
            unmatched = report.unmatched,
            new_articles = report.new_articles,
            "Merged article records"
        );
        report
    }
}
