//! Identity store: the authoritative canonical-domain → global-id mapping.
//!
//! ## Invariants
//!
//! - Every canonical domain seen in any merged slice has exactly one id.
//! - Ids come from a single monotonically increasing counter shared by
//!   domain and article nodes, and are never reused.
//! - Because ids are monotonic, "known before this merge" is exactly
//!   `id < next_id` as observed when the merge started.
//!
//! The store is single-writer. It provides no internal locking.

use std::collections::{BTreeSet, HashMap, HashSet};

use crate::normalize::normalize_domain;
use crate::types::{Node, NodeId, TimeMarker};

/// Identity record of a domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DomainEntry {
    /// Global id.
    pub id: NodeId,
    /// Most recent slice that mentioned the domain.
    pub time_marker: Option<TimeMarker>,
}

/// Identity record of an article page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleEntry {
    /// Global id.
    pub id: NodeId,
    /// Crawl date as reported by the archive.
    pub date: String,
    /// Extracted text.
    pub text: String,
}

/// Mapping from canonical domain to `(global id, last-seen marker)`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentityStore {
    domains: HashMap<String, DomainEntry>,
    articles: HashMap<String, ArticleEntry>,
    next_id: u64,
    time_markers: BTreeSet<TimeMarker>,
}

impl IdentityStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the id of `domain`, creating one if it has never been seen.
    ///
    /// An existing domain's marker becomes the max of the old and new
    /// markers (last-seen semantics).
    pub fn lookup_or_create(&mut self, domain: &str, time_marker: TimeMarker) -> NodeId {
        if let Some(entry) = self.domains.get_mut(domain) {
            entry.time_marker = entry.time_marker.max(Some(time_marker));
            return entry.id;
        }

        let id = self.allocate();
        self.domains.insert(
            domain.to_string(),
            DomainEntry {
                id,
                time_marker: Some(time_marker),
            },
        );
        id
    }

    /// Return the id of an article URL, creating the article node if needed.
    ///
    /// The boolean is `true` when a new node was created. The stored date
    /// and text of an existing article are left untouched.
    pub fn lookup_or_create_article(&mut self, url: &str, date: &str, text: &str) -> (NodeId, bool) {
        if let Some(entry) = self.articles.get(url) {
            return (entry.id, false);
        }
        let id = self.allocate();
        self.articles.insert(
            url.to_string(),
            ArticleEntry {
                id,
                date: date.to_string(),
                text: text.to_string(),
            },
        );
        (id, true)
    }

    fn allocate(&mut self) -> NodeId {
        let id = NodeId::new(self.next_id);
        self.next_id += 1;
        id
    }

    /// Look up a domain without modifying the store.
    pub fn get(&self, domain: &str) -> Option<&DomainEntry> {
        self.domains.get(domain)
    }

    /// Look up an article without modifying the store.
    pub fn get_article(&self, url: &str) -> Option<&ArticleEntry> {
        self.articles.get(url)
    }

    /// Id the next created node will receive.
    pub fn next_id(&self) -> NodeId {
        NodeId::new(self.next_id)
    }

    /// Whether `id` was assigned before the counter reached `watermark`.
    pub fn is_known_before(id: NodeId, watermark: NodeId) -> bool {
        id < watermark
    }

    /// Whether a slice with this marker has already been merged.
    pub fn has_time_marker(&self, time_marker: TimeMarker) -> bool {
        self.time_markers.contains(&time_marker)
    }

    /// Record a slice marker as merged.
    pub fn mark_time_marker(&mut self, time_marker: TimeMarker) {
        self.time_markers.insert(time_marker);
    }

    /// Merged slice markers in ascending order.
    pub fn time_markers(&self) -> impl Iterator<Item = TimeMarker> + '_ {
        self.time_markers.iter().copied()
    }

    /// Number of domain nodes.
    pub fn num_domains(&self) -> usize {
        self.domains.len()
    }

    /// Number of article nodes.
    pub fn num_articles(&self) -> usize {
        self.articles.len()
    }

    /// Resolve label domains to the ids of matching domain nodes.
    ///
    /// Labels are normalized the same way vertices are; unknown labels are
    /// ignored.
    pub fn resolve_labels<'a, I>(&self, labels: I) -> HashSet<NodeId>
    where
        I: IntoIterator<Item = &'a str>,
    {
        labels
            .into_iter()
            .filter_map(|label| self.domains.get(&normalize_domain(label)))
            .map(|entry| entry.id)
            .collect()
    }

    /// Suffix lookup used to attach URLs to known domains.
    ///
    /// Returns the longest suffix of `host` (itself included) that is a
    /// known domain.
    pub fn longest_known_suffix<'h>(&self, host: &'h str) -> Option<(&'h str, &DomainEntry)> {
        crate::normalize::registrable_suffixes(host)
            .into_iter()
            .find_map(|suffix| self.domains.get(suffix).map(|entry| (suffix, entry)))
    }

    /// All nodes, domains first, each group ordered by id.
    pub fn nodes(&self) -> Vec<Node> {
        let mut domains: Vec<Node> = self
            .domains
            .iter()
            .map(|(domain, entry)| Node {
                id: entry.id,
                domain_or_url: domain.clone(),
                time_marker: entry.time_marker,
                kind: crate::types::NodeKind::Domain,
                date: None,
                text: None,
            })
            .collect();
        domains.sort();

        let mut articles: Vec<Node> = self
            .articles
            .iter()
            .map(|(url, entry)| Node::article(entry.id, url.clone(), entry.date.clone(), entry.text.clone()))
            .collect();
        articles.sort();

        domains.extend(articles);
        domains
    }

    /// Restore a persisted domain row.
    ///
    /// Returns `false` (and keeps the first row) if the domain is already
    /// present. The counter is advanced past `id`.
    pub fn restore_domain(&mut self, domain: String, id: NodeId, time_marker: Option<TimeMarker>) -> bool {
        if self.domains.contains_key(&domain) {
            return false;
        }
        self.bump_past(id);
        if let Some(marker) = time_marker {
            self.time_markers.insert(marker);
        }
        self.domains.insert(domain, DomainEntry { id, time_marker });
        true
    }

    /// Restore a persisted article row. Same duplicate rule as domains.
    pub fn restore_article(&mut self, url: String, id: NodeId, date: String, text: String) -> bool {
        if self.articles.contains_key(&url) {
            return false;
        }
        self.bump_past(id);
        self.articles.insert(url, ArticleEntry { id, date, text });
        true
    }

    /// Ensure the counter is at least `floor`.
    pub fn reserve_ids_below(&mut self, floor: NodeId) {
        self.next_id = self.next_id.max(floor.as_u64());
    }

    fn bump_past(&mut self, id: NodeId) {
        self.next_id = self.next_id.max(id.as_u64() + 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(raw: i64) -> TimeMarker {
        TimeMarker::new(raw)
    }

    #[test]
    fn test_lookup_or_create_assigns_monotonic_ids() {
        let mut store = IdentityStore::new();
        let a = store.lookup_or_create("a.com", t(1));
        let b = store.lookup_or_create("b.com", t(1));
        let a_again = store.lookup_or_create("a.com", t(2));

        assert_eq!(a, NodeId::new(0));
        assert_eq!(b, NodeId::new(1));
        assert_eq!(a_again, a);
        assert_eq!(store.next_id(), NodeId::new(2));
        assert_eq!(store.num_domains(), 2);
    }

    #[test]
    fn test_time_marker_is_last_seen_max() {
        let mut store = IdentityStore::new();
        store.lookup_or_create("a.com", t(20240101));
        store.lookup_or_create("a.com", t(20230101));
        assert_eq!(store.get("a.com").unwrap().time_marker, Some(t(20240101)));

        store.lookup_or_create("a.com", t(20250101));
        assert_eq!(store.get("a.com").unwrap().time_marker, Some(t(20250101)));
    }

    #[test]
    fn test_articles_share_id_space() {
        let mut store = IdentityStore::new();
        store.lookup_or_create("a.com", t(1));
        let (art, created) = store.lookup_or_create_article("https://a.com/x", "2024", "body");
        let (same, created_again) = store.lookup_or_create_article("https://a.com/x", "2025", "other");
        let next = store.lookup_or_create("b.com", t(1));

        assert!(created);
        assert!(!created_again);
        assert_eq!(art, same);
        assert_eq!(art, NodeId::new(1));
        assert_eq!(next, NodeId::new(2));
        assert_eq!(store.get_article("https://a.com/x").unwrap().date, "2024");
    }

    #[test]
    fn test_time_markers() {
        let mut store = IdentityStore::new();
        assert!(!store.has_time_marker(t(5)));
        store.mark_time_marker(t(5));
        store.mark_time_marker(t(3));
        assert!(store.has_time_marker(t(5)));
        assert_eq!(store.time_markers().collect::<Vec<_>>(), vec![t(3), t(5)]);
    }

    #[test]
    fn test_resolve_labels_normalizes() {
        let mut store = IdentityStore::new();
        let id = store.lookup_or_create("example.com", t(1));
        let resolved = store.resolve_labels(["WWW.Example.com", "unknown.org"]);
        assert_eq!(resolved.len(), 1);
        assert!(resolved.contains(&id));
    }

    #[test]
    fn test_longest_known_suffix() {
        let mut store = IdentityStore::new();
        let parent = store.lookup_or_create("example.com", t(1));
        let child = store.lookup_or_create("news.example.com", t(1));

        let (suffix, entry) = store.longest_known_suffix("a.news.example.com").unwrap();
        assert_eq!(suffix, "news.example.com");
        assert_eq!(entry.id, child);

        let (_, entry) = store.longest_known_suffix("blog.example.com").unwrap();
        assert_eq!(entry.id, parent);
        assert!(store.longest_known_suffix("other.net").is_none());
    }

    #[test]
    fn test_restore_advances_counter_and_rejects_duplicates() {
        let mut store = IdentityStore::new();
        assert!(store.restore_domain("a.com".into(), NodeId::new(7), Some(t(9))));
        assert!(!store.restore_domain("a.com".into(), NodeId::new(8), None));
        assert!(store.restore_article("u".into(), NodeId::new(3), "d".into(), "x".into()));

        assert_eq!(store.next_id(), NodeId::new(8));
        assert_eq!(store.get("a.com").unwrap().id, NodeId::new(7));
        assert!(store.has_time_marker(t(9)));
        assert_eq!(store.lookup_or_create("b.com", t(10)), NodeId::new(8));
    }

    #[test]
    fn test_nodes_ordering() {
        let mut store = IdentityStore::new();
        store.lookup_or_create("b.com", t(1));
        store.lookup_or_create_article("https://b.com/1", "d", "x");
        store.lookup_or_create("a.com", t(1));

        let nodes = store.nodes();
        let ids: Vec<u64> = nodes.iter().map(|n| n.id.as_u64()).collect();
        assert_eq!(ids, vec![0, 2, 1]);
        assert!(!nodes[2].is_domain());
    }
}
