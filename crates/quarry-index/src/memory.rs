use std::collections::{BTreeMap, BTreeSet};
use std::ops::Bound;
use std::sync::atomic::{AtomicU64, Ordering};

use quarry_core::DocumentPath;
use tracing::trace;

use crate::keys::IndexCategory;
use crate::rules::{camel_match, wildcard_match, MatchMode, MatchRule};
use crate::{IndexEntry, QueryIndex, Result};

type Postings = BTreeMap<String, BTreeSet<DocumentPath>>;

/// In-memory index: per-category sorted key → document postings.
///
/// Queries are read-only over `&self`; mutation happens between queries
/// (reindexing is an external trigger). The open/close counters exist for
/// regression tests and diagnostics.
#[derive(Debug, Default)]
pub struct MemoryIndex {
    generation: u64,
    categories: BTreeMap<IndexCategory, Postings>,
    opens: AtomicU64,
    closes: AtomicU64,
}

impl MemoryIndex {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn open_count(&self) -> u64 {
        self.opens.load(Ordering::Relaxed)
    }

    pub fn close_count(&self) -> u64 {
        self.closes.load(Ordering::Relaxed)
    }

    pub fn add_entry(&mut self, category: IndexCategory, key: impl Into<String>, document: DocumentPath) {
        self.categories
            .entry(category)
            .or_default()
            .entry(key.into())
            .or_default()
            .insert(document);
        self.generation += 1;
    }

    /// Removes every posting that mentions `document`, dropping emptied keys.
    pub fn remove_document(&mut self, document: &DocumentPath) {
        for postings in self.categories.values_mut() {
            postings.retain(|_, docs| {
                docs.remove(document);
                !docs.is_empty()
            });
        }
        self.generation += 1;
    }

    /// All `(category, key, documents)` triples, in stable order.
    pub fn entries(&self) -> impl Iterator<Item = (IndexCategory, &str, &BTreeSet<DocumentPath>)> {
        self.categories.iter().flat_map(|(category, postings)| {
            postings
                .iter()
                .map(move |(key, docs)| (*category, key.as_str(), docs))
        })
    }

    pub(crate) fn set_generation(&mut self, generation: u64) {
        self.generation = generation;
    }

    fn query_category(&self, category: IndexCategory, pattern: &str, rule: MatchRule) -> Vec<IndexEntry> {
        let Some(postings) = self.categories.get(&category) else {
            return Vec::new();
        };

        let mut entries = Vec::new();
        let mut push = |key: &str, docs: &BTreeSet<DocumentPath>| {
            entries.push(IndexEntry {
                category,
                key: key.as_bytes().to_vec(),
                documents: docs.iter().cloned().collect(),
            });
        };

        match (rule.mode, rule.case_sensitive) {
            (MatchMode::Exact, true) => {
                if let Some(docs) = postings.get(pattern) {
                    push(pattern, docs);
                }
            }
            (MatchMode::Prefix, true) => {
                let range =
                    postings.range::<String, _>((Bound::Included(pattern.to_string()), Bound::Unbounded));
                for (key, docs) in range {
                    if !key.starts_with(pattern) {
                        break;
                    }
                    push(key, docs);
                }
            }
            _ => {
                for (key, docs) in postings {
                    if stored_key_matches(pattern, key, rule) {
                        push(key, docs);
                    }
                }
            }
        }
        entries
    }
}

/// Applies `rule` to a stored key.
///
/// Pattern globs run over the whole key (encoded suffix segments included, so
/// callers append a trailing `*` for composite-key categories); camel-case
/// runs over the first key segment only, which is always the name part.
fn stored_key_matches(pattern: &str, key: &str, rule: MatchRule) -> bool {
    match rule.mode {
        MatchMode::Exact => {
            if rule.case_sensitive {
                key == pattern
            } else {
                key.eq_ignore_ascii_case(pattern)
            }
        }
        MatchMode::Prefix => {
            debug_assert!(!rule.case_sensitive, "handled by the range scan");
            let mut chars = key.chars();
            pattern.chars().all(|expected| {
                chars
                    .next()
                    .is_some_and(|actual| actual.eq_ignore_ascii_case(&expected))
            })
        }
        MatchMode::Pattern => wildcard_match(pattern, key, rule.case_sensitive),
        MatchMode::CamelCase => {
            let first_segment = key.split('/').next().unwrap_or(key);
            camel_match(pattern, first_segment)
        }
    }
}

impl QueryIndex for MemoryIndex {
    fn open_for_query(&self) -> Result<()> {
        self.opens.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn close_after_query(&self) {
        self.closes.fetch_add(1, Ordering::Relaxed);
    }

    fn query(
        &self,
        categories: &[IndexCategory],
        key: &[u8],
        rule: MatchRule,
    ) -> Result<Vec<IndexEntry>> {
        let Ok(pattern) = std::str::from_utf8(key) else {
            return Ok(Vec::new());
        };

        let mut entries = Vec::new();
        for &category in categories {
            entries.extend(self.query_category(category, pattern, rule));
        }
        trace!(
            pattern,
            categories = categories.len(),
            hits = entries.len(),
            "index query"
        );
        Ok(entries)
    }
}
