use std::collections::HashSet;

use quarry_core::{CancelToken, Cancelled, DocumentPath};
use quarry_index::{decode_key, IndexReader};
use tracing::trace;

use crate::error::SearchError;
use crate::pattern::SearchPattern;
use crate::report::MatchRequestor;
use crate::scope::{AccessCheck, SearchScope};

/// The coarse phase: pattern → index lookups → decoded-key filter → scope
/// check → candidate documents, in index order.
pub(crate) struct IndexPhase<'a> {
    pub reader: &'a IndexReader<'a>,
    pub scope: &'a dyn SearchScope,
    pub cancel: &'a CancelToken,
    pub entries_considered: usize,
}

impl IndexPhase<'_> {
    pub(crate) fn run(
        &mut self,
        pattern: &SearchPattern,
        requestor: &mut dyn MatchRequestor,
    ) -> Result<Vec<DocumentPath>, SearchError> {
        match pattern {
            SearchPattern::And(left, right) => {
                // Both children's index phases must produce the document.
                let left_docs = self.run(left, requestor)?;
                if left_docs.is_empty() {
                    return Ok(left_docs);
                }
                let right_docs: HashSet<DocumentPath> =
                    self.run(right, requestor)?.into_iter().collect();
                Ok(left_docs
                    .into_iter()
                    .filter(|doc| right_docs.contains(doc))
                    .collect())
            }
            SearchPattern::Or(children) => {
                let mut seen = HashSet::new();
                let mut documents = Vec::new();
                for child in children {
                    for document in self.run(child, requestor)? {
                        if seen.insert(document.clone()) {
                            documents.push(document);
                        }
                    }
                }
                Ok(documents)
            }
            SearchPattern::DeclarationsOf(inner) => self.run(inner, requestor),
            _ => self.run_simple(pattern, requestor),
        }
    }

    fn run_simple(
        &mut self,
        pattern: &SearchPattern,
        requestor: &mut dyn MatchRequestor,
    ) -> Result<Vec<DocumentPath>, SearchError> {
        let mut seen = HashSet::new();
        let mut documents = Vec::new();
        for spec in pattern.index_queries() {
            self.cancel.check()?;
            let entries = self.reader.query(&spec.categories, &spec.key, spec.rule)?;
            trace!(
                categories = spec.categories.len(),
                entries = entries.len(),
                "index lookup"
            );
            for entry in entries {
                self.cancel.check()?;
                self.entries_considered += 1;
                // A key the codec cannot decode is a mismatch, not an error.
                let Some(decoded) = decode_key(entry.category, &entry.key) else {
                    continue;
                };
                if !pattern.matches_key(entry.category, &decoded) {
                    continue;
                }
                for document in entry.documents {
                    if seen.contains(&document) {
                        continue;
                    }
                    let access = self.scope.access_check(&document);
                    if access == AccessCheck::Excluded {
                        trace!(%document, "outside search scope");
                        continue;
                    }
                    // `Undetermined` in particular forces this decision; a
                    // rejection cancels the whole query, not just this entry.
                    if !requestor.accept_index_match(&document, &decoded, &access) {
                        self.cancel.cancel();
                        return Err(SearchError::Cancelled(Cancelled));
                    }
                    seen.insert(document.clone());
                    documents.push(document);
                }
            }
        }
        Ok(documents)
    }
}
