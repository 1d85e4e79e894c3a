use std::collections::HashMap;
use std::sync::Arc;

use quarry_core::{CancelToken, DocumentPath};
use quarry_hir::CompilationUnit;
use quarry_index::{IndexReader, QueryIndex};
use quarry_resolve::{NameEnvironment, Resolver};
use tracing::{debug, trace};

use crate::error::SearchError;
use crate::index_query::IndexPhase;
use crate::locator;
use crate::pattern::SearchPattern;
use crate::report::{KnownEntities, MatchAccumulator, MatchRequestor};
use crate::scope::{SearchScope, WorkspaceScope};
use crate::shadow::{PotentialUnit, ShadowEnvironment};

/// Supplies the compilation unit behind an indexed document.
pub trait UnitStore {
    fn unit(&self, document: &DocumentPath) -> Option<Arc<CompilationUnit>>;
}

/// Document → unit map; the plain store used in tests and embedded setups.
#[derive(Debug, Default)]
pub struct MemoryUnitStore {
    units: HashMap<DocumentPath, Arc<CompilationUnit>>,
}

impl MemoryUnitStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, unit: CompilationUnit) {
        self.units.insert(unit.document.clone(), Arc::new(unit));
    }
}

impl UnitStore for MemoryUnitStore {
    fn unit(&self, document: &DocumentPath) -> Option<Arc<CompilationUnit>> {
        self.units.get(document).cloned()
    }
}

/// Counters for one query execution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchStats {
    pub entries_considered: usize,
    pub documents_walked: usize,
    pub records_reported: usize,
}

/// Drives one query: index phase, per-document resolution through the shadow
/// environment, tree locators, then deduplicated reporting.
///
/// Engines borrow their collaborators and own nothing shared; independent
/// queries may run concurrently against the same index and environment, which
/// are accessed read-only.
pub struct SearchEngine<'a> {
    index: &'a dyn QueryIndex,
    units: &'a dyn UnitStore,
    env: &'a dyn NameEnvironment,
    scope: &'a dyn SearchScope,
    cancel: CancelToken,
}

const EVERYWHERE: WorkspaceScope = WorkspaceScope;

impl<'a> SearchEngine<'a> {
    pub fn new(
        index: &'a dyn QueryIndex,
        units: &'a dyn UnitStore,
        env: &'a dyn NameEnvironment,
    ) -> Self {
        Self {
            index,
            units,
            env,
            scope: &EVERYWHERE,
            cancel: CancelToken::new(),
        }
    }

    #[must_use]
    pub fn with_scope(mut self, scope: &'a dyn SearchScope) -> Self {
        self.scope = scope;
        self
    }

    /// Shares the caller's cancellation token with this engine.
    #[must_use]
    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn execute(
        &self,
        pattern: &SearchPattern,
        requestor: &mut dyn MatchRequestor,
    ) -> Result<SearchStats, SearchError> {
        let mut stats = SearchStats::default();
        debug!(?pattern, "search start");

        // The index handle is scoped to the coarse phase; the guard's drop
        // releases it on success, failure and cancellation paths alike.
        let documents = {
            let reader = IndexReader::open(self.index)?;
            let mut phase = IndexPhase {
                reader: &reader,
                scope: self.scope,
                cancel: &self.cancel,
                entries_considered: 0,
            };
            let documents = phase.run(pattern, requestor)?;
            stats.entries_considered = phase.entries_considered;
            documents
        };
        debug!(candidates = documents.len(), "index phase complete");

        // The candidate units themselves seed the shadow environment, so they
        // answer each other's type lookups ahead of the persistent state.
        let potentials = documents
            .iter()
            .map(|document| match self.units.unit(document) {
                Some(unit) => PotentialUnit::materialized(unit),
                None => PotentialUnit::unmaterialized(document.compound_name()),
            })
            .collect();
        let shadow = ShadowEnvironment::new(self.env, potentials);
        let needs_resolution = pattern.needs_resolution();
        let declarations_of = matches!(pattern, SearchPattern::DeclarationsOf(_));
        let mut known = KnownEntities::default();

        for document in &documents {
            self.cancel.check()?;
            let Some(unit) = self.units.unit(document) else {
                trace!(%document, "candidate has no unit; skipped");
                continue;
            };
            let bindings = if needs_resolution {
                Some(Resolver::new(&shadow).resolve_unit(&unit))
            } else {
                None
            };
            let mut acc = MatchAccumulator::new();
            locator::locate(pattern, &unit, bindings.as_ref(), &mut acc);
            stats.documents_walked += 1;

            for reported in acc.into_reports(document) {
                if declarations_of {
                    // Report the resolved target once, no matter how many
                    // sites refer to it; unresolved sites cannot name their
                    // declaration and are dropped.
                    let Some(entity) = reported.entity else {
                        trace!(%document, "declarations-of site unresolved; dropped");
                        continue;
                    };
                    if !known.first_sighting(entity) {
                        trace!(%document, "duplicate declaration target; dropped");
                        continue;
                    }
                    requestor.report(reported.record.into_declaration());
                } else {
                    requestor.report(reported.record);
                }
                stats.records_reported += 1;
            }
        }

        shadow.cleanup();
        debug!(
            entries = stats.entries_considered,
            documents = stats.documents_walked,
            records = stats.records_reported,
            "search complete"
        );
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::{FieldPattern, MatchSpec, SearchFor};
    use crate::report::RecordCollector;
    use quarry_hir::{TypeKind, UnitBuilder};
    use quarry_index::{index_unit, MemoryIndex};
    use quarry_resolve::TableEnvironment;

    #[test]
    fn two_phase_query_reports_tree_confirmed_matches() {
        let mut b = UnitBuilder::new("com/example/Foo.java").package("com.example");
        let class = b.begin_type("Foo", TypeKind::Class);
        b.add_field(class, "count", Some("int"));
        let unit = b.finish();

        let mut index = MemoryIndex::new();
        index_unit(&mut index, &unit);
        let mut store = MemoryUnitStore::new();
        store.insert(unit);
        let env = TableEnvironment::new();

        let engine = SearchEngine::new(&index, &store, &env);
        let pattern = SearchPattern::from(FieldPattern::new(
            MatchSpec::exact("count"),
            SearchFor::Declarations,
        ));
        let mut collector = RecordCollector::new();
        let stats = engine.execute(&pattern, &mut collector).unwrap();

        assert_eq!(collector.records.len(), 1);
        assert_eq!(stats.records_reported, 1);
        assert_eq!(stats.documents_walked, 1);
        assert_eq!(index.open_count(), 1);
        assert_eq!(index.close_count(), 1);
    }

    #[test]
    fn documents_without_units_are_skipped_not_fatal() {
        let mut index = MemoryIndex::new();
        index.add_entry(
            quarry_index::IndexCategory::FieldDecl,
            "count",
            DocumentPath::new("Ghost.java"),
        );
        let store = MemoryUnitStore::new();
        let env = TableEnvironment::new();

        let engine = SearchEngine::new(&index, &store, &env);
        let pattern = SearchPattern::from(FieldPattern::new(
            MatchSpec::exact("count"),
            SearchFor::Declarations,
        ));
        let mut collector = RecordCollector::new();
        let stats = engine.execute(&pattern, &mut collector).unwrap();
        assert_eq!(stats.documents_walked, 0);
        assert_eq!(stats.records_reported, 0);
    }
}
