//! End-to-end queries over an in-memory index and unit store.

use quarry_core::{CancelToken, DocumentPath};
use quarry_hir::{CompilationUnit, TypeKind, UnitBuilder};
use quarry_index::{
    index_unit, DecodedKey, IndexEntry, IndexCategory, IndexError, MatchRule, MemoryIndex,
    QueryIndex,
};
use quarry_resolve::TableEnvironment;
use quarry_search::{
    Access, AccessCheck, Confidence, DocumentSetScope, FieldPattern, Grain, MatchRecord,
    MatchRequestor, MatchSpec, MemoryUnitStore, MethodPattern, RecordCollector, SearchEngine,
    SearchError, SearchFor, SearchPattern, SuperFlavor, SuperTypePattern, TypePattern,
    VariablePattern,
};

struct Fixture {
    index: MemoryIndex,
    store: MemoryUnitStore,
    env: TableEnvironment,
}

impl Fixture {
    fn new(units: Vec<CompilationUnit>) -> Self {
        let mut index = MemoryIndex::new();
        let mut store = MemoryUnitStore::new();
        for unit in units {
            index_unit(&mut index, &unit);
            store.insert(unit);
        }
        Self {
            index,
            store,
            env: TableEnvironment::new(),
        }
    }

    fn search(&self, pattern: impl Into<SearchPattern>) -> Vec<MatchRecord> {
        let engine = SearchEngine::new(&self.index, &self.store, &self.env);
        let mut collector = RecordCollector::new();
        engine
            .execute(&pattern.into(), &mut collector)
            .expect("query succeeds");
        collector.records
    }
}

fn base_unit() -> CompilationUnit {
    let mut b = UnitBuilder::new("com/example/Base.java").package("com.example");
    let class = b.begin_type("Base", TypeKind::Class);
    b.add_field(class, "shared", Some("int"));
    b.add_method(class, "helper", &[("int", "v")], Some("int"));
    b.finish()
}

fn sub_unit() -> CompilationUnit {
    let mut b = UnitBuilder::new("com/example/Sub.java").package("com.example");
    let class = b.begin_type("Sub", TypeKind::Class);
    b.set_extends(class, "Base");
    b.add_implements(class, "Runnable");
    let method = b.add_method(class, "m", &[], None);
    b.body(method, |bb| {
        // shared = 1; three helper calls; a read and a compound write.
        let target = bb.name("shared");
        let one = bb.int("1");
        let assignment = bb.assign(target, one);
        bb.expr_stmt(assignment);
        for _ in 0..3 {
            let arg = bb.name("shared");
            let call = bb.call(None, "helper", vec![arg]);
            bb.expr_stmt(call);
        }
        let local = bb.name("total");
        let two = bb.int("2");
        let bump = bb.compound_assign(local, two);
        bb.expr_stmt(bump);
        bb.let_stmt(Some("int"), "total", None);
    });
    b.finish()
}

#[test]
fn match_modes_behave_per_contract() {
    let mut b = UnitBuilder::new("A.java");
    let class = b.begin_type("A", TypeKind::Class);
    b.add_field(class, "foo", None);
    b.add_field(class, "fooBar", None);
    b.add_field(class, "xfoo", None);
    b.add_field(class, "faro", None);
    let fixture = Fixture::new(vec![b.finish()]);

    let names = |spec: MatchSpec| {
        fixture
            .search(FieldPattern::new(spec, SearchFor::Declarations))
            .into_iter()
            .map(|record| match record {
                MatchRecord::Field(field) => field.name,
                other => panic!("unexpected record: {other:?}"),
            })
            .collect::<Vec<_>>()
    };

    assert_eq!(names(MatchSpec::exact("foo")), ["foo"]);
    assert_eq!(names(MatchSpec::prefix("foo")), ["foo", "fooBar"]);
    let mut globbed = names(MatchSpec::pattern("f*o"));
    globbed.sort();
    assert_eq!(globbed, ["faro", "foo"]);
}

#[test]
fn camel_case_type_search_matches_humps_only() {
    let mut a = UnitBuilder::new("a/HashMap.java").package("a");
    a.begin_type("HashMap", TypeKind::Class);
    let mut b = UnitBuilder::new("b/Hashmap.java").package("b");
    b.begin_type("Hashmap", TypeKind::Class);
    let fixture = Fixture::new(vec![a.finish(), b.finish()]);

    let records = fixture.search(TypePattern::new(
        MatchSpec::camel_case("HM"),
        SearchFor::Declarations,
    ));
    assert_eq!(records.len(), 1);
    match &records[0] {
        MatchRecord::Type(m) => assert_eq!(m.name, "HashMap"),
        other => panic!("unexpected record: {other:?}"),
    }
}

#[test]
fn documents_outside_the_scope_never_produce_records() {
    let fixture = Fixture::new(vec![base_unit(), sub_unit()]);
    let scope = DocumentSetScope::new([DocumentPath::new("com/example/Sub.java")]);
    let engine = SearchEngine::new(&fixture.index, &fixture.store, &fixture.env).with_scope(&scope);

    let pattern = SearchPattern::from(FieldPattern::new(
        MatchSpec::exact("shared"),
        SearchFor::All,
    ));
    let mut collector = RecordCollector::new();
    engine.execute(&pattern, &mut collector).unwrap();

    // The declaration lives in Base.java, which the scope excludes; only the
    // reference sites inside Sub.java survive.
    assert!(!collector.records.is_empty());
    for record in &collector.records {
        assert_eq!(
            record.core().document,
            DocumentPath::new("com/example/Sub.java")
        );
        assert_eq!(record.core().grain, Grain::Reference);
    }
}

#[test]
fn qualified_field_query_resolves_across_candidate_units() {
    let fixture = Fixture::new(vec![base_unit(), sub_unit()]);
    // `shared` is declared in Base and written in Sub; the declaring-type
    // qualifier needs Sub's resolution to see Base, which only the shadow
    // environment (seeded with the candidate units) can provide here.
    let records = fixture.search(
        FieldPattern::new(MatchSpec::exact("shared"), SearchFor::All)
            .with_declaring_type("com.example.Base"),
    );

    assert_eq!(records.len(), 5);
    for record in &records {
        assert_eq!(record.core().confidence, Confidence::Accurate);
        match record {
            MatchRecord::Field(m) => {
                assert_eq!(
                    m.declaring_type.as_ref().map(|t| t.as_str()),
                    Some("com.example.Base")
                );
            }
            other => panic!("unexpected record: {other:?}"),
        }
    }
    let declarations = records
        .iter()
        .filter(|r| r.core().grain == Grain::Declaration)
        .count();
    assert_eq!(declarations, 1);
}

#[test]
fn missing_candidate_unit_downgrades_instead_of_answering_from_a_placeholder() {
    // Same query as above, but Base.java's unit is absent from the store: its
    // potential match stays unmaterialized, resolution falls through to the
    // (empty) underlying environment, and the qualifier cannot be confirmed.
    let mut index = MemoryIndex::new();
    let base = base_unit();
    let sub = sub_unit();
    index_unit(&mut index, &base);
    index_unit(&mut index, &sub);
    let mut store = MemoryUnitStore::new();
    store.insert(sub);
    let env = TableEnvironment::new();

    let engine = SearchEngine::new(&index, &store, &env);
    let pattern = SearchPattern::from(
        FieldPattern::new(MatchSpec::exact("shared"), SearchFor::All)
            .with_declaring_type("com.example.Base"),
    );
    let mut collector = RecordCollector::new();
    engine.execute(&pattern, &mut collector).unwrap();

    assert!(!collector.records.is_empty());
    for record in &collector.records {
        assert_eq!(record.core().confidence, Confidence::Inaccurate);
    }
}

#[test]
fn read_and_write_accesses_classify_assignment_targets() {
    let fixture = Fixture::new(vec![base_unit(), sub_unit()]);

    let writes = fixture.search(FieldPattern::new(
        MatchSpec::exact("shared"),
        SearchFor::WriteAccesses,
    ));
    assert_eq!(writes.len(), 1);
    match &writes[0] {
        MatchRecord::Field(m) => assert_eq!(m.access, Some(Access::Write)),
        other => panic!("unexpected record: {other:?}"),
    }

    let reads = fixture.search(FieldPattern::new(
        MatchSpec::exact("shared"),
        SearchFor::ReadAccesses,
    ));
    // The three call arguments read the field.
    assert_eq!(reads.len(), 3);

    // A compound assignment target is a write.
    let local_writes = fixture.search(VariablePattern::new(
        MatchSpec::exact("total"),
        SearchFor::WriteAccesses,
    ));
    assert_eq!(local_writes.len(), 1);
    match &local_writes[0] {
        MatchRecord::Local(m) => assert_eq!(m.access, Some(Access::Write)),
        other => panic!("unexpected record: {other:?}"),
    }
}

#[test]
fn declarations_of_reports_each_target_entity_once() {
    let fixture = Fixture::new(vec![base_unit(), sub_unit()]);

    // Three call sites to Base.helper inside Sub.m: exactly one record.
    let records = fixture.search(SearchPattern::declarations_of(
        MethodPattern::new(MatchSpec::exact("helper"), SearchFor::References).into(),
    ));
    assert_eq!(records.len(), 1);
    match &records[0] {
        MatchRecord::Method(m) => {
            assert_eq!(m.selector, "helper");
            assert_eq!(m.core.grain, Grain::Declaration);
            assert_eq!(
                m.declaring_type.as_ref().map(|t| t.as_str()),
                Some("com.example.Base")
            );
        }
        other => panic!("unexpected record: {other:?}"),
    }
}

#[test]
fn super_type_flavors_follow_the_written_slot() {
    let fixture = Fixture::new(vec![base_unit(), sub_unit()]);

    let interfaces = fixture.search(SuperTypePattern::new(
        MatchSpec::exact("Runnable"),
        SuperFlavor::Interfaces,
    ));
    assert_eq!(interfaces.len(), 1);

    // `Base` occupies the superclass slot; an interface-only pattern skips it.
    let wrong_flavor = fixture.search(SuperTypePattern::new(
        MatchSpec::exact("Base"),
        SuperFlavor::Interfaces,
    ));
    assert!(wrong_flavor.is_empty());

    let classes = fixture.search(SuperTypePattern::new(
        MatchSpec::exact("Base"),
        SuperFlavor::Classes,
    ));
    assert_eq!(classes.len(), 1);
}

#[test]
fn or_pattern_merges_both_kinds_without_cross_contamination() {
    let fixture = Fixture::new(vec![base_unit(), sub_unit()]);
    let records = fixture.search(SearchPattern::Or(vec![
        FieldPattern::new(MatchSpec::exact("shared"), SearchFor::References).into(),
        VariablePattern::new(MatchSpec::exact("total"), SearchFor::References).into(),
    ]));

    let fields = records
        .iter()
        .filter(|r| matches!(r, MatchRecord::Field(_)))
        .count();
    let locals = records
        .iter()
        .filter(|r| matches!(r, MatchRecord::Local(_)))
        .count();
    assert_eq!(fields, 4);
    assert_eq!(locals, 1);
}

struct CancelAfterFirst {
    accepted: usize,
}

impl MatchRequestor for CancelAfterFirst {
    fn accept_index_match(
        &mut self,
        _document: &DocumentPath,
        _key: &DecodedKey,
        _access: &AccessCheck,
    ) -> bool {
        self.accepted += 1;
        self.accepted == 1
    }

    fn report(&mut self, record: MatchRecord) {
        panic!("no record should survive a cancelled query: {record:?}");
    }
}

#[test]
fn rejection_cancels_the_whole_query_and_releases_the_handle_once() {
    let fixture = Fixture::new(vec![base_unit(), sub_unit()]);
    let cancel = CancelToken::new();
    let engine = SearchEngine::new(&fixture.index, &fixture.store, &fixture.env)
        .with_cancel_token(cancel.clone());

    let pattern = SearchPattern::from(FieldPattern::new(
        MatchSpec::exact("shared"),
        SearchFor::All,
    ));
    let mut requestor = CancelAfterFirst { accepted: 0 };
    let result = engine.execute(&pattern, &mut requestor);

    assert!(matches!(result, Err(SearchError::Cancelled(_))));
    assert!(cancel.is_cancelled());
    assert_eq!(requestor.accepted, 2);
    assert_eq!(fixture.index.open_count(), 1);
    assert_eq!(fixture.index.close_count(), 1);
}

#[test]
fn pre_cancelled_token_halts_before_any_lookup() {
    let fixture = Fixture::new(vec![base_unit()]);
    let cancel = CancelToken::new();
    cancel.cancel();
    let engine = SearchEngine::new(&fixture.index, &fixture.store, &fixture.env)
        .with_cancel_token(cancel);

    let pattern = SearchPattern::from(FieldPattern::new(
        MatchSpec::exact("shared"),
        SearchFor::All,
    ));
    let mut collector = RecordCollector::new();
    let result = engine.execute(&pattern, &mut collector);

    assert!(matches!(result, Err(SearchError::Cancelled(_))));
    assert!(collector.records.is_empty());
    assert_eq!(fixture.index.open_count(), 1);
    assert_eq!(fixture.index.close_count(), 1);
}

/// A scope that cannot decide membership yet for any document.
struct UndecidedScope;

impl quarry_search::SearchScope for UndecidedScope {
    fn encloses(&self, _document: &DocumentPath) -> bool {
        true
    }

    fn access_check(&self, _document: &DocumentPath) -> AccessCheck {
        AccessCheck::Undetermined
    }
}

struct RejectUndetermined;

impl MatchRequestor for RejectUndetermined {
    fn accept_index_match(
        &mut self,
        _document: &DocumentPath,
        _key: &DecodedKey,
        access: &AccessCheck,
    ) -> bool {
        *access != AccessCheck::Undetermined
    }

    fn report(&mut self, _record: MatchRecord) {}
}

#[test]
fn undetermined_scope_answers_force_an_explicit_decision() {
    let fixture = Fixture::new(vec![base_unit()]);
    let pattern = SearchPattern::from(FieldPattern::new(
        MatchSpec::exact("shared"),
        SearchFor::Declarations,
    ));

    // With the workspace scope the same requestor accepts everything.
    let engine = SearchEngine::new(&fixture.index, &fixture.store, &fixture.env);
    let mut requestor = RejectUndetermined;
    assert!(engine.execute(&pattern, &mut requestor).is_ok());

    // An undecided scope routes the inconclusive lookup to the requestor,
    // whose rejection cancels the query.
    let scope = UndecidedScope;
    let engine = SearchEngine::new(&fixture.index, &fixture.store, &fixture.env).with_scope(&scope);
    let result = engine.execute(&pattern, &mut RejectUndetermined);
    assert!(matches!(result, Err(SearchError::Cancelled(_))));
    assert_eq!(fixture.index.close_count(), fixture.index.open_count());
}

struct FailingIndex {
    inner: MemoryIndex,
}

impl QueryIndex for FailingIndex {
    fn open_for_query(&self) -> quarry_index::Result<()> {
        self.inner.open_for_query()
    }

    fn close_after_query(&self) {
        self.inner.close_after_query();
    }

    fn query(
        &self,
        _categories: &[IndexCategory],
        _key: &[u8],
        _rule: MatchRule,
    ) -> quarry_index::Result<Vec<IndexEntry>> {
        Err(IndexError::Io(std::io::Error::other("disk failure")))
    }
}

#[test]
fn index_failure_propagates_after_the_handle_is_released() {
    let index = FailingIndex {
        inner: MemoryIndex::new(),
    };
    let store = MemoryUnitStore::new();
    let env = TableEnvironment::new();
    let engine = SearchEngine::new(&index, &store, &env);

    let pattern = SearchPattern::from(FieldPattern::new(
        MatchSpec::exact("shared"),
        SearchFor::All,
    ));
    let mut collector = RecordCollector::new();
    let result = engine.execute(&pattern, &mut collector);

    assert!(matches!(result, Err(SearchError::Index(_))));
    assert_eq!(index.inner.open_count(), 1);
    assert_eq!(index.inner.close_count(), 1);
}

#[test]
fn and_pattern_walks_only_documents_matching_both_children() {
    let fixture = Fixture::new(vec![base_unit(), sub_unit()]);
    let engine = SearchEngine::new(&fixture.index, &fixture.store, &fixture.env);

    // Only Base.java declares both the field and the method.
    let pattern = SearchPattern::and(
        FieldPattern::new(MatchSpec::exact("shared"), SearchFor::Declarations).into(),
        MethodPattern::new(MatchSpec::exact("helper"), SearchFor::Declarations).into(),
    );
    let mut collector = RecordCollector::new();
    let stats = engine.execute(&pattern, &mut collector).unwrap();

    assert_eq!(stats.documents_walked, 1);
    // The conjunction holds on no single node, so nothing is reported.
    assert!(collector.records.is_empty());
}
