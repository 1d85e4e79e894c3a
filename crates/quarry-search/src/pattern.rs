use quarry_hir::TypeKind;
use quarry_index::{
    DecodedKey, IndexCategory, MatchMode, MatchRule, MethodKey, SimpleKey, SuperRefKey,
    TypeDeclKey, SEPARATOR,
};

/// Which occurrences of an entity a pattern asks for.
///
/// `ReadAccesses`/`WriteAccesses` narrow reference matching for fields and
/// variables; for other entity kinds they behave like `References`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchFor {
    Declarations,
    References,
    All,
    ReadAccesses,
    WriteAccesses,
}

impl SearchFor {
    pub(crate) fn wants_declarations(self) -> bool {
        matches!(self, SearchFor::Declarations | SearchFor::All)
    }

    pub(crate) fn wants_references(self) -> bool {
        !matches!(self, SearchFor::Declarations)
    }
}

/// The primary name of a pattern plus the rule it is compared under.
///
/// A spec without a name is the open wildcard: it matches every candidate of
/// the pattern's kind, which is legal and intentional.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchSpec {
    pub name: Option<String>,
    pub rule: MatchRule,
}

impl MatchSpec {
    pub fn exact(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            rule: MatchRule::exact(),
        }
    }

    pub fn prefix(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            rule: MatchRule::prefix(),
        }
    }

    pub fn pattern(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            rule: MatchRule::pattern(),
        }
    }

    pub fn camel_case(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            rule: MatchRule::camel_case(),
        }
    }

    /// The unbound wildcard: matches everything of the pattern's kind.
    pub fn any() -> Self {
        Self {
            name: None,
            rule: MatchRule::prefix(),
        }
    }

    #[must_use]
    pub fn case_insensitive(mut self) -> Self {
        self.rule = self.rule.case_insensitive();
        self
    }

    pub(crate) fn matches(&self, candidate: &str) -> bool {
        match &self.name {
            None => true,
            Some(pattern) => self.rule.matches(pattern, candidate),
        }
    }

    pub(crate) fn case_sensitive(&self) -> bool {
        self.rule.case_sensitive
    }
}

/// One index lookup derived from a pattern: which categories to probe, with
/// what key bytes, under what rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexQuerySpec {
    pub categories: Vec<IndexCategory>,
    pub key: Vec<u8>,
    pub rule: MatchRule,
}

/// A structured query for one program entity, or a combination of them.
///
/// Simple variants carry the entity's name spec, optional qualifiers and the
/// occurrence grain; `And`/`Or` combine sub-patterns; `DeclarationsOf` turns
/// the reference sites its inner pattern locates into one declaration report
/// per distinct resolved target entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchPattern {
    Package(PackagePattern),
    Type(TypePattern),
    Field(FieldPattern),
    Method(MethodPattern),
    Variable(VariablePattern),
    SuperType(SuperTypePattern),
    And(Box<SearchPattern>, Box<SearchPattern>),
    Or(Vec<SearchPattern>),
    DeclarationsOf(Box<SearchPattern>),
}

impl SearchPattern {
    /// Whether matching needs resolved bindings to confirm candidates.
    ///
    /// True iff any qualifying field besides the primary name is set; a
    /// pattern without qualifiers is fully decided by tree matching alone.
    #[must_use]
    pub fn needs_resolution(&self) -> bool {
        match self {
            SearchPattern::Package(_) => false,
            SearchPattern::Type(p) => p.package.is_some() || p.classifier.is_some(),
            SearchPattern::Field(p) => p.declaring_type.is_some() || p.field_type.is_some(),
            SearchPattern::Method(p) => {
                p.declaring_type.is_some() || p.return_type.is_some() || p.param_types.is_some()
            }
            SearchPattern::Variable(p) => p.var_type.is_some(),
            SearchPattern::SuperType(p) => p.package.is_some(),
            SearchPattern::And(left, right) => left.needs_resolution() && right.needs_resolution(),
            SearchPattern::Or(children) => children.iter().any(SearchPattern::needs_resolution),
            SearchPattern::DeclarationsOf(_) => true,
        }
    }

    /// The index lookups this pattern wants.
    ///
    /// Combinators return the union of their children's lookups; the engine
    /// applies the combinator's own document-set semantics (intersection for
    /// `And`, deduplicated union for `Or`) on top.
    #[must_use]
    pub fn index_queries(&self) -> Vec<IndexQuerySpec> {
        match self {
            SearchPattern::Package(p) => p.index_queries(),
            SearchPattern::Type(p) => p.index_queries(),
            SearchPattern::Field(p) => p.index_queries(),
            SearchPattern::Method(p) => p.index_queries(),
            SearchPattern::Variable(p) => p.index_queries(),
            SearchPattern::SuperType(p) => p.index_queries(),
            SearchPattern::And(left, right) => {
                let mut specs = left.index_queries();
                specs.extend(right.index_queries());
                specs
            }
            SearchPattern::Or(children) => {
                children.iter().flat_map(SearchPattern::index_queries).collect()
            }
            SearchPattern::DeclarationsOf(inner) => inner.index_queries(),
        }
    }

    /// Re-validates a decoded index key against this pattern's own fields,
    /// short-circuiting on the first mismatch.
    #[must_use]
    pub fn matches_key(&self, category: IndexCategory, key: &DecodedKey) -> bool {
        match self {
            SearchPattern::Package(p) => p.matches_key(category, key),
            SearchPattern::Type(p) => p.matches_key(category, key),
            SearchPattern::Field(p) => p.matches_key(category, key),
            SearchPattern::Method(p) => p.matches_key(category, key),
            SearchPattern::Variable(p) => p.matches_key(category, key),
            SearchPattern::SuperType(p) => p.matches_key(category, key),
            SearchPattern::And(left, right) => {
                left.matches_key(category, key) || right.matches_key(category, key)
            }
            SearchPattern::Or(children) => {
                children.iter().any(|c| c.matches_key(category, key))
            }
            SearchPattern::DeclarationsOf(inner) => inner.matches_key(category, key),
        }
    }

    pub fn declarations_of(inner: SearchPattern) -> Self {
        SearchPattern::DeclarationsOf(Box::new(inner))
    }

    pub fn and(left: SearchPattern, right: SearchPattern) -> Self {
        SearchPattern::And(Box::new(left), Box::new(right))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackagePattern {
    pub spec: MatchSpec,
    pub search_for: SearchFor,
}

impl PackagePattern {
    pub fn new(spec: MatchSpec, search_for: SearchFor) -> Self {
        Self { spec, search_for }
    }

    fn index_queries(&self) -> Vec<IndexQuerySpec> {
        let mut categories = Vec::new();
        if self.search_for.wants_declarations() {
            categories.push(IndexCategory::PackageDecl);
        }
        if self.search_for.wants_references() {
            categories.push(IndexCategory::PackageRef);
        }
        vec![simple_spec(categories, &self.spec)]
    }

    fn matches_key(&self, category: IndexCategory, key: &DecodedKey) -> bool {
        let wanted = match category {
            IndexCategory::PackageDecl => self.search_for.wants_declarations(),
            IndexCategory::PackageRef => self.search_for.wants_references(),
            _ => false,
        };
        if !wanted {
            return false;
        }
        match key {
            DecodedKey::Package(pkg) => self.spec.matches(&pkg.name),
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypePattern {
    pub spec: MatchSpec,
    /// Dotted package qualifier, compared against the resolved identity.
    pub package: Option<String>,
    /// Restricts to one declaration kind (class/interface/enum/annotation).
    pub classifier: Option<TypeKind>,
    pub search_for: SearchFor,
}

impl TypePattern {
    pub fn new(spec: MatchSpec, search_for: SearchFor) -> Self {
        Self {
            spec,
            package: None,
            classifier: None,
            search_for,
        }
    }

    #[must_use]
    pub fn with_package(mut self, package: impl Into<String>) -> Self {
        self.package = Some(package.into());
        self
    }

    #[must_use]
    pub fn with_classifier(mut self, classifier: TypeKind) -> Self {
        self.classifier = Some(classifier);
        self
    }

    fn index_queries(&self) -> Vec<IndexQuerySpec> {
        let mut specs = Vec::new();
        if self.search_for.wants_declarations() {
            let (key, rule) = match (self.spec.rule.mode, &self.spec.name) {
                (MatchMode::Exact, Some(name)) => match (&self.package, self.classifier) {
                    (Some(package), Some(kind)) => (
                        TypeDeclKey {
                            simple_name: name.clone(),
                            package: package.clone(),
                            kind,
                        }
                        .encode(),
                        self.spec.rule,
                    ),
                    (Some(package), None) => (
                        format!("{name}{SEPARATOR}{package}{SEPARATOR}").into_bytes(),
                        prefix_like(self.spec.rule),
                    ),
                    (None, _) => (
                        format!("{name}{SEPARATOR}").into_bytes(),
                        prefix_like(self.spec.rule),
                    ),
                },
                _ => composite_key(&self.spec),
            };
            specs.push(IndexQuerySpec {
                categories: vec![IndexCategory::TypeDecl],
                key,
                rule,
            });
        }
        if self.search_for.wants_references() {
            specs.push(simple_spec(vec![IndexCategory::TypeRef], &self.spec));
        }
        specs
    }

    fn matches_key(&self, category: IndexCategory, key: &DecodedKey) -> bool {
        match (category, key) {
            (IndexCategory::TypeDecl, DecodedKey::Type(decoded)) => {
                if !self.search_for.wants_declarations() {
                    return false;
                }
                if !self.spec.matches(&decoded.simple_name) {
                    return false;
                }
                if let Some(package) = &self.package {
                    if !eq_with_case(package, &decoded.package, self.spec.case_sensitive()) {
                        return false;
                    }
                }
                match self.classifier {
                    Some(kind) => kind == decoded.kind,
                    None => true,
                }
            }
            (IndexCategory::TypeRef, DecodedKey::Simple(decoded)) => {
                // Package and classifier need the resolved identity; the tree
                // stage confirms them.
                self.search_for.wants_references() && self.spec.matches(&decoded.name)
            }
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPattern {
    pub spec: MatchSpec,
    /// Simple or dotted type qualifier for the declaring type.
    pub declaring_type: Option<String>,
    /// Qualifier for the field's declared type.
    pub field_type: Option<String>,
    pub search_for: SearchFor,
}

impl FieldPattern {
    pub fn new(spec: MatchSpec, search_for: SearchFor) -> Self {
        Self {
            spec,
            declaring_type: None,
            field_type: None,
            search_for,
        }
    }

    #[must_use]
    pub fn with_declaring_type(mut self, qualifier: impl Into<String>) -> Self {
        self.declaring_type = Some(qualifier.into());
        self
    }

    #[must_use]
    pub fn with_field_type(mut self, qualifier: impl Into<String>) -> Self {
        self.field_type = Some(qualifier.into());
        self
    }

    fn index_queries(&self) -> Vec<IndexQuerySpec> {
        let mut categories = Vec::new();
        if self.search_for.wants_declarations() {
            categories.push(IndexCategory::FieldDecl);
        }
        if self.search_for.wants_references() {
            // Unqualified reads and writes share the bare-name namespace with
            // variable references; decoded keys are re-validated per pattern.
            categories.push(IndexCategory::Ref);
        }
        vec![simple_spec(categories, &self.spec)]
    }

    fn matches_key(&self, category: IndexCategory, key: &DecodedKey) -> bool {
        let wanted = match category {
            IndexCategory::FieldDecl => self.search_for.wants_declarations(),
            IndexCategory::Ref => self.search_for.wants_references(),
            _ => false,
        };
        if !wanted {
            return false;
        }
        match key {
            DecodedKey::Simple(decoded) => self.spec.matches(&decoded.name),
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodPattern {
    /// Selector spec; constructors are not matched by method patterns.
    pub spec: MatchSpec,
    pub param_count: Option<u32>,
    pub declaring_type: Option<String>,
    pub return_type: Option<String>,
    /// Structural parameter-type qualifiers, one per position.
    pub param_types: Option<Vec<String>>,
    pub search_for: SearchFor,
}

impl MethodPattern {
    pub fn new(spec: MatchSpec, search_for: SearchFor) -> Self {
        Self {
            spec,
            param_count: None,
            declaring_type: None,
            return_type: None,
            param_types: None,
            search_for,
        }
    }

    #[must_use]
    pub fn with_param_count(mut self, count: u32) -> Self {
        self.param_count = Some(count);
        self
    }

    #[must_use]
    pub fn with_declaring_type(mut self, qualifier: impl Into<String>) -> Self {
        self.declaring_type = Some(qualifier.into());
        self
    }

    #[must_use]
    pub fn with_return_type(mut self, qualifier: impl Into<String>) -> Self {
        self.return_type = Some(qualifier.into());
        self
    }

    /// Also pins the parameter count to the qualifier list's length.
    #[must_use]
    pub fn with_param_types(mut self, qualifiers: Vec<String>) -> Self {
        self.param_count = Some(qualifiers.len() as u32);
        self.param_types = Some(qualifiers);
        self
    }

    fn index_queries(&self) -> Vec<IndexQuerySpec> {
        let mut categories = Vec::new();
        if self.search_for.wants_declarations() {
            categories.push(IndexCategory::MethodDecl);
        }
        if self.search_for.wants_references() {
            categories.push(IndexCategory::MethodRef);
        }
        let (key, rule) = match (self.spec.rule.mode, &self.spec.name, self.param_count) {
            (MatchMode::Exact, Some(selector), Some(count)) => (
                MethodKey {
                    selector: selector.clone(),
                    param_count: count,
                }
                .encode(),
                self.spec.rule,
            ),
            (MatchMode::Exact, Some(selector), None) => (
                format!("{selector}{SEPARATOR}").into_bytes(),
                prefix_like(self.spec.rule),
            ),
            _ => composite_key(&self.spec),
        };
        vec![IndexQuerySpec {
            categories,
            key,
            rule,
        }]
    }

    fn matches_key(&self, category: IndexCategory, key: &DecodedKey) -> bool {
        let wanted = match category {
            IndexCategory::MethodDecl => self.search_for.wants_declarations(),
            IndexCategory::MethodRef => self.search_for.wants_references(),
            _ => false,
        };
        if !wanted {
            return false;
        }
        match key {
            DecodedKey::Method(decoded) => {
                if !self.spec.matches(&decoded.selector) {
                    return false;
                }
                match self.param_count {
                    Some(count) => count == decoded.param_count,
                    None => true,
                }
            }
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariablePattern {
    pub spec: MatchSpec,
    /// Qualifier for the variable's declared type.
    pub var_type: Option<String>,
    pub search_for: SearchFor,
}

impl VariablePattern {
    pub fn new(spec: MatchSpec, search_for: SearchFor) -> Self {
        Self {
            spec,
            var_type: None,
            search_for,
        }
    }

    #[must_use]
    pub fn with_var_type(mut self, qualifier: impl Into<String>) -> Self {
        self.var_type = Some(qualifier.into());
        self
    }

    fn index_queries(&self) -> Vec<IndexQuerySpec> {
        let mut categories = Vec::new();
        if self.search_for.wants_declarations() {
            categories.push(IndexCategory::VarDecl);
        }
        if self.search_for.wants_references() {
            categories.push(IndexCategory::Ref);
        }
        vec![simple_spec(categories, &self.spec)]
    }

    fn matches_key(&self, category: IndexCategory, key: &DecodedKey) -> bool {
        let wanted = match category {
            IndexCategory::VarDecl => self.search_for.wants_declarations(),
            IndexCategory::Ref => self.search_for.wants_references(),
            _ => false,
        };
        if !wanted {
            return false;
        }
        match key {
            DecodedKey::Simple(decoded) => self.spec.matches(&decoded.name),
            _ => false,
        }
    }
}

/// Which super clause slots a super-type pattern admits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuperFlavor {
    Classes,
    Interfaces,
    Both,
}

impl SuperFlavor {
    pub(crate) fn admits(self, position: quarry_hir::SuperPosition) -> bool {
        match self {
            SuperFlavor::Classes => position == quarry_hir::SuperPosition::Class,
            SuperFlavor::Interfaces => position == quarry_hir::SuperPosition::Interface,
            SuperFlavor::Both => true,
        }
    }
}

/// Matches written super clauses naming the given super type.
///
/// Super-type occurrences are always references (the written clause refers to
/// the super type); there is no declaration grain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuperTypePattern {
    pub spec: MatchSpec,
    /// Dotted package qualifier on the super type's resolved identity.
    pub package: Option<String>,
    pub flavor: SuperFlavor,
}

impl SuperTypePattern {
    pub fn new(spec: MatchSpec, flavor: SuperFlavor) -> Self {
        Self {
            spec,
            package: None,
            flavor,
        }
    }

    #[must_use]
    pub fn with_package(mut self, package: impl Into<String>) -> Self {
        self.package = Some(package.into());
        self
    }

    fn index_queries(&self) -> Vec<IndexQuerySpec> {
        let (key, rule) = match (self.spec.rule.mode, &self.spec.name) {
            (MatchMode::Exact, Some(name)) => (
                SuperRefKey::super_prefix(name),
                prefix_like(self.spec.rule),
            ),
            _ => composite_key(&self.spec),
        };
        vec![IndexQuerySpec {
            categories: vec![IndexCategory::SuperRef],
            key,
            rule,
        }]
    }

    fn matches_key(&self, category: IndexCategory, key: &DecodedKey) -> bool {
        if category != IndexCategory::SuperRef {
            return false;
        }
        match key {
            DecodedKey::Super(decoded) => {
                self.spec.matches(&decoded.super_simple_name)
                    && self.flavor.admits(decoded.position)
            }
            _ => false,
        }
    }
}

impl From<PackagePattern> for SearchPattern {
    fn from(pattern: PackagePattern) -> Self {
        SearchPattern::Package(pattern)
    }
}

impl From<TypePattern> for SearchPattern {
    fn from(pattern: TypePattern) -> Self {
        SearchPattern::Type(pattern)
    }
}

impl From<FieldPattern> for SearchPattern {
    fn from(pattern: FieldPattern) -> Self {
        SearchPattern::Field(pattern)
    }
}

impl From<MethodPattern> for SearchPattern {
    fn from(pattern: MethodPattern) -> Self {
        SearchPattern::Method(pattern)
    }
}

impl From<VariablePattern> for SearchPattern {
    fn from(pattern: VariablePattern) -> Self {
        SearchPattern::Variable(pattern)
    }
}

impl From<SuperTypePattern> for SearchPattern {
    fn from(pattern: SuperTypePattern) -> Self {
        SearchPattern::SuperType(pattern)
    }
}

fn simple_spec(categories: Vec<IndexCategory>, spec: &MatchSpec) -> IndexQuerySpec {
    let key = match &spec.name {
        Some(name) => SimpleKey::new(name.clone()).encode(),
        None => Vec::new(),
    };
    let rule = match (spec.rule.mode, &spec.name) {
        // Unbound name: probe the whole category.
        (_, None) => prefix_like(spec.rule),
        _ => spec.rule,
    };
    IndexQuerySpec {
        categories,
        key,
        rule,
    }
}

/// Key + rule for composite-key categories under non-exact modes: prefix and
/// camel rules anchor at the name segment already; globs get an open tail so
/// the encoded suffix segments never refute the probe.
fn composite_key(spec: &MatchSpec) -> (Vec<u8>, MatchRule) {
    match (spec.rule.mode, &spec.name) {
        (MatchMode::Pattern, name) => {
            let glob = name.as_deref().unwrap_or("*");
            (
                format!("{glob}{SEPARATOR}*").into_bytes(),
                spec.rule,
            )
        }
        (_, Some(name)) => (name.clone().into_bytes(), spec.rule),
        (_, None) => (Vec::new(), prefix_like(spec.rule)),
    }
}

fn prefix_like(rule: MatchRule) -> MatchRule {
    MatchRule {
        mode: MatchMode::Prefix,
        case_sensitive: rule.case_sensitive,
    }
}

fn eq_with_case(a: &str, b: &str, case_sensitive: bool) -> bool {
    if case_sensitive {
        a == b
    } else {
        a.eq_ignore_ascii_case(b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quarry_index::decode_key;

    fn decoded(category: IndexCategory, key: &[u8]) -> DecodedKey {
        decode_key(category, key).expect("well-formed key")
    }

    #[test]
    fn field_pattern_validates_its_own_categories() {
        let decls = FieldPattern::new(MatchSpec::exact("count"), SearchFor::Declarations);
        let key = decoded(IndexCategory::FieldDecl, b"count");
        assert!(SearchPattern::from(decls.clone()).matches_key(IndexCategory::FieldDecl, &key));
        // A declarations-only pattern never accepts reference-namespace keys.
        let ref_key = decoded(IndexCategory::Ref, b"count");
        assert!(!SearchPattern::from(decls).matches_key(IndexCategory::Ref, &ref_key));
    }

    #[test]
    fn method_key_validation_short_circuits_on_selector_then_arity() {
        let pattern = MethodPattern::new(MatchSpec::exact("put"), SearchFor::All).with_param_count(2);
        let pattern = SearchPattern::from(pattern);
        assert!(pattern.matches_key(
            IndexCategory::MethodDecl,
            &decoded(IndexCategory::MethodDecl, b"put/2"),
        ));
        assert!(!pattern.matches_key(
            IndexCategory::MethodDecl,
            &decoded(IndexCategory::MethodDecl, b"get/2"),
        ));
        assert!(!pattern.matches_key(
            IndexCategory::MethodDecl,
            &decoded(IndexCategory::MethodDecl, b"put/3"),
        ));
    }

    #[test]
    fn exact_method_pattern_without_arity_probes_a_selector_prefix() {
        let pattern = MethodPattern::new(MatchSpec::exact("put"), SearchFor::Declarations);
        let specs = pattern.index_queries();
        assert_eq!(specs.len(), 1);
        assert_eq!(specs[0].key, b"put/");
        assert_eq!(specs[0].rule.mode, MatchMode::Prefix);

        let pinned = pattern.with_param_count(2);
        let specs = pinned.index_queries();
        assert_eq!(specs[0].key, b"put/2");
        assert_eq!(specs[0].rule.mode, MatchMode::Exact);
    }

    #[test]
    fn glob_specs_get_an_open_tail_on_composite_categories() {
        let pattern = MethodPattern::new(MatchSpec::pattern("get*"), SearchFor::Declarations);
        let specs = pattern.index_queries();
        assert_eq!(specs[0].key, b"get*/*");
        assert_eq!(specs[0].rule.mode, MatchMode::Pattern);
    }

    #[test]
    fn unbound_pattern_is_the_open_wildcard() {
        let pattern = SearchPattern::from(FieldPattern::new(MatchSpec::any(), SearchFor::All));
        let specs = pattern.index_queries();
        assert_eq!(specs.len(), 1);
        assert!(specs[0].key.is_empty());
        assert_eq!(specs[0].rule.mode, MatchMode::Prefix);
        assert!(pattern.matches_key(IndexCategory::Ref, &decoded(IndexCategory::Ref, b"anything")));
        assert!(!pattern.needs_resolution());
    }

    #[test]
    fn type_pattern_checks_package_and_classifier_on_decl_keys() {
        let pattern = TypePattern::new(MatchSpec::exact("Foo"), SearchFor::Declarations)
            .with_package("com.example")
            .with_classifier(TypeKind::Interface);
        let pattern = SearchPattern::from(pattern);
        assert!(pattern.matches_key(
            IndexCategory::TypeDecl,
            &decoded(IndexCategory::TypeDecl, b"Foo/com.example/i"),
        ));
        assert!(!pattern.matches_key(
            IndexCategory::TypeDecl,
            &decoded(IndexCategory::TypeDecl, b"Foo/com.example/c"),
        ));
        assert!(!pattern.matches_key(
            IndexCategory::TypeDecl,
            &decoded(IndexCategory::TypeDecl, b"Foo/other/i"),
        ));
        assert!(pattern.needs_resolution());
    }

    #[test]
    fn super_type_pattern_filters_by_position_tag() {
        let interfaces = SearchPattern::from(SuperTypePattern::new(
            MatchSpec::exact("List"),
            SuperFlavor::Interfaces,
        ));
        assert!(interfaces.matches_key(
            IndexCategory::SuperRef,
            &decoded(IndexCategory::SuperRef, b"List/ArrayList/i"),
        ));
        assert!(!interfaces.matches_key(
            IndexCategory::SuperRef,
            &decoded(IndexCategory::SuperRef, b"List/ArrayList/c"),
        ));
        let both = SearchPattern::from(SuperTypePattern::new(
            MatchSpec::exact("List"),
            SuperFlavor::Both,
        ));
        assert!(both.matches_key(
            IndexCategory::SuperRef,
            &decoded(IndexCategory::SuperRef, b"List/ArrayList/c"),
        ));
    }

    #[test]
    fn or_validates_each_child_against_its_own_fields() {
        // Field and variable reference patterns share the bare-name namespace;
        // the union accepts a key iff one of the children does.
        let or = SearchPattern::Or(vec![
            FieldPattern::new(MatchSpec::exact("count"), SearchFor::References).into(),
            VariablePattern::new(MatchSpec::exact("result"), SearchFor::References).into(),
        ]);
        assert!(or.matches_key(IndexCategory::Ref, &decoded(IndexCategory::Ref, b"count")));
        assert!(or.matches_key(IndexCategory::Ref, &decoded(IndexCategory::Ref, b"result")));
        assert!(!or.matches_key(IndexCategory::Ref, &decoded(IndexCategory::Ref, b"other")));
    }

    #[test]
    fn combinator_resolution_needs() {
        let plain: SearchPattern =
            FieldPattern::new(MatchSpec::exact("a"), SearchFor::All).into();
        let qualified: SearchPattern = FieldPattern::new(MatchSpec::exact("b"), SearchFor::All)
            .with_declaring_type("Foo")
            .into();
        assert!(!SearchPattern::and(plain.clone(), qualified.clone()).needs_resolution());
        assert!(SearchPattern::and(qualified.clone(), qualified.clone()).needs_resolution());
        assert!(SearchPattern::Or(vec![plain, qualified]).needs_resolution());
    }
}
