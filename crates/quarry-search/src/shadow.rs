use std::sync::Arc;

use quarry_core::{PackageName, QualifiedName};
use quarry_hir::{CompilationUnit, TypeDeclId};
use quarry_resolve::{describe_type, NameEnvironment, TypeDescriptor};
use tracing::trace;

/// A candidate compilation unit that may answer type lookups before it is
/// committed anywhere persistent.
///
/// `unit: None` is the unmaterialized sentinel: the candidate is known by
/// name but its content has not been loaded yet.
#[derive(Debug, Clone)]
pub struct PotentialUnit {
    pub name: QualifiedName,
    pub unit: Option<Arc<CompilationUnit>>,
}

impl PotentialUnit {
    pub fn materialized(unit: Arc<CompilationUnit>) -> Self {
        Self {
            name: unit.document.compound_name(),
            unit: Some(unit),
        }
    }

    pub fn unmaterialized(name: QualifiedName) -> Self {
        Self { name, unit: None }
    }
}

/// Wraps a resolution environment so a query's in-flight candidate units can
/// satisfy type lookups ahead of it.
///
/// The potential list is immutable after construction and owned by the query;
/// the underlying environment is borrowed and stays authoritative for
/// everything the list does not cover. Results are therefore stable for the
/// query's lifetime even if the underlying environment changes concurrently.
pub struct ShadowEnvironment<'a> {
    underlying: &'a dyn NameEnvironment,
    potentials: Vec<PotentialUnit>,
}

impl<'a> ShadowEnvironment<'a> {
    pub fn new(underlying: &'a dyn NameEnvironment, potentials: Vec<PotentialUnit>) -> Self {
        Self {
            underlying,
            potentials,
        }
    }
}

impl NameEnvironment for ShadowEnvironment<'_> {
    fn find_type(&self, name: &QualifiedName) -> Option<TypeDescriptor> {
        for potential in &self.potentials {
            if potential.name != *name {
                continue;
            }
            match &potential.unit {
                // Never answer from a placeholder; fall through to the
                // underlying environment instead.
                None => {
                    trace!(name = %name, "potential match unmaterialized");
                    break;
                }
                Some(unit) => {
                    // Materialized: the potential unit answers without
                    // consulting the underlying environment, including a
                    // definitive miss.
                    for (raw, _) in unit.types.iter() {
                        let id = TypeDeclId::from_raw(raw);
                        if unit.qualified_type_name(id) == *name {
                            return Some(describe_type(unit, id));
                        }
                    }
                    return None;
                }
            }
        }
        self.underlying.find_type(name)
    }

    fn is_package(&self, name: &PackageName) -> bool {
        self.underlying.is_package(name)
    }

    fn cleanup(&self) {
        self.underlying.cleanup();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quarry_core::TypeName;
    use quarry_hir::{TypeKind, UnitBuilder};
    use quarry_resolve::TableEnvironment;

    fn stale_descriptor() -> TypeDescriptor {
        TypeDescriptor {
            name: TypeName::new("com.example.Foo"),
            kind: TypeKind::Class,
            superclass: Some("Stale".into()),
            interfaces: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
        }
    }

    fn candidate_unit() -> Arc<CompilationUnit> {
        let mut b = UnitBuilder::new("com/example/Foo.java").package("com.example");
        let class = b.begin_type("Foo", TypeKind::Class);
        b.add_field(class, "fresh", Some("int"));
        Arc::new(b.finish())
    }

    #[test]
    fn materialized_potential_wins_over_the_underlying_environment() {
        let mut env = TableEnvironment::new();
        env.add_type(stale_descriptor());
        let shadow = ShadowEnvironment::new(
            &env,
            vec![PotentialUnit::materialized(candidate_unit())],
        );

        let found = shadow
            .find_type(&QualifiedName::from_dotted("com.example.Foo"))
            .expect("type");
        // Answered from the candidate unit, not the stale descriptor.
        assert_eq!(found.superclass, None);
        assert_eq!(found.fields.len(), 1);
        assert_eq!(found.fields[0].name, "fresh");
    }

    #[test]
    fn unmaterialized_potential_falls_through() {
        let mut env = TableEnvironment::new();
        env.add_type(stale_descriptor());
        let shadow = ShadowEnvironment::new(
            &env,
            vec![PotentialUnit::unmaterialized(QualifiedName::from_dotted(
                "com.example.Foo",
            ))],
        );

        let found = shadow
            .find_type(&QualifiedName::from_dotted("com.example.Foo"))
            .expect("fallback answer");
        assert_eq!(found.superclass.as_deref(), Some("Stale"));
    }

    #[test]
    fn absent_names_delegate() {
        let mut env = TableEnvironment::new();
        env.add_type(stale_descriptor());
        let shadow = ShadowEnvironment::new(&env, Vec::new());

        assert!(shadow
            .find_type(&QualifiedName::from_dotted("com.example.Foo"))
            .is_some());
        assert!(shadow
            .find_type(&QualifiedName::from_dotted("com.example.Missing"))
            .is_none());
        assert!(shadow.is_package(&PackageName::from_dotted("com.example")));
    }
}
