use quarry_core::TypeName;
use quarry_hir::{CompilationUnit, NodeRef, TypeDeclId, TypeKind, TypeRefId};
use quarry_resolve::BindingMap;

use crate::confidence::Confidence;
use crate::pattern::TypePattern;
use crate::report::{Entity, Grain, MatchAccumulator, Occurrence};

use super::unresolved_level;

/// Binding-level grade for a type pattern against a resolved identity.
///
/// `kind` is `None` for primitives and arrays, whose classifier cannot be
/// confirmed.
pub(crate) fn resolve_level(
    pattern: &TypePattern,
    name: &TypeName,
    kind: Option<TypeKind>,
) -> Confidence {
    if !pattern.spec.matches(name.simple_name()) {
        return Confidence::Impossible;
    }
    let mut level = Confidence::Accurate;
    if let Some(package) = &pattern.package {
        let resolved = name.package().to_dotted();
        let hit = if pattern.spec.case_sensitive() {
            *package == resolved
        } else {
            package.eq_ignore_ascii_case(&resolved)
        };
        if !hit {
            return Confidence::Impossible;
        }
    }
    if let Some(classifier) = pattern.classifier {
        level = level.both(match kind {
            None => Confidence::Inaccurate,
            Some(kind) if kind == classifier => Confidence::Accurate,
            Some(_) => Confidence::Impossible,
        });
    }
    level
}

pub(crate) fn locate(
    pattern: &TypePattern,
    unit: &CompilationUnit,
    bindings: Option<&BindingMap>,
    acc: &mut MatchAccumulator,
) {
    if pattern.search_for.wants_declarations() {
        declarations(pattern, unit, bindings, acc);
    }
    if pattern.search_for.wants_references() {
        references(pattern, unit, bindings, acc);
    }
}

fn needs_resolution(pattern: &TypePattern) -> bool {
    pattern.package.is_some() || pattern.classifier.is_some()
}

fn declarations(
    pattern: &TypePattern,
    unit: &CompilationUnit,
    bindings: Option<&BindingMap>,
    acc: &mut MatchAccumulator,
) {
    for (raw, decl) in unit.types.iter() {
        if !pattern.spec.matches(&decl.name) {
            continue;
        }
        // The declaration's kind is syntactic; a classifier mismatch refutes
        // without resolution.
        if let Some(classifier) = pattern.classifier {
            if decl.kind != classifier {
                continue;
            }
        }
        let id = TypeDeclId::from_raw(raw);
        let (confidence, entity) = match bindings {
            None => (
                unresolved_level(needs_resolution(pattern)),
                Entity::Type {
                    name: decl.name.clone(),
                    resolved: None,
                },
            ),
            Some(map) => match map.types.get(&id) {
                None => (
                    Confidence::Inaccurate,
                    Entity::Type {
                        name: decl.name.clone(),
                        resolved: None,
                    },
                ),
                Some(binding) => (
                    resolve_level(pattern, &binding.name, Some(binding.kind)),
                    Entity::Type {
                        name: decl.name.clone(),
                        resolved: Some(binding.name.clone()),
                    },
                ),
            },
        };
        acc.insert(Occurrence {
            node: NodeRef::Type(id),
            span: decl.name_range,
            grain: Grain::Declaration,
            access: None,
            entity,
            confidence,
        });
    }
}

fn references(
    pattern: &TypePattern,
    unit: &CompilationUnit,
    bindings: Option<&BindingMap>,
    acc: &mut MatchAccumulator,
) {
    for (raw, tref) in unit.type_refs.iter() {
        if !pattern.spec.matches(tref.simple_name()) {
            continue;
        }
        let id = TypeRefId::from_raw(raw);
        let unresolved_entity = Entity::Type {
            name: tref.text.clone(),
            resolved: None,
        };
        let (confidence, entity) = match bindings {
            None => (unresolved_level(needs_resolution(pattern)), unresolved_entity),
            Some(map) => match map.type_refs.get(&id) {
                None => (Confidence::Inaccurate, unresolved_entity),
                Some(resolved) => (
                    resolve_level(pattern, &resolved.name, resolved.kind),
                    Entity::Type {
                        name: tref.text.clone(),
                        resolved: Some(resolved.name.clone()),
                    },
                ),
            },
        };
        acc.insert(Occurrence {
            node: NodeRef::TypeRef(id),
            span: tref.range,
            grain: Grain::Reference,
            access: None,
            entity,
            confidence,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::{MatchSpec, SearchFor};

    #[test]
    fn package_qualifier_refutes_on_resolved_identity() {
        let pattern = TypePattern::new(MatchSpec::exact("Foo"), SearchFor::All)
            .with_package("com.example");
        assert_eq!(
            resolve_level(&pattern, &TypeName::new("com.example.Foo"), Some(TypeKind::Class)),
            Confidence::Accurate
        );
        assert_eq!(
            resolve_level(&pattern, &TypeName::new("other.Foo"), Some(TypeKind::Class)),
            Confidence::Impossible
        );
    }

    #[test]
    fn classifier_downgrades_when_the_kind_is_unknown() {
        let pattern = TypePattern::new(MatchSpec::exact("Foo"), SearchFor::All)
            .with_classifier(TypeKind::Interface);
        assert_eq!(
            resolve_level(&pattern, &TypeName::new("a.Foo"), Some(TypeKind::Interface)),
            Confidence::Accurate
        );
        assert_eq!(
            resolve_level(&pattern, &TypeName::new("a.Foo"), Some(TypeKind::Class)),
            Confidence::Impossible
        );
        assert_eq!(
            resolve_level(&pattern, &TypeName::new("a.Foo"), None),
            Confidence::Inaccurate
        );
    }
}
