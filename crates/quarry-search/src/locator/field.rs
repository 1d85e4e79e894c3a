use quarry_hir::{CompilationUnit, Expr, ExprId, FieldId, MethodId, NodeRef};
use quarry_resolve::{BindingMap, FieldBinding, NameBinding};

use crate::confidence::Confidence;
use crate::pattern::{FieldPattern, SearchFor};
use crate::report::{Access, Entity, Grain, MatchAccumulator, Occurrence};

use super::{qualifier_level, unresolved_level, write_targets};

/// Binding-level grade for a field pattern, shared by declaration and
/// reference matching.
pub(crate) fn resolve_level(pattern: &FieldPattern, binding: &FieldBinding) -> Confidence {
    if !pattern.spec.matches(&binding.name) {
        return Confidence::Impossible;
    }
    let case_sensitive = pattern.spec.case_sensitive();
    qualifier_level(
        pattern.declaring_type.as_deref(),
        Some(&binding.declaring_type),
        case_sensitive,
    )
    .both(qualifier_level(
        pattern.field_type.as_deref(),
        binding.ty.as_ref(),
        case_sensitive,
    ))
}

pub(crate) fn locate(
    pattern: &FieldPattern,
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

fn needs_resolution(pattern: &FieldPattern) -> bool {
    pattern.declaring_type.is_some() || pattern.field_type.is_some()
}

fn declarations(
    pattern: &FieldPattern,
    unit: &CompilationUnit,
    bindings: Option<&BindingMap>,
    acc: &mut MatchAccumulator,
) {
    for (raw, field) in unit.fields.iter() {
        if !pattern.spec.matches(&field.name) {
            continue;
        }
        let id = FieldId::from_raw(raw);
        let (confidence, entity) = match bindings {
            None => (
                unresolved_level(needs_resolution(pattern)),
                Entity::Field {
                    name: field.name.clone(),
                    declaring_type: None,
                },
            ),
            Some(map) => match map.fields.get(&id) {
                None => (
                    Confidence::Inaccurate,
                    Entity::Field {
                        name: field.name.clone(),
                        declaring_type: None,
                    },
                ),
                Some(binding) => (
                    resolve_level(pattern, binding),
                    Entity::Field {
                        name: binding.name.clone(),
                        declaring_type: Some(binding.declaring_type.clone()),
                    },
                ),
            },
        };
        acc.insert(Occurrence {
            node: NodeRef::Field(id),
            span: field.name_range,
            grain: Grain::Declaration,
            access: None,
            entity,
            confidence,
        });
    }
}

fn references(
    pattern: &FieldPattern,
    unit: &CompilationUnit,
    bindings: Option<&BindingMap>,
    acc: &mut MatchAccumulator,
) {
    for (raw_method, method) in unit.methods.iter() {
        let Some(body) = &method.body else {
            continue;
        };
        let method_id = MethodId::from_raw(raw_method);
        let writes = write_targets(body);
        for (raw_expr, expr) in body.exprs.iter() {
            let (name, name_range) = match expr {
                Expr::Name { name, range } => (name, *range),
                Expr::FieldAccess {
                    name, name_range, ..
                } => (name, *name_range),
                _ => continue,
            };
            if !pattern.spec.matches(name) {
                continue;
            }
            let expr_id = ExprId::from_raw(raw_expr);
            let access = if writes.contains(&expr_id) {
                Access::Write
            } else {
                Access::Read
            };
            match pattern.search_for {
                SearchFor::ReadAccesses if access == Access::Write => continue,
                SearchFor::WriteAccesses if access == Access::Read => continue,
                _ => {}
            }

            let unresolved_entity = Entity::Field {
                name: name.clone(),
                declaring_type: None,
            };
            let (confidence, entity) = match bindings {
                None => (unresolved_level(needs_resolution(pattern)), unresolved_entity),
                Some(map) => match map.names.get(&(method_id, expr_id)) {
                    Some(NameBinding::Field(binding)) => (
                        resolve_level(pattern, binding),
                        Entity::Field {
                            name: binding.name.clone(),
                            declaring_type: Some(binding.declaring_type.clone()),
                        },
                    ),
                    // Bound, but to something that is not a field.
                    Some(_) => (Confidence::Impossible, unresolved_entity),
                    None => (Confidence::Inaccurate, unresolved_entity),
                },
            };
            acc.insert(Occurrence {
                node: NodeRef::Expr {
                    method: method_id,
                    expr: expr_id,
                },
                span: name_range,
                grain: Grain::Reference,
                access: Some(access),
                entity,
                confidence,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::MatchSpec;
    use quarry_core::TypeName;

    fn binding(declaring: &str, ty: Option<&str>) -> FieldBinding {
        FieldBinding {
            name: "count".into(),
            declaring_type: TypeName::new(declaring),
            ty: ty.map(TypeName::new),
        }
    }

    #[test]
    fn resolve_level_refutes_on_declaring_type_mismatch() {
        let pattern = FieldPattern::new(MatchSpec::exact("count"), SearchFor::All)
            .with_declaring_type("Foo");
        assert_eq!(
            resolve_level(&pattern, &binding("com.example.Foo", Some("int"))),
            Confidence::Accurate
        );
        assert_eq!(
            resolve_level(&pattern, &binding("com.example.Bar", Some("int"))),
            Confidence::Impossible
        );
    }

    #[test]
    fn resolve_level_downgrades_when_the_field_type_is_unresolved() {
        let pattern =
            FieldPattern::new(MatchSpec::exact("count"), SearchFor::All).with_field_type("int");
        assert_eq!(
            resolve_level(&pattern, &binding("Foo", None)),
            Confidence::Inaccurate
        );
        assert_eq!(
            resolve_level(&pattern, &binding("Foo", Some("int"))),
            Confidence::Accurate
        );
        assert_eq!(
            resolve_level(&pattern, &binding("Foo", Some("long"))),
            Confidence::Impossible
        );
    }

    #[test]
    fn resolve_level_checks_the_name_first() {
        let pattern = FieldPattern::new(MatchSpec::exact("other"), SearchFor::All);
        assert_eq!(
            resolve_level(&pattern, &binding("Foo", Some("int"))),
            Confidence::Impossible
        );
    }
}
