use quarry_core::TypeName;
use quarry_hir::{CompilationUnit, Expr, ExprId, LocalId, MethodId, NodeRef};
use quarry_resolve::{BindingMap, LocalBinding, NameBinding};

use crate::confidence::Confidence;
use crate::pattern::{SearchFor, VariablePattern};
use crate::report::{Access, Entity, Grain, MatchAccumulator, Occurrence};

use super::{qualifier_level, unresolved_level, write_targets};

/// Binding-level grade for a variable pattern; parameters grade the same way
/// as locals, by name plus declared-type qualifier.
pub(crate) fn resolve_level(
    pattern: &VariablePattern,
    name: &str,
    ty: Option<&TypeName>,
) -> Confidence {
    if !pattern.spec.matches(name) {
        return Confidence::Impossible;
    }
    qualifier_level(
        pattern.var_type.as_deref(),
        ty,
        pattern.spec.case_sensitive(),
    )
}

pub(crate) fn locate(
    pattern: &VariablePattern,
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

fn declarations(
    pattern: &VariablePattern,
    unit: &CompilationUnit,
    bindings: Option<&BindingMap>,
    acc: &mut MatchAccumulator,
) {
    for (raw_method, method) in unit.methods.iter() {
        let Some(body) = &method.body else {
            continue;
        };
        let method_id = MethodId::from_raw(raw_method);
        for (raw_local, local) in body.locals.iter() {
            if !pattern.spec.matches(&local.name) {
                continue;
            }
            let local_id = LocalId::from_raw(raw_local);
            let entity = Entity::Local {
                name: local.name.clone(),
                decl: Some((method_id, local_id)),
            };
            let confidence = match bindings {
                None => unresolved_level(pattern.var_type.is_some()),
                Some(map) => match map.locals.get(&(method_id, local_id)) {
                    None => Confidence::Inaccurate,
                    Some(binding) => binding_level(pattern, binding),
                },
            };
            acc.insert(Occurrence {
                node: NodeRef::Local {
                    method: method_id,
                    local: local_id,
                },
                span: local.name_range,
                grain: Grain::Declaration,
                access: None,
                entity,
                confidence,
            });
        }
    }
}

fn references(
    pattern: &VariablePattern,
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
            // Locals are only ever referenced by bare name.
            let Expr::Name { name, range } = expr else {
                continue;
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

            let unresolved_entity = Entity::Local {
                name: name.clone(),
                decl: None,
            };
            let (confidence, entity) = match bindings {
                None => (
                    unresolved_level(pattern.var_type.is_some()),
                    unresolved_entity,
                ),
                Some(map) => match map.names.get(&(method_id, expr_id)) {
                    Some(NameBinding::Local(binding)) => (
                        binding_level(pattern, binding),
                        Entity::Local {
                            name: binding.name.clone(),
                            decl: Some((binding.method, binding.local)),
                        },
                    ),
                    Some(NameBinding::Param { name, ty, .. }) => (
                        resolve_level(pattern, name, ty.as_ref()),
                        unresolved_entity,
                    ),
                    // Bound to a field, type or package: not a variable.
                    Some(_) => (Confidence::Impossible, unresolved_entity),
                    None => (Confidence::Inaccurate, unresolved_entity),
                },
            };
            acc.insert(Occurrence {
                node: NodeRef::Expr {
                    method: method_id,
                    expr: expr_id,
                },
                span: *range,
                grain: Grain::Reference,
                access: Some(access),
                entity,
                confidence,
            });
        }
    }
}

fn binding_level(pattern: &VariablePattern, binding: &LocalBinding) -> Confidence {
    resolve_level(pattern, &binding.name, binding.ty.as_ref())
}
