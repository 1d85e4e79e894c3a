use quarry_hir::{CompilationUnit, Expr, ExprId, MethodId, NodeRef};
use quarry_resolve::{BindingMap, MethodBinding};

use crate::confidence::Confidence;
use crate::pattern::MethodPattern;
use crate::report::{Entity, Grain, MatchAccumulator, Occurrence};

use super::{qualifier_level, unresolved_level};

/// Binding-level grade for a method pattern.
///
/// Parameter types are compared structurally, position by position, against
/// resolved identities; an unresolved position downgrades rather than
/// refutes.
pub(crate) fn resolve_level(pattern: &MethodPattern, binding: &MethodBinding) -> Confidence {
    if !pattern.spec.matches(&binding.selector) {
        return Confidence::Impossible;
    }
    if let Some(count) = pattern.param_count {
        if binding.param_types.len() != count as usize {
            return Confidence::Impossible;
        }
    }
    let case_sensitive = pattern.spec.case_sensitive();
    let mut level = qualifier_level(
        pattern.declaring_type.as_deref(),
        Some(&binding.declaring_type),
        case_sensitive,
    )
    .both(qualifier_level(
        pattern.return_type.as_deref(),
        binding.return_ty.as_ref(),
        case_sensitive,
    ));
    if let Some(qualifiers) = &pattern.param_types {
        if binding.param_types.len() != qualifiers.len() {
            return Confidence::Impossible;
        }
        for (qualifier, resolved) in qualifiers.iter().zip(&binding.param_types) {
            level = level.both(qualifier_level(
                Some(qualifier),
                resolved.as_ref(),
                case_sensitive,
            ));
        }
    }
    level
}

pub(crate) fn locate(
    pattern: &MethodPattern,
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

fn needs_resolution(pattern: &MethodPattern) -> bool {
    pattern.declaring_type.is_some()
        || pattern.return_type.is_some()
        || pattern.param_types.is_some()
}

fn declarations(
    pattern: &MethodPattern,
    unit: &CompilationUnit,
    bindings: Option<&BindingMap>,
    acc: &mut MatchAccumulator,
) {
    for (raw, method) in unit.methods.iter() {
        if method.is_constructor || !pattern.spec.matches(&method.name) {
            continue;
        }
        if let Some(count) = pattern.param_count {
            if method.params.len() != count as usize {
                continue;
            }
        }
        let id = MethodId::from_raw(raw);
        let unresolved_entity = Entity::Method {
            selector: method.name.clone(),
            declaring_type: None,
            param_types: None,
        };
        let (confidence, entity) = match bindings {
            None => (unresolved_level(needs_resolution(pattern)), unresolved_entity),
            Some(map) => match map.methods.get(&id) {
                None => (Confidence::Inaccurate, unresolved_entity),
                Some(binding) => (resolve_level(pattern, binding), method_entity(binding)),
            },
        };
        acc.insert(Occurrence {
            node: NodeRef::Method(id),
            span: method.name_range,
            grain: Grain::Declaration,
            access: None,
            entity,
            confidence,
        });
    }
}

fn references(
    pattern: &MethodPattern,
    unit: &CompilationUnit,
    bindings: Option<&BindingMap>,
    acc: &mut MatchAccumulator,
) {
    for (raw_method, method) in unit.methods.iter() {
        let Some(body) = &method.body else {
            continue;
        };
        let method_id = MethodId::from_raw(raw_method);
        for (raw_expr, expr) in body.exprs.iter() {
            let Expr::Call {
                name,
                name_range,
                args,
                ..
            } = expr
            else {
                continue;
            };
            if !pattern.spec.matches(name) {
                continue;
            }
            if let Some(count) = pattern.param_count {
                if args.len() != count as usize {
                    continue;
                }
            }
            let expr_id = ExprId::from_raw(raw_expr);
            let unresolved_entity = Entity::Method {
                selector: name.clone(),
                declaring_type: None,
                param_types: None,
            };
            let (confidence, entity) = match bindings {
                None => (unresolved_level(needs_resolution(pattern)), unresolved_entity),
                Some(map) => match map.calls.get(&(method_id, expr_id)) {
                    None => (Confidence::Inaccurate, unresolved_entity),
                    Some(binding) => (resolve_level(pattern, binding), method_entity(binding)),
                },
            };
            acc.insert(Occurrence {
                node: NodeRef::Expr {
                    method: method_id,
                    expr: expr_id,
                },
                span: *name_range,
                grain: Grain::Reference,
                access: None,
                entity,
                confidence,
            });
        }
    }
}

fn method_entity(binding: &MethodBinding) -> Entity {
    Entity::Method {
        selector: binding.selector.clone(),
        declaring_type: Some(binding.declaring_type.clone()),
        param_types: Some(binding.param_types.clone()),
    }
}
