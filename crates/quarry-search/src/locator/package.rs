use quarry_hir::{CompilationUnit, ImportId, MethodId, NodeRef};
use quarry_resolve::{BindingMap, NameBinding};

use crate::confidence::Confidence;
use crate::pattern::PackagePattern;
use crate::report::{Entity, Grain, MatchAccumulator, Occurrence};

/// Package matching has no semantic dimension: a package name is its own
/// identity, so syntactic hits are `Accurate` outright.
pub(crate) fn locate(
    pattern: &PackagePattern,
    unit: &CompilationUnit,
    bindings: Option<&BindingMap>,
    acc: &mut MatchAccumulator,
) {
    if pattern.search_for.wants_declarations() {
        if let Some(decl) = &unit.package {
            let dotted = decl.name.to_dotted();
            if pattern.spec.matches(&dotted) {
                acc.insert(Occurrence {
                    node: NodeRef::Package,
                    span: decl.range,
                    grain: Grain::Declaration,
                    access: None,
                    entity: Entity::Package { name: dotted },
                    confidence: Confidence::Accurate,
                });
            }
        }
    }

    if pattern.search_for.wants_references() {
        references(pattern, unit, bindings, acc);
    }
}

fn references(
    pattern: &PackagePattern,
    unit: &CompilationUnit,
    bindings: Option<&BindingMap>,
    acc: &mut MatchAccumulator,
) {
    for (raw, import) in unit.imports.iter() {
        let package = if import.on_demand {
            import.path.to_dotted()
        } else {
            let pkg = import.path.package();
            if pkg.is_empty() {
                continue;
            }
            pkg.to_dotted()
        };
        if !pattern.spec.matches(&package) {
            continue;
        }
        acc.insert(Occurrence {
            node: NodeRef::Import(ImportId::from_raw(raw)),
            span: import.range,
            grain: Grain::Reference,
            access: None,
            entity: Entity::Package { name: package },
            confidence: Confidence::Accurate,
        });
    }

    // Qualified-name chains inside bodies surface as expressions bound to a
    // package; those are only visible once bindings exist.
    let Some(map) = bindings else {
        return;
    };
    for ((method_id, expr_id), binding) in &map.names {
        let NameBinding::Package(package) = binding else {
            continue;
        };
        let dotted = package.to_dotted();
        if !pattern.spec.matches(&dotted) {
            continue;
        }
        let Some(span) = expr_span(unit, *method_id, *expr_id) else {
            continue;
        };
        acc.insert(Occurrence {
            node: NodeRef::Expr {
                method: *method_id,
                expr: *expr_id,
            },
            span,
            grain: Grain::Reference,
            access: None,
            entity: Entity::Package { name: dotted },
            confidence: Confidence::Accurate,
        });
    }
}

fn expr_span(
    unit: &CompilationUnit,
    method: MethodId,
    expr: quarry_hir::ExprId,
) -> Option<quarry_core::Span> {
    let body = unit.methods[method].body.as_ref()?;
    Some(body.exprs[expr].range())
}
