use quarry_core::TypeName;
use quarry_hir::{CompilationUnit, NodeRef, TypeDeclId};
use quarry_resolve::{BindingMap, TypeBinding};

use crate::confidence::Confidence;
use crate::pattern::{SuperFlavor, SuperTypePattern};
use crate::report::{Entity, Grain, MatchAccumulator, Occurrence};

use super::unresolved_level;

/// Binding-level grade for a super-type pattern against the subtype's
/// resolved binding.
///
/// The pattern's flavor selects which resolved list is consulted: a
/// superinterface-only pattern looks at the interface list and never at the
/// superclass chain. An empty relevant list downgrades rather than refutes,
/// since unresolved clause entries never make it into the binding.
pub(crate) fn resolve_level(pattern: &SuperTypePattern, sub: &TypeBinding) -> Confidence {
    let case_sensitive = pattern.spec.case_sensitive();
    let matches = |ty: &TypeName| {
        if !pattern.spec.matches(ty.simple_name()) {
            return false;
        }
        match &pattern.package {
            None => true,
            Some(package) => {
                let resolved = ty.package().to_dotted();
                if case_sensitive {
                    *package == resolved
                } else {
                    package.eq_ignore_ascii_case(&resolved)
                }
            }
        }
    };
    let in_classes = sub.superclass.as_ref().is_some_and(matches);
    let in_interfaces = sub.interfaces.iter().any(matches);
    let hit = match pattern.flavor {
        SuperFlavor::Classes => in_classes,
        SuperFlavor::Interfaces => in_interfaces,
        SuperFlavor::Both => in_classes || in_interfaces,
    };
    if hit {
        return Confidence::Accurate;
    }
    let relevant_empty = match pattern.flavor {
        SuperFlavor::Classes => sub.superclass.is_none(),
        SuperFlavor::Interfaces => sub.interfaces.is_empty(),
        SuperFlavor::Both => sub.superclass.is_none() && sub.interfaces.is_empty(),
    };
    if relevant_empty {
        Confidence::Inaccurate
    } else {
        Confidence::Impossible
    }
}

pub(crate) fn locate(
    pattern: &SuperTypePattern,
    unit: &CompilationUnit,
    bindings: Option<&BindingMap>,
    acc: &mut MatchAccumulator,
) {
    for (raw, _) in unit.types.iter() {
        let id = TypeDeclId::from_raw(raw);
        for (tref_id, position) in unit.super_refs(id) {
            let tref = &unit.type_refs[tref_id];
            if !pattern.spec.matches(tref.simple_name()) {
                continue;
            }
            if !pattern.flavor.admits(position) {
                continue;
            }
            let resolved = bindings
                .and_then(|map| map.type_refs.get(&tref_id))
                .map(|r| r.name.clone());
            let confidence = match bindings {
                None => unresolved_level(pattern.package.is_some()),
                Some(map) => match map.types.get(&id) {
                    None => Confidence::Inaccurate,
                    Some(sub) => resolve_level(pattern, sub),
                },
            };
            acc.insert(Occurrence {
                node: NodeRef::TypeRef(tref_id),
                span: tref.range,
                grain: Grain::Reference,
                access: None,
                entity: Entity::Type {
                    name: tref.text.clone(),
                    resolved,
                },
                confidence,
            });
        }
    }
}
