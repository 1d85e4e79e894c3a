//! Fine-grained tree matching, one module per pattern kind.
//!
//! Every locator walks the node kinds its entity can appear as, grades each
//! occurrence syntactically, and upgrades or refutes the grade from resolved
//! bindings when a [`BindingMap`] is available. The binding-level grading for
//! each kind lives in one `resolve_level` function consumed by both the
//! node-walking path and direct binding checks, so the two directions always
//! agree.

mod field;
mod method;
mod package;
mod super_type;
mod ty;
mod variable;

use std::collections::HashSet;

use quarry_core::TypeName;
use quarry_hir::{Body, CompilationUnit, Expr, ExprId};
use quarry_resolve::BindingMap;

use crate::confidence::Confidence;
use crate::pattern::SearchPattern;
use crate::report::MatchAccumulator;

pub(crate) fn locate(
    pattern: &SearchPattern,
    unit: &CompilationUnit,
    bindings: Option<&BindingMap>,
    acc: &mut MatchAccumulator,
) {
    match pattern {
        SearchPattern::Package(p) => package::locate(p, unit, bindings, acc),
        SearchPattern::Type(p) => ty::locate(p, unit, bindings, acc),
        SearchPattern::Field(p) => field::locate(p, unit, bindings, acc),
        SearchPattern::Method(p) => method::locate(p, unit, bindings, acc),
        SearchPattern::Variable(p) => variable::locate(p, unit, bindings, acc),
        SearchPattern::SuperType(p) => super_type::locate(p, unit, bindings, acc),
        SearchPattern::And(left, right) => {
            let mut left_acc = MatchAccumulator::new();
            locate(left, unit, bindings, &mut left_acc);
            if left_acc.is_empty() {
                return;
            }
            let mut right_acc = MatchAccumulator::new();
            locate(right, unit, bindings, &mut right_acc);
            acc.absorb(MatchAccumulator::intersect(left_acc, &right_acc));
        }
        SearchPattern::Or(children) => {
            for child in children {
                locate(child, unit, bindings, acc);
            }
        }
        SearchPattern::DeclarationsOf(inner) => locate(inner, unit, bindings, acc),
    }
}

/// Grade for a syntactic hit when this unit carries no bindings: final for
/// patterns tree matching alone can decide, pending otherwise.
pub(crate) fn unresolved_level(needs_resolution: bool) -> Confidence {
    if needs_resolution {
        Confidence::Possible
    } else {
        Confidence::Accurate
    }
}

/// Grades one type qualifier against a resolved identity.
///
/// A dotted qualifier compares against the full canonical name, a simple one
/// against the last segment; spelling at the use site never matters once a
/// binding exists.
pub(crate) fn qualifier_level(
    qualifier: Option<&str>,
    resolved: Option<&TypeName>,
    case_sensitive: bool,
) -> Confidence {
    match (qualifier, resolved) {
        (None, _) => Confidence::Accurate,
        (Some(_), None) => Confidence::Inaccurate,
        (Some(qualifier), Some(resolved)) => {
            if type_qualifier_matches(qualifier, resolved, case_sensitive) {
                Confidence::Accurate
            } else {
                Confidence::Impossible
            }
        }
    }
}

pub(crate) fn type_qualifier_matches(
    qualifier: &str,
    resolved: &TypeName,
    case_sensitive: bool,
) -> bool {
    let candidate = if qualifier.contains('.') {
        resolved.as_str()
    } else {
        resolved.simple_name()
    };
    if case_sensitive {
        qualifier == candidate
    } else {
        qualifier.eq_ignore_ascii_case(candidate)
    }
}

/// Expression ids that are assignment targets (plain or compound) in `body`.
pub(crate) fn write_targets(body: &Body) -> HashSet<ExprId> {
    let mut targets = HashSet::new();
    for (_, expr) in body.exprs.iter() {
        if let Expr::Assign { target, .. } = expr {
            targets.insert(*target);
        }
    }
    targets
}
