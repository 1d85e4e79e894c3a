use quarry_hir::{Body, CompilationUnit, Expr, TypeDeclId};
use tracing::debug;

use crate::keys::{IndexCategory, MethodKey, PackageKey, SimpleKey, SuperRefKey, TypeDeclKey};
use crate::memory::MemoryIndex;

/// (Re)indexes one compilation unit: removes the document's old postings and
/// walks the tree emitting declaration and reference keys.
pub fn index_unit(index: &mut MemoryIndex, unit: &CompilationUnit) {
    let document = unit.document.clone();
    index.remove_document(&document);

    let mut sink = EntrySink {
        index,
        unit,
        count: 0,
    };

    if let Some(pkg) = &unit.package {
        sink.add(
            IndexCategory::PackageDecl,
            PackageKey::new(pkg.name.to_dotted()).encode(),
        );
    }

    for (_, import) in unit.imports.iter() {
        if import.on_demand {
            sink.add(
                IndexCategory::PackageRef,
                PackageKey::new(import.path.to_dotted()).encode(),
            );
        } else {
            sink.add(
                IndexCategory::TypeRef,
                SimpleKey::new(import.path.simple_name()).encode(),
            );
            let package = import.path.package();
            if !package.is_empty() {
                sink.add(
                    IndexCategory::PackageRef,
                    PackageKey::new(package.to_dotted()).encode(),
                );
            }
        }
    }

    let package = unit.package_name().to_dotted();
    for (raw, decl) in unit.types.iter() {
        sink.add(
            IndexCategory::TypeDecl,
            TypeDeclKey {
                simple_name: decl.name.clone(),
                package: package.clone(),
                kind: decl.kind,
            }
            .encode(),
        );
        for (tref, position) in unit.super_refs(TypeDeclId::from_raw(raw)) {
            sink.add(
                IndexCategory::SuperRef,
                SuperRefKey {
                    super_simple_name: unit.type_refs[tref].simple_name().to_string(),
                    sub_simple_name: decl.name.clone(),
                    position,
                }
                .encode(),
            );
        }
    }

    // Every written type name becomes a TypeRef posting: field types, return
    // and parameter types, super clauses, local variable types.
    for (_, tref) in unit.type_refs.iter() {
        sink.add(
            IndexCategory::TypeRef,
            SimpleKey::new(tref.simple_name()).encode(),
        );
    }

    for (_, field) in unit.fields.iter() {
        sink.add(
            IndexCategory::FieldDecl,
            SimpleKey::new(field.name.as_str()).encode(),
        );
    }

    for (_, method) in unit.methods.iter() {
        if !method.is_constructor {
            sink.add(
                IndexCategory::MethodDecl,
                MethodKey {
                    selector: method.name.clone(),
                    param_count: method.params.len() as u32,
                }
                .encode(),
            );
        }
        if let Some(body) = &method.body {
            sink.index_body(body);
        }
    }

    debug!(
        document = %document,
        entries = sink.count,
        "indexed compilation unit"
    );
}

struct EntrySink<'a> {
    index: &'a mut MemoryIndex,
    unit: &'a CompilationUnit,
    count: usize,
}

impl EntrySink<'_> {
    fn add(&mut self, category: IndexCategory, key: Vec<u8>) {
        // The separator cannot occur in identifiers; anything else is a
        // malformed node and is skipped rather than corrupting the namespace.
        let Ok(key) = String::from_utf8(key) else {
            return;
        };
        self.index
            .add_entry(category, key, self.unit.document.clone());
        self.count += 1;
    }

    fn index_body(&mut self, body: &Body) {
        for (_, local) in body.locals.iter() {
            self.add(
                IndexCategory::VarDecl,
                SimpleKey::new(local.name.as_str()).encode(),
            );
        }
        for (_, expr) in body.exprs.iter() {
            match expr {
                Expr::Name { name, .. } | Expr::FieldAccess { name, .. } => {
                    self.add(IndexCategory::Ref, SimpleKey::new(name.as_str()).encode());
                }
                Expr::Call { name, args, .. } => {
                    self.add(
                        IndexCategory::MethodRef,
                        MethodKey {
                            selector: name.clone(),
                            param_count: args.len() as u32,
                        }
                        .encode(),
                    );
                }
                Expr::Literal { .. }
                | Expr::Assign { .. }
                | Expr::Binary { .. }
                | Expr::Missing { .. } => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::MatchRule;
    use crate::QueryIndex;
    use quarry_hir::{TypeKind, UnitBuilder};

    fn sample_unit() -> CompilationUnit {
        let mut b = UnitBuilder::new("com/example/Foo.java")
            .package("com.example")
            .import("java.util.List");
        let class = b.begin_type("Foo", TypeKind::Class);
        b.set_extends(class, "Base");
        b.add_implements(class, "Runnable");
        b.add_field(class, "count", Some("int"));
        let method = b.add_method(class, "total", &[("int", "delta")], Some("int"));
        b.body(method, |bb| {
            let count = bb.name("count");
            let delta = bb.name("delta");
            let sum = bb.binary(quarry_hir::BinaryOp::Add, count, delta);
            bb.let_stmt(Some("int"), "result", Some(sum));
            let recv = bb.name("helper");
            let call = bb.call(Some(recv), "compute", vec![]);
            bb.expr_stmt(call);
        });
        b.finish()
    }

    fn keys(index: &MemoryIndex, category: IndexCategory) -> Vec<String> {
        index
            .query(&[category], b"", MatchRule::prefix())
            .unwrap()
            .into_iter()
            .map(|e| String::from_utf8(e.key).unwrap())
            .collect()
    }

    #[test]
    fn indexes_declarations_and_references() {
        let mut index = MemoryIndex::new();
        index_unit(&mut index, &sample_unit());

        assert_eq!(keys(&index, IndexCategory::PackageDecl), ["com.example"]);
        assert_eq!(keys(&index, IndexCategory::TypeDecl), ["Foo/com.example/c"]);
        assert_eq!(keys(&index, IndexCategory::FieldDecl), ["count"]);
        assert_eq!(keys(&index, IndexCategory::MethodDecl), ["total/1"]);
        assert_eq!(keys(&index, IndexCategory::VarDecl), ["result"]);
        assert_eq!(keys(&index, IndexCategory::MethodRef), ["compute/0"]);
        assert_eq!(
            keys(&index, IndexCategory::SuperRef),
            ["Base/Foo/c", "Runnable/Foo/i"]
        );
        // Unqualified reads plus the call receiver.
        assert_eq!(keys(&index, IndexCategory::Ref), ["count", "delta", "helper"]);
        // The explicit import contributes both a type and a package reference.
        assert!(keys(&index, IndexCategory::TypeRef).contains(&"List".to_string()));
        assert!(keys(&index, IndexCategory::PackageRef).contains(&"java.util".to_string()));
    }

    #[test]
    fn reindexing_replaces_old_postings() {
        let mut index = MemoryIndex::new();
        index_unit(&mut index, &sample_unit());

        let mut b = UnitBuilder::new("com/example/Foo.java").package("com.example");
        let class = b.begin_type("Foo", TypeKind::Class);
        b.add_field(class, "renamed", None);
        index_unit(&mut index, &b.finish());

        assert_eq!(keys(&index, IndexCategory::FieldDecl), ["renamed"]);
    }
}
