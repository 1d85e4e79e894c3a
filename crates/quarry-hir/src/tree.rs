use quarry_core::{DocumentPath, PackageName, QualifiedName, Span};

use crate::body::Body;
use crate::ids::{Arena, ExprId, FieldId, ImportId, LocalId, MethodId, TypeDeclId, TypeRefId};

/// One lowered compilation unit.
///
/// Declarations live in unit-level arenas; method bodies own their statement,
/// expression and local arenas (see [`Body`]). Type references are unit-level
/// nodes so a written type name is individually addressable by locators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilationUnit {
    pub document: DocumentPath,
    pub package: Option<PackageDecl>,
    pub imports: Arena<Import>,
    pub types: Arena<TypeDecl>,
    pub fields: Arena<FieldDecl>,
    pub methods: Arena<MethodDecl>,
    pub type_refs: Arena<TypeRef>,
}

impl CompilationUnit {
    #[must_use]
    pub fn package_name(&self) -> PackageName {
        self.package
            .as_ref()
            .map(|p| p.name.clone())
            .unwrap_or_default()
    }

    /// Fully qualified name of a type declaration: package, enclosing chain,
    /// then the simple name.
    #[must_use]
    pub fn qualified_type_name(&self, id: TypeDeclId) -> QualifiedName {
        let mut chain = Vec::new();
        let mut current = Some(id);
        while let Some(ty) = current {
            let decl = &self.types[ty];
            chain.push(decl.name.clone());
            current = decl.parent;
        }
        chain.reverse();

        let mut segments: Vec<String> = self.package_name().segments().to_vec();
        segments.extend(chain);
        QualifiedName::from_segments(segments)
    }

    /// The type declaration with the given simple name, outermost first.
    #[must_use]
    pub fn type_by_simple_name(&self, name: &str) -> Option<TypeDeclId> {
        let mut nested = None;
        for (raw, decl) in self.types.iter() {
            if decl.name == name {
                let id = TypeDeclId::from_raw(raw);
                if decl.parent.is_none() {
                    return Some(id);
                }
                nested.get_or_insert(id);
            }
        }
        nested
    }

    /// All `(TypeRefId, SuperPosition)` pairs for a type's super clauses.
    ///
    /// An interface's `extends` entries are superinterface positions; only a
    /// class's `extends` entry is a superclass position.
    pub fn super_refs(&self, id: TypeDeclId) -> Vec<(TypeRefId, SuperPosition)> {
        let decl = &self.types[id];
        let mut refs = Vec::new();
        if let Some(ext) = decl.extends {
            let position = match decl.kind {
                TypeKind::Class => SuperPosition::Class,
                _ => SuperPosition::Interface,
            };
            refs.push((ext, position));
        }
        for &imp in &decl.implements {
            refs.push((imp, SuperPosition::Interface));
        }
        refs
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageDecl {
    pub name: PackageName,
    pub range: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Import {
    pub path: QualifiedName,
    /// `import com.example.*;`
    pub on_demand: bool,
    pub range: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TypeKind {
    Class,
    Interface,
    Enum,
    Annotation,
}

/// Whether a super clause entry occupies a superclass or superinterface slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SuperPosition {
    Class,
    Interface,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDecl {
    pub name: String,
    pub name_range: Span,
    pub range: Span,
    pub kind: TypeKind,
    /// Enclosing type for nested declarations.
    pub parent: Option<TypeDeclId>,
    pub extends: Option<TypeRefId>,
    pub implements: Vec<TypeRefId>,
    pub fields: Vec<FieldId>,
    pub methods: Vec<MethodId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDecl {
    pub owner: TypeDeclId,
    pub name: String,
    pub name_range: Span,
    pub ty: Option<TypeRefId>,
    pub range: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDecl {
    pub owner: TypeDeclId,
    /// The selector; for constructors this equals the declaring type's name.
    pub name: String,
    pub name_range: Span,
    pub params: Vec<Param>,
    /// `None` for `void` methods and constructors.
    pub return_ty: Option<TypeRefId>,
    pub is_constructor: bool,
    pub body: Option<Body>,
    pub range: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub name: String,
    pub name_range: Span,
    pub ty: TypeRefId,
}

/// A type name as written in source; `text` may be simple or dot-qualified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeRef {
    pub text: String,
    pub range: Span,
}

impl TypeRef {
    /// The rightmost segment of the written name.
    #[must_use]
    pub fn simple_name(&self) -> &str {
        self.text.rsplit('.').next().unwrap_or(&self.text)
    }
}

/// Stable identity of one reportable node within a unit.
///
/// Expression and local nodes are keyed by their owning method since body
/// arenas are per-method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NodeRef {
    Package,
    Import(ImportId),
    Type(TypeDeclId),
    Field(FieldId),
    Method(MethodId),
    TypeRef(TypeRefId),
    Local { method: MethodId, local: LocalId },
    Expr { method: MethodId, expr: ExprId },
}

#[cfg(test)]
mod tests {
    use crate::builder::UnitBuilder;
    use crate::tree::{SuperPosition, TypeKind};

    #[test]
    fn qualified_type_name_includes_enclosing_chain() {
        let mut b = UnitBuilder::new("com/example/Outer.java").package("com.example");
        let outer = b.begin_type("Outer", TypeKind::Class);
        let inner = b.begin_nested_type("Inner", TypeKind::Class, outer);
        let unit = b.finish();

        assert_eq!(
            unit.qualified_type_name(inner).to_dotted(),
            "com.example.Outer.Inner"
        );
    }

    #[test]
    fn interface_extends_is_an_interface_position() {
        let mut b = UnitBuilder::new("I.java");
        let iface = b.begin_type("I", TypeKind::Interface);
        b.set_extends(iface, "Base");
        let unit = b.finish();

        let refs = unit.super_refs(iface);
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].1, SuperPosition::Interface);
    }

    #[test]
    fn class_extends_is_a_class_position() {
        let mut b = UnitBuilder::new("C.java");
        let class = b.begin_type("C", TypeKind::Class);
        b.set_extends(class, "Base");
        b.add_implements(class, "Runnable");
        let unit = b.finish();

        let refs = unit.super_refs(class);
        assert_eq!(refs.len(), 2);
        assert_eq!(refs[0].1, SuperPosition::Class);
        assert_eq!(refs[1].1, SuperPosition::Interface);
    }

    #[test]
    fn type_by_simple_name_prefers_top_level() {
        let mut b = UnitBuilder::new("A.java");
        let outer = b.begin_type("Outer", TypeKind::Class);
        b.begin_nested_type("A", TypeKind::Class, outer);
        let top = b.begin_type("A", TypeKind::Class);
        let unit = b.finish();

        assert_eq!(unit.type_by_simple_name("A"), Some(top));
    }
}
