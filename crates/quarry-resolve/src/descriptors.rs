use quarry_core::TypeName;
use quarry_hir::{CompilationUnit, TypeDeclId, TypeKind, TypeRefId};

/// Shape of a type as an environment answers it: canonical name, super
/// clause texts (as written — the consumer resolves them in the descriptor's
/// own package context) and member stubs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDescriptor {
    pub name: TypeName,
    pub kind: TypeKind,
    pub superclass: Option<String>,
    pub interfaces: Vec<String>,
    pub fields: Vec<FieldStub>,
    pub methods: Vec<MethodStub>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldStub {
    pub name: String,
    pub ty: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodStub {
    pub selector: String,
    pub param_types: Vec<String>,
    pub return_ty: Option<String>,
    pub is_constructor: bool,
}

/// Projects one declaration of a source unit into descriptor form.
pub fn describe_type(unit: &CompilationUnit, id: TypeDeclId) -> TypeDescriptor {
    let decl = &unit.types[id];
    let ref_text = |tref: TypeRefId| unit.type_refs[tref].text.clone();

    let mut superclass = None;
    let mut interfaces = Vec::new();
    if let Some(ext) = decl.extends {
        match decl.kind {
            TypeKind::Class => superclass = Some(ref_text(ext)),
            _ => interfaces.push(ref_text(ext)),
        }
    }
    interfaces.extend(decl.implements.iter().map(|&tref| ref_text(tref)));

    let fields = decl
        .fields
        .iter()
        .map(|&field| {
            let field = &unit.fields[field];
            FieldStub {
                name: field.name.clone(),
                ty: field.ty.map(ref_text),
            }
        })
        .collect();

    let methods = decl
        .methods
        .iter()
        .map(|&method| {
            let method = &unit.methods[method];
            MethodStub {
                selector: method.name.clone(),
                param_types: method.params.iter().map(|p| ref_text(p.ty)).collect(),
                return_ty: method.return_ty.map(ref_text),
                is_constructor: method.is_constructor,
            }
        })
        .collect();

    TypeDescriptor {
        name: TypeName::new(unit.qualified_type_name(id).to_dotted()),
        kind: decl.kind,
        superclass,
        interfaces,
        fields,
        methods,
    }
}
