use std::collections::HashMap;

use quarry_core::{PackageName, TypeName};
use quarry_hir::{ExprId, FieldId, LocalId, MethodId, TypeDeclId, TypeKind, TypeRefId};

/// A written type reference resolved to its canonical identity.
///
/// `kind` is present when the resolver saw a descriptor for the type;
/// primitives and array types carry `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTypeRef {
    pub name: TypeName,
    pub kind: Option<TypeKind>,
}

/// Resolved facts about a type declaration: canonical name plus the resolved
/// super chain entries. An interface's `extends` entries land in
/// `interfaces` — superclass is only ever populated for classes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeBinding {
    pub name: TypeName,
    pub kind: TypeKind,
    pub superclass: Option<TypeName>,
    pub interfaces: Vec<TypeName>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldBinding {
    pub name: String,
    pub declaring_type: TypeName,
    pub ty: Option<TypeName>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodBinding {
    pub selector: String,
    pub declaring_type: TypeName,
    pub return_ty: Option<TypeName>,
    /// One entry per parameter; `None` where the parameter type did not
    /// resolve.
    pub param_types: Vec<Option<TypeName>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalBinding {
    pub method: MethodId,
    pub local: LocalId,
    pub name: String,
    pub ty: Option<TypeName>,
}

/// What an unqualified or member name resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameBinding {
    Local(LocalBinding),
    Param {
        method: MethodId,
        index: u32,
        name: String,
        ty: Option<TypeName>,
    },
    Field(FieldBinding),
    Type(ResolvedTypeRef),
    Package(PackageName),
}

impl NameBinding {
    /// The static type this binding contributes as an expression receiver.
    #[must_use]
    pub fn value_type(&self) -> Option<&TypeName> {
        match self {
            NameBinding::Local(local) => local.ty.as_ref(),
            NameBinding::Param { ty, .. } => ty.as_ref(),
            NameBinding::Field(field) => field.ty.as_ref(),
            NameBinding::Type(ty) => Some(&ty.name),
            NameBinding::Package(_) => None,
        }
    }
}

/// All bindings the resolver computed for one compilation unit.
///
/// Absence of an entry means resolution failed or was not attempted for that
/// node; locators downgrade, never fail, on absence.
#[derive(Debug, Clone, Default)]
pub struct BindingMap {
    pub types: HashMap<TypeDeclId, TypeBinding>,
    pub type_refs: HashMap<TypeRefId, ResolvedTypeRef>,
    pub fields: HashMap<FieldId, FieldBinding>,
    pub methods: HashMap<MethodId, MethodBinding>,
    pub locals: HashMap<(MethodId, LocalId), LocalBinding>,
    /// `Name` and `FieldAccess` expressions.
    pub names: HashMap<(MethodId, ExprId), NameBinding>,
    /// `Call` expressions.
    pub calls: HashMap<(MethodId, ExprId), MethodBinding>,
}
