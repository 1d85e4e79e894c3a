use std::collections::HashSet;

use quarry_core::{PackageName, QualifiedName, TypeName};
use quarry_hir::{
    Body, CompilationUnit, Expr, ExprId, FieldId, LocalId, MethodId, Stmt, StmtId, TypeDeclId,
    TypeKind, TypeRefId,
};
use tracing::trace;

use crate::bindings::{
    BindingMap, FieldBinding, LocalBinding, MethodBinding, NameBinding, ResolvedTypeRef,
    TypeBinding,
};
use crate::descriptors::{describe_type, TypeDescriptor};
use crate::env::NameEnvironment;

const PRIMITIVES: &[&str] = &[
    "boolean", "byte", "char", "double", "float", "int", "long", "short", "void",
];

/// Bounds the super-chain walk; deeper hierarchies (or cycles through broken
/// descriptors) stop contributing members instead of looping.
const MAX_CHAIN: usize = 32;

/// Resolves the names of one compilation unit against a [`NameEnvironment`].
pub struct Resolver<'a> {
    env: &'a dyn NameEnvironment,
}

impl<'a> Resolver<'a> {
    #[must_use]
    pub fn new(env: &'a dyn NameEnvironment) -> Self {
        Self { env }
    }

    #[must_use]
    pub fn resolve_unit(&self, unit: &CompilationUnit) -> BindingMap {
        let mut ctx = UnitResolver {
            env: self.env,
            unit,
            map: BindingMap::default(),
        };
        ctx.resolve();
        trace!(
            document = %unit.document,
            type_refs = ctx.map.type_refs.len(),
            names = ctx.map.names.len(),
            "resolved compilation unit"
        );
        ctx.map
    }
}

struct UnitResolver<'a> {
    env: &'a dyn NameEnvironment,
    unit: &'a CompilationUnit,
    map: BindingMap,
}

impl<'a> UnitResolver<'a> {
    fn resolve(&mut self) {
        let unit = self.unit;

        // Canonical identities first, so qualified references into this unit
        // resolve while the rest of the unit is still being processed.
        for (raw, decl) in unit.types.iter() {
            let id = TypeDeclId::from_raw(raw);
            self.map.types.insert(
                id,
                TypeBinding {
                    name: TypeName::new(unit.qualified_type_name(id).to_dotted()),
                    kind: decl.kind,
                    superclass: None,
                    interfaces: Vec::new(),
                },
            );
        }

        for (raw, tref) in unit.type_refs.iter() {
            if let Some(resolved) = self.resolve_text(&tref.text) {
                self.map.type_refs.insert(TypeRefId::from_raw(raw), resolved);
            }
        }

        for (raw, decl) in unit.types.iter() {
            let id = TypeDeclId::from_raw(raw);
            let mut superclass = None;
            let mut interfaces = Vec::new();
            if let Some(ext) = decl.extends {
                let resolved = self.map.type_refs.get(&ext).cloned();
                match decl.kind {
                    TypeKind::Class => superclass = resolved.map(|r| r.name),
                    _ => interfaces.extend(resolved.map(|r| r.name)),
                }
            }
            for imp in &decl.implements {
                if let Some(resolved) = self.map.type_refs.get(imp) {
                    interfaces.push(resolved.name.clone());
                }
            }
            if let Some(binding) = self.map.types.get_mut(&id) {
                binding.superclass = superclass;
                binding.interfaces = interfaces;
            }
        }

        for (raw, field) in unit.fields.iter() {
            let Some(owner) = self.map.types.get(&field.owner) else {
                continue;
            };
            let declaring_type = owner.name.clone();
            let ty = field
                .ty
                .and_then(|t| self.map.type_refs.get(&t))
                .map(|r| r.name.clone());
            self.map.fields.insert(
                FieldId::from_raw(raw),
                FieldBinding {
                    name: field.name.clone(),
                    declaring_type,
                    ty,
                },
            );
        }

        for (raw, method) in unit.methods.iter() {
            let Some(owner) = self.map.types.get(&method.owner) else {
                continue;
            };
            let declaring_type = owner.name.clone();
            let return_ty = method
                .return_ty
                .and_then(|t| self.map.type_refs.get(&t))
                .map(|r| r.name.clone());
            let param_types = method
                .params
                .iter()
                .map(|p| self.map.type_refs.get(&p.ty).map(|r| r.name.clone()))
                .collect();
            self.map.methods.insert(
                MethodId::from_raw(raw),
                MethodBinding {
                    selector: method.name.clone(),
                    declaring_type,
                    return_ty,
                    param_types,
                },
            );
        }

        for (raw, method) in unit.methods.iter() {
            if let Some(body) = &method.body {
                let id = MethodId::from_raw(raw);
                let mut scope: Vec<(String, LocalId)> = Vec::new();
                self.walk_stmt(id, method.owner, body, body.root, &mut scope);
            }
        }
    }

    // ---- type reference resolution ------------------------------------

    fn resolve_text(&self, text: &str) -> Option<ResolvedTypeRef> {
        if let Some(base) = text.strip_suffix("[]") {
            let elem = self.resolve_text(base.trim_end())?;
            return Some(ResolvedTypeRef {
                name: TypeName::new(format!("{}[]", elem.name)),
                kind: None,
            });
        }
        if PRIMITIVES.contains(&text) {
            return Some(ResolvedTypeRef {
                name: TypeName::new(text),
                kind: None,
            });
        }
        if text.contains('.') {
            return self.resolve_qualified(text);
        }

        let unit = self.unit;
        if let Some(id) = unit.type_by_simple_name(text) {
            let binding = self.map.types.get(&id)?;
            return Some(ResolvedTypeRef {
                name: binding.name.clone(),
                kind: Some(binding.kind),
            });
        }

        // Explicit imports bind identity even when the environment has no
        // descriptor yet; two units importing the same name must agree.
        for (_, import) in unit.imports.iter() {
            if !import.on_demand && import.path.simple_name() == text {
                let kind = self.env.find_type(&import.path).map(|d| d.kind);
                return Some(ResolvedTypeRef {
                    name: TypeName::new(import.path.to_dotted()),
                    kind,
                });
            }
        }

        let package = unit.package_name();
        if let Some(desc) = self.env.find_type_in(&package, text) {
            return Some(descriptor_ref(desc));
        }

        for (_, import) in unit.imports.iter() {
            if import.on_demand {
                let pkg = PackageName::from_segments(import.path.segments().iter().cloned());
                if let Some(desc) = self.env.find_type_in(&pkg, text) {
                    return Some(descriptor_ref(desc));
                }
            }
        }

        self.env
            .find_type_in(&PackageName::from_dotted("java.lang"), text)
            .map(descriptor_ref)
    }

    fn resolve_qualified(&self, text: &str) -> Option<ResolvedTypeRef> {
        if let Some(binding) = self.map.types.values().find(|b| b.name.as_str() == text) {
            return Some(ResolvedTypeRef {
                name: binding.name.clone(),
                kind: Some(binding.kind),
            });
        }
        self.env
            .find_type(&QualifiedName::from_dotted(text))
            .map(descriptor_ref)
    }

    /// Resolves a descriptor-provided name (super clause, member type) in the
    /// descriptor's own package context.
    fn resolve_text_in(&self, package: &PackageName, text: &str) -> Option<ResolvedTypeRef> {
        if let Some(base) = text.strip_suffix("[]") {
            let elem = self.resolve_text_in(package, base.trim_end())?;
            return Some(ResolvedTypeRef {
                name: TypeName::new(format!("{}[]", elem.name)),
                kind: None,
            });
        }
        if PRIMITIVES.contains(&text) {
            return Some(ResolvedTypeRef {
                name: TypeName::new(text),
                kind: None,
            });
        }
        if text.contains('.') {
            return self.resolve_qualified(text);
        }
        if *package == self.unit.package_name() {
            if let Some(id) = self.unit.type_by_simple_name(text) {
                if let Some(binding) = self.map.types.get(&id) {
                    return Some(ResolvedTypeRef {
                        name: binding.name.clone(),
                        kind: Some(binding.kind),
                    });
                }
            }
        }
        if let Some(desc) = self.env.find_type_in(package, text) {
            return Some(descriptor_ref(desc));
        }
        self.env
            .find_type_in(&PackageName::from_dotted("java.lang"), text)
            .map(descriptor_ref)
    }

    // ---- member lookup along the super chain --------------------------

    fn descriptor_of(&self, name: &TypeName) -> Option<TypeDescriptor> {
        let unit = self.unit;
        for (raw, _) in unit.types.iter() {
            let id = TypeDeclId::from_raw(raw);
            if self.map.types.get(&id).is_some_and(|b| &b.name == name) {
                return Some(describe_type(unit, id));
            }
        }
        self.env.find_type(&QualifiedName::from_dotted(name.as_str()))
    }

    /// Descriptors along the resolved super chain (superclass and
    /// superinterfaces), starting type first, cycles and depth bounded.
    fn chain_descriptors(&self, start: &TypeName) -> Vec<TypeDescriptor> {
        let mut out = Vec::new();
        let mut visited: HashSet<TypeName> = HashSet::new();
        let mut worklist = vec![start.clone()];
        while let Some(name) = worklist.pop() {
            if out.len() >= MAX_CHAIN || !visited.insert(name.clone()) {
                continue;
            }
            let Some(desc) = self.descriptor_of(&name) else {
                continue;
            };
            let package = desc.name.package();
            if let Some(superclass) = desc.superclass.as_deref() {
                if let Some(resolved) = self.resolve_text_in(&package, superclass) {
                    worklist.push(resolved.name);
                }
            }
            for interface in &desc.interfaces {
                if let Some(resolved) = self.resolve_text_in(&package, interface) {
                    worklist.push(resolved.name);
                }
            }
            out.push(desc);
        }
        out
    }

    fn lookup_field_in_chain(&self, start: &TypeName, name: &str) -> Option<FieldBinding> {
        for desc in self.chain_descriptors(start) {
            if let Some(stub) = desc.fields.iter().find(|f| f.name == name) {
                let package = desc.name.package();
                let ty = stub
                    .ty
                    .as_deref()
                    .and_then(|t| self.resolve_text_in(&package, t))
                    .map(|r| r.name);
                return Some(FieldBinding {
                    name: name.to_string(),
                    declaring_type: desc.name.clone(),
                    ty,
                });
            }
        }
        None
    }

    fn lookup_method_in_chain(
        &self,
        start: &TypeName,
        selector: &str,
        arity: usize,
    ) -> Option<MethodBinding> {
        for desc in self.chain_descriptors(start) {
            let found = desc.methods.iter().find(|m| {
                !m.is_constructor && m.selector == selector && m.param_types.len() == arity
            });
            if let Some(stub) = found {
                let package = desc.name.package();
                let return_ty = stub
                    .return_ty
                    .as_deref()
                    .and_then(|t| self.resolve_text_in(&package, t))
                    .map(|r| r.name);
                let param_types = stub
                    .param_types
                    .iter()
                    .map(|t| self.resolve_text_in(&package, t).map(|r| r.name))
                    .collect();
                return Some(MethodBinding {
                    selector: selector.to_string(),
                    declaring_type: desc.name.clone(),
                    return_ty,
                    param_types,
                });
            }
        }
        None
    }

    // ---- bodies -------------------------------------------------------

    fn walk_stmt(
        &mut self,
        method: MethodId,
        owner: TypeDeclId,
        body: &'a Body,
        stmt: StmtId,
        scope: &mut Vec<(String, LocalId)>,
    ) {
        match &body.stmts[stmt] {
            Stmt::Block { statements, .. } => {
                let depth = scope.len();
                for &s in statements {
                    self.walk_stmt(method, owner, body, s, scope);
                }
                scope.truncate(depth);
            }
            Stmt::Let {
                local, initializer, ..
            } => {
                if let Some(init) = initializer {
                    self.walk_expr(method, owner, body, *init, scope);
                }
                let decl = &body.locals[*local];
                let ty = decl
                    .ty
                    .and_then(|t| self.map.type_refs.get(&t))
                    .map(|r| r.name.clone());
                self.map.locals.insert(
                    (method, *local),
                    LocalBinding {
                        method,
                        local: *local,
                        name: decl.name.clone(),
                        ty,
                    },
                );
                scope.push((decl.name.clone(), *local));
            }
            Stmt::Expr { expr, .. } => self.walk_expr(method, owner, body, *expr, scope),
            Stmt::Return { expr, .. } => {
                if let Some(e) = expr {
                    self.walk_expr(method, owner, body, *e, scope);
                }
            }
            Stmt::Empty { .. } => {}
        }
    }

    fn walk_expr(
        &mut self,
        method: MethodId,
        owner: TypeDeclId,
        body: &'a Body,
        expr: ExprId,
        scope: &mut Vec<(String, LocalId)>,
    ) {
        match &body.exprs[expr] {
            Expr::Name { name, .. } => {
                if let Some(binding) = self.resolve_name(method, owner, name, scope) {
                    self.map.names.insert((method, expr), binding);
                }
            }
            Expr::FieldAccess { receiver, name, .. } => {
                self.walk_expr(method, owner, body, *receiver, scope);
                if let Some(binding) = self.resolve_member(method, body, *receiver, name) {
                    self.map.names.insert((method, expr), binding);
                }
            }
            Expr::Call {
                receiver,
                name,
                args,
                ..
            } => {
                if let Some(r) = receiver {
                    self.walk_expr(method, owner, body, *r, scope);
                }
                for &a in args {
                    self.walk_expr(method, owner, body, a, scope);
                }
                let binding = match receiver {
                    Some(r) => self
                        .type_of(method, body, *r)
                        .and_then(|ty| self.lookup_method_in_chain(&ty, name, args.len())),
                    None => self.resolve_unqualified_call(owner, name, args.len()),
                };
                if let Some(binding) = binding {
                    self.map.calls.insert((method, expr), binding);
                }
            }
            Expr::Assign { target, value, .. } => {
                self.walk_expr(method, owner, body, *target, scope);
                self.walk_expr(method, owner, body, *value, scope);
            }
            Expr::Binary { lhs, rhs, .. } => {
                self.walk_expr(method, owner, body, *lhs, scope);
                self.walk_expr(method, owner, body, *rhs, scope);
            }
            Expr::Literal { .. } | Expr::Missing { .. } => {}
        }
    }

    fn resolve_name(
        &self,
        method: MethodId,
        owner: TypeDeclId,
        name: &str,
        scope: &[(String, LocalId)],
    ) -> Option<NameBinding> {
        // Innermost local wins.
        for (local_name, local) in scope.iter().rev() {
            if local_name == name {
                return self
                    .map
                    .locals
                    .get(&(method, *local))
                    .cloned()
                    .map(NameBinding::Local);
            }
        }

        let decl = &self.unit.methods[method];
        for (index, param) in decl.params.iter().enumerate() {
            if param.name == name {
                let ty = self.map.type_refs.get(&param.ty).map(|r| r.name.clone());
                return Some(NameBinding::Param {
                    method,
                    index: index as u32,
                    name: name.to_string(),
                    ty,
                });
            }
        }

        // Fields of the enclosing type chain, inherited members included.
        let mut enclosing = Some(owner);
        while let Some(ty) = enclosing {
            if let Some(binding) = self.map.types.get(&ty) {
                let start = binding.name.clone();
                if let Some(field) = self.lookup_field_in_chain(&start, name) {
                    return Some(NameBinding::Field(field));
                }
            }
            enclosing = self.unit.types[ty].parent;
        }

        if let Some(resolved) = self.resolve_text(name) {
            return Some(NameBinding::Type(resolved));
        }

        let pkg = PackageName::from_segments([name.to_string()]);
        if self.env.is_package(&pkg) {
            return Some(NameBinding::Package(pkg));
        }
        None
    }

    fn resolve_member(
        &self,
        method: MethodId,
        body: &Body,
        receiver: ExprId,
        name: &str,
    ) -> Option<NameBinding> {
        if let Some(NameBinding::Package(pkg)) = self.map.names.get(&(method, receiver)) {
            if *pkg == self.unit.package_name() {
                if let Some(id) = self.unit.type_by_simple_name(name) {
                    if let Some(binding) = self.map.types.get(&id) {
                        return Some(NameBinding::Type(ResolvedTypeRef {
                            name: binding.name.clone(),
                            kind: Some(binding.kind),
                        }));
                    }
                }
            }
            if let Some(desc) = self.env.find_type_in(pkg, name) {
                return Some(NameBinding::Type(descriptor_ref(desc)));
            }
            let longer = PackageName::from_segments(
                pkg.segments().iter().cloned().chain([name.to_string()]),
            );
            if self.env.is_package(&longer) {
                return Some(NameBinding::Package(longer));
            }
            return None;
        }

        let ty = self.type_of(method, body, receiver)?;
        self.lookup_field_in_chain(&ty, name).map(NameBinding::Field)
    }

    fn resolve_unqualified_call(
        &self,
        owner: TypeDeclId,
        selector: &str,
        arity: usize,
    ) -> Option<MethodBinding> {
        let mut enclosing = Some(owner);
        while let Some(ty) = enclosing {
            if let Some(binding) = self.map.types.get(&ty) {
                let start = binding.name.clone();
                if let Some(found) = self.lookup_method_in_chain(&start, selector, arity) {
                    return Some(found);
                }
            }
            enclosing = self.unit.types[ty].parent;
        }
        None
    }

    fn type_of(&self, method: MethodId, body: &Body, expr: ExprId) -> Option<TypeName> {
        match &body.exprs[expr] {
            Expr::Name { .. } | Expr::FieldAccess { .. } => self
                .map
                .names
                .get(&(method, expr))
                .and_then(|b| b.value_type().cloned()),
            Expr::Call { .. } => self
                .map
                .calls
                .get(&(method, expr))
                .and_then(|m| m.return_ty.clone()),
            Expr::Literal { kind, .. } => Some(match kind {
                quarry_hir::LiteralKind::Int => TypeName::new("int"),
                quarry_hir::LiteralKind::String => TypeName::new("java.lang.String"),
            }),
            Expr::Binary { lhs, .. } => self.type_of(method, body, *lhs),
            Expr::Assign { target, .. } => self.type_of(method, body, *target),
            Expr::Missing { .. } => None,
        }
    }
}

fn descriptor_ref(desc: TypeDescriptor) -> ResolvedTypeRef {
    ResolvedTypeRef {
        name: desc.name,
        kind: Some(desc.kind),
    }
}
