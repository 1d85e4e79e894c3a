use quarry_core::{PackageName, QualifiedName, Span};

use crate::body::{AssignOp, BinaryOp, Body, Expr, LiteralKind, Local, Stmt};
use crate::ids::{Arena, ExprId, FieldId, LocalId, MethodId, StmtId, TypeDeclId, TypeRefId};
use crate::tree::{
    CompilationUnit, FieldDecl, Import, MethodDecl, PackageDecl, Param, TypeDecl, TypeKind, TypeRef,
};

/// Programmatic construction of a [`CompilationUnit`].
///
/// Lowering from parsed source happens outside this crate; the builder exists
/// for indexer fixtures and tests. Spans are synthetic: every node gets a
/// fresh, disjoint, strictly increasing byte range.
#[derive(Debug)]
pub struct UnitBuilder {
    unit: CompilationUnit,
    offset: usize,
}

impl UnitBuilder {
    pub fn new(document: &str) -> Self {
        Self {
            unit: CompilationUnit {
                document: document.into(),
                package: None,
                imports: Arena::default(),
                types: Arena::default(),
                fields: Arena::default(),
                methods: Arena::default(),
                type_refs: Arena::default(),
            },
            offset: 0,
        }
    }

    #[must_use]
    pub fn package(mut self, dotted: &str) -> Self {
        let range = self.span(dotted.len());
        self.unit.package = Some(PackageDecl {
            name: PackageName::from_dotted(dotted),
            range,
        });
        self
    }

    #[must_use]
    pub fn import(mut self, path: &str) -> Self {
        let range = self.span(path.len());
        self.unit.imports.alloc(Import {
            path: QualifiedName::from_dotted(path),
            on_demand: false,
            range,
        });
        self
    }

    #[must_use]
    pub fn import_on_demand(mut self, package: &str) -> Self {
        let range = self.span(package.len() + 2);
        self.unit.imports.alloc(Import {
            path: QualifiedName::from_dotted(package),
            on_demand: true,
            range,
        });
        self
    }

    pub fn begin_type(&mut self, name: &str, kind: TypeKind) -> TypeDeclId {
        self.push_type(name, kind, None)
    }

    pub fn begin_nested_type(
        &mut self,
        name: &str,
        kind: TypeKind,
        parent: TypeDeclId,
    ) -> TypeDeclId {
        self.push_type(name, kind, Some(parent))
    }

    fn push_type(&mut self, name: &str, kind: TypeKind, parent: Option<TypeDeclId>) -> TypeDeclId {
        let range = self.span(name.len() + 8);
        let name_range = self.span(name.len());
        TypeDeclId::from_raw(self.unit.types.alloc(TypeDecl {
            name: name.to_string(),
            name_range,
            range,
            kind,
            parent,
            extends: None,
            implements: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
        }))
    }

    pub fn set_extends(&mut self, ty: TypeDeclId, text: &str) {
        let tref = self.type_ref(text);
        self.unit.types[ty].extends = Some(tref);
    }

    pub fn add_implements(&mut self, ty: TypeDeclId, text: &str) {
        let tref = self.type_ref(text);
        self.unit.types[ty].implements.push(tref);
    }

    pub fn add_field(&mut self, owner: TypeDeclId, name: &str, ty: Option<&str>) -> FieldId {
        let ty = ty.map(|t| self.type_ref(t));
        let range = self.span(name.len() + 6);
        let name_range = self.span(name.len());
        let id = FieldId::from_raw(self.unit.fields.alloc(FieldDecl {
            owner,
            name: name.to_string(),
            name_range,
            ty,
            range,
        }));
        self.unit.types[owner].fields.push(id);
        id
    }

    /// `params` are `(type text, parameter name)` pairs.
    pub fn add_method(
        &mut self,
        owner: TypeDeclId,
        name: &str,
        params: &[(&str, &str)],
        return_ty: Option<&str>,
    ) -> MethodId {
        self.push_method(owner, name, params, return_ty, false)
    }

    pub fn add_constructor(&mut self, owner: TypeDeclId, params: &[(&str, &str)]) -> MethodId {
        let name = self.unit.types[owner].name.clone();
        self.push_method(owner, &name, params, None, true)
    }

    fn push_method(
        &mut self,
        owner: TypeDeclId,
        name: &str,
        params: &[(&str, &str)],
        return_ty: Option<&str>,
        is_constructor: bool,
    ) -> MethodId {
        let return_ty = return_ty.map(|t| self.type_ref(t));
        let params: Vec<Param> = params
            .iter()
            .map(|(ty, pname)| {
                let ty = self.type_ref(ty);
                let name_range = self.span(pname.len());
                Param {
                    name: pname.to_string(),
                    name_range,
                    ty,
                }
            })
            .collect();
        let range = self.span(name.len() + 10);
        let name_range = self.span(name.len());
        let id = MethodId::from_raw(self.unit.methods.alloc(MethodDecl {
            owner,
            name: name.to_string(),
            name_range,
            params,
            return_ty,
            is_constructor,
            body: None,
            range,
        }));
        self.unit.types[owner].methods.push(id);
        id
    }

    pub fn body(&mut self, method: MethodId, f: impl FnOnce(&mut BodyBuilder<'_>)) {
        let range = self.span(2);
        let mut builder = BodyBuilder::new(self, range);
        f(&mut builder);
        let body = builder.finish();
        self.unit.methods[method].body = Some(body);
    }

    pub fn type_ref(&mut self, text: &str) -> TypeRefId {
        let range = self.span(text.len());
        TypeRefId::from_raw(self.unit.type_refs.alloc(TypeRef {
            text: text.to_string(),
            range,
        }))
    }

    #[must_use]
    pub fn finish(self) -> CompilationUnit {
        self.unit
    }

    fn span(&mut self, len: usize) -> Span {
        let len = len.max(1);
        let start = self.offset;
        self.offset = start + len + 1;
        Span::new(start, start + len)
    }
}

/// Builds one method body inside [`UnitBuilder::body`].
#[derive(Debug)]
pub struct BodyBuilder<'a> {
    unit: &'a mut UnitBuilder,
    stmts: Arena<Stmt>,
    exprs: Arena<Expr>,
    locals: Arena<Local>,
    frames: Vec<Vec<StmtId>>,
    root_range: Span,
}

impl<'a> BodyBuilder<'a> {
    fn new(unit: &'a mut UnitBuilder, root_range: Span) -> Self {
        Self {
            unit,
            stmts: Arena::default(),
            exprs: Arena::default(),
            locals: Arena::default(),
            frames: vec![Vec::new()],
            root_range,
        }
    }

    pub fn name(&mut self, name: &str) -> ExprId {
        let range = self.unit.span(name.len());
        self.alloc_expr(Expr::Name {
            name: name.to_string(),
            range,
        })
    }

    pub fn int(&mut self, value: &str) -> ExprId {
        let range = self.unit.span(value.len());
        self.alloc_expr(Expr::Literal {
            kind: LiteralKind::Int,
            value: value.to_string(),
            range,
        })
    }

    pub fn string(&mut self, value: &str) -> ExprId {
        let range = self.unit.span(value.len() + 2);
        self.alloc_expr(Expr::Literal {
            kind: LiteralKind::String,
            value: value.to_string(),
            range,
        })
    }

    pub fn field_access(&mut self, receiver: ExprId, name: &str) -> ExprId {
        let name_range = self.unit.span(name.len());
        let range = self.unit.span(name.len() + 2);
        self.alloc_expr(Expr::FieldAccess {
            receiver,
            name: name.to_string(),
            name_range,
            range,
        })
    }

    pub fn call(&mut self, receiver: Option<ExprId>, name: &str, args: Vec<ExprId>) -> ExprId {
        let name_range = self.unit.span(name.len());
        let range = self.unit.span(name.len() + 2);
        self.alloc_expr(Expr::Call {
            receiver,
            name: name.to_string(),
            name_range,
            args,
            range,
        })
    }

    pub fn assign(&mut self, target: ExprId, value: ExprId) -> ExprId {
        let range = self.unit.span(3);
        self.alloc_expr(Expr::Assign {
            target,
            value,
            op: AssignOp::Set,
            range,
        })
    }

    pub fn compound_assign(&mut self, target: ExprId, value: ExprId) -> ExprId {
        let range = self.unit.span(4);
        self.alloc_expr(Expr::Assign {
            target,
            value,
            op: AssignOp::Compound,
            range,
        })
    }

    pub fn binary(&mut self, op: BinaryOp, lhs: ExprId, rhs: ExprId) -> ExprId {
        let range = self.unit.span(3);
        self.alloc_expr(Expr::Binary { op, lhs, rhs, range })
    }

    pub fn let_stmt(&mut self, ty: Option<&str>, name: &str, initializer: Option<ExprId>) -> LocalId {
        let ty = ty.map(|t| self.unit.type_ref(t));
        let name_range = self.unit.span(name.len());
        let range = self.unit.span(name.len() + 6);
        let local = LocalId::from_raw(self.locals.alloc(Local {
            name: name.to_string(),
            name_range,
            ty,
            range,
        }));
        let stmt = StmtId::from_raw(self.stmts.alloc(Stmt::Let {
            local,
            initializer,
            range,
        }));
        self.push_stmt(stmt);
        local
    }

    pub fn expr_stmt(&mut self, expr: ExprId) {
        let range = self.exprs[expr].range();
        let stmt = StmtId::from_raw(self.stmts.alloc(Stmt::Expr { expr, range }));
        self.push_stmt(stmt);
    }

    pub fn ret(&mut self, expr: Option<ExprId>) {
        let range = self.unit.span(6);
        let stmt = StmtId::from_raw(self.stmts.alloc(Stmt::Return { expr, range }));
        self.push_stmt(stmt);
    }

    pub fn block(&mut self, f: impl FnOnce(&mut Self)) {
        self.frames.push(Vec::new());
        f(self);
        let statements = self.frames.pop().unwrap_or_default();
        let range = self.unit.span(2);
        let stmt = StmtId::from_raw(self.stmts.alloc(Stmt::Block { statements, range }));
        self.push_stmt(stmt);
    }

    fn alloc_expr(&mut self, expr: Expr) -> ExprId {
        ExprId::from_raw(self.exprs.alloc(expr))
    }

    fn push_stmt(&mut self, stmt: StmtId) {
        if let Some(frame) = self.frames.last_mut() {
            frame.push(stmt);
        }
    }

    fn finish(mut self) -> Body {
        let statements = self.frames.pop().unwrap_or_default();
        let root = StmtId::from_raw(self.stmts.alloc(Stmt::Block {
            statements,
            range: self.root_range,
        }));
        Body {
            root,
            stmts: self.stmts,
            exprs: self.exprs,
            locals: self.locals,
        }
    }
}
