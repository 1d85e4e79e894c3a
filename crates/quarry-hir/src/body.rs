use quarry_core::Span;

use crate::ids::{Arena, ExprId, LocalId, StmtId, TypeRefId};

/// One method body with its own statement, expression and local arenas.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Body {
    pub root: StmtId,
    pub stmts: Arena<Stmt>,
    pub exprs: Arena<Expr>,
    pub locals: Arena<Local>,
}

impl Body {
    #[must_use]
    pub fn empty(range: Span) -> Self {
        let mut stmts = Arena::default();
        let root = StmtId::from_raw(stmts.alloc(Stmt::Block {
            statements: Vec::new(),
            range,
        }));
        Body {
            root,
            stmts,
            exprs: Arena::default(),
            locals: Arena::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Local {
    pub name: String,
    pub name_range: Span,
    pub ty: Option<TypeRefId>,
    pub range: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stmt {
    Block {
        statements: Vec<StmtId>,
        range: Span,
    },
    Let {
        local: LocalId,
        initializer: Option<ExprId>,
        range: Span,
    },
    Expr {
        expr: ExprId,
        range: Span,
    },
    Return {
        expr: Option<ExprId>,
        range: Span,
    },
    Empty {
        range: Span,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LiteralKind {
    Int,
    String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    /// `=`
    Set,
    /// `+=`, `-=`, ... — reads and writes the target.
    Compound,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    /// An unqualified name: a local, parameter, field, or type reference.
    Name {
        name: String,
        range: Span,
    },
    Literal {
        kind: LiteralKind,
        value: String,
        range: Span,
    },
    FieldAccess {
        receiver: ExprId,
        name: String,
        name_range: Span,
        range: Span,
    },
    Call {
        receiver: Option<ExprId>,
        name: String,
        name_range: Span,
        args: Vec<ExprId>,
        range: Span,
    },
    Assign {
        target: ExprId,
        value: ExprId,
        op: AssignOp,
        range: Span,
    },
    Binary {
        op: BinaryOp,
        lhs: ExprId,
        rhs: ExprId,
        range: Span,
    },
    Missing {
        range: Span,
    },
}

impl Expr {
    #[must_use]
    pub fn range(&self) -> Span {
        match self {
            Expr::Name { range, .. }
            | Expr::Literal { range, .. }
            | Expr::FieldAccess { range, .. }
            | Expr::Call { range, .. }
            | Expr::Assign { range, .. }
            | Expr::Binary { range, .. }
            | Expr::Missing { range } => *range,
        }
    }
}
