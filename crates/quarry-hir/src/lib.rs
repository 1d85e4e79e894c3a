//! Compilation-unit trees for Quarry.
//!
//! This crate is the structural half of the matching pipeline: a lowered,
//! arena-based view of one Java compilation unit (declarations, bodies,
//! expressions, type references), with a stable [`NodeRef`] identity for every
//! node a locator can report. Parsing is out of scope; units are produced by
//! an external lowering step or built programmatically via [`UnitBuilder`].

mod body;
mod builder;
mod ids;
mod tree;

pub use body::{AssignOp, BinaryOp, Body, Expr, LiteralKind, Local, Stmt};
pub use builder::{BodyBuilder, UnitBuilder};
pub use ids::{Arena, ExprId, FieldId, ImportId, LocalId, MethodId, StmtId, TypeDeclId, TypeRefId};
pub use tree::{
    CompilationUnit, FieldDecl, Import, MethodDecl, NodeRef, PackageDecl, Param, SuperPosition,
    TypeDecl, TypeKind, TypeRef,
};
