//! Name resolution for Quarry.
//!
//! This crate is intentionally small: it resolves the names in one lowered
//! compilation unit against a pluggable [`NameEnvironment`] and produces the
//! binding shapes the tree locators consume (declaring types, member types,
//! local identities). Full type checking is out of scope; identity and
//! member lookup along the super chain is what matching needs.

mod bindings;
mod descriptors;
mod env;
mod resolver;

pub use bindings::{
    BindingMap, FieldBinding, LocalBinding, MethodBinding, NameBinding, ResolvedTypeRef,
    TypeBinding,
};
pub use descriptors::{describe_type, FieldStub, MethodStub, TypeDescriptor};
pub use env::{NameEnvironment, TableEnvironment};
pub use resolver::Resolver;
