//! AST, scope and storage-annotation types shared by the Horse64
//! resolver and VM.
//!
//! The lexer and parser are external collaborators: this crate only
//! fixes the *shape* the resolver requires an
//! AST to have. Every source file's nodes and scopes live in one
//! arena owned by its [`Ast`]; cross-references inside that arena are
//! plain integer indices ([`ExprId`], [`ScopeId`]) rather than
//! pointers, so the whole tree is `Send` and trivially owned.

mod ast;
mod expr;
mod name;
mod position;
mod scope;
mod storage;

pub mod builder;
pub mod pathnorm;

pub use ast::{Ast, AstStage, Diagnostic};
pub use expr::{BinOp, Expr, ExprId, ExprKind, Literal, RescueClause};
pub use name::Name;
pub use position::Position;
pub use scope::{Definition, Scope, ScopeId};
pub use storage::{BuiltinRef, Storage, StorageRef};

/// Internal-consistency failures that mean the AST itself is
/// malformed (parent links broken, a node claims a scope that was
/// never registered,...). These are never user-facing diagnostics;
/// they surface only from [`Ast::get_scope`]-style lookups that walk
/// parent links expecting them to be intact.
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum AstError {
    #[error("malformed AST: expression {0:?} has no parent and is not the file root")]
    MalformedAst(ExprId),
}
