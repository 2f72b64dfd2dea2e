use crate::{Name, Position, ScopeId, Storage};

/// Index of an [`crate::Expr`] inside its owning [`crate::Ast`]'s
/// expression arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExprId(pub u32);

impl ExprId {
    pub fn to_usize(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    None,
    Bool(bool),
    Int64(i64),
    Float64(f64),
    Str(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    NotEq,
    Lt,
    Gt,
    And,
    Or,
}

/// One `rescue ExceptionClass {... }` arm of a `do` block.
#[derive(Debug, Clone)]
pub struct RescueClause {
    /// `identifier_ref` nodes naming the exception classes this arm
    /// catches.
    pub classes: Vec<ExprId>,
    pub body: Vec<ExprId>,
}

/// The node-kind-specific payload of an [`Expr`]. Field shapes are
/// close enough to the language grammar that the resolver in
/// `horse64-resolve` can be written directly against them; anything
/// not needed by scope resolution or interpretation (formatting
/// hints, trivia,...) is left to the external parser/pretty-printer
/// and has no representation here.
#[derive(Debug, Clone)]
pub enum ExprKind {
    /// The synthetic root of a source file. Owns the file's global
    /// scope.
    File { body: Vec<ExprId> },
    Literal(Literal),
    /// A bare name reference, e.g. `x`, `self`, `base`, or the
    /// right-hand side `b` of `a.b`.
    IdentifierRef { name: Name },
    BinaryOp { op: BinOp, lhs: ExprId, rhs: ExprId },
    /// `target.member`. `member` is the [`ExprId`] of an
    /// `IdentifierRef` node whose parent is this expression; the
    /// resolver special-cases such nodes.
    MemberByIdentifier { target: ExprId, member: ExprId },
    Call {
        callee: ExprId,
        args: Vec<ExprId>,
        kwargs: Vec<(Name, ExprId)>,
    },
    VarDef {
        name: Name,
        is_const: bool,
        initializer: Option<ExprId>,
    },
    /// Both top-level `func foo {... }` and `inline func {... }`
    /// expressions use this variant (`is_inline` and `name`
    /// distinguish them). Owns the function's top scope (parameters
    /// plus top-level locals).
    FuncDef {
        name: Option<Name>,
        params: Vec<Name>,
        kwparams: Vec<(Name, Option<ExprId>)>,
        multi_arg_last: bool,
        body: Vec<ExprId>,
        is_inline: bool,
        /// Outer-function locals this function (or a function nested
        /// inside it) captures, as `(home scope, definition index)`
        /// pairs into the outer function's scope. Populated by the
        /// identifier-resolution pass, never by the builder

        closure_captures: Vec<(ScopeId, u32)>,
    },
    ClassDef {
        name: Name,
        base: Option<Name>,
        body: Vec<ExprId>,
    },
    ImportStmt {
        path_components: Vec<Name>,
        library: Option<Name>,
    },
    /// `for name in source { body }`. Owns a scope in which `name` is
    /// pre-defined as a local.
    ForStmt {
        iterator_name: Name,
        source: ExprId,
        body: Vec<ExprId>,
    },
    DoStmt {
        body: Vec<ExprId>,
        rescues: Vec<RescueClause>,
        finally: Vec<ExprId>,
    },
    Raise { value: ExprId },
    Return { value: Option<ExprId> },
}

/// One node of the AST. `parent` and `owns_scope` are the two fields
/// the resolver relies on for the scope walk (`Ast::get_scope`);
/// everything else is kind-specific payload plus
/// the `storage` annotation the resolver fills in.
#[derive(Debug, Clone)]
pub struct Expr {
    pub kind: ExprKind,
    pub parent: Option<ExprId>,
    pub owns_scope: Option<ScopeId>,
    pub pos: Position,
    pub storage: Option<Storage>,
    pub resolved_to_builtin: bool,
}

impl Expr {
    pub fn new(kind: ExprKind, parent: Option<ExprId>, pos: Position) -> Self {
        Expr {
            kind,
            parent,
            owns_scope: None,
            pos,
            storage: None,
            resolved_to_builtin: false,
        }
    }

    pub fn is_identifier_ref(&self) -> bool {
        matches!(self.kind, ExprKind::IdentifierRef { .. })
    }

    pub fn identifier_name(&self) -> Option<&Name> {
        match &self.kind {
            ExprKind::IdentifierRef { name } => Some(name),
            _ => None,
        }
    }
}
