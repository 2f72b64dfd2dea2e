//! Small helpers for building [`Ast`] trees by hand.
//!
//! There is no lexer or parser in this repository, so every resolver and VM
//! test constructs its input tree directly. Nodes are built
//! bottom-up: build a child, get its [`ExprId`], then wrap it in its
//! parent and [`reparent`] the child onto the new node.

use crate::{Ast, BinOp, Expr, ExprId, ExprKind, Literal, Name, Position, RescueClause, Scope, ScopeId};

fn at(line: u32, column: u32) -> Position {
    Position::new(line, column)
}

/// Fixes up `child`'s parent pointer once its real parent node has
/// been allocated.
pub fn reparent(ast: &mut Ast, child: ExprId, parent: ExprId) {
    ast.expr_mut(child).parent = Some(parent);
}

fn reparent_all(ast: &mut Ast, children: &[ExprId], parent: ExprId) {
    for &child in children {
        reparent(ast, child, parent);
    }
}

pub fn literal(ast: &mut Ast, line: u32, lit: Literal) -> ExprId {
    ast.push_expr(Expr::new(ExprKind::Literal(lit), None, at(line, 1)))
}

pub fn identifier_ref(ast: &mut Ast, line: u32, name: impl Into<Name>) -> ExprId {
    ast.push_expr(Expr::new(
            ExprKind::IdentifierRef { name: name.into() },
            None,
            at(line, 1),
    ))
}

pub fn member_by_identifier(
    ast: &mut Ast,
    line: u32,
    target: ExprId,
    member_name: impl Into<Name>,
) -> ExprId {
    let member = identifier_ref(ast, line, member_name);
    let node = ast.push_expr(Expr::new(
            ExprKind::MemberByIdentifier { target, member },
            None,
            at(line, 1),
    ));
    reparent(ast, target, node);
    reparent(ast, member, node);
    node
}

pub fn binary_op(ast: &mut Ast, line: u32, op: BinOp, lhs: ExprId, rhs: ExprId) -> ExprId {
    let node = ast.push_expr(Expr::new(ExprKind::BinaryOp { op, lhs, rhs }, None, at(line, 1)));
    reparent(ast, lhs, node);
    reparent(ast, rhs, node);
    node
}

pub fn call(ast: &mut Ast, line: u32, callee: ExprId, args: Vec<ExprId>, kwargs: Vec<(Name, ExprId)>) -> ExprId {
    let node = ast.push_expr(Expr::new(
            ExprKind::Call {
                callee,
                args: args.clone(),
                kwargs: kwargs.clone(),
            },
            None,
            at(line, 1),
    ));
    reparent(ast, callee, node);
    reparent_all(ast, &args, node);
    for (_, v) in &kwargs {
        reparent(ast, *v, node);
    }
    node
}

/// Builds a `var_def` expression, with `initializer` (if any) already
/// built and owned by the caller. Does *not* register the definition
/// in any scope --- callers do that with [`crate::Ast::define_in`]
/// once the declaration's [`ExprId`] is known, matching the
/// resolver's own global-storage pass.
pub fn var_def(ast: &mut Ast, line: u32, name: impl Into<Name>, is_const: bool, initializer: Option<ExprId>) -> ExprId {
    let node = ast.push_expr(Expr::new(
            ExprKind::VarDef {
                name: name.into(),
                is_const,
                initializer,
            },
            None,
            at(line, 1),
    ));
    if let Some(init) = initializer {
        reparent(ast, init, node);
    }
    node
}

pub fn import_stmt(
    ast: &mut Ast,
    line: u32,
    path_components: Vec<Name>,
    library: Option<Name>,
) -> ExprId {
    ast.push_expr(Expr::new(
            ExprKind::ImportStmt {
                path_components,
                library,
            },
            None,
            at(line, 1),
    ))
}

pub fn raise(ast: &mut Ast, line: u32, value: ExprId) -> ExprId {
    let node = ast.push_expr(Expr::new(ExprKind::Raise { value }, None, at(line, 1)));
    reparent(ast, value, node);
    node
}

pub fn return_stmt(ast: &mut Ast, line: u32, value: Option<ExprId>) -> ExprId {
    let node = ast.push_expr(Expr::new(ExprKind::Return { value }, None, at(line, 1)));
    if let Some(v) = value {
        reparent(ast, v, node);
    }
    node
}

/// Builds a `func_def`/`inline func` node and the scope it owns, as a
/// child of `parent_scope`. `build_body` receives the function's own
/// [`ExprId`] and [`ScopeId`] and must return the body statements,
/// each already built (and not yet parented --- this function
/// reparents them).
pub fn func_def(
    ast: &mut Ast,
    line: u32,
    name: Option<Name>,
    params: Vec<Name>,
    is_inline: bool,
    parent_scope: ScopeId,
    build_body: impl FnOnce(&mut Ast, ExprId, ScopeId) -> Vec<ExprId>,
) -> ExprId {
    let node = ast.push_expr(Expr::new(
            ExprKind::FuncDef {
                name,
                params: params.clone(),
                kwparams: Vec::new(),
                multi_arg_last: false,
                body: Vec::new(),
                is_inline,
                closure_captures: Vec::new(),
            },
            None,
            at(line, 1),
    ));

    let fn_scope = ast.push_scope(Scope::new(Some(parent_scope), false));
    ast.expr_mut(node).owns_scope = Some(fn_scope);

    for (i, p) in params.iter().enumerate() {
        ast.define_in(fn_scope, p.clone(), node);
        let _ = i;
    }

    let body = build_body(ast, node, fn_scope);
    reparent_all(ast, &body, node);

    if let ExprKind::FuncDef { body: b,.. } = &mut ast.expr_mut(node).kind {
        *b = body;
    }

    node
}

/// Builds a `class_def` node. `build_body` returns the class's
/// members (`var_def`/`func_def` nodes), already built.
pub fn class_def(
    ast: &mut Ast,
    line: u32,
    name: impl Into<Name>,
    base: Option<Name>,
    build_body: impl FnOnce(&mut Ast, ExprId) -> Vec<ExprId>,
) -> ExprId {
    let node = ast.push_expr(Expr::new(
            ExprKind::ClassDef {
                name: name.into(),
                base,
                body: Vec::new(),
            },
            None,
            at(line, 1),
    ));

    let body = build_body(ast, node);
    reparent_all(ast, &body, node);

    if let ExprKind::ClassDef { body: b,.. } = &mut ast.expr_mut(node).kind {
        *b = body;
    }

    node
}

/// Builds a `for` loop and the scope it owns (binding
/// `iterator_name`).
pub fn for_stmt(
    ast: &mut Ast,
    line: u32,
    iterator_name: impl Into<Name>,
    source: ExprId,
    parent_scope: ScopeId,
    build_body: impl FnOnce(&mut Ast, ExprId, ScopeId) -> Vec<ExprId>,
) -> ExprId {
    let iterator_name = iterator_name.into();
    let node = ast.push_expr(Expr::new(
            ExprKind::ForStmt {
                iterator_name: iterator_name.clone(),
                source,
                body: Vec::new(),
            },
            None,
            at(line, 1),
    ));
    reparent(ast, source, node);

    let loop_scope = ast.push_scope(Scope::new(Some(parent_scope), false));
    ast.expr_mut(node).owns_scope = Some(loop_scope);
    ast.define_in(loop_scope, iterator_name, node);

    let body = build_body(ast, node, loop_scope);
    reparent_all(ast, &body, node);

    if let ExprKind::ForStmt { body: b,.. } = &mut ast.expr_mut(node).kind {
        *b = body;
    }

    node
}

/// Builds a `do { body } rescue A, B {... } finally {... }`
/// expression. `rescues` is `(class_name_refs, body)` pairs, each
/// already built.
pub fn do_stmt(
    ast: &mut Ast,
    line: u32,
    body: Vec<ExprId>,
    rescues: Vec<(Vec<ExprId>, Vec<ExprId>)>,
    finally: Vec<ExprId>,
) -> ExprId {
    let node = ast.push_expr(Expr::new(
            ExprKind::DoStmt {
                body: Vec::new(),
                rescues: Vec::new(),
                finally: Vec::new(),
            },
            None,
            at(line, 1),
    ));

    reparent_all(ast, &body, node);
    let mut built_rescues = Vec::with_capacity(rescues.len());
    for (classes, rbody) in rescues {
        reparent_all(ast, &classes, node);
        reparent_all(ast, &rbody, node);
        built_rescues.push(RescueClause {
                classes,
                body: rbody,
        });
    }
    reparent_all(ast, &finally, node);

    if let ExprKind::DoStmt {
        body: b,
        rescues: r,
        finally: f,
    } = &mut ast.expr_mut(node).kind
    {
        *b = body;
        *r = built_rescues;
        *f = finally;
    }

    node
}

/// Registers a `var_def` (or `for_stmt` iterator, though
/// [`for_stmt`] already does this for you) as a local of `scope`.
/// Used for locals declared inside a function body, which --- unlike
/// top-level declarations --- are never visited by the global-storage
/// pass.
pub fn define_local(ast: &mut Ast, scope: ScopeId, decl: ExprId) {
    let name = match &ast.expr(decl).kind {
        ExprKind::VarDef { name,.. } => name.clone(),
        ExprKind::FuncDef { name: Some(name),.. } => name.clone(),
        _ => panic!("define_local expects a var_def or named func_def expression"),
    };
    ast.define_in(scope, name, decl);
}

/// Appends `stmt` to the AST's top-level body and, if it is an
/// `import_stmt`/`var_def`/`func_def`/`class_def`, records its
/// binding in the global scope the way a parser's declaration-binding
/// step would (the resolver itself only *annotates* storage; it does
/// not invent scope bindings for top-level declarations that have
/// none yet, since the resolver assumes the scope is already populated).
pub fn add_top_level(ast: &mut Ast, stmt: ExprId) {
    let root = ast.root_expr;
    reparent(ast, stmt, root);
    let root_scope = ast.root_scope;

    let binding = match &ast.expr(stmt).kind {
        ExprKind::VarDef { name,.. } => Some(name.clone()),
        ExprKind::FuncDef { name,.. } => name.clone(),
        ExprKind::ClassDef { name,.. } => Some(name.clone()),
        ExprKind::ImportStmt { path_components,.. } => path_components.first().cloned(),
        _ => None,
    };

    if let Some(name) = binding {
        ast.define_in(root_scope, name, stmt);
    }

    ast.add_top_level(stmt);
}
