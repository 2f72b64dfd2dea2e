use crate::{AstError, Expr, ExprId, ExprKind, Name, Position, Scope, ScopeId};

/// One recoverable diagnostic, reported as a `{kind, file_uri, line,
/// column, message}` record. `kind` is a
/// stable tag string (the `Display` of whichever closed error enum
/// produced it — `horse64-resolve::ResolverError`, typically) rather
/// than an enum itself, so this crate does not need to depend on the
/// crates that define those enums.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: &'static str,
    pub file_uri: String,
    pub line: u32,
    pub column: u32,
    pub message: String,
}

/// The one-shot state machine an AST moves through: `Parsed ->
/// GlobalStorageBuilt -> IdentifiersResolved`. A transition is
/// latched the moment it runs, whether or not it produced errors ---
/// `stage` records how far the AST got, `Ast::has_errors` records
/// whether it got there cleanly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum AstStage {
    Parsed,
    GlobalStorageBuilt,
    IdentifiersResolved,
}

/// One parsed source file: its expression/scope arena, import list,
/// and resolution state. `horse64-resolve` is the only crate that
/// mutates an `Ast` past construction; this crate only owns the
/// shape.
#[derive(Debug, Clone)]
pub struct Ast {
    pub file_uri: String,
    pub module_path: Option<String>,
    pub library: Option<String>,
    pub root_scope: ScopeId,
    pub root_expr: ExprId,
    /// Top-level `import` statement expressions, in source order.
    pub imports: Vec<ExprId>,
    pub exprs: Vec<Expr>,
    pub scopes: Vec<Scope>,
    pub messages: Vec<Diagnostic>,
    pub stage: AstStage,
}

impl Ast {
    /// Creates a fresh AST with an empty `File` root and its global
    /// scope.
    pub fn new(file_uri: impl Into<String>) -> Self {
        let mut ast = Ast {
            file_uri: file_uri.into(),
            module_path: None,
            library: None,
            root_scope: ScopeId(0),
            root_expr: ExprId(0),
            imports: Vec::new(),
            exprs: Vec::new(),
            scopes: Vec::new(),
            messages: Vec::new(),
            stage: AstStage::Parsed,
        };

        let root_scope = ast.push_scope(Scope::new(None, true));
        let root_expr = ast.push_expr(Expr::new(
                ExprKind::File { body: Vec::new() },
                None,
                Position::default(),
        ));
        ast.exprs[root_expr.to_usize()].owns_scope = Some(root_scope);
        ast.root_scope = root_scope;
        ast.root_expr = root_expr;
        ast
    }

    pub fn push_expr(&mut self, expr: Expr) -> ExprId {
        let id = ExprId(self.exprs.len() as u32);
        self.exprs.push(expr);
        id
    }

    pub fn push_scope(&mut self, scope: Scope) -> ScopeId {
        let id = ScopeId(self.scopes.len() as u32);
        self.scopes.push(scope);
        id
    }

    pub fn expr(&self, id: ExprId) -> &Expr {
        &self.exprs[id.to_usize()]
    }

    pub fn expr_mut(&mut self, id: ExprId) -> &mut Expr {
        &mut self.exprs[id.to_usize()]
    }

    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.to_usize()]
    }

    pub fn scope_mut(&mut self, id: ScopeId) -> &mut Scope {
        &mut self.scopes[id.to_usize()]
    }

    pub fn pos_of(&self, id: ExprId) -> Position {
        self.expr(id).pos
    }

    /// Appends `body` to the file root's `File` node.
    pub fn add_top_level(&mut self, id: ExprId) {
        let root = self.root_expr;
        if let ExprKind::File { body } = &mut self.expr_mut(root).kind {
            body.push(id);
        } else {
            unreachable!("root_expr is always a File node");
        }
    }

    /// Walks `expr`'s parent chain until it reaches the nearest
    /// ancestor that owns a scope. A node with no
    /// parent that is not the AST's own root is a malformed tree.
    pub fn get_scope(&self, expr: ExprId) -> Result<ScopeId, AstError> {
        let mut cur = self.expr(expr).parent;
        loop {
            match cur {
                Some(id) => {
                    if let Some(scope) = self.expr(id).owns_scope {
                        return Ok(scope);
                    }
                    cur = self.expr(id).parent;
                }
                None => {
                    if expr == self.root_expr {
                        return Ok(self.root_scope);
                    }
                    return Err(AstError::MalformedAst(expr));
                }
            }
        }
    }

    /// Lexical name lookup: searches `scope`, then (if
    /// `walk_parents`) each ancestor scope in turn. Returns the scope
    /// the binding was found in together with its definition index,
    /// so callers can mutate the definition in place (e.g. to flag
    /// `closure_bound`).
    pub fn query(
        &self,
        scope: ScopeId,
        name: &str,
        walk_parents: bool,
    ) -> Option<(ScopeId, usize)> {
        let mut cur = Some(scope);
        while let Some(id) = cur {
            if let Some(idx) = self.scope(id).get_local(name) {
                return Some((id, idx));
            }
            if !walk_parents {
                return None;
            }
            cur = self.scope(id).parent;
        }
        None
    }

    pub fn has_errors(&self) -> bool {
        !self.messages.is_empty()
    }

    pub fn report(&mut self, kind: &'static str, pos: Position, message: String) {
        self.messages.push(Diagnostic {
                kind,
                file_uri: self.file_uri.clone(),
                line: pos.line,
                column: pos.column,
                message,
        });
    }

    /// Looks up a definition given the identifier of a name known (by
    /// construction) to be a function parameter / local var name
    /// newly declared in `scope`, returning its position in
    /// `scope.definitions`.
    pub fn define_in(&mut self, scope: ScopeId, name: Name, decl: ExprId) -> usize {
        self.scope_mut(scope).define(name, decl)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_ast_roots_to_its_own_scope() {
        let ast = Ast::new("file:///a.h64");
        assert_eq!(ast.get_scope(ast.root_expr), Ok(ast.root_scope));
        assert_eq!(ast.stage, AstStage::Parsed);
        assert!(!ast.has_errors());
    }

    #[test]
    fn malformed_parentless_node_is_reported() {
        let mut ast = Ast::new("file:///a.h64");
        let orphan = ast.push_expr(Expr::new(
                ExprKind::Literal(crate::Literal::None),
                None,
                Position::default(),
        ));
        assert_eq!(ast.get_scope(orphan), Err(AstError::MalformedAst(orphan)));
    }
}
