use std::collections::HashMap;

use crate::{ExprId, Name};

/// Index of a [`Scope`] inside its owning [`crate::Ast`]'s scope
/// arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(pub u32);

impl ScopeId {
    pub fn to_usize(self) -> usize {
        self.0 as usize
    }
}

/// A binding of one identifier to the expression that declared it.
///
/// `additional_decls` holds further declarations that share this
/// identifier in the same scope without being flagged as a collision
/// --- a running example is two `import foo.bar`
/// / `import foo.baz` statements, both of which bind the prefix
/// `foo`, and both of which must be considered when the identifier
/// resolver reconstructs a dotted access chain.
#[derive(Debug, Clone)]
pub struct Definition {
    pub identifier: Name,
    pub declaration_expr: ExprId,
    pub additional_decls: Vec<ExprId>,
    pub ever_used: bool,
    pub closure_bound: bool,
    /// The concrete stack slot this definition occupies within its
    /// owning function's frame, assigned by the local-storage pass.
    /// `None` until that pass runs, and for
    /// definitions that never needed a slot (globals, which never
    /// appear here in the first place).
    pub local_slot: Option<u32>,
}

impl Definition {
    pub fn new(identifier: Name, declaration_expr: ExprId) -> Self {
        Definition {
            identifier,
            declaration_expr,
            additional_decls: Vec::new(),
            ever_used: false,
            closure_bound: false,
            local_slot: None,
        }
    }
}

/// A lexical name environment. Scopes form a tree rooted at the
/// file's global scope; every function, inline function and `for`
/// loop opens a new child scope.
#[derive(Debug, Clone)]
pub struct Scope {
    pub definitions: Vec<Definition>,
    name_index: HashMap<Name, usize>,
    pub parent: Option<ScopeId>,
    pub is_global: bool,
}

impl Scope {
    pub fn new(parent: Option<ScopeId>, is_global: bool) -> Self {
        Scope {
            definitions: Vec::new(),
            name_index: HashMap::new(),
            parent,
            is_global,
        }
    }

    /// Binds `identifier` to `declaration_expr`. If the identifier is
    /// already bound in this exact scope, the new declaration is
    /// appended to the existing definition's `additional_decls`
    /// instead of shadowing it (this is what lets two `import`
    /// statements share a binding).
    pub fn define(&mut self, identifier: Name, declaration_expr: ExprId) -> usize {
        if let Some(&idx) = self.name_index.get(&identifier) {
            self.definitions[idx].additional_decls.push(declaration_expr);
            idx
        } else {
            let idx = self.definitions.len();
            self.name_index.insert(identifier.clone(), idx);
            self.definitions.push(Definition::new(identifier, declaration_expr));
            idx
        }
    }

    /// Looks up `name` in this scope only (no parent walk).
    pub fn get_local(&self, name: &str) -> Option<usize> {
        self.name_index.get(name).copied()
    }
}
