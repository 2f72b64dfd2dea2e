//! The builtin module's three name tables, consulted only after a name misses
//! every lexical scope.

use std::collections::HashMap;

use horse64_ast::BuiltinRef;

#[derive(Debug, Clone, Default)]
pub struct Builtins {
    funcs: HashMap<String, u32>,
    classes: HashMap<String, u32>,
    vars: HashMap<String, u32>,
}

impl Builtins {
    pub fn new() -> Self {
        Builtins::default()
    }

    pub fn register_func(&mut self, name: impl Into<String>, id: u32) {
        self.funcs.insert(name.into(), id);
    }

    pub fn register_class(&mut self, name: impl Into<String>, id: u32) {
        self.classes.insert(name.into(), id);
    }

    pub fn register_var(&mut self, name: impl Into<String>, id: u32) {
        self.vars.insert(name.into(), id);
    }

    pub fn lookup(&self, name: &str) -> Option<BuiltinRef> {
        if let Some(&id) = self.funcs.get(name) {
            return Some(BuiltinRef::Func(id));
        }
        if let Some(&id) = self.classes.get(name) {
            return Some(BuiltinRef::Class(id));
        }
        if let Some(&id) = self.vars.get(name) {
            return Some(BuiltinRef::Var(id));
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn looks_up_across_all_three_tables() {
        let mut builtins = Builtins::new();
        builtins.register_func("print", 0);
        builtins.register_class("Exception", 1);
        assert_eq!(builtins.lookup("print"), Some(BuiltinRef::Func(0)));
        assert_eq!(builtins.lookup("Exception"), Some(BuiltinRef::Class(1)));
        assert_eq!(builtins.lookup("nope"), None);
    }
}
