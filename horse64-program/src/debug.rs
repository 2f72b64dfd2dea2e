//! Debug symbol tables, keyed by the same stable integer ids as the
//! program tables themselves.
//!
//! These are never consulted by the interpreter loop; they exist for
//! the disassembler and for turning an `UncaughtException{class_id}`
//! into a printed class name a user-facing diagnostic can show.

use crate::ids::{ClassId, FuncId, VarId};

#[derive(Debug, Clone, Default)]
pub struct DebugSymbols {
    func_names: Vec<String>,
    class_names: Vec<String>,
    var_names: Vec<String>,
}

impl DebugSymbols {
    pub fn new() -> Self {
        DebugSymbols::default()
    }

    pub fn record_func(&mut self, id: FuncId, name: impl Into<String>) {
        insert_at(&mut self.func_names, id.to_usize(), name.into());
    }

    pub fn record_class(&mut self, id: ClassId, name: impl Into<String>) {
        insert_at(&mut self.class_names, id.to_usize(), name.into());
    }

    pub fn record_var(&mut self, id: VarId, name: impl Into<String>) {
        insert_at(&mut self.var_names, id.to_usize(), name.into());
    }

    pub fn func_name(&self, id: FuncId) -> &str {
        lookup(&self.func_names, id.to_usize())
    }

    pub fn class_name(&self, id: ClassId) -> &str {
        lookup(&self.class_names, id.to_usize())
    }

    pub fn var_name(&self, id: VarId) -> &str {
        lookup(&self.var_names, id.to_usize())
    }
}

fn insert_at(table: &mut Vec<String>, idx: usize, value: String) {
    if idx >= table.len() {
        table.resize(idx + 1, String::new());
    }
    table[idx] = value;
}

fn lookup(table: &[String], idx: usize) -> &str {
    table.get(idx).map(String::as_str).unwrap_or("<unknown>")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_and_looks_up_out_of_order() {
        let mut symbols = DebugSymbols::new();
        symbols.record_func(FuncId(2), "main");
        symbols.record_func(FuncId(0), "$$globalinit");
        assert_eq!(symbols.func_name(FuncId(2)), "main");
        assert_eq!(symbols.func_name(FuncId(0)), "$$globalinit");
        assert_eq!(symbols.func_name(FuncId(1)), "");
    }

    #[test]
    fn unknown_id_does_not_panic() {
        let symbols = DebugSymbols::new();
        assert_eq!(symbols.class_name(ClassId(5)), "<unknown>");
    }
}
