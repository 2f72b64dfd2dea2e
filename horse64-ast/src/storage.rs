use crate::ScopeId;

/// Where a builtin name lives, mirroring the three builtin tables
/// (`func_name_to_entry`, `class_name_to_entry`,
/// `globalvar_name_to_entry`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinRef {
    Func(u32),
    Class(u32),
    Var(u32),
}

/// The resolved location of a value a reference expression denotes.
///
/// `Local` carries the home scope and definition index of the
/// declaration within [`crate::Scope::definitions`] --- not yet a
/// concrete slot index. A declaration's *expression* id is not enough
/// to identify it here: every parameter of one `func_def` shares the
/// same declaring expression (there is no per-parameter AST node), so
/// only the `(scope, definition index)` pair is unique. Slot indices
/// are assigned in a separate local-storage pass once every reference has been resolved and every capture
/// recorded, since only then is the final set of locals (including
/// closure captures) of a function known.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageRef {
    GlobalFunc(u32),
    GlobalClass(u32),
    GlobalVar(u32),
    Local(ScopeId, u32),
    Builtin(BuiltinRef),
}

/// The `storage` annotation each reference-bearing node carries:
/// `{set: bool, ref: {kind, id}}`. `set` distinguishes "never looked at" from
/// "resolved", which the resolver needs because `Storage` has no
/// `Option`-shaped empty state of its own (an unset `Local(ExprId)`
/// would still have to point somewhere).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Storage {
    pub set: bool,
    pub reference: StorageRef,
}

impl Storage {
    pub fn new(reference: StorageRef) -> Self {
        Storage {
            set: true,
            reference,
        }
    }

    pub fn global_func(id: u32) -> Self {
        Storage::new(StorageRef::GlobalFunc(id))
    }

    pub fn global_class(id: u32) -> Self {
        Storage::new(StorageRef::GlobalClass(id))
    }

    pub fn global_var(id: u32) -> Self {
        Storage::new(StorageRef::GlobalVar(id))
    }

    pub fn local(scope: ScopeId, definition_index: u32) -> Self {
        Storage::new(StorageRef::Local(scope, definition_index))
    }

    pub fn builtin(reference: BuiltinRef) -> Self {
        Storage::new(StorageRef::Builtin(reference))
    }
}
