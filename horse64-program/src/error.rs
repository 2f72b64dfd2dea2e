//! Program-table error kinds.

use thiserror::Error;

use crate::ids::ClassId;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProgramError {
    #[error("class {class_id} already has a member named {name:?}")]
    DuplicateClassMember { class_id: ClassId, name: String },

    #[error("class {class_id} has more than MAX_METHODS methods")]
    TooManyMethods { class_id: ClassId },

    /// Additive beyond the closed §7 list: §4.1 requires
    /// `add_global_var`/`add_class`/`register_function` to fail "if
    /// name collides within the same module", which §7 never gives a
    /// tag of its own. `horse64-resolve` maps this to the
    /// resolver-facing `DuplicateGlobalSymbol` diagnostic kind.
    #[error("symbol {name:?} is already registered in this module")]
    DuplicateSymbol { name: String },

    #[error("allocation failure while registering a program-table entry")]
    OutOfMemory,
}

/// The error type a native (`is_c_func`) function's callback returns.
/// Kept distinct from [`ProgramError`] and the VM's own error enum
/// since a native function is an external collaborator that only
/// knows how to report "it went wrong", not which VM-internal
/// invariant (if any) it violated; `horse64-vm` is responsible for
/// turning this into an `UncaughtException`/`TypeMismatch` at the
/// call site.
///
/// `class_id` lets a native function raise a catchable, class-tagged
/// exception (e.g. a library's own `IoError`) rather than always
/// aborting the thread; a bare [`NativeError::new`] leaves it `None`,
/// which the VM treats as uncatchable since there is no class for a
/// surrounding catch frame to match against.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct NativeError {
    pub message: String,
    pub class_id: Option<ClassId>,
}

impl NativeError {
    pub fn new(message: impl Into<String>) -> Self {
        NativeError {
            message: message.into(),
            class_id: None,
        }
    }

    pub fn raised(class_id: ClassId, message: impl Into<String>) -> Self {
        NativeError {
            message: message.into(),
            class_id: Some(class_id),
        }
    }
}
