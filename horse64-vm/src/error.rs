//! VM error kinds.

use horse64_program::ClassId;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum VmError {
    #[error("allocation failure")]
    OutOfMemory,

    #[error("invalid instruction at {pc}: {detail}")]
    InvalidInstruction { pc: u32, detail: String },

    #[error("uncaught exception of class {class_id:?}")]
    UncaughtException { class_id: ClassId },

    #[error("division by zero")]
    DivisionByZero,

    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: &'static str, found: &'static str },
}

impl VmError {
    /// A stable tag for this error kind, independent of `Display`'s
    /// formatted message.
    pub fn kind_tag(&self) -> &'static str {
        match self {
            VmError::OutOfMemory => "OutOfMemory",
            VmError::InvalidInstruction { .. } => "InvalidInstruction",
            VmError::UncaughtException { .. } => "UncaughtException",
            VmError::DivisionByZero => "DivisionByZero",
            VmError::TypeMismatch { .. } => "TypeMismatch",
        }
    }
}
