use std::hash::{Hash, Hasher};

use crate::heap::HeapId;
use crate::ids::{ClassId, FuncId};

/// A length-prefixed (by construction --- `Vec::len`) buffer of UTF-32
/// code units. Values are not required to be valid Unicode scalars:
/// Invalid UTF-8 bytes round-trip through a surrogate-pair escape
/// (`0xDC80 + byte`), which produces values in
/// the surrogate range that `char` cannot represent. `u32` is the
/// honest storage type for that.
pub type Utf32Buf = Vec<u32>;

/// A short string constant embedded directly in an instruction
/// operand. Kept out of the heap so that
/// constant pools do not churn the allocator on every `SETCONST`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShortStrConst(pub Utf32Buf);

/// The tagged union every runtime value is stored as. The tag (this enum's
/// discriminant) fully determines which payload is live; there is no
/// representation for "wrong variant accessed" because Rust's
/// pattern matching makes that unreachable by construction.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    None,
    Bool(bool),
    Int64(i64),
    Float64(f64),
    ShortStrConst(ShortStrConst),
    HeapRef(HeapId),
    /// What `GETFUNC` writes to a slot: a first-class reference to a
    /// program-table function, consumed by `CALL`'s `callee` operand.
    /// Not heap-allocated --- functions are static
    /// program data, never garbage-collected.
    FuncRef(FuncId),
    /// What `GETCLASS` writes to a slot, consumed by member lookup and
    /// instance construction.
    ClassRef(ClassId),
}

impl Value {
    pub fn is_none(&self) -> bool {
        matches!(self, Value::None)
    }

    pub fn is_heap_ref(&self) -> bool {
        matches!(self, Value::HeapRef(_))
    }

    pub fn as_heap_ref(&self) -> Option<HeapId> {
        match self {
            Value::HeapRef(id) => Some(*id),
            _ => None,
        }
    }

    pub fn as_func_ref(&self) -> Option<FuncId> {
        match self {
            Value::FuncRef(id) => Some(*id),
            _ => None,
        }
    }

    pub fn as_class_ref(&self) -> Option<ClassId> {
        match self {
            Value::ClassRef(id) => Some(*id),
            _ => None,
        }
    }

    pub fn truthy(&self) -> bool {
        match self {
            Value::None => false,
            Value::Bool(b) => *b,
            Value::Int64(i) => *i != 0,
            Value::Float64(f) => *f != 0.0,
            Value::ShortStrConst(s) => !s.0.is_empty(),
            Value::HeapRef(_) => true,
            Value::FuncRef(_) => true,
            Value::ClassRef(_) => true,
        }
    }

    /// A short, stable name for the tag, used by `TypeMismatch`
    /// diagnostics and the disassembler.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::None => "none",
            Value::Bool(_) => "bool",
            Value::Int64(_) => "int",
            Value::Float64(_) => "float",
            Value::ShortStrConst(_) => "str",
            Value::HeapRef(_) => "heap",
            Value::FuncRef(_) => "func",
            Value::ClassRef(_) => "class",
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::None => {}
            Value::Bool(b) => b.hash(state),
            Value::Int64(i) => i.hash(state),
            Value::Float64(f) => f.to_bits().hash(state),
            Value::ShortStrConst(s) => s.0.hash(state),
            Value::HeapRef(id) => id.hash(state),
            Value::FuncRef(id) => id.hash(state),
            Value::ClassRef(id) => id.hash(state),
        }
    }
}
