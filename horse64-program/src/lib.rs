//! The program table, value model, and reference-counted heap that
//! make up the Horse64 VM's static data.
//!
//! This crate has no dependency on `horse64-vm`: native function
//! bodies are plain closures over [`value::Value`] slices
//! ([`bytecode::NativeFn`]), so the interpreter can be layered on top
//! without a dependency cycle.

pub mod bytecode;
pub mod debug;
pub mod error;
pub mod heap;
pub mod ids;
pub mod program;
pub mod strutil;
pub mod value;

pub use bytecode::{BinOp, Const, FuncBody, Instruction, InstrAddr, InstrBuf, NativeFn, Slot, UnOp};
pub use debug::DebugSymbols;
pub use error::{NativeError, ProgramError};
pub use heap::{
    free_value, ExceptionObj, Heap, HeapId, HeapObject, HeapObjectKind, HeapPayload, InstanceObj, IteratorObj,
};
pub use ids::{ClassId, FileUriId, FuncId, NameId, VarId};
pub use program::{ClassEntry, ClassMemberLookup, FuncEntry, GlobalEntry, Program, HASH_SIZE, MAX_METHODS};
pub use value::{ShortStrConst, Utf32Buf, Value};
