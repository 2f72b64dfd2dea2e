//! The bytecode interpreter loop and program entry
//! point.
//!
//! A classic bytecode interpreter uses a threaded-dispatch table where
//! each opcode handler jumps directly to the next one, eliminating a
//! central switch. Rust has no computed-goto primitive to express
//! that with, and the idiomatic equivalent LLVM already produces from
//! a `match` in a loop is the same jump-table dispatch in spirit; this
//! interpreter is written as that `match`. Likewise, `CALL` is
//! implemented as a plain recursive call into [`Thread::call`] rather
//! than a hand-rolled frame-switch trampoline: Rust's own call stack
//! already plays the role of the VM's frame stack one level at a
//! time, and unwinding a `Result::Err` through it is exactly "pop the
//! frame and propagate", so there is nothing a manual trampoline would
//! buy here.

use horse64_program::{
    BinOp, ClassId, Const, FuncBody, FuncId, Heap, HeapObjectKind, HeapPayload, Instruction,
    InstanceObj, IteratorObj, NameId, Program, UnOp, Value,
};

use crate::catchframe::CatchStack;
use crate::error::VmError;
use crate::stack::Stack;

enum Step {
    Continue,
    Jump(u32),
    Return(Value),
}

/// One VM thread: the flat value stack, the pooled heap, the
/// catch-frame stack, and a per-thread copy of every global's current
/// value. Globals live here rather than on [`Program`] because the
/// program tables are shared, read-only state across threads;
/// only the initial value recorded at resolve time lives
/// on the table itself.
pub struct Thread {
    pub heap: Heap,
    stack: Stack,
    catch_stack: CatchStack,
    /// Finally-block targets for frames a raised exception has already
    /// matched and removed from `catch_stack`. `catch_from` returns
    /// the matched frame (and drops it, along with everything above
    /// it), so by the time the handler body itself runs, that frame's
    /// `finally` address is gone from `catch_stack` --- it is stashed
    /// here instead, in handler-entry order, for `JUMPTOFINALLY` to
    /// pop.
    pending_finally: Vec<u32>,
    globals: Vec<Value>,
}

impl Thread {
    pub fn new(program: &Program) -> Self {
        Thread {
            heap: Heap::new(),
            stack: Stack::new(),
            catch_stack: CatchStack::new(),
            pending_finally: Vec::new(),
            globals: program.globals.iter().map(|g| g.value.clone()).collect(),
        }
    }

    fn install_root(&mut self, value: &Value) {
        if let Value::HeapRef(id) = value {
            self.heap.inc_external(*id);
        }
    }

    fn install_edge(&mut self, value: &Value) {
        if let Value::HeapRef(id) = value {
            self.heap.inc_heap(*id);
        }
    }

    /// Calls `func_id` with `args` and returns its result. Native
    /// functions are invoked directly; bytecode functions get a fresh
    /// frame on the shared stack.
    pub fn call(&mut self, program: &Program, func_id: FuncId, args: &[Value]) -> Result<Value, VmError> {
        let entry = &program.funcs[func_id.to_usize()];
        if let FuncBody::Native(native) = &entry.body {
            let native = native.clone();
            return native(args).map_err(|e| match e.class_id {
                    Some(class_id) => VmError::UncaughtException { class_id },
                    None => VmError::InvalidInstruction {
                        pc: 0,
                        detail: e.message,
                    },
            });
        }

        let floor = self.stack.len();
        let slot_count = entry.input_stack_size.max(args.len() as u32) as usize;
        self.stack.to_size(&mut self.heap, floor + slot_count, false)?;
        for (i, arg) in args.iter().enumerate() {
            self.install_root(arg);
            self.stack.set(&mut self.heap, floor + i, arg.clone());
        }

        let catch_floor = self.catch_stack.len();
        let pending_finally_floor = self.pending_finally.len();
        let result = self.run(program, func_id, floor);
        self.catch_stack.truncate(catch_floor);
        self.pending_finally.truncate(pending_finally_floor);
        self.stack.to_size(&mut self.heap, floor, false)?;
        result
    }

    /// Allocates a new instance of `class_id` and, if an `init` method
    /// is found anywhere on its ancestor chain, calls it with the new
    /// instance as an implicit leading `self` argument followed by
    /// `args`. This is the convention `GETCLASS` + `CALL` uses to
    /// construct instances; there is no dedicated `NEWINSTANCE` opcode.
    pub fn construct(&mut self, program: &Program, class_id: ClassId, args: &[Value]) -> Result<Value, VmError> {
        let field_count = program.class_total_field_count(class_id) as usize;
        let id = self.heap.alloc(
            HeapObjectKind::Instance,
            HeapPayload::Instance(InstanceObj {
                    class_id,
                    fields: vec![Value::None; field_count],
            }),
        );
        let instance = Value::HeapRef(id);

        if let Some(init_id) = find_method(program, class_id, program.special_method_names["init"]) {
            let mut call_args = Vec::with_capacity(args.len() + 1);
            call_args.push(instance.clone());
            call_args.extend_from_slice(args);
            self.call(program, init_id, &call_args)?;
        }

        Ok(instance)
    }

    fn slot(&self, floor: usize, slot: u32) -> Value {
        self.stack.get(floor + slot as usize).clone()
    }

    fn set_slot(&mut self, floor: usize, slot: u32, value: Value) {
        self.stack.set(&mut self.heap, floor + slot as usize, value);
    }

    /// Runs `func_id`'s bytecode with its frame already installed at
    /// `floor`, driving the opcode dispatch loop until `RETURNVALUE`
    /// or an uncaught error.
    fn run(&mut self, program: &Program, func_id: FuncId, floor: usize) -> Result<Value, VmError> {
        let body = match &program.funcs[func_id.to_usize()].body {
            FuncBody::Bytecode(b) => b,
            FuncBody::Native(_) => unreachable!("native bodies never reach run()"),
        };
        let catch_floor = self.catch_stack.len();
        let mut pc: u32 = 0;

        loop {
            let instr = match body.get(pc) {
                Some(instr) => instr.clone(),
                None => {
                    return Err(VmError::InvalidInstruction {
                            pc,
                            detail: "program counter past end of function".into(),
                    })
                }
            };

            let step = match self.exec(program, floor, &instr) {
                Ok(step) => step,
                Err(VmError::UncaughtException { class_id }) => {
                    match self.catch_stack.catch_from(program, class_id, catch_floor) {
                        Some(frame) => {
                            self.stack.to_size(&mut self.heap, frame.saved_floor, false)?;
                            if let Some(finally) = frame.finally {
                                self.pending_finally.push(finally);
                            }
                            Step::Jump(frame.handler)
                        }
                        None => return Err(VmError::UncaughtException { class_id }),
                    }
                }
                Err(e) => return Err(e),
            };

            match step {
                Step::Continue => pc += 1,
                Step::Jump(target) => pc = target,
                Step::Return(value) => return Ok(value),
            }
        }
    }

    /// Executes one instruction. Jump targets and `RETURNVALUE` are
    /// reported via [`Step`]; everything else implicitly advances the
    /// program counter by one.
    fn exec(&mut self, program: &Program, floor: usize, instr: &Instruction) -> Result<Step, VmError> {
        match instr {
            Instruction::SetConst { dest, value } => {
                self.set_slot(floor, *dest, const_to_value(value));
            }
            Instruction::SetGlobal { var_id, src } => {
                let value = self.slot(floor, *src);
                self.install_root(&value);
                let old = std::mem::replace(&mut self.globals[var_id.to_usize()], value);
                horse64_program::free_value(&mut self.heap, &old);
            }
            Instruction::GetGlobal { dest, var_id } => {
                let value = self.globals[var_id.to_usize()].clone();
                self.install_root(&value);
                self.set_slot(floor, *dest, value);
            }
            Instruction::GetFunc { dest, func_id } => {
                self.set_slot(floor, *dest, Value::FuncRef(*func_id));
            }
            Instruction::GetClass { dest, class_id } => {
                self.set_slot(floor, *dest, Value::ClassRef(*class_id));
            }
            Instruction::ValueCopy { dest, src } => {
                let value = self.slot(floor, *src);
                self.install_root(&value);
                self.set_slot(floor, *dest, value);
            }
            Instruction::BinOp { dest, op, lhs, rhs } => {
                let result = eval_binop(*op, &self.slot(floor, *lhs), &self.slot(floor, *rhs))?;
                self.set_slot(floor, *dest, result);
            }
            Instruction::UnOp { dest, op, src } => {
                let result = eval_unop(*op, &self.slot(floor, *src))?;
                self.set_slot(floor, *dest, result);
            }
            Instruction::Call { dest, callee, first_arg, arg_count } => {
                let callee_value = self.slot(floor, *callee);
                let args: Vec<Value> = (0..*arg_count)
                .map(|i| self.slot(floor, first_arg + i))
                .collect();
                let result = match callee_value {
                    Value::FuncRef(func_id) => self.call(program, func_id, &args)?,
                    Value::ClassRef(class_id) => self.construct(program, class_id, &args)?,
                    other => {
                        return Err(VmError::TypeMismatch {
                                expected: "func or class",
                                found: other.type_name(),
                        })
                    }
                };
                self.set_slot(floor, *dest, result);
            }
            Instruction::SetTop { src } => {
                self.stack.to_size(&mut self.heap, floor + *src as usize + 1, false)?;
            }
            Instruction::ReturnValue { src } => {
                let value = self.slot(floor, *src);
                self.install_root(&value);
                return Ok(Step::Return(value));
            }
            Instruction::JumpTarget => {}
            Instruction::CondJump { cond, target, jump_if } => {
                if self.slot(floor, *cond).truthy() == *jump_if {
                    return Ok(Step::Jump(*target));
                }
            }
            Instruction::Jump { target } => return Ok(Step::Jump(*target)),
            Instruction::NewIterator { dest, source } => {
                let source_value = self.slot(floor, *source);
                let value = self.new_iterator(&source_value)?;
                self.set_slot(floor, *dest, value);
            }
            Instruction::Iterate { dest, iter_slot, end_target } => {
                let iter_value = self.slot(floor, *iter_slot);
                let next = self.advance_iterator(&iter_value)?;
                match next {
                    Some(value) => self.set_slot(floor, *dest, value),
                    None => return Ok(Step::Jump(*end_target)),
                }
            }
            Instruction::PushCatchFrame { handler, finally } => {
                self.catch_stack.push(self.stack.len(), *handler, *finally);
            }
            Instruction::AddCatchType { class_id } => {
                self.catch_stack.add_class(*class_id);
            }
            Instruction::AddCatchTypeByRef { slot } => match self.slot(floor, *slot) {
                Value::ClassRef(class_id) => self.catch_stack.add_class(class_id),
                other => {
                    return Err(VmError::TypeMismatch {
                            expected: "class",
                            found: other.type_name(),
                    })
                }
            },
            Instruction::PopCatchFrame => {
                self.catch_stack.pop();
            }
            Instruction::GetMember { dest, target, name_id } => {
                let target_value = self.slot(floor, *target);
                let value = self.get_member(program, &target_value, *name_id)?;
                self.set_slot(floor, *dest, value);
            }
            Instruction::JumpToFinally => {
                if let Some(finally) = self.pending_finally.pop() {
                    return Ok(Step::Jump(finally));
                }
            }
            Instruction::NewList { dest } => {
                let id = self.heap.alloc(HeapObjectKind::List, HeapPayload::List(Vec::new()));
                self.set_slot(floor, *dest, Value::HeapRef(id));
            }
            Instruction::AddToList { list, value } => {
                let value = self.slot(floor, *value);
                self.install_edge(&value);
                let list_id = self.heap_ref(floor, *list)?;
                match &mut self.heap.get_mut(list_id).payload {
                    HeapPayload::List(items) => items.push(value),
                    _ => {
                        return Err(VmError::TypeMismatch {
                                expected: "list",
                                found: "heap",
                        })
                    }
                }
            }
            Instruction::NewSet { dest } => {
                let id = self
                .heap
                .alloc(HeapObjectKind::Set, HeapPayload::Set(std::collections::HashSet::new()));
                self.set_slot(floor, *dest, Value::HeapRef(id));
            }
            Instruction::AddToSet { set, value } => {
                let value = self.slot(floor, *value);
                self.install_edge(&value);
                let set_id = self.heap_ref(floor, *set)?;
                match &mut self.heap.get_mut(set_id).payload {
                    HeapPayload::Set(items) => {
                        items.insert(value);
                    }
                    _ => {
                        return Err(VmError::TypeMismatch {
                                expected: "set",
                                found: "heap",
                        })
                    }
                }
            }
            Instruction::NewVector { dest, len } => {
                let id = self
                .heap
                .alloc(HeapObjectKind::Vector, HeapPayload::Vector(vec![Value::None; *len as usize]));
                self.set_slot(floor, *dest, Value::HeapRef(id));
            }
            Instruction::PutVector { vector, index, value } => {
                let value = self.slot(floor, *value);
                let index_val = self.slot(floor, *index);
                self.install_edge(&value);
                let vector_id = self.heap_ref(floor, *vector)?;
                let idx = as_index(&index_val)?;
                let old = match &mut self.heap.get_mut(vector_id).payload {
                    HeapPayload::Vector(items) => {
                        let slot = items.get_mut(idx).ok_or(VmError::TypeMismatch {
                                expected: "in-bounds index",
                                found: "out of range",
                        })?;
                        std::mem::replace(slot, value)
                    }
                    _ => {
                        return Err(VmError::TypeMismatch {
                                expected: "vector",
                                found: "heap",
                        })
                    }
                };
                if let Value::HeapRef(old_id) = old {
                    self.heap.dec_heap(old_id);
                }
            }
            Instruction::NewMap { dest } => {
                let id = self
                .heap
                .alloc(HeapObjectKind::Map, HeapPayload::Map(std::collections::HashMap::new()));
                self.set_slot(floor, *dest, Value::HeapRef(id));
            }
            Instruction::PutMap { map, key, value } => {
                let key = self.slot(floor, *key);
                let value = self.slot(floor, *value);
                self.install_edge(&key);
                self.install_edge(&value);
                let map_id = self.heap_ref(floor, *map)?;
                let old = match &mut self.heap.get_mut(map_id).payload {
                    HeapPayload::Map(entries) => entries.insert(key, value),
                    _ => {
                        return Err(VmError::TypeMismatch {
                                expected: "map",
                                found: "heap",
                        })
                    }
                };
                if let Some(Value::HeapRef(old_id)) = old {
                    self.heap.dec_heap(old_id);
                }
            }
        }
        Ok(Step::Continue)
    }

    fn heap_ref(&self, floor: usize, slot: u32) -> Result<horse64_program::HeapId, VmError> {
        self.slot(floor, slot).as_heap_ref().ok_or(VmError::TypeMismatch {
                expected: "heap reference",
                found: "non-heap value",
        })
    }

    fn new_iterator(&mut self, source: &Value) -> Result<Value, VmError> {
        let source_id = source.as_heap_ref().ok_or(VmError::TypeMismatch {
                expected: "container",
                found: source.type_name(),
        })?;

        enum Kind {
            Indexed,
            Snapshot(Vec<Value>),
        }

        // Read the container's kind (and, for set/map, a value snapshot)
        // into owned data before touching `self.heap` mutably below, so
        // the two never overlap.
        let kind = match &self.heap.get(source_id).payload {
            HeapPayload::List(_) | HeapPayload::Vector(_) => Kind::Indexed,
            HeapPayload::Set(items) => Kind::Snapshot(items.iter().cloned().collect()),
            HeapPayload::Map(entries) => Kind::Snapshot(entries.keys().cloned().collect()),
            _ => {
                return Err(VmError::TypeMismatch {
                        expected: "container",
                        found: "non-container heap value",
                })
            }
        };

        let payload = match kind {
            Kind::Indexed => {
                self.heap.inc_heap(source_id);
                IteratorObj::Indexed { source: source_id, next: 0 }
            }
            Kind::Snapshot(items) => {
                for item in &items {
                    self.install_edge(item);
                }
                IteratorObj::Snapshot { items, next: 0 }
            }
        };

        let id = self.heap.alloc(HeapObjectKind::Iterator, HeapPayload::Iterator(payload));
        Ok(Value::HeapRef(id))
    }

    fn advance_iterator(&mut self, iter_value: &Value) -> Result<Option<Value>, VmError> {
        let iter_id = iter_value.as_heap_ref().ok_or(VmError::TypeMismatch {
                expected: "iterator",
                found: iter_value.type_name(),
        })?;

        // Read the iterator's kind and position first, in its own borrow of
        // `self.heap`, so the lookup of its source container below (a
        // second, independent borrow) never overlaps with it.
        let (source, idx) = match &self.heap.get(iter_id).payload {
            HeapPayload::Iterator(IteratorObj::Snapshot { next,.. }) => (None, *next),
            HeapPayload::Iterator(IteratorObj::Indexed { source, next }) => (Some(*source), *next),
            _ => {
                return Err(VmError::TypeMismatch {
                        expected: "iterator",
                        found: "non-iterator heap value",
                })
            }
        };

        let element = match source {
            None => match &self.heap.get(iter_id).payload {
                HeapPayload::Iterator(IteratorObj::Snapshot { items,.. }) => items.get(idx).cloned(),
                _ => unreachable!(),
            },
            Some(source_id) => match &self.heap.get(source_id).payload {
                HeapPayload::List(items) | HeapPayload::Vector(items) => items.get(idx).cloned(),
                _ => None,
            },
        };

        let exhausted = element.is_none();
        if !exhausted {
            if let HeapPayload::Iterator(
                IteratorObj::Snapshot { next,.. } | IteratorObj::Indexed { next,.. },
            ) = &mut self.heap.get_mut(iter_id).payload
            {
                *next += 1;
            }
        }

        if let Some(v) = &element {
            self.install_root(v);
        }
        if exhausted {
            self.heap.dec_external(iter_id);
        }
        Ok(element)
    }

    fn get_member(&mut self, program: &Program, target: &Value, name_id: NameId) -> Result<Value, VmError> {
        let instance_id = target.as_heap_ref().ok_or(VmError::TypeMismatch {
                expected: "instance",
                found: target.type_name(),
        })?;
        let class_id = match &self.heap.get(instance_id).payload {
            HeapPayload::Instance(inst) => inst.class_id,
            _ => {
                return Err(VmError::TypeMismatch {
                        expected: "instance",
                        found: "non-instance heap value",
                })
            }
        };

        for ancestor in program.class_ancestors(class_id) {
            let lookup = program.lookup_class_member(ancestor, name_id);
            if let Some(func_id) = lookup.method_func_id {
                return Ok(Value::FuncRef(func_id));
            }
            if let Some(ordinal) = lookup.member_var_ordinal {
                let offset = program.class_field_base_offset(ancestor) + ordinal;
                let value = match &self.heap.get(instance_id).payload {
                    HeapPayload::Instance(inst) => inst.fields[offset as usize].clone(),
                    _ => unreachable!(),
                };
                self.install_root(&value);
                return Ok(value);
            }
        }

        Err(VmError::TypeMismatch {
                expected: "member present on class",
                found: "no such member",
        })
    }
}

fn find_method(program: &Program, class_id: ClassId, name_id: NameId) -> Option<FuncId> {
    for ancestor in program.class_ancestors(class_id) {
        if let Some(func_id) = program.lookup_class_member(ancestor, name_id).method_func_id {
            return Some(func_id);
        }
    }
    None
}

fn const_to_value(c: &Const) -> Value {
    match c {
        Const::None => Value::None,
        Const::Bool(b) => Value::Bool(*b),
        Const::Int64(i) => Value::Int64(*i),
        Const::Float64(f) => Value::Float64(*f),
        Const::ShortStr(chars) => Value::ShortStrConst(horse64_program::ShortStrConst(chars.clone())),
    }
}

fn as_index(value: &Value) -> Result<usize, VmError> {
    match value {
        Value::Int64(i) if *i >= 0 => Ok(*i as usize),
        other => Err(VmError::TypeMismatch {
                expected: "non-negative int",
                found: other.type_name(),
        }),
    }
}

fn numeric(value: &Value) -> Result<f64, VmError> {
    match value {
        Value::Int64(i) => Ok(*i as f64),
        Value::Float64(f) => Ok(*f),
        other => Err(VmError::TypeMismatch {
                expected: "number",
                found: other.type_name(),
        }),
    }
}

fn is_zero(value: &Value) -> bool {
    matches!(value, Value::Int64(0)) || matches!(value, Value::Float64(f) if *f == 0.0)
}

fn eval_binop(op: BinOp, lhs: &Value, rhs: &Value) -> Result<Value, VmError> {
    match op {
        BinOp::Eq => return Ok(Value::Bool(lhs == rhs)),
        BinOp::NotEq => return Ok(Value::Bool(lhs != rhs)),
        BinOp::And => return Ok(Value::Bool(lhs.truthy() && rhs.truthy())),
        BinOp::Or => return Ok(Value::Bool(lhs.truthy() || rhs.truthy())),
        _ => {}
    }

    match op {
        BinOp::Lt | BinOp::LtEq | BinOp::Gt | BinOp::GtEq => {
            let (a, b) = (numeric(lhs)?, numeric(rhs)?);
            let result = match op {
                BinOp::Lt => a < b,
                BinOp::LtEq => a <= b,
                BinOp::Gt => a > b,
                BinOp::GtEq => a >= b,
                _ => unreachable!(),
            };
            Ok(Value::Bool(result))
        }
        BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Div | BinOp::Mod => {
            if matches!(op, BinOp::Div | BinOp::Mod) && is_zero(rhs) {
                return Err(VmError::DivisionByZero);
            }
            if let (Value::Int64(a), Value::Int64(b)) = (lhs, rhs) {
                let result = match op {
                    BinOp::Add => a.wrapping_add(*b),
                    BinOp::Sub => a.wrapping_sub(*b),
                    BinOp::Mul => a.wrapping_mul(*b),
                    BinOp::Div => a / b,
                    BinOp::Mod => a % b,
                    _ => unreachable!(),
                };
                return Ok(Value::Int64(result));
            }
            let (a, b) = (numeric(lhs)?, numeric(rhs)?);
            let result = match op {
                BinOp::Add => a + b,
                BinOp::Sub => a - b,
                BinOp::Mul => a * b,
                BinOp::Div => a / b,
                BinOp::Mod => a % b,
                _ => unreachable!(),
            };
            Ok(Value::Float64(result))
        }
        BinOp::Eq | BinOp::NotEq | BinOp::And | BinOp::Or => unreachable!("handled above"),
    }
}

fn eval_unop(op: UnOp, value: &Value) -> Result<Value, VmError> {
    match op {
        UnOp::Not => Ok(Value::Bool(!value.truthy())),
        UnOp::Neg => match value {
            Value::Int64(i) => Ok(Value::Int64(i.wrapping_neg())),
            Value::Float64(f) => Ok(Value::Float64(-f)),
            other => Err(VmError::TypeMismatch {
                    expected: "number",
                    found: other.type_name(),
            }),
        },
    }
}

/// `execute_program`: runs `$$globalinit` if present,
/// then `main`; an uncaught exception is printed by class name and
/// maps to a non-zero exit status.
pub fn execute_program(program: &Program) -> i32 {
    let mut thread = Thread::new(program);

    if let Some(globalinit) = program.globalinit_func_index {
        if let Err(e) = thread.call(program, globalinit, &[]) {
            return report_uncaught(program, e);
        }
    }

    let Some(main) = program.main_func_index else {
        log::error!("program has no main function");
        return 1;
    };

    match thread.call(program, main, &[]) {
        Ok(_) => 0,
        Err(e) => report_uncaught(program, e),
    }
}

fn report_uncaught(program: &Program, err: VmError) -> i32 {
    match err {
        VmError::UncaughtException { class_id } => {
            eprintln!("uncaught exception: {}", program.debug.class_name(class_id));
        }
        other => eprintln!("uncaught VM error ({}): {other}", other.kind_tag()),
    }
    1
}
