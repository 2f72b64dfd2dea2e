//! End-to-end coverage driven through the public `Thread`/
//! `execute_program` entry points, against hand-authored bytecode
//! (there is no compiler backend in this workspace). Complements the
//! white-box `#[cfg(test)]` units inside `interpreter.rs` with
//! scenarios that only make sense from outside the crate.

use std::sync::{Arc, Mutex};

use horse64_program::{Const, Instruction, InstrBuf, NativeError, Program, Value};
use horse64_vm::{execute_program, Thread};
use pretty_assertions::assert_eq;

fn new_func(program: &mut Program, name: &str, arg_count: u32) -> horse64_program::FuncId {
    let uri = program.intern_file_uri("file:///demo.h64");
    program
        .register_function(name, uri, arg_count, &[], false, "demo", None, None, None)
        .unwrap()
}

/// Scenario: a `main` that calls a host-registered `print` function
/// with a string argument, then returns; `execute_program` reports a
/// clean exit and the printed text reached the host.
#[test]
fn hello_program_prints_and_exits_cleanly() {
    let mut program = Program::new();
    let uri = program.intern_file_uri("file:///demo.h64");

    let printed = Arc::new(Mutex::new(Vec::new()));
    let sink = printed.clone();
    let print_id = program
        .register_function(
            "print",
            uri,
            1,
            &[],
            false,
            "demo",
            None,
            None,
            Some(Arc::new(move |args: &[Value]| {
                if let [Value::ShortStrConst(s)] = args {
                    sink.lock().unwrap().push(horse64_program::strutil::utf32_to_utf8(&s.0));
                }
                Ok(Value::None)
            })),
        )
        .unwrap();

    let greeting: Vec<u32> = horse64_program::strutil::utf8_to_utf32(b"hello, world", true).unwrap();

    let main = new_func(&mut program, "main", 0);
    let mut body = InstrBuf::new();
    body.push(Instruction::GetFunc { dest: 0, func_id: print_id });
    body.push(Instruction::SetConst { dest: 1, value: Const::ShortStr(greeting) });
    body.push(Instruction::Call { dest: 2, callee: 0, first_arg: 1, arg_count: 1 });
    body.push(Instruction::SetConst { dest: 2, value: Const::None });
    body.push(Instruction::ReturnValue { src: 2 });
    program.set_func_body(main, body);
    program.main_func_index = Some(main);

    assert_eq!(execute_program(&program), 0);
    assert_eq!(printed.lock().unwrap().as_slice(), [b"hello, world".to_vec()]);
}

/// Scenario: a raised, class-tagged exception matching an active catch
/// frame transfers control to the handler, which runs the paired
/// `finally` block before returning, instead of propagating past it.
#[test]
fn caught_exception_reaches_its_handler_and_finally() {
    let mut program = Program::new();
    let uri = program.intern_file_uri("file:///demo.h64");
    let io_error = program.add_class("IoError", uri, "demo", None).unwrap();

    let raise_id = program
        .register_function(
            "raise",
            uri,
            0,
            &[],
            false,
            "demo",
            None,
            None,
            Some(Arc::new(move |_args| Err(NativeError::raised(io_error, "boom")))),
        )
        .unwrap();

    // 0: GetFunc raise           5: SetConst dest=2 <- 10 (handler)
    // 1: PushCatchFrame(5, 7)    6: JumpToFinally
    // 2: AddCatchType            7: SetConst dest=2 <- 20 (finally)
    // 3: Call                    8: ReturnValue 2
    // 4: Jump 8
    let main = new_func(&mut program, "main", 0);
    let mut body = InstrBuf::new();
    body.push(Instruction::GetFunc { dest: 0, func_id: raise_id });
    body.push(Instruction::PushCatchFrame { handler: 5, finally: Some(7) });
    body.push(Instruction::AddCatchType { class_id: io_error });
    body.push(Instruction::Call { dest: 1, callee: 0, first_arg: 0, arg_count: 0 });
    body.push(Instruction::Jump { target: 8 });
    body.push(Instruction::SetConst { dest: 2, value: Const::Int64(10) });
    body.push(Instruction::JumpToFinally);
    body.push(Instruction::SetConst { dest: 2, value: Const::Int64(20) });
    body.push(Instruction::ReturnValue { src: 2 });
    program.set_func_body(main, body);
    program.main_func_index = Some(main);

    let mut thread = Thread::new(&program);
    let result = thread.call(&program, main, &[]).unwrap();
    assert_eq!(result, Value::Int64(20));
}

/// Scenario: an exception with no matching catch frame anywhere on the
/// call stack propagates all the way out of `execute_program` as a
/// non-zero exit status.
#[test]
fn uncaught_exception_exits_with_nonzero_status() {
    let mut program = Program::new();
    let uri = program.intern_file_uri("file:///demo.h64");
    let io_error = program.add_class("IoError", uri, "demo", None).unwrap();

    let raise_id = program
        .register_function(
            "raise",
            uri,
            0,
            &[],
            false,
            "demo",
            None,
            None,
            Some(Arc::new(move |_args| Err(NativeError::raised(io_error, "boom")))),
        )
        .unwrap();

    let main = new_func(&mut program, "main", 0);
    let mut body = InstrBuf::new();
    body.push(Instruction::GetFunc { dest: 0, func_id: raise_id });
    body.push(Instruction::Call { dest: 1, callee: 0, first_arg: 0, arg_count: 0 });
    body.push(Instruction::ReturnValue { src: 1 });
    program.set_func_body(main, body);
    program.main_func_index = Some(main);

    assert_eq!(execute_program(&program), 1);
}
