//! A human-readable instruction listing, grounded in
//! [`horse64_program::Instruction::mnemonic`] and the program's debug
//! symbol tables. Not part of the interpreter; only used for
//! diagnostics and tests that want to assert on emitted bytecode.

use horse64_program::{BinOp, Const, FuncBody, FuncId, Instruction, Program, UnOp};

/// One line per instruction, e.g. `0003 CALL dest=2 callee=0 first_arg=1 arg_count=1`.
pub fn disassemble_func(program: &Program, func_id: FuncId) -> String {
    let entry = &program.funcs[func_id.to_usize()];
    let body = match &entry.body {
        FuncBody::Bytecode(b) => b,
        FuncBody::Native(_) => return format!("{} is a native function", entry.name),
    };

    let mut out = String::new();
    for (addr, instr) in body.iter() {
        out.push_str(&format!("{addr:04} {}\n", format_instr(instr)));
    }
    out
}

fn format_instr(instr: &Instruction) -> String {
    let mnemonic = instr.mnemonic();
    match instr {
        Instruction::SetConst { dest, value } => {
            format!("{mnemonic} dest={dest} value={}", format_const(value))
        }
        Instruction::SetGlobal { var_id, src } => format!("{mnemonic} var={var_id} src={src}"),
        Instruction::GetGlobal { dest, var_id } => format!("{mnemonic} dest={dest} var={var_id}"),
        Instruction::GetFunc { dest, func_id } => format!("{mnemonic} dest={dest} func={func_id}"),
        Instruction::GetClass { dest, class_id } => format!("{mnemonic} dest={dest} class={class_id}"),
        Instruction::ValueCopy { dest, src } => format!("{mnemonic} dest={dest} src={src}"),
        Instruction::BinOp { dest, op, lhs, rhs } => {
            format!("{mnemonic} dest={dest} op={} lhs={lhs} rhs={rhs}", format_binop(*op))
        }
        Instruction::UnOp { dest, op, src } => {
            format!("{mnemonic} dest={dest} op={} src={src}", format_unop(*op))
        }
        Instruction::Call { dest, callee, first_arg, arg_count } => {
            format!("{mnemonic} dest={dest} callee={callee} first_arg={first_arg} arg_count={arg_count}")
        }
        Instruction::SetTop { src } => format!("{mnemonic} src={src}"),
        Instruction::ReturnValue { src } => format!("{mnemonic} src={src}"),
        Instruction::JumpTarget => mnemonic.to_string(),
        Instruction::CondJump { cond, target, jump_if } => {
            format!("{mnemonic} cond={cond} target={target} jump_if={jump_if}")
        }
        Instruction::Jump { target } => format!("{mnemonic} target={target}"),
        Instruction::NewIterator { dest, source } => format!("{mnemonic} dest={dest} source={source}"),
        Instruction::Iterate { dest, iter_slot, end_target } => {
            format!("{mnemonic} dest={dest} iter={iter_slot} end_target={end_target}")
        }
        Instruction::PushCatchFrame { handler, finally } => {
            format!("{mnemonic} handler={handler} finally={finally:?}")
        }
        Instruction::AddCatchType { class_id } => format!("{mnemonic} class={class_id}"),
        Instruction::AddCatchTypeByRef { slot } => format!("{mnemonic} slot={slot}"),
        Instruction::PopCatchFrame => mnemonic.to_string(),
        Instruction::GetMember { dest, target, name_id } => {
            format!("{mnemonic} dest={dest} target={target} name={name_id}")
        }
        Instruction::JumpToFinally => mnemonic.to_string(),
        Instruction::NewList { dest } => format!("{mnemonic} dest={dest}"),
        Instruction::AddToList { list, value } => format!("{mnemonic} list={list} value={value}"),
        Instruction::NewSet { dest } => format!("{mnemonic} dest={dest}"),
        Instruction::AddToSet { set, value } => format!("{mnemonic} set={set} value={value}"),
        Instruction::NewVector { dest, len } => format!("{mnemonic} dest={dest} len={len}"),
        Instruction::PutVector { vector, index, value } => {
            format!("{mnemonic} vector={vector} index={index} value={value}")
        }
        Instruction::NewMap { dest } => format!("{mnemonic} dest={dest}"),
        Instruction::PutMap { map, key, value } => format!("{mnemonic} map={map} key={key} value={value}"),
    }
}

fn format_const(c: &Const) -> String {
    match c {
        Const::None => "none".to_string(),
        Const::Bool(b) => b.to_string(),
        Const::Int64(i) => i.to_string(),
        Const::Float64(f) => f.to_string(),
        Const::ShortStr(chars) => format!("str[{}]", chars.len()),
    }
}

fn format_binop(op: BinOp) -> &'static str {
    match op {
        BinOp::Add => "add",
        BinOp::Sub => "sub",
        BinOp::Mul => "mul",
        BinOp::Div => "div",
        BinOp::Mod => "mod",
        BinOp::Eq => "eq",
        BinOp::NotEq => "neq",
        BinOp::Lt => "lt",
        BinOp::LtEq => "lteq",
        BinOp::Gt => "gt",
        BinOp::GtEq => "gteq",
        BinOp::And => "and",
        BinOp::Or => "or",
    }
}

fn format_unop(op: UnOp) -> &'static str {
    match op {
        UnOp::Neg => "neg",
        UnOp::Not => "not",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use horse64_program::InstrBuf;

    #[test]
    fn lists_one_line_per_instruction() {
        let mut program = Program::new();
        let uri = program.intern_file_uri("file:///a.h64");
        let func_id = program
        .register_function("f", uri, 0, &[], false, "a", None, None, None)
        .unwrap();
        let mut body = InstrBuf::new();
        body.push(Instruction::SetConst { dest: 0, value: Const::Int64(1) });
        body.push(Instruction::ReturnValue { src: 0 });
        program.set_func_body(func_id, body);

        let listing = disassemble_func(&program, func_id);
        assert_eq!(listing.lines().count(), 2);
        assert!(listing.contains("SETCONST"));
        assert!(listing.contains("RETURNVALUE"));
    }
}
