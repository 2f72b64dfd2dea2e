//! Demo CLI --- a minimal host is still useful to exercise the
//! library end to end, so this one hand-builds a single-file AST with
//! [`horse64_ast::builder`] in place of a real parser, resolves it,
//! then hand-authors the bytecode a real compiler backend would emit
//! (see [`horse64::parse_and_resolve`]'s doc comment for why there is
//! no compiler backend in this workspace) before running it.

use std::sync::Arc;

use camino::Utf8PathBuf;
use clap::Parser;
use horse64_ast::{builder, Ast};
use horse64_program::{Const, Instruction, InstrBuf, Value};
use horse64_resolve::{Builtins, Environment, ResolverConfig};

#[derive(Parser, Debug)]
#[command(name = "horse64", version, about = "Horse64 resolver + VM demo host")]
struct Cli {
    /// Print every resolved top-level declaration's storage before running.
    #[arg(long)]
    emit_resolution: bool,
}

/// Builds `main() { print("hello from horse64!") }`: a single top-level
/// function whose body calls a one-argument builtin by name, standing
/// in for whatever a real parser would hand back for that source line.
fn build_demo_ast() -> Ast {
    let mut ast = Ast::new("file:///demo/main.h64");
    let root_scope = ast.root_scope;

    let main_fn = builder::func_def(&mut ast, 1, Some("main".into()), vec![], false, root_scope, |ast, _node, _scope| {
        let callee = builder::identifier_ref(ast, 2, "print");
        let call = builder::call(ast, 2, callee, vec![], vec![]);
        vec![call, builder::return_stmt(ast, 3, None)]
    });
    builder::add_top_level(&mut ast, main_fn);

    ast
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let ast = build_demo_ast();
    let environment = Environment::with_project_root(Utf8PathBuf::from("/demo"));
    let config = ResolverConfig::default();
    let mut builtins = Builtins::new();
    builtins.register_func("print", 1);

    let (mut program, outcome) = match horse64::parse_and_resolve(
        "file:///demo/main.h64",
        ast,
        &environment,
        &config,
        &builtins,
        &horse64::NoImports,
        &mut horse64::NoProvider,
    ) {
        Ok(result) => result,
        Err(err) => {
            eprintln!("resolution failed: {err}");
            std::process::exit(1);
        }
    };

    for diagnostic in &outcome.diagnostics {
        log::warn!(
            "{} at {}:{}:{}: {}",
            diagnostic.kind,
            diagnostic.file_uri,
            diagnostic.line,
            diagnostic.column,
            diagnostic.message
        );
    }

    if cli.emit_resolution {
        println!("resolved {} diagnostic(s); main = {:?}", outcome.diagnostics.len(), program.main_func_index);
    }

    // Stand-in for the bytecode compiler backend this workspace leaves
    // external: `main() { print("hello from horse64!") }` compiles to
    // a call against a host-registered native `print`, then "return none".
    if let Some(main_id) = program.main_func_index {
        let uri = program.intern_file_uri("file:///demo/main.h64");
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
                Some(Arc::new(|args: &[Value]| {
                    if let [Value::ShortStrConst(s)] = args {
                        println!("{}", String::from_utf8_lossy(&horse64_program::strutil::utf32_to_utf8(&s.0)));
                    }
                    Ok(Value::None)
                })),
            )
            .expect("registering the demo's native print function");
        let greeting = horse64_program::strutil::utf8_to_utf32(b"hello from horse64!", true)
            .expect("the demo greeting is valid UTF-8");

        let mut body = InstrBuf::new();
        body.push(Instruction::GetFunc { dest: 0, func_id: print_id });
        body.push(Instruction::SetConst { dest: 1, value: Const::ShortStr(greeting) });
        body.push(Instruction::Call { dest: 2, callee: 0, first_arg: 1, arg_count: 1 });
        body.push(Instruction::SetConst { dest: 2, value: Const::None });
        body.push(Instruction::ReturnValue { src: 2 });
        program.set_func_body(main_id, body);
    }

    let exit_code = horse64::execute(&program);
    std::process::exit(exit_code);
}
