//! End-to-end coverage driven entirely through the public
//! `resolve_project`/`resolve_identifiers` entry points, against
//! hand-built `horse64-ast` trees (there is no parser in this
//! workspace). Complements the white-box `#[cfg(test)]` units inside
//! `resolver.rs` with scenarios that only make sense from outside the
//! crate.

use camino::Utf8PathBuf;
use pretty_assertions::assert_eq;

use horse64_ast::{builder, Ast};
use horse64_program::Program;
use horse64_resolve::{resolve_project, AstProvider, Builtins, Environment, ImportResolver, ResolverConfig, ResolverError};

fn env() -> Environment {
    Environment::with_project_root(Utf8PathBuf::from("/proj"))
}

struct NoImports;

impl ImportResolver for NoImports {
    fn resolve_import(&self, _from: &str, path: &[String], _library: Option<&str>) -> Result<String, ResolverError> {
        Err(ResolverError::ImportFailed {
            path: path.join("."),
            message: "no imports in this test".to_string(),
        })
    }
}

struct NoProvider;

impl AstProvider for NoProvider {
    fn get_ast(&mut self, file_uri: &str) -> Result<Ast, ResolverError> {
        Err(ResolverError::ImportFailed {
            path: file_uri.to_string(),
            message: "no provider in this test".to_string(),
        })
    }
}

/// Resolves any single-component import `foo` to `file:///proj/foo.h64`.
struct OneImport;

impl ImportResolver for OneImport {
    fn resolve_import(&self, _from: &str, path: &[String], _library: Option<&str>) -> Result<String, ResolverError> {
        match path {
            [name] => Ok(format!("file:///proj/{name}.h64")),
            _ => Err(ResolverError::ImportFailed {
                path: path.join("."),
                message: "unknown import in this test".to_string(),
            }),
        }
    }
}

struct FixedProvider {
    pending: Option<Ast>,
}

impl AstProvider for FixedProvider {
    fn get_ast(&mut self, file_uri: &str) -> Result<Ast, ResolverError> {
        match &self.pending {
            Some(ast) if ast.file_uri == file_uri => Ok(self.pending.take().unwrap()),
            _ => Err(ResolverError::ImportFailed {
                path: file_uri.to_string(),
                message: "unknown file in this test".to_string(),
            }),
        }
    }
}

/// Scenario: a single file declaring `main`, calling the builtin
/// `print`, resolves with no diagnostics and a populated entry point.
#[test]
fn hello_program_resolves_cleanly() {
    let mut ast = Ast::new("file:///proj/main.h64");
    let root_scope = ast.root_scope;

    let main_fn = builder::func_def(&mut ast, 1, Some("main".into()), vec![], false, root_scope, |ast, node, scope| {
        let callee = builder::identifier_ref(ast, 2, "print");
        let call = builder::call(ast, 2, callee, vec![], vec![]);
        let _ = (node, scope);
        vec![call]
    });
    builder::add_top_level(&mut ast, main_fn);

    let mut program = Program::new();
    let config = ResolverConfig::default();
    let mut builtins = Builtins::new();
    builtins.register_func("print", 0);

    let outcome = resolve_project(
        "file:///proj/main.h64",
        ast,
        &mut program,
        &config,
        &env(),
        &builtins,
        &NoImports,
        &mut NoProvider,
    )
    .unwrap();

    assert_eq!(outcome.diagnostics.len(), 0);
    assert!(program.main_func_index.is_some());
}

/// Scenario: a second top-level `main` declared in an imported file is
/// reported as `DuplicateMain`, not silently accepted.
#[test]
fn duplicate_main_across_files_is_reported() {
    let mut root = Ast::new("file:///proj/main.h64");
    let root_scope = root.root_scope;
    let import = builder::import_stmt(&mut root, 1, vec!["other".into()], None);
    builder::add_top_level(&mut root, import);
    let root_main = builder::func_def(&mut root, 2, Some("main".into()), vec![], false, root_scope, |_ast, _n, _s| vec![]);
    builder::add_top_level(&mut root, root_main);

    let mut other = Ast::new("file:///proj/other.h64");
    let other_scope = other.root_scope;
    let other_main = builder::func_def(&mut other, 1, Some("main".into()), vec![], false, other_scope, |_ast, _n, _s| vec![]);
    builder::add_top_level(&mut other, other_main);

    let mut program = Program::new();
    let config = ResolverConfig::default();
    let builtins = Builtins::new();
    let mut provider = FixedProvider { pending: Some(other) };

    let outcome = resolve_project(
        "file:///proj/main.h64",
        root,
        &mut program,
        &config,
        &env(),
        &builtins,
        &OneImport,
        &mut provider,
    )
    .unwrap();

    assert_eq!(outcome.diagnostics.len(), 1, "{:?}", outcome.diagnostics);
    assert_eq!(outcome.diagnostics[0].kind, "DuplicateMain");
    assert!(program.main_func_index.is_some());
}

/// Scenario: a variable read from a nested function is recorded as a
/// closure capture on the function that reads it, not resolved as a
/// local slot in the wrong frame.
#[test]
fn closure_capture_is_recorded() {
    let mut ast = Ast::new("file:///proj/main.h64");
    let root_scope = ast.root_scope;

    let outer = builder::func_def(&mut ast, 1, Some("outer".into()), vec![], false, root_scope, |ast, _node, scope| {
        let x = builder::var_def(ast, 2, "x", false, None);
        builder::define_local(ast, scope, x);

        let inner = builder::func_def(ast, 3, None, vec![], true, scope, |ast, _inner_node, _inner_scope| {
            let x_ref = builder::identifier_ref(ast, 4, "x");
            vec![builder::return_stmt(ast, 4, Some(x_ref))]
        });

        vec![x, inner, builder::return_stmt(ast, 5, None)]
    });
    builder::add_top_level(&mut ast, outer);

    let mut program = Program::new();
    let config = ResolverConfig::default();
    let builtins = Builtins::new();

    let outcome = resolve_project(
        "file:///proj/main.h64",
        ast,
        &mut program,
        &config,
        &env(),
        &builtins,
        &NoImports,
        &mut NoProvider,
    )
    .unwrap();

    assert_eq!(outcome.diagnostics.len(), 0, "{:?}", outcome.diagnostics);
}

/// Scenario: a function declared in an imported file is reachable from
/// the root file through a dotted `module.name` access, resolving to
/// that function's global storage with no diagnostics.
#[test]
fn cross_module_function_reference_resolves() {
    let mut root = Ast::new("file:///proj/main.h64");
    let root_scope = root.root_scope;
    let import = builder::import_stmt(&mut root, 1, vec!["util".into()], None);
    builder::add_top_level(&mut root, import);
    let main_fn = builder::func_def(&mut root, 2, Some("main".into()), vec![], false, root_scope, |ast, _node, _scope| {
        let util_ref = builder::identifier_ref(ast, 3, "util");
        let access = builder::member_by_identifier(ast, 3, util_ref, "helper");
        vec![builder::return_stmt(ast, 3, Some(access))]
    });
    builder::add_top_level(&mut root, main_fn);

    let mut util = Ast::new("file:///proj/util.h64");
    let util_scope = util.root_scope;
    let helper = builder::func_def(&mut util, 1, Some("helper".into()), vec![], false, util_scope, |_ast, _n, _s| vec![]);
    builder::add_top_level(&mut util, helper);

    let mut program = Program::new();
    let config = ResolverConfig::default();
    let builtins = Builtins::new();
    let mut provider = FixedProvider { pending: Some(util) };

    let outcome = resolve_project(
        "file:///proj/main.h64",
        root,
        &mut program,
        &config,
        &env(),
        &builtins,
        &OneImport,
        &mut provider,
    )
    .unwrap();

    assert_eq!(outcome.diagnostics.len(), 0, "{:?}", outcome.diagnostics);
}
