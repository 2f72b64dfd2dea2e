//! Facade tying the resolver (`horse64-resolve`) and interpreter
//! (`horse64-vm`) together behind the two entry points a host calls:
//! `parse_and_resolve` and `execute`.
//!
//! There is no lexer/parser or bytecode compiler in this workspace. A host
//! embedding this crate is expected to supply an already-built
//! [`horse64_ast::Ast`] (from its own parser) and to populate each
//! resolved function's body with [`horse64_program::Program::set_func_body`]
//! (from its own bytecode compiler) before calling [`execute`].

use horse64_ast::Ast;
use horse64_program::Program;
use horse64_resolve::{
    AstProvider, Builtins, Environment, ImportResolver, ResolveOutcome, ResolverConfig, ResolverError,
};

/// Runs the whole resolution pipeline over an
/// already-parsed `root_ast`, producing a fresh [`Program`] with every
/// top-level declaration registered and every identifier reference
/// resolved or reported as a diagnostic.
pub fn parse_and_resolve(
    root_uri: &str,
    root_ast: Ast,
    environment: &Environment,
    config: &ResolverConfig,
    builtins: &Builtins,
    import_resolver: &dyn ImportResolver,
    provider: &mut dyn AstProvider,
) -> Result<(Program, ResolveOutcome), ResolverError> {
    let mut program = Program::new();
    let outcome = horse64_resolve::resolve_project(
        root_uri,
        root_ast,
        &mut program,
        config,
        environment,
        builtins,
        import_resolver,
        provider,
    )?;
    Ok((program, outcome))
}

/// Runs a resolved [`Program`] to completion: the
/// thin wrapper [`horse64_vm::execute_program`] is the entry point a
/// host calls after its own codegen step has filled in every
/// function's bytecode.
pub fn execute(program: &Program) -> i32 {
    horse64_vm::execute_program(program)
}

/// An [`ImportResolver`] that rejects every import, for hosts with no
/// module system of their own yet (e.g. a single-file demo program).
pub struct NoImports;

impl ImportResolver for NoImports {
    fn resolve_import(
        &self,
        _from_uri: &str,
        path_components: &[String],
        _library: Option<&str>,
    ) -> Result<String, ResolverError> {
        Err(ResolverError::ImportFailed {
                path: path_components.join("."),
                message: "this host has no import resolver configured".to_string(),
        })
    }
}

/// An [`AstProvider`] paired with [`NoImports`]: since no import ever
/// resolves to a file URI, this is never actually called, but a
/// single-file host still needs a concrete type to satisfy the
/// `resolve_project` signature.
pub struct NoProvider;

impl AstProvider for NoProvider {
    fn get_ast(&mut self, file_uri: &str) -> Result<Ast, ResolverError> {
        Err(ResolverError::ImportFailed {
                path: file_uri.to_string(),
                message: "this host has no AST provider configured".to_string(),
        })
    }
}
