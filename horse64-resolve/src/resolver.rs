//! The resolver driver itself: module-path derivation, import
//! preloading, the global-storage pass, identifier resolution, and
//! local-storage slot assignment.
//!
//! Cross-module lookups never need to read another file's AST: by the
//! time identifier resolution for any one file runs, every file's
//! top-level declarations have already been registered into the
//! shared [`Program`], so a dotted `a.b` access resolves purely
//! through `Program::resolve_module_*`.

use std::collections::HashMap;

use horse64_ast::{Ast, AstStage, ExprId, ExprKind, Name, ScopeId, Storage};
use horse64_program::{ClassId, Program, ProgramError};

use crate::builtins::Builtins;
use crate::config::{Environment, ResolverConfig};
use crate::error::ResolverError;
use crate::import_loader::{AstProvider, ImportCache, ImportResolver};
use crate::modulepath::derive_module_path;

/// Everything a successful (or partially successful --- diagnostics
/// are recoverable) resolution run produced.
#[derive(Debug, Default)]
pub struct ResolveOutcome {
    pub diagnostics: Vec<horse64_ast::Diagnostic>,
}

/// Runs the whole pipeline over `root_uri` and every file it
/// transitively imports: module-path derivation, import preloading,
/// global-storage registration, identifier resolution, and
/// local-storage slot assignment.
pub fn resolve_project(
    root_uri: &str,
    root_ast: Ast,
    program: &mut Program,
    config: &ResolverConfig,
    environment: &Environment,
    builtins: &Builtins,
    import_resolver: &dyn ImportResolver,
    provider: &mut dyn AstProvider,
) -> Result<ResolveOutcome, ResolverError> {
    let mut cache = ImportCache::new();
    cache.insert(root_uri, root_ast);
    ensure_module_path(&mut cache, root_uri, environment)?;
    preload_imports(&mut cache, root_uri, 0, config, environment, import_resolver, provider)?;

    let uris: Vec<String> = cache.uris().map(str::to_string).collect();

    build_global_storage(cache.get_mut(root_uri).expect("root ast was just inserted"), program, true);
    for uri in &uris {
        if uri != root_uri {
            build_global_storage(cache.get_mut(uri).expect("uri came from cache.uris()"), program, false);
        }
    }

    for uri in &uris {
        resolve_identifiers(
            cache.get_mut(uri).expect("uri came from cache.uris()"),
            program,
            builtins,
            config,
        );
    }

    for uri in &uris {
        assign_local_slots(cache.get_mut(uri).expect("uri came from cache.uris()"));
    }

    let mut diagnostics = Vec::new();
    for uri in &uris {
        let ast = cache.get_mut(uri).expect("uri came from cache.uris()");
        diagnostics.append(&mut ast.messages);
    }

    log::info!("resolved {} file(s), {} diagnostic(s)", uris.len(), diagnostics.len());

    Ok(ResolveOutcome { diagnostics })
}

fn ensure_module_path(cache: &mut ImportCache, uri: &str, environment: &Environment) -> Result<(), ResolverError> {
    let ast = cache.get_mut(uri).expect("uri must already be cached");
    if ast.module_path.is_none() {
        let path = derive_module_path(uri, &environment.project_root)?;
        log::debug!("derived module path {:?} for {:?}", path, uri);
        ast.module_path = Some(path);
    }
    Ok(())
}

/// The `(path_components, library, position)` of every top-level
/// `import` statement in `ast`.
fn collect_top_level_imports(ast: &Ast) -> Vec<(Vec<String>, Option<String>, ExprId)> {
    let body = match &ast.expr(ast.root_expr).kind {
        ExprKind::File { body } => body.clone(),
        _ => unreachable!("root_expr is always a File node"),
    };
    body.into_iter()
    .filter_map(|id| match &ast.expr(id).kind {
            ExprKind::ImportStmt { path_components, library } => Some((
                    path_components.iter().map(|n| n.to_string()).collect(),
                    library.as_ref().map(|n| n.to_string()),
                    id,
            )),
            _ => None,
    })
    .collect()
}

#[allow(clippy::too_many_arguments)]
fn preload_imports(
    cache: &mut ImportCache,
    uri: &str,
    depth: u32,
    config: &ResolverConfig,
    environment: &Environment,
    import_resolver: &dyn ImportResolver,
    provider: &mut dyn AstProvider,
) -> Result<(), ResolverError> {
    if depth > config.import_chain_limit {
        return Err(ResolverError::ImportChainTooDeep { limit: config.import_chain_limit });
    }

    let imports = collect_top_level_imports(cache.get(uri).expect("uri must already be cached"));

    for (path_components, library, stmt) in imports {
        match import_resolver.resolve_import(uri, &path_components, library.as_deref()) {
            Ok(target_uri) => {
                if !cache.contains(&target_uri) {
                    let ast = provider.get_ast(&target_uri)?;
                    cache.insert(target_uri.clone(), ast);
                    ensure_module_path(cache, &target_uri, environment)?;
                    preload_imports(cache, &target_uri, depth + 1, config, environment, import_resolver, provider)?;
                }
            }
            Err(err) => {
                let pos = cache.get(uri).expect("uri must already be cached").pos_of(stmt);
                let ast = cache.get_mut(uri).expect("uri must already be cached");
                ast.report("ImportFailed", pos, err.to_string());
            }
        }
    }

    Ok(())
}

fn report_program_error(ast: &mut Ast, at: ExprId, err: ProgramError, module_path: &str) {
    let pos = ast.pos_of(at);
    match err {
        ProgramError::DuplicateSymbol { name } => ast.report(
            "DuplicateGlobalSymbol",
            pos,
            format!("{:?} is already declared in module {:?}", name, module_path),
        ),
        ProgramError::DuplicateClassMember { name,.. } => {
            ast.report("DuplicateClassMember", pos, format!("duplicate member {:?}", name))
        }
        ProgramError::TooManyMethods { .. } => {
            ast.report("TooManyMethods", pos, "class exceeds the maximum method count".to_string())
        }
        ProgramError::OutOfMemory => ast.report("OutOfMemory", pos, "allocation failure".to_string()),
    }
}

/// Global-storage pass: registers every
/// top-level `var_def`/`func_def`/`class_def` (and class members) into
/// `program`, annotating each declaration's own expression with its
/// global [`Storage`]. Pre-interns every `call` node's keyword-argument
/// names anywhere in the file, not just at the top level.
pub fn build_global_storage(ast: &mut Ast, program: &mut Program, extract_main: bool) {
    if ast.stage >= AstStage::GlobalStorageBuilt {
        return;
    }

    let file_uri = program.intern_file_uri(&ast.file_uri);
    let module_path = ast.module_path.clone().unwrap_or_default();
    let library = ast.library.clone();

    let top_level = match &ast.expr(ast.root_expr).kind {
        ExprKind::File { body } => body.clone(),
        _ => unreachable!("root_expr is always a File node"),
    };

    // Classes first, so methods below can see an already-assigned
    // class_id, and so base-class resolution (next) has every
    // same-module class available regardless of declaration order.
    for &stmt in &top_level {
        if let ExprKind::ClassDef { name,.. } = &ast.expr(stmt).kind {
            let name = name.to_string();
            match program.add_class(&name, file_uri, &module_path, library.as_deref()) {
                Ok(class_id) => ast.expr_mut(stmt).storage = Some(Storage::global_class(class_id.0)),
                Err(err) => report_program_error(ast, stmt, err, &module_path),
            }
        }
    }

    for &stmt in &top_level {
        let (class_id, base_name) = match &ast.expr(stmt).kind {
            ExprKind::ClassDef { base: Some(base_name),.. } => {
                let class_id = match ast.expr(stmt).storage {
                    Some(s) => match s.reference {
                        horse64_ast::StorageRef::GlobalClass(id) => ClassId(id),
                        _ => continue,
                    },
                    None => continue,
                };
                (class_id, base_name.to_string())
            }
            _ => continue,
        };
        match program.resolve_module_class(&module_path, &base_name) {
            Some(base_id) => program.set_class_base(class_id, base_id),
            None => ast.report(
                "UnknownIdentifier",
                ast.pos_of(stmt),
                format!("unknown base class {:?}", base_name),
            ),
        }
    }

    // One class can have at most one synthetic "$varinit" initializer
    // function, shared by every initialized member var on that class.
    let mut varinit_for_class: HashMap<ClassId, ()> = HashMap::new();

    for &stmt in &top_level {
        match ast.expr(stmt).kind.clone() {
            ExprKind::VarDef { name, is_const,.. } => {
                let name = name.to_string();
                match program.add_global_var(&name, is_const, file_uri, &module_path, library.as_deref()) {
                    Ok(var_id) => ast.expr_mut(stmt).storage = Some(Storage::global_var(var_id.0)),
                    Err(err) => report_program_error(ast, stmt, err, &module_path),
                }
            }
            ExprKind::FuncDef { name: Some(name), params, multi_arg_last,.. } => {
                let name = name.to_string();
                match program.register_function(
                    &name,
                    file_uri,
                    params.len() as u32,
                    &[],
                    multi_arg_last,
                    &module_path,
                    library.as_deref(),
                    None,
                    None,
                ) {
                    Ok(func_id) => {
                        ast.expr_mut(stmt).storage = Some(Storage::global_func(func_id.0));
                        // A second top-level `main`, in the root file or
                        // any imported file, is always a conflict with
                        // the one already registered --- only whether
                        // *this* file's `main` becomes the program
                        // entry point depends on `extract_main`.
                        if name == "main" {
                            if program.main_func_index.is_some() {
                                ast.report(
                                    "DuplicateMain",
                                    ast.pos_of(stmt),
                                    "a `main` function is already registered".to_string(),
                                );
                            } else if extract_main {
                                program.main_func_index = Some(func_id);
                            }
                        }
                    }
                    Err(err) => report_program_error(ast, stmt, err, &module_path),
                }
            }
            ExprKind::ClassDef { body,.. } => {
                let class_id = match ast.expr(stmt).storage {
                    Some(s) => match s.reference {
                        horse64_ast::StorageRef::GlobalClass(id) => ClassId(id),
                        _ => continue,
                    },
                    None => continue,
                };
                for &member in &body {
                    match ast.expr(member).kind.clone() {
                        ExprKind::VarDef { name, initializer,.. } => {
                            let name = name.to_string();
                            if let Err(err) = program.register_class_member(class_id, &name, None) {
                                report_program_error(ast, member, err, &module_path);
                            }
                            if initializer.is_some() && !varinit_for_class.contains_key(&class_id) {
                                if program
                                .register_function(
                                    "$varinit",
                                    file_uri,
                                    0,
                                    &[],
                                    false,
                                    &module_path,
                                    library.as_deref(),
                                    Some(class_id),
                                    None,
                                )
                                .is_ok()
                                {
                                    varinit_for_class.insert(class_id, ());
                                }
                            }
                        }
                        ExprKind::FuncDef { name: Some(name), params, multi_arg_last,.. } => {
                            let name = name.to_string();
                            if let Err(err) = program.register_function(
                                &name,
                                file_uri,
                                params.len() as u32,
                                &[],
                                multi_arg_last,
                                &module_path,
                                library.as_deref(),
                                Some(class_id),
                                None,
                            ) {
                                report_program_error(ast, member, err, &module_path);
                            }
                        }
                        _ => {}
                    }
                }
            }
            _ => {}
        }
    }

    for idx in 0..ast.exprs.len() {
        let id = ExprId(idx as u32);
        if let ExprKind::Call { kwargs,.. } = &ast.expr(id).kind {
            let names: Vec<String> = kwargs.iter().map(|(n, _)| n.to_string()).collect();
            for name in names {
                program.intern_member_name(&name);
            }
        }
    }

    ast.stage = AstStage::GlobalStorageBuilt;
}

fn is_member_role(ast: &Ast, id: ExprId) -> bool {
    matches!(
        ast.expr(id).parent.map(|p| &ast.expr(p).kind),
        Some(ExprKind::MemberByIdentifier { member,.. }) if *member == id
    )
}

/// Nearest enclosing `func_def`/inline-func ancestor of `id`, or `None`
/// if `id` is not nested in any function (e.g. it sits directly at
/// file or class-member level).
fn enclosing_func(ast: &Ast, id: ExprId) -> Option<ExprId> {
    let mut cur = ast.expr(id).parent;
    while let Some(p) = cur {
        if matches!(ast.expr(p).kind, ExprKind::FuncDef { .. }) {
            return Some(p);
        }
        cur = ast.expr(p).parent;
    }
    None
}

/// The function a given declaration's binding belongs to. Usually this
/// is just `enclosing_func(declaration_expr)`, except when
/// `declaration_expr` is itself a `func_def` and `def_scope` is that
/// very function's own scope --- that combination means the
/// declaration is one of the function's *parameters*, which is owned
/// by the function itself rather than by whatever encloses it.
fn decl_owning_func(ast: &Ast, declaration_expr: ExprId, def_scope: ScopeId) -> Option<ExprId> {
    if matches!(ast.expr(declaration_expr).kind, ExprKind::FuncDef { .. })
    && ast.expr(declaration_expr).owns_scope == Some(def_scope)
    {
        return Some(declaration_expr);
    }
    enclosing_func(ast, declaration_expr)
}

/// `self`/`base` are only valid directly inside a method body: the
/// nearest enclosing function must itself be a class member (its
/// immediate parent is the `class_def` it belongs to).
fn enclosing_method(ast: &Ast, id: ExprId) -> Option<ExprId> {
    let func = enclosing_func(ast, id)?;
    match ast.expr(func).parent {
        Some(p) if matches!(ast.expr(p).kind, ExprKind::ClassDef { .. }) => Some(func),
        _ => None,
    }
}

/// Identifier-resolution pass.
pub fn resolve_identifiers(ast: &mut Ast, program: &mut Program, builtins: &Builtins, config: &ResolverConfig) {
    if ast.stage >= AstStage::IdentifiersResolved {
        return;
    }

    let ids: Vec<ExprId> = (0..ast.exprs.len() as u32).map(ExprId).collect();

    for id in ids {
        if !matches!(ast.expr(id).kind, ExprKind::IdentifierRef { .. }) {
            continue;
        }

        if is_member_role(ast, id) {
            let name = ast.expr(id).identifier_name().unwrap().to_string();
            program.intern_member_name(&name);
            continue;
        }

        let name = ast.expr(id).identifier_name().unwrap().to_string();

        if name == "self" || name == "base" {
            if enclosing_method(ast, id).is_none() {
                ast.report(
                    "SelfOutsideMethod",
                    ast.pos_of(id),
                    format!("`{}` used outside a method body", name),
                );
            }
            continue;
        }

        let scope = match ast.get_scope(id) {
            Ok(s) => s,
            Err(_) => {
                ast.report("MalformedAST", ast.pos_of(id), "expression has no enclosing scope".to_string());
                continue;
            }
        };

        match ast.query(scope, &name, true) {
            Some((def_scope, def_idx)) => {
                resolve_found_reference(ast, program, id, def_scope, def_idx, &name, config);
            }
            None => match builtins.lookup(&name) {
                Some(builtin_ref) => {
                    ast.expr_mut(id).storage = Some(Storage::builtin(builtin_ref));
                    ast.expr_mut(id).resolved_to_builtin = true;
                }
                None => {
                    ast.report("UnknownIdentifier", ast.pos_of(id), format!("unknown identifier {:?}", name));
                }
            },
        }
    }

    ast.stage = AstStage::IdentifiersResolved;
}

fn resolve_found_reference(
    ast: &mut Ast,
    program: &mut Program,
    ref_id: ExprId,
    def_scope: ScopeId,
    def_idx: usize,
    name: &str,
    config: &ResolverConfig,
) {
    let declaration_expr = ast.scope(def_scope).definitions[def_idx].declaration_expr;

    if matches!(ast.expr(declaration_expr).kind, ExprKind::ImportStmt { .. }) {
        resolve_module_reference(ast, program, ref_id, def_scope, def_idx, name, config);
        return;
    }

    if let Some(storage) = ast.expr(declaration_expr).storage {
        // A global var/func/class: copy its already-assigned storage
        // onto the reference verbatim.
        ast.expr_mut(ref_id).storage = Some(storage);
        return;
    }

    let ref_func = enclosing_func(ast, ref_id);
    let decl_func = decl_owning_func(ast, declaration_expr, def_scope);

    if ref_func != decl_func {
        ast.scope_mut(def_scope).definitions[def_idx].closure_bound = true;
        let capture = (def_scope, def_idx as u32);
        let mut cur = ref_func;
        while let Some(f) = cur {
            if Some(f) == decl_func {
                break;
            }
            if let ExprKind::FuncDef { closure_captures,.. } = &mut ast.expr_mut(f).kind {
                if !closure_captures.contains(&capture) {
                    closure_captures.push(capture);
                }
            }
            cur = enclosing_func(ast, f);
        }
    }

    ast.expr_mut(ref_id).storage = Some(Storage::local(def_scope, def_idx as u32));
}

/// Reconstructs the dotted access chain starting at `start` (an
/// `identifier_ref` bound to an import prefix), following consecutive
/// `target.member` steps upward, and matches it against every
/// `import_stmt` sharing that binding.
fn resolve_module_reference(
    ast: &mut Ast,
    program: &mut Program,
    ref_id: ExprId,
    def_scope: ScopeId,
    def_idx: usize,
    prefix_name: &str,
    config: &ResolverConfig,
) {
    let mut chain_names = vec![prefix_name.to_string()];
    let mut chain_tail = ref_id;
    loop {
        if chain_names.len() as u32 > config.import_chain_limit {
            ast.report(
                "ImportChainTooDeep",
                ast.pos_of(ref_id),
                format!("import access chain exceeds the limit of {} names", config.import_chain_limit),
            );
            return;
        }
        match ast.expr(chain_tail).parent {
            Some(p) => match &ast.expr(p).kind {
                ExprKind::MemberByIdentifier { target, member } if *target == chain_tail => {
                    chain_names.push(ast.expr(*member).identifier_name().unwrap().to_string());
                    chain_tail = p;
                }
                _ => break,
            },
            None => break,
        }
    }

    let definition = &ast.scope(def_scope).definitions[def_idx];
    let mut import_stmts = vec![definition.declaration_expr];
    import_stmts.extend(definition.additional_decls.iter().copied());

    for stmt in import_stmts {
        let path_components: Vec<String> = match &ast.expr(stmt).kind {
            ExprKind::ImportStmt { path_components,.. } => {
                path_components.iter().map(|n| n.to_string()).collect()
            }
            _ => continue,
        };

        if chain_names.len() < path_components.len() || chain_names[..path_components.len()] != path_components[..] {
            continue;
        }

        let module_path = path_components.join(".");

        if chain_names.len() != path_components.len() + 1 {
            ast.report(
                "BareModuleReference",
                ast.pos_of(ref_id),
                format!("bare reference to module {:?}; expected a member access", module_path),
            );
            return;
        }

        let item_name = &chain_names[path_components.len()];
        let storage = program
        .resolve_module_func(&module_path, item_name)
        .map(|id| Storage::global_func(id.0))
        .or_else(|| program.resolve_module_class(&module_path, item_name).map(|id| Storage::global_class(id.0)))
        .or_else(|| program.resolve_module_var(&module_path, item_name).map(|id| Storage::global_var(id.0)));

        match storage {
            Some(storage) => {
                ast.expr_mut(chain_tail).storage = Some(storage);
            }
            None => ast.report(
                "UnknownIdentifier",
                ast.pos_of(ref_id),
                format!("module {:?} has no member {:?}", module_path, item_name),
            ),
        }
        return;
    }

    ast.report(
        "UnknownModulePath",
        ast.pos_of(ref_id),
        format!("unknown module path for identifier {:?}", prefix_name),
    );
}

/// Local-storage assignment: assigns
/// contiguous slot indices to every function's parameters, locals
/// (including those of nested `for` loops, which share the enclosing
/// function's frame) and closure captures. Runs once per file, after
/// every reference in it has been resolved.
pub fn assign_local_slots(ast: &mut Ast) {
    let mut scope_owner: HashMap<ScopeId, ExprId> = HashMap::new();
    for (idx, expr) in ast.exprs.iter().enumerate() {
        if let Some(scope) = expr.owns_scope {
            scope_owner.insert(scope, ExprId(idx as u32));
        }
    }

    let func_ids: Vec<ExprId> = (0..ast.exprs.len() as u32)
    .map(ExprId)
    .filter(|&id| matches!(ast.expr(id).kind, ExprKind::FuncDef { .. }))
    .collect();

    for func_id in func_ids {
        let mut slots: Vec<(ScopeId, u32)> = Vec::new();

        let fn_scope = ast.expr(func_id).owns_scope.expect("func_def always owns a scope");
        let mut frontier = vec![fn_scope];
        while let Some(scope_id) = frontier.pop() {
            for idx in 0..ast.scope(scope_id).definitions.len() {
                slots.push((scope_id, idx as u32));
            }
            for child_idx in 0..ast.scopes.len() {
                let child_id = ScopeId(child_idx as u32);
                if ast.scope(child_id).parent != Some(scope_id) {
                    continue;
                }
                let owned_by_nested_func = matches!(
                    scope_owner.get(&child_id).map(|e| &ast.expr(*e).kind),
                    Some(ExprKind::FuncDef { .. })
                );
                if !owned_by_nested_func {
                    frontier.push(child_id);
                }
            }
        }

        if let ExprKind::FuncDef { closure_captures,.. } = &ast.expr(func_id).kind {
            for &capture in closure_captures {
                if !slots.contains(&capture) {
                    slots.push(capture);
                }
            }
        }

        for (slot_index, (scope_id, def_idx)) in slots.into_iter().enumerate() {
            ast.scope_mut(scope_id).definitions[def_idx as usize].local_slot = Some(slot_index as u32);
        }
    }
}

#[cfg(test)]
mod tests {
    use camino::Utf8PathBuf;
    use horse64_ast::builder;

    use super::*;

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

    fn env() -> Environment {
        Environment::with_project_root(Utf8PathBuf::from("/proj"))
    }

    #[test]
    fn resolves_a_global_reference_to_its_own_function() {
        let mut ast = Ast::new("file:///proj/main.h64");
        let root_scope = ast.root_scope;

        let main_fn = builder::func_def(&mut ast, 1, Some("main".into()), vec![], false, root_scope, |ast, _node, scope| {
                let ident = builder::identifier_ref(ast, 2, "main");
                vec![builder::return_stmt(ast, 2, Some(ident))]
        });
        builder::add_top_level(&mut ast, main_fn);

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

        assert!(outcome.diagnostics.is_empty(), "{:?}", outcome.diagnostics);
        assert!(program.main_func_index.is_some());
    }

    #[test]
    fn unknown_identifier_is_reported() {
        let mut ast = Ast::new("file:///proj/main.h64");
        let root_scope = ast.root_scope;

        let main_fn = builder::func_def(&mut ast, 1, Some("main".into()), vec![], false, root_scope, |ast, _node, _scope| {
                let ident = builder::identifier_ref(ast, 2, "mystery");
                vec![builder::return_stmt(ast, 2, Some(ident))]
        });
        builder::add_top_level(&mut ast, main_fn);

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

        assert_eq!(outcome.diagnostics.len(), 1);
        assert_eq!(outcome.diagnostics[0].kind, "UnknownIdentifier");
    }

    #[test]
    fn builtin_fallback_resolves_print() {
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

        assert!(outcome.diagnostics.is_empty(), "{:?}", outcome.diagnostics);
    }

    #[test]
    fn self_outside_method_is_reported() {
        let mut ast = Ast::new("file:///proj/main.h64");
        let root_scope = ast.root_scope;

        let main_fn = builder::func_def(&mut ast, 1, Some("main".into()), vec![], false, root_scope, |ast, _node, _scope| {
                let self_ref = builder::identifier_ref(ast, 2, "self");
                vec![builder::return_stmt(ast, 2, Some(self_ref))]
        });
        builder::add_top_level(&mut ast, main_fn);

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

        assert_eq!(outcome.diagnostics.len(), 1);
        assert_eq!(outcome.diagnostics[0].kind, "SelfOutsideMethod");
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

    /// Hands back a single fixed AST for whatever URI it is constructed
    /// with, standing in for a real parser.
    struct FixedProvider {
        other: Option<Ast>,
    }

    impl AstProvider for FixedProvider {
        fn get_ast(&mut self, file_uri: &str) -> Result<Ast, ResolverError> {
            match &self.other {
                Some(ast) if ast.file_uri == file_uri => Ok(self.other.take().unwrap()),
                _ => Err(ResolverError::ImportFailed {
                        path: file_uri.to_string(),
                        message: "unknown file in this test".to_string(),
                }),
            }
        }
    }

    #[test]
    fn duplicate_main_across_files_is_reported_through_resolve_project() {
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
        let mut provider = FixedProvider { other: Some(other) };

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

    #[test]
    fn dotted_access_chain_past_the_configured_limit_is_reported() {
        let mut ast = Ast::new("file:///proj/main.h64");
        let root_scope = ast.root_scope;

        let import = builder::import_stmt(&mut ast, 1, vec!["mod".into()], None);
        builder::add_top_level(&mut ast, import);

        let main_fn = builder::func_def(&mut ast, 2, Some("main".into()), vec![], false, root_scope, |ast, _node, _scope| {
                let mut chain = builder::identifier_ref(ast, 3, "mod");
                for member in ["a", "b", "c", "d", "e"] {
                    chain = builder::member_by_identifier(ast, 3, chain, member);
                }
                vec![builder::return_stmt(ast, 3, Some(chain))]
        });
        builder::add_top_level(&mut ast, main_fn);

        let mut program = Program::new();
        let config = ResolverConfig { import_chain_limit: 2 };
        let builtins = Builtins::new();
        let mut provider = FixedProvider {
            other: Some(Ast::new("file:///proj/mod.h64")),
        };

        let outcome = resolve_project(
            "file:///proj/main.h64",
            ast,
            &mut program,
            &config,
            &env(),
            &builtins,
            &OneImport,
            &mut provider,
        )
        .unwrap();

        assert_eq!(outcome.diagnostics.len(), 1, "{:?}", outcome.diagnostics);
        assert_eq!(outcome.diagnostics[0].kind, "ImportChainTooDeep");
    }

    #[test]
    fn closure_capture_is_recorded_on_the_inner_function() {
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

        assert!(outcome.diagnostics.is_empty(), "{:?}", outcome.diagnostics);
    }
}
