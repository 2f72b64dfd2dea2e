//! Import loader: maps dotted import paths to file
//! URIs and lazily materializes the referenced ASTs, caching by URI so
//! that every distinct source is parsed once.
//!
//! `resolve_import`/`get_ast` are external collaborators; this module only owns the caching and the loop over a
//! file's `import_stmt`s. Production hosts implement [`ImportResolver`]
//! and [`AstProvider`] against their own file system and parser.

use std::collections::HashMap;

use horse64_ast::Ast;

use crate::error::ResolverError;

/// Maps an import statement's `(from_uri, path_components, library)`
/// to the file URI it refers to.
pub trait ImportResolver {
    fn resolve_import(
        &self,
        from_uri: &str,
        path_components: &[String],
        library: Option<&str>,
    ) -> Result<String, ResolverError>;
}

/// Parses (or otherwise produces) the AST for a given file URI

pub trait AstProvider {
    fn get_ast(&mut self, file_uri: &str) -> Result<Ast, ResolverError>;
}

/// Caches materialized ASTs by file URI so a source file referenced by
/// several imports (including import cycles, which are permitted) is
/// only ever parsed once.
#[derive(Default)]
pub struct ImportCache {
    by_uri: HashMap<String, Ast>,
}

impl ImportCache {
    pub fn new() -> Self {
        ImportCache::default()
    }

    /// Returns the cached AST for `file_uri`, loading it via
    /// `provider` on first access.
    pub fn load<'a>(
        &'a mut self,
        provider: &mut dyn AstProvider,
        file_uri: &str,
    ) -> Result<&'a mut Ast, ResolverError> {
        if !self.by_uri.contains_key(file_uri) {
            let ast = provider.get_ast(file_uri)?;
            self.by_uri.insert(file_uri.to_string(), ast);
        }
        Ok(self.by_uri.get_mut(file_uri).expect("just inserted"))
    }

    pub fn get(&self, file_uri: &str) -> Option<&Ast> {
        self.by_uri.get(file_uri)
    }

    pub fn get_mut(&mut self, file_uri: &str) -> Option<&mut Ast> {
        self.by_uri.get_mut(file_uri)
    }

    pub fn uris(&self) -> impl Iterator<Item = &str> {
        self.by_uri.keys().map(String::as_str)
    }

    pub fn contains(&self, file_uri: &str) -> bool {
        self.by_uri.contains_key(file_uri)
    }

    pub fn insert(&mut self, file_uri: impl Into<String>, ast: Ast) {
        self.by_uri.insert(file_uri.into(), ast);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct CountingProvider {
        loads: std::cell::RefCell<u32>,
    }

    impl AstProvider for CountingProvider {
        fn get_ast(&mut self, file_uri: &str) -> Result<Ast, ResolverError> {
            *self.loads.borrow_mut() += 1;
            Ok(Ast::new(file_uri))
        }
    }

    #[test]
    fn loads_each_uri_exactly_once() {
        let mut cache = ImportCache::new();
        let mut provider = CountingProvider {
            loads: std::cell::RefCell::new(0),
        };

        cache.load(&mut provider, "file:///a.h64").unwrap();
        cache.load(&mut provider, "file:///a.h64").unwrap();
        cache.load(&mut provider, "file:///b.h64").unwrap();

        assert_eq!(*provider.loads.borrow(), 2);
    }
}
