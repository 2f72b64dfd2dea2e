//! Resolver error kinds.

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ResolverError {
    #[error("unknown identifier {name:?}")]
    UnknownIdentifier { name: String },

    #[error("unknown module path for identifier {name:?}")]
    UnknownModulePath { name: String },

    #[error("bare reference to module {module:?}; expected a member access")]
    BareModuleReference { module: String },

    #[error("`{name}` used outside a method body")]
    SelfOutsideMethod { name: String },

    #[error("duplicate `func main` entry point")]
    DuplicateMain,

    #[error("import chain exceeds the configured limit of {limit}")]
    ImportChainTooDeep { limit: u32 },

    #[error("module path {path:?} contains dot segments")]
    ModulePathHasDots { path: String },

    #[error("file {uri:?} is not under the project root")]
    FileNotInProject { uri: String },

    #[error("malformed AST: {0}")]
    MalformedAst(#[from] horse64_ast::AstError),

    /// The resolver-facing view of
    /// [`horse64_program::ProgramError::DuplicateSymbol`]: two
    /// top-level declarations in the same module claim the same name.
    #[error("symbol {name:?} is already declared in module {module:?}")]
    DuplicateGlobalSymbol { name: String, module: String },

    #[error("allocation failure during resolution")]
    OutOfMemory,

    /// Surfaced by an [`crate::import_loader::ImportResolver`]/[`crate::import_loader::AstProvider`]
    /// collaborator; not itself one of §7's resolver kinds, but it has
    /// to become *some* `ResolverError` so `resolve` can report it
    /// through the same diagnostic channel as every other failure.
    #[error("import of {path:?} failed: {message}")]
    ImportFailed { path: String, message: String },
}

impl ResolverError {
    /// The stable tag recorded on [`horse64_ast::Diagnostic::kind`].
    pub fn kind_tag(&self) -> &'static str {
        match self {
            ResolverError::UnknownIdentifier { .. } => "UnknownIdentifier",
            ResolverError::UnknownModulePath { .. } => "UnknownModulePath",
            ResolverError::BareModuleReference { .. } => "BareModuleReference",
            ResolverError::SelfOutsideMethod { .. } => "SelfOutsideMethod",
            ResolverError::DuplicateMain => "DuplicateMain",
            ResolverError::ImportChainTooDeep { .. } => "ImportChainTooDeep",
            ResolverError::ModulePathHasDots { .. } => "ModulePathHasDots",
            ResolverError::FileNotInProject { .. } => "FileNotInProject",
            ResolverError::MalformedAst(_) => "MalformedAST",
            ResolverError::DuplicateGlobalSymbol { .. } => "DuplicateGlobalSymbol",
            ResolverError::OutOfMemory => "OutOfMemory",
            ResolverError::ImportFailed { .. } => "ImportFailed",
        }
    }
}
