//! Ties an [`horse64_program::Program`] and a set of parsed
//! [`horse64_ast::Ast`]s together: derives module paths, loads
//! imports, and runs the global-storage, identifier-resolution, and
//! local-storage passes.
//!
//! The lexer/parser producing the `Ast`s in the first place stay
//! external collaborators, reached through [`import_loader::AstProvider`]
//! and [`import_loader::ImportResolver`].

pub mod builtins;
pub mod config;
pub mod error;
pub mod import_loader;
pub mod modulepath;
pub mod resolver;

pub use builtins::Builtins;
pub use config::{Environment, ResolverConfig, DEFAULT_IMPORT_CHAIN_LIMIT};
pub use error::ResolverError;
pub use import_loader::{AstProvider, ImportCache, ImportResolver};
pub use modulepath::derive_module_path;
pub use resolver::{build_global_storage, resolve_identifiers, resolve_project, assign_local_slots, ResolveOutcome};
