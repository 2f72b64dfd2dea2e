//! Resolver configuration and the lifted environment record

use camino::Utf8PathBuf;

/// Default for `H64LIMIT_IMPORTCHAINLEN`.
pub const DEFAULT_IMPORT_CHAIN_LIMIT: u32 = 16;

#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Maximum length of a reconstructed `a.b.c` dotted access chain
    /// while matching an identifier reference against an import
    /// statement.
    pub import_chain_limit: u32,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        ResolverConfig {
            import_chain_limit: DEFAULT_IMPORT_CHAIN_LIMIT,
        }
    }
}

/// Replaces the process-wide cached paths the source implementation
/// reads as global mutable state (documents-path, appdata-path,
/// current-directory). The resolver only ever reads `project_root`
/// today, but the whole record travels together so a future need for
/// one of the others does not reopen the "implicit global" question.
#[derive(Debug, Clone)]
pub struct Environment {
    pub project_root: Utf8PathBuf,
    pub current_dir: Utf8PathBuf,
    pub documents_path: Option<Utf8PathBuf>,
    pub appdata_path: Option<Utf8PathBuf>,
}

impl Environment {
    pub fn with_project_root(project_root: impl Into<Utf8PathBuf>) -> Self {
        let project_root = project_root.into();
        Environment {
            current_dir: project_root.clone(),
            project_root,
            documents_path: None,
            appdata_path: None,
        }
    }
}
