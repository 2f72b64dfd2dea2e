//! Module-path derivation. If the AST has no
//! module path, compute one from the file URI relative to its project
//! root: strip the `.h64` extension, normalize, reject paths
//! containing additional dots, and replace directory separators with
//! `.`.

use camino::Utf8Path;

use horse64_ast::pathnorm::normalize;

use crate::error::ResolverError;

const SOURCE_EXTENSION: &str = ".h64";

/// Derives `(module_path, library)` for `file_uri` relative to
/// `project_root`. Deterministic: the same inputs always produce the
/// same dotted path.
pub fn derive_module_path(file_uri: &str, project_root: &Utf8Path) -> Result<String, ResolverError> {
    let relative = strip_project_root(file_uri, project_root)?;
    let normalized = normalize(&relative);

    let without_ext = normalized
    .strip_suffix(SOURCE_EXTENSION)
    .unwrap_or(&normalized);

    let dotted = without_ext.replace('/', ".");

    if dotted.split('.').any(str::is_empty) || dotted.contains("..") {
        return Err(ResolverError::ModulePathHasDots { path: dotted });
    }

    Ok(dotted)
}

fn strip_project_root(file_uri: &str, project_root: &Utf8Path) -> Result<String, ResolverError> {
    let uri = file_uri.strip_prefix("file://").unwrap_or(file_uri);
    let root = project_root.as_str().trim_end_matches('/');

    match uri.strip_prefix(root) {
        Some(rest) => Ok(rest.trim_start_matches('/').to_string()),
        None => Err(ResolverError::FileNotInProject {
                uri: file_uri.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_extension_and_dotifies_separators() {
        let root = Utf8Path::new("/project");
        let path = derive_module_path("file:///project/pkg/mod.h64", root).unwrap();
        assert_eq!(path, "pkg.mod");
    }

    #[test]
    fn rejects_files_outside_the_project_root() {
        let root = Utf8Path::new("/project");
        let err = derive_module_path("file:///elsewhere/mod.h64", root).unwrap_err();
        assert_eq!(
            err,
            ResolverError::FileNotInProject {
                uri: "file:///elsewhere/mod.h64".to_string()
            }
        );
    }

    #[test]
    fn is_deterministic() {
        let root = Utf8Path::new("/project");
        let a = derive_module_path("file:///project/a/b.h64", root).unwrap();
        let b = derive_module_path("file:///project/a/b.h64", root).unwrap();
        assert_eq!(a, b);
    }
}
