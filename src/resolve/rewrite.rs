//! Specifier rewriting for moved files and folders.
//!
//! Given a specifier that currently reaches a file under `old_path`, the
//! rewriter produces the specifier that reaches the same file under
//! `new_path`, keeping the author's style: an explicit extension stays,
//! an extension-less specifier stays extension-less, directory-style
//! specifiers keep naming the directory, and absolute specifiers stay
//! absolute.

use std::path::{Path, PathBuf};

use super::paths::{ends_with_index, has_source_extension, is_index_file, specifier_for, SpecifierStyle};
use super::specifier::{Resolution, ResolveMethod, Resolver};
use crate::error::{RefactorError, RefactorResult};

/// Input for one rewrite.
#[derive(Debug, Clone, Copy)]
pub struct RewriteRequest<'a> {
    /// File containing the specifier, at its current location.
    pub from_file: &'a Path,
    /// Where that file ends up when it moves along with the target.
    pub new_from_file: Option<&'a Path>,
    /// Moved file or directory, before the move.
    pub old_path: &'a Path,
    /// Moved file or directory, after the move.
    pub new_path: &'a Path,
    pub original_specifier: &'a str,
}

/// Computes new specifiers for moved targets.
#[derive(Debug, Clone, Copy)]
pub struct PathRewriter<'r> {
    resolver: &'r Resolver,
}

impl<'r> PathRewriter<'r> {
    pub fn new(resolver: &'r Resolver) -> Self {
        Self { resolver }
    }

    /// Compute the specifier that reaches the moved target.
    ///
    /// External specifiers come back unchanged. A specifier that does not
    /// resolve is an [`RefactorError::Unresolvable`] error.
    pub fn rewrite(&self, request: &RewriteRequest<'_>) -> RefactorResult<String> {
        let original = request.original_specifier;

        let resolved = match self.resolver.resolve(request.from_file, original) {
            Resolution::External => return Ok(original.to_string()),
            Resolution::Resolved(resolved) => resolved,
            Resolution::Unresolved { .. } => {
                return Err(RefactorError::Unresolvable {
                    specifier: original.to_string(),
                    from: request.from_file.to_path_buf(),
                })
            }
        };

        let relocated = relocate(&resolved.path, request.old_path, request.new_path);
        let moved_target = relocated.is_some();
        let new_target = relocated.unwrap_or_else(|| resolved.path.clone());

        let importer = request.new_from_file.unwrap_or(request.from_file);
        let base_dir = importer.parent().unwrap_or_else(|| Path::new("/"));

        let keep_extension = has_source_extension(original)
            && resolved.method != ResolveMethod::IndexFile;

        // The moved directory's own index stands in for the directory.
        let folder_index = moved_target
            && !keep_extension
            && resolved.path.parent() == Some(request.old_path)
            && is_index_file(&resolved.path);

        let style = SpecifierStyle {
            keep_extension,
            keep_index: ends_with_index(original) && !folder_index,
            absolute: original.starts_with('/'),
        };

        let rewritten = specifier_for(base_dir, &new_target, style);
        if rewritten != original {
            tracing::debug!(
                from = %request.from_file.display(),
                old = original,
                new = %rewritten,
                "Rewrote specifier"
            );
        }
        Ok(rewritten)
    }
}

/// Moves `path` from under `old_root` to under `new_root`.
///
/// Returns `None` when `path` is not `old_root` or inside it. Canonical
/// forms are compared too so symlinked roots still match.
pub fn relocate(path: &Path, old_root: &Path, new_root: &Path) -> Option<PathBuf> {
    if let Ok(rest) = path.strip_prefix(old_root) {
        return Some(join_rest(new_root, rest));
    }

    let canonical_path = path.canonicalize().ok()?;
    let canonical_root = old_root.canonicalize().ok()?;
    canonical_path
        .strip_prefix(&canonical_root)
        .ok()
        .map(|rest| join_rest(new_root, rest))
}

fn join_rest(root: &Path, rest: &Path) -> PathBuf {
    if rest.as_os_str().is_empty() {
        root.to_path_buf()
    } else {
        root.join(rest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn setup_project(files: &[&str]) -> TempDir {
        let dir = TempDir::new().unwrap();
        for path in files {
            let full = dir.path().join(path);
            if let Some(parent) = full.parent() {
                fs::create_dir_all(parent).unwrap();
            }
            fs::write(&full, "export const x = 1;\n").unwrap();
        }
        dir
    }

    fn rewrite(
        root: &Path,
        from: &str,
        old: &str,
        new: &str,
        specifier: &str,
    ) -> RefactorResult<String> {
        let resolver = Resolver::new();
        let from = root.join(from);
        let old = root.join(old);
        let new = root.join(new);
        PathRewriter::new(&resolver).rewrite(&RewriteRequest {
            from_file: &from,
            new_from_file: None,
            old_path: &old,
            new_path: &new,
            original_specifier: specifier,
        })
    }

    #[test]
    fn test_file_move_to_other_directory() {
        let dir = setup_project(&["src/app.ts", "src/math.ts"]);
        let spec = rewrite(dir.path(), "src/app.ts", "src/math.ts", "src/lib/math.ts", "./math");
        assert_eq!(spec.unwrap(), "./lib/math");
    }

    #[test]
    fn test_extension_is_preserved_only_when_written() {
        let dir = setup_project(&["src/app.ts", "src/oldStyle.ts"]);

        let bare = rewrite(dir.path(), "src/app.ts", "src/oldStyle.ts", "src/newStyle.ts", "./oldStyle");
        assert_eq!(bare.unwrap(), "./newStyle");

        let with_ext = rewrite(
            dir.path(),
            "src/app.ts",
            "src/oldStyle.ts",
            "src/newStyle.ts",
            "./oldStyle.ts",
        );
        assert_eq!(with_ext.unwrap(), "./newStyle.ts");
    }

    #[test]
    fn test_directory_specifier_stays_directory_style() {
        let dir = setup_project(&["src/app.ts", "src/utils/index.ts"]);

        let spec = rewrite(dir.path(), "src/app.ts", "src/utils", "src/helpers", "./utils");
        assert_eq!(spec.unwrap(), "./helpers");
    }

    #[test]
    fn test_folder_move_collapses_own_index() {
        let dir = setup_project(&["src/app.ts", "src/utils/index.ts"]);

        let spec = rewrite(dir.path(), "src/app.ts", "src/utils", "src/helpers", "./utils/index");
        assert_eq!(spec.unwrap(), "./helpers");
    }

    #[test]
    fn test_index_file_move_keeps_explicit_index() {
        let dir = setup_project(&["src/app.ts", "src/utils/index.ts"]);

        let spec = rewrite(
            dir.path(),
            "src/app.ts",
            "src/utils/index.ts",
            "src/shared/index.ts",
            "./utils/index",
        );
        assert_eq!(spec.unwrap(), "./shared/index");
    }

    #[test]
    fn test_moved_index_file_referenced_as_directory() {
        let dir = setup_project(&["src/app.ts", "src/utils/index.ts"]);

        let spec = rewrite(
            dir.path(),
            "src/app.ts",
            "src/utils/index.ts",
            "src/shared/index.ts",
            "./utils",
        );
        assert_eq!(spec.unwrap(), "./shared");
    }

    #[test]
    fn test_deep_import_into_moved_folder() {
        let dir = setup_project(&["src/index.ts", "src/widgets/WidgetA.ts"]);

        let spec = rewrite(
            dir.path(),
            "src/index.ts",
            "src/widgets",
            "src/components",
            "./widgets/WidgetA",
        );
        assert_eq!(spec.unwrap(), "./components/WidgetA");
    }

    #[test]
    fn test_importer_moves_with_target() {
        let dir = setup_project(&["src/widgets/a.ts", "src/widgets/b.ts"]);
        let resolver = Resolver::new();
        let from = dir.path().join("src/widgets/a.ts");
        let new_from = dir.path().join("lib/components/a.ts");
        let old = dir.path().join("src/widgets");
        let new = dir.path().join("lib/components");

        let spec = PathRewriter::new(&resolver)
            .rewrite(&RewriteRequest {
                from_file: &from,
                new_from_file: Some(&new_from),
                old_path: &old,
                new_path: &new,
                original_specifier: "./b",
            })
            .unwrap();
        assert_eq!(spec, "./b");
    }

    #[test]
    fn test_importer_moves_away_from_unmoved_target() {
        let dir = setup_project(&["src/app.ts", "src/shared.ts"]);
        let resolver = Resolver::new();
        let from = dir.path().join("src/app.ts");
        let new_from = dir.path().join("src/pages/app.ts");

        let spec = PathRewriter::new(&resolver)
            .rewrite(&RewriteRequest {
                from_file: &from,
                new_from_file: Some(&new_from),
                old_path: &from,
                new_path: &new_from,
                original_specifier: "./shared",
            })
            .unwrap();
        assert_eq!(spec, "../shared");
    }

    #[test]
    fn test_absolute_specifier_stays_absolute() {
        let dir = setup_project(&["src/app.ts", "src/math.ts"]);
        let absolute = format!("{}/src/math", dir.path().display());

        let spec = rewrite(dir.path(), "src/app.ts", "src/math.ts", "lib/math.ts", &absolute);
        assert_eq!(spec.unwrap(), format!("{}/lib/math", dir.path().display()));
    }

    #[test]
    fn test_external_specifier_unchanged() {
        let dir = setup_project(&["src/app.ts"]);
        let spec = rewrite(dir.path(), "src/app.ts", "src/a.ts", "src/b.ts", "lodash");
        assert_eq!(spec.unwrap(), "lodash");
    }

    #[test]
    fn test_unresolvable_specifier_is_error() {
        let dir = setup_project(&["src/app.ts"]);
        let spec = rewrite(dir.path(), "src/app.ts", "src/a.ts", "src/b.ts", "./gone");
        assert!(matches!(spec, Err(RefactorError::Unresolvable { .. })));
    }

    #[test]
    fn test_rewrite_then_resolve_round_trip() {
        let dir = setup_project(&["src/app.ts", "src/math.ts"]);
        let from = dir.path().join("src/app.ts");
        let old = dir.path().join("src/math.ts");
        let new = dir.path().join("src/core/math.ts");

        let resolver = Resolver::new();
        let spec = PathRewriter::new(&resolver)
            .rewrite(&RewriteRequest {
                from_file: &from,
                new_from_file: None,
                old_path: &old,
                new_path: &new,
                original_specifier: "./math",
            })
            .unwrap();

        fs::create_dir_all(new.parent().unwrap()).unwrap();
        fs::rename(&old, &new).unwrap();

        assert_eq!(resolver.resolve(&from, &spec).path(), Some(new.as_path()));
    }
}
