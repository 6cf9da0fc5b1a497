//! Moving and renaming files and folders.

use std::collections::HashSet;
use std::fs;
use std::io;
use std::ops::Range;
use std::path::{Path, PathBuf};

use serde::Serialize;

use super::{specifier_sites, OperationResult, Workspace};
use crate::error::{RefactorError, RefactorResult};
use crate::project::ProjectSnapshot;
use crate::references::ReferenceScanner;
use crate::resolve::{is_relative_specifier, relocate, PathRewriter, RewriteRequest};
use crate::syntax::SourceLanguage;

/// One specifier changed by a move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatedReference {
    /// File holding the specifier, at its location after the move.
    pub file: String,
    pub line: usize,
    pub old_specifier: String,
    pub new_specifier: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveReport {
    pub source: String,
    pub destination: String,
    pub is_directory: bool,
    /// Files whose text changed, at their location after the move.
    pub updated_files: Vec<String>,
    pub updated_references: Vec<UpdatedReference>,
}

/// A specifier replacement computed before anything is written.
#[derive(Debug, Clone)]
struct PlannedEdit {
    file: PathBuf,
    span: Range<usize>,
    line: usize,
    old: String,
    new: String,
}

/// Move a file or folder and rewrite every specifier that reaches it.
pub fn move_path(
    workspace: &Workspace,
    source: &Path,
    destination: &Path,
    update_imports: bool,
) -> OperationResult<MoveReport> {
    let source = workspace.path(source);
    let destination = workspace.path(destination);
    OperationResult::from_result(
        "move",
        run_move(workspace, &source, &destination, update_imports),
    )
}

/// Rename a file or folder.
///
/// A bare file name is taken relative to the source's parent directory.
pub fn rename_path(
    workspace: &Workspace,
    source: &Path,
    destination: &Path,
    update_imports: bool,
) -> OperationResult<MoveReport> {
    let source = workspace.path(source);
    let destination = rename_destination(workspace, &source, destination);
    OperationResult::from_result(
        "rename",
        run_move(workspace, &source, &destination, update_imports),
    )
}

fn rename_destination(workspace: &Workspace, source: &Path, destination: &Path) -> PathBuf {
    let bare = !destination.is_absolute() && destination.components().count() == 1;
    match source.parent() {
        Some(parent) if bare => parent.join(destination),
        _ => workspace.path(destination),
    }
}

fn run_move(
    workspace: &Workspace,
    source: &Path,
    destination: &Path,
    update_imports: bool,
) -> RefactorResult<MoveReport> {
    if !source.exists() {
        return Err(RefactorError::not_found_path(source));
    }
    validate_destination(source, destination)?;
    let is_directory = source.is_dir();

    let mut project = workspace.snapshot()?;
    let plan = if update_imports {
        plan_move(&mut project, source, destination, is_directory)?
    } else {
        Vec::new()
    };

    let moved_display = |path: &Path| {
        let after = relocate(path, source, destination).unwrap_or_else(|| path.to_path_buf());
        project.relative_display(&after)
    };
    let updated_references: Vec<UpdatedReference> = plan
        .iter()
        .map(|edit| UpdatedReference {
            file: moved_display(&edit.file),
            line: edit.line,
            old_specifier: edit.old.clone(),
            new_specifier: edit.new.clone(),
        })
        .collect();
    let mut updated_files: Vec<String> = Vec::new();
    for reference in &updated_references {
        if !updated_files.contains(&reference.file) {
            updated_files.push(reference.file.clone());
        }
    }
    let report = MoveReport {
        source: project.relative_display(source),
        destination: project.relative_display(destination),
        is_directory,
        updated_files,
        updated_references,
    };

    for edit in &plan {
        if let Some(file) = project.file_mut(&edit.file) {
            if !file.set_specifier(edit.span.clone(), &edit.new) {
                tracing::warn!(file = %edit.file.display(), "Overlapping edit dropped");
            }
        }
    }
    let written = project.save_dirty()?;
    if let Err(e) = rename_on_disk(source, destination) {
        for path in &written {
            tracing::error!(
                file = %path.display(),
                source = %source.display(),
                destination = %destination.display(),
                "Specifiers rewritten but the move failed; revert this file"
            );
        }
        return Err(e);
    }

    tracing::info!(
        source = %source.display(),
        destination = %destination.display(),
        references = report.updated_references.len(),
        "Moved path"
    );
    Ok(report)
}

fn validate_destination(source: &Path, destination: &Path) -> RefactorResult<()> {
    if destination.exists() && !is_case_only_rename(source, destination) {
        return Err(RefactorError::AlreadyExists(destination.to_path_buf()));
    }
    if destination.starts_with(source) {
        return Err(RefactorError::io(
            destination,
            io::Error::new(
                io::ErrorKind::InvalidInput,
                "destination is inside the source directory",
            ),
        ));
    }
    Ok(())
}

/// `Utils.ts` -> `utils.ts` on a case-insensitive filesystem.
fn is_case_only_rename(source: &Path, destination: &Path) -> bool {
    if source == destination {
        return false;
    }
    match (source.canonicalize(), destination.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

fn plan_move(
    project: &mut ProjectSnapshot,
    source: &Path,
    destination: &Path,
    is_directory: bool,
) -> RefactorResult<Vec<PlannedEdit>> {
    if !is_directory && SourceLanguage::from_path(source).is_some() {
        project.ensure_loaded(source)?;
    }
    let project = &*project;
    let rewriter = PathRewriter::new(project.resolver());
    let scanner = ReferenceScanner::new(project);

    let references = if is_directory {
        scanner.find_references_under(source, true)
    } else {
        scanner.find_references(source, true)
    };

    let mut plan = Vec::new();
    let mut handled: HashSet<(PathBuf, usize)> = HashSet::new();

    let mut rewrite = |from_file: &Path, specifier: &str, span: &Range<usize>, line: usize| {
        let new_from = relocate(from_file, source, destination);
        if !handled.insert((from_file.to_path_buf(), span.start)) {
            return Ok(());
        }
        let request = RewriteRequest {
            from_file,
            new_from_file: new_from.as_deref(),
            old_path: source,
            new_path: destination,
            original_specifier: specifier,
        };

        match rewriter.rewrite(&request) {
            Ok(new) => {
                if new != specifier {
                    plan.push(PlannedEdit {
                        file: from_file.to_path_buf(),
                        span: span.clone(),
                        line,
                        old: specifier.to_string(),
                        new,
                    });
                }
                Ok(())
            }
            Err(RefactorError::Unresolvable { specifier, from }) => {
                tracing::warn!(
                    file = %from.display(),
                    specifier = %specifier,
                    "Leaving unresolvable specifier unchanged"
                );
                Ok(())
            }
            Err(e) => Err(e),
        }
    };

    for reference in &references {
        rewrite(
            &reference.file,
            &reference.text,
            &reference.span,
            reference.location.line,
        )?;
    }

    // Specifiers inside moved files not already reached through a reference.
    for file in project.files() {
        if relocate(file.path(), source, destination).is_none() {
            continue;
        }
        for site in specifier_sites(file) {
            if !is_relative_specifier(site.specifier) {
                continue;
            }
            rewrite(file.path(), site.specifier, &site.span, site.location.line)?;
        }
    }

    Ok(plan)
}

fn rename_on_disk(source: &Path, destination: &Path) -> RefactorResult<()> {
    if let Some(parent) = destination.parent() {
        fs::create_dir_all(parent).map_err(|e| RefactorError::io(parent, e))?;
    }
    fs::rename(source, destination).map_err(|e| RefactorError::io(source, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use tempfile::TempDir;

    fn setup_project(files: &[(&str, &str)]) -> (TempDir, Workspace) {
        let dir = TempDir::new().unwrap();
        for (path, content) in files {
            let full = dir.path().join(path);
            if let Some(parent) = full.parent() {
                fs::create_dir_all(parent).unwrap();
            }
            fs::write(&full, content).unwrap();
        }
        let workspace = Workspace::with_config(dir.path(), Config::default());
        (dir, workspace)
    }

    fn read(workspace: &Workspace, path: &str) -> String {
        fs::read_to_string(workspace.root().join(path)).unwrap()
    }

    #[test]
    fn test_rename_destination_bare_name() {
        let (_dir, workspace) = setup_project(&[("src/old.ts", "")]);
        let source = workspace.root().join("src/old.ts");

        assert_eq!(
            rename_destination(&workspace, &source, Path::new("new.ts")),
            workspace.root().join("src/new.ts")
        );
    }

    #[test]
    fn test_move_updates_importers_and_own_imports() {
        let (_dir, workspace) = setup_project(&[
            ("src/app.ts", "import { add } from './math';\n"),
            ("src/math.ts", "import { log } from './log';\nexport const add = 1;\n"),
            ("src/log.ts", "export const log = 1;\n"),
        ]);

        let result = move_path(
            &workspace,
            &workspace.root().join("src/math.ts"),
            &workspace.root().join("src/lib/math.ts"),
            true,
        );

        assert!(result.success, "{:?}", result.error);
        assert_eq!(read(&workspace, "src/app.ts"), "import { add } from './lib/math';\n");
        assert_eq!(
            read(&workspace, "src/lib/math.ts"),
            "import { log } from '../log';\nexport const add = 1;\n"
        );
        assert!(!workspace.root().join("src/math.ts").exists());

        let report = result.report.unwrap();
        assert_eq!(report.updated_files, vec!["src/app.ts", "src/lib/math.ts"]);
    }

    #[test]
    fn test_move_without_updating_imports() {
        let (_dir, workspace) = setup_project(&[
            ("src/app.ts", "import { add } from './math';\n"),
            ("src/math.ts", "export const add = 1;\n"),
        ]);

        let result = move_path(
            &workspace,
            &workspace.root().join("src/math.ts"),
            &workspace.root().join("lib/math.ts"),
            false,
        );

        assert!(result.success);
        assert_eq!(read(&workspace, "src/app.ts"), "import { add } from './math';\n");
        assert!(workspace.root().join("lib/math.ts").exists());
    }

    #[test]
    fn test_destination_collision_changes_nothing() {
        let (_dir, workspace) = setup_project(&[
            ("src/app.ts", "import { a } from './a';\n"),
            ("src/a.ts", "export const a = 1;\n"),
            ("src/b.ts", "export const b = 1;\n"),
        ]);

        let result = move_path(
            &workspace,
            &workspace.root().join("src/a.ts"),
            &workspace.root().join("src/b.ts"),
            true,
        );

        assert!(!result.success);
        assert!(result.error.unwrap().contains("already exists"));
        assert_eq!(read(&workspace, "src/app.ts"), "import { a } from './a';\n");
        assert!(workspace.root().join("src/a.ts").exists());
    }

    #[test]
    fn test_failed_rename_after_writes_is_reported() {
        let (_dir, workspace) = setup_project(&[
            ("src/app.ts", "import { add } from './math';\n"),
            ("src/math.ts", "export const add = 1;\n"),
            ("src/blocker.ts", ""),
        ]);

        // The destination's parent is a regular file, so creating it fails.
        let result = move_path(
            &workspace,
            &workspace.root().join("src/math.ts"),
            &workspace.root().join("src/blocker.ts/math.ts"),
            true,
        );

        assert!(!result.success);
        assert!(workspace.root().join("src/math.ts").exists());
        // Writes happen before the rename and are not rolled back.
        assert!(read(&workspace, "src/app.ts").contains("./blocker.ts/math"));
    }

    #[test]
    fn test_missing_source() {
        let (_dir, workspace) = setup_project(&[("src/app.ts", "")]);

        let result = move_path(
            &workspace,
            &workspace.root().join("src/ghost.ts"),
            &workspace.root().join("src/spirit.ts"),
            true,
        );

        assert!(!result.success);
        assert!(result.error.unwrap().starts_with("Not found"));
    }

    #[test]
    fn test_move_folder_into_itself_is_rejected() {
        let (_dir, workspace) = setup_project(&[("src/utils/a.ts", "")]);

        let result = move_path(
            &workspace,
            &workspace.root().join("src/utils"),
            &workspace.root().join("src/utils/inner"),
            true,
        );

        assert!(!result.success);
        assert!(workspace.root().join("src/utils/a.ts").exists());
    }

    #[test]
    fn test_rename_keeps_specifier_style() {
        let (_dir, workspace) = setup_project(&[
            ("src/a.ts", "import { x } from './oldStyle';\n"),
            ("src/b.ts", "import { x } from './oldStyle.ts';\n"),
            ("src/oldStyle.ts", "export const x = 1;\n"),
        ]);

        let result = rename_path(
            &workspace,
            &workspace.root().join("src/oldStyle.ts"),
            Path::new("newStyle.ts"),
            true,
        );

        assert!(result.success, "{:?}", result.error);
        assert_eq!(read(&workspace, "src/a.ts"), "import { x } from './newStyle';\n");
        assert_eq!(read(&workspace, "src/b.ts"), "import { x } from './newStyle.ts';\n");
    }
}
