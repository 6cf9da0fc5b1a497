//! Renaming an exported symbol across the project.
//!
//! Renaming is name based rather than scope based: every identifier spelled
//! like the old name in the declaring file is renamed, and in each importing
//! file that binds the symbol without an alias.

use std::path::{Path, PathBuf};

use serde::Serialize;

use super::{OperationResult, Workspace};
use crate::error::{RefactorError, RefactorResult};
use crate::project::ProjectSnapshot;
use crate::references::{ReferenceKind, ReferenceScanner};
use crate::syntax::{DeclarationKind, ExportKind, SourceFile, TextEdit};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenameSymbolReport {
    pub file: String,
    pub old_name: String,
    pub new_name: String,
    pub kind: DeclarationKind,
    /// Files whose text changed, declaring file first.
    pub updated_files: Vec<String>,
    pub occurrences: usize,
}

/// Rename a top-level symbol and its uses in importing files.
///
/// `symbol_kind` narrows the lookup when a file declares the same name
/// twice (a type and a value, for example).
pub fn rename_symbol(
    workspace: &Workspace,
    file: &Path,
    old_name: &str,
    new_name: &str,
    symbol_kind: Option<DeclarationKind>,
) -> OperationResult<RenameSymbolReport> {
    let file = workspace.path(file);
    OperationResult::from_result(
        "rename-symbol",
        run_rename(workspace, &file, old_name, new_name, symbol_kind),
    )
}

fn run_rename(
    workspace: &Workspace,
    path: &Path,
    old_name: &str,
    new_name: &str,
    symbol_kind: Option<DeclarationKind>,
) -> RefactorResult<RenameSymbolReport> {
    if !is_identifier(new_name) {
        return Err(RefactorError::InvalidName(new_name.to_string()));
    }

    let mut project = workspace.snapshot()?;
    let declaring = project.ensure_loaded(path)?;

    let kind = declaring
        .declarations()
        .iter()
        .find(|d| d.name == old_name && symbol_kind.map_or(true, |k| k == d.kind))
        .map(|d| d.kind)
        .ok_or_else(|| {
            RefactorError::NotFound(format!("symbol '{}' in {}", old_name, path.display()))
        })?;

    let plan = plan_rename(&project, path, old_name, new_name)?;

    let mut occurrences = 0;
    let mut updated_files = Vec::new();
    for (file_path, edits) in &plan {
        let Some(file) = project.file_mut(file_path) else {
            continue;
        };
        for edit in edits {
            if file.replace(edit.span.clone(), edit.replacement.clone()) {
                occurrences += 1;
            }
        }
        if file.is_dirty() {
            updated_files.push(file_path.clone());
        }
    }
    project.save_dirty()?;

    tracing::info!(
        file = %path.display(),
        old = old_name,
        new = new_name,
        occurrences,
        "Renamed symbol"
    );
    Ok(RenameSymbolReport {
        file: project.relative_display(path),
        old_name: old_name.to_string(),
        new_name: new_name.to_string(),
        kind,
        updated_files: updated_files
            .iter()
            .map(|p| project.relative_display(p))
            .collect(),
        occurrences,
    })
}

type FileEdits = (PathBuf, Vec<TextEdit>);

fn plan_rename(
    project: &ProjectSnapshot,
    path: &Path,
    old_name: &str,
    new_name: &str,
) -> RefactorResult<Vec<FileEdits>> {
    let declaring = project
        .file(path)
        .ok_or_else(|| RefactorError::not_found_path(path))?;

    let mut plan: Vec<FileEdits> = Vec::new();
    plan.push((path.to_path_buf(), rename_all(declaring, old_name, new_name)));

    if !exported_under_own_name(declaring, old_name) {
        return Ok(plan);
    }

    let references = ReferenceScanner::new(project).find_references(path, true);
    for reference in &references {
        let Some(file) = project.file(&reference.file) else {
            continue;
        };
        let mut edits = Vec::new();

        match reference.kind {
            ReferenceKind::Import => {
                let Some(import) = file.imports().iter().find(|i| i.span == reference.span) else {
                    continue;
                };
                for binding in import.named_bindings.iter().filter(|b| b.name == old_name) {
                    if binding.alias.is_some() {
                        edits.push(TextEdit {
                            span: binding.name_span.clone(),
                            replacement: new_name.to_string(),
                        });
                    } else {
                        edits.extend(rename_all(file, old_name, new_name));
                    }
                }
            }
            ReferenceKind::Export => {
                let Some(export) = file
                    .exports()
                    .iter()
                    .find(|e| e.span.as_ref() == Some(&reference.span))
                else {
                    continue;
                };
                for binding in export.bindings.iter().filter(|b| b.name == old_name) {
                    // Consumers of the re-exporting module keep the old name.
                    let replacement = match binding.alias {
                        Some(_) => new_name.to_string(),
                        None => format!("{} as {}", new_name, old_name),
                    };
                    edits.push(TextEdit {
                        span: binding.name_span.clone(),
                        replacement,
                    });
                }
            }
            ReferenceKind::DynamicImport => {}
        }

        if edits.is_empty() {
            continue;
        }
        match plan.iter_mut().find(|(p, _)| p == &reference.file) {
            Some((_, existing)) => existing.extend(edits),
            None => plan.push((reference.file.clone(), edits)),
        }
    }

    Ok(plan)
}

/// Edits renaming every identifier spelled `old_name` in a file.
fn rename_all(file: &SourceFile, old_name: &str, new_name: &str) -> Vec<TextEdit> {
    file.identifier_occurrences(old_name)
        .into_iter()
        .map(|occurrence| TextEdit {
            replacement: if occurrence.shorthand_property {
                format!("{}: {}", old_name, new_name)
            } else {
                new_name.to_string()
            },
            span: occurrence.span,
        })
        .collect()
}

/// Returns true if importers see the symbol under `name`.
fn exported_under_own_name(file: &SourceFile, name: &str) -> bool {
    let declared = file
        .declarations()
        .iter()
        .any(|d| d.name == name && d.exported && d.kind != DeclarationKind::Default);
    let listed = file.exports().iter().any(|e| {
        e.kind == ExportKind::Named
            && e.bindings
                .iter()
                .any(|b| b.name == name && b.alias.as_deref().map_or(true, |a| a == name))
    });
    declared || listed
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_alphabetic() || first == '_' || first == '$' => {
            chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
        }
        _ => false,
    }
}
