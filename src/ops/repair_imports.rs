//! Repairing broken imports in one file.

use std::path::Path;

use serde::Serialize;

use super::{OperationResult, Workspace};
use crate::error::RefactorResult;
use crate::repair::{ImportRequirement, RepairEngine, RepairOutcome, RepairRequest};
use crate::resolve::is_relative_specifier;
use crate::syntax::{ExportKind, SourceFile};

/// Knobs for [`repair_imports`].
#[derive(Debug, Clone, Copy)]
pub struct RepairOptions {
    /// Report what would change without writing.
    pub dry_run: bool,
    /// Also repair `import type` and `export type` statements.
    pub include_types: bool,
    pub prioritize_closer_paths: bool,
}

impl Default for RepairOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            include_types: true,
            prioritize_closer_paths: true,
        }
    }
}

/// Outcome for one broken specifier.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RepairEntry {
    pub specifier: String,
    pub line: usize,
    #[serde(flatten)]
    pub outcome: RepairOutcome,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RepairReport {
    pub file: String,
    pub dry_run: bool,
    /// Relative specifiers examined.
    pub checked: usize,
    pub repaired: usize,
    /// One entry per specifier that did not resolve.
    pub entries: Vec<RepairEntry>,
}

/// Find and fix relative specifiers in `file` that no longer resolve.
pub fn repair_imports(
    workspace: &Workspace,
    file: &Path,
    options: RepairOptions,
) -> OperationResult<RepairReport> {
    let file = workspace.path(file);
    OperationResult::from_result("repair-imports", run_repair(workspace, &file, options))
}

/// A specifier to check plus what its statement needs from the target.
struct Site {
    specifier: String,
    span: std::ops::Range<usize>,
    line: usize,
    requirement: ImportRequirement,
}

fn collect_sites(file: &SourceFile, include_types: bool) -> Vec<Site> {
    let imports = file
        .imports()
        .iter()
        .filter(|i| include_types || !i.is_type_only)
        .map(|i| Site {
            specifier: i.specifier.clone(),
            span: i.span.clone(),
            line: i.location.line,
            requirement: ImportRequirement::from_import(i),
        });

    let exports = file
        .exports()
        .iter()
        .filter(|e| include_types || !e.is_type_only)
        .filter_map(|e| {
            let requirement = match e.kind {
                ExportKind::Wildcard => ImportRequirement::Unconstrained,
                ExportKind::Reexport | ExportKind::Named => {
                    let names: Vec<String> = e
                        .forwarded_names()
                        .into_iter()
                        .filter(|n| n != "*" && n != "default")
                        .collect();
                    if names.is_empty() {
                        ImportRequirement::Unconstrained
                    } else {
                        ImportRequirement::Named(names)
                    }
                }
            };
            Some(Site {
                specifier: e.specifier.clone()?,
                span: e.span.clone()?,
                line: e.location.line,
                requirement,
            })
        });

    let mut sites: Vec<Site> = imports
        .chain(exports)
        .filter(|s| is_relative_specifier(&s.specifier))
        .collect();
    sites.sort_by_key(|s| s.span.start);
    sites
}

fn run_repair(
    workspace: &Workspace,
    path: &Path,
    options: RepairOptions,
) -> RefactorResult<RepairReport> {
    let mut project = workspace.snapshot()?;
    let sites = collect_sites(project.ensure_loaded(path)?, options.include_types);

    let mut entries = Vec::new();
    let mut fixes = Vec::new();
    {
        let engine = RepairEngine::new(&project);
        for site in &sites {
            let outcome = engine.repair(&RepairRequest {
                from_file: path,
                specifier: &site.specifier,
                requirement: site.requirement.clone(),
                prioritize_closer_paths: options.prioritize_closer_paths,
            })?;

            if matches!(outcome, RepairOutcome::AlreadyValid) {
                continue;
            }
            if let RepairOutcome::Repaired { new_specifier, .. } = &outcome {
                fixes.push((site.span.clone(), new_specifier.clone()));
            }
            entries.push(RepairEntry {
                specifier: site.specifier.clone(),
                line: site.line,
                outcome,
            });
        }
    }

    if !options.dry_run && !fixes.is_empty() {
        if let Some(file) = project.file_mut(path) {
            for (span, specifier) in &fixes {
                file.set_specifier(span.clone(), specifier);
            }
        }
        project.save_dirty()?;
    }

    tracing::info!(
        file = %path.display(),
        checked = sites.len(),
        broken = entries.len(),
        repaired = fixes.len(),
        dry_run = options.dry_run,
        "Repaired imports"
    );
    Ok(RepairReport {
        file: project.relative_display(path),
        dry_run: options.dry_run,
        checked: sites.len(),
        repaired: fixes.len(),
        entries,
    })
}
