//! Dependency queries for a single file.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::Serialize;

use super::{specifier_sites, OperationResult, Workspace};
use crate::error::{RefactorError, RefactorResult};
use crate::references::{Reference, ReferenceKind, ReferenceScanner};
use crate::resolve::Resolution;
use crate::syntax::SourceLanguage;

/// Which side of a file's dependencies to report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// What the file depends on.
    Imports,
    /// Who references the file.
    Importers,
    #[default]
    Both,
}

impl Direction {
    fn includes_imports(self) -> bool {
        matches!(self, Direction::Imports | Direction::Both)
    }

    fn includes_importers(self) -> bool {
        matches!(self, Direction::Importers | Direction::Both)
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "imports" | "dependencies" => Ok(Direction::Imports),
            "importers" | "dependents" => Ok(Direction::Importers),
            "both" => Ok(Direction::Both),
            _ => Err(format!(
                "Unknown direction: '{}'. Valid directions: imports, importers, both",
                s
            )),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Imports => write!(f, "imports"),
            Direction::Importers => write!(f, "importers"),
            Direction::Both => write!(f, "both"),
        }
    }
}

/// A module the analyzed file depends on.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyEntry {
    pub specifier: String,
    /// Root-relative path of the resolved file.
    pub path: String,
    pub line: usize,
    pub is_type_only: bool,
}

/// A statement in another file that references the analyzed file.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImporterEntry {
    pub file: String,
    pub line: usize,
    pub specifier: String,
    pub kind: ReferenceKind,
    pub imported_names: Vec<String>,
    pub is_type_only: bool,
}

impl ImporterEntry {
    fn from_reference(reference: &Reference, display: String) -> Self {
        Self {
            file: display,
            line: reference.location.line,
            specifier: reference.text.clone(),
            kind: reference.kind,
            imported_names: reference.imported_names.clone(),
            is_type_only: reference.is_type_only,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyReport {
    pub file: String,
    pub direction: Direction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub imports: Option<Vec<DependencyEntry>>,
    /// Package specifiers, deduplicated in first-seen order.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external: Option<Vec<String>>,
    /// Relative specifiers that resolve to nothing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unresolved: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub importers: Option<Vec<ImporterEntry>>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletableReport {
    pub file: String,
    pub is_deletable: bool,
    pub references: Vec<ImporterEntry>,
}

/// Report what `file` imports, who imports it, or both.
pub fn analyze_dependencies(
    workspace: &Workspace,
    file: &Path,
    direction: Direction,
    include_types: bool,
) -> OperationResult<DependencyReport> {
    let file = workspace.path(file);
    OperationResult::from_result(
        "analyze-dependencies",
        run_analyze(workspace, &file, direction, include_types),
    )
}

/// Returns a deletable verdict: no import, re-export or dynamic import
/// anywhere in the project reaches `file`.
pub fn check_deletable(
    workspace: &Workspace,
    file: &Path,
    include_types: bool,
) -> OperationResult<DeletableReport> {
    let file = workspace.path(file);
    OperationResult::from_result(
        "check-deletable",
        run_check_deletable(workspace, &file, include_types),
    )
}

fn run_analyze(
    workspace: &Workspace,
    path: &Path,
    direction: Direction,
    include_types: bool,
) -> RefactorResult<DependencyReport> {
    let mut project = workspace.snapshot()?;
    project.ensure_loaded(path)?;

    let mut report = DependencyReport {
        file: project.relative_display(path),
        direction,
        imports: None,
        external: None,
        unresolved: None,
        importers: None,
    };

    if direction.includes_imports() {
        let mut imports = Vec::new();
        let mut external: Vec<String> = Vec::new();
        let mut unresolved = Vec::new();

        if let Some(file) = project.file(path) {
            for site in specifier_sites(file) {
                if site.is_type_only && !include_types {
                    continue;
                }
                match project.resolver().resolve(path, site.specifier) {
                    Resolution::Resolved(resolved) => imports.push(DependencyEntry {
                        specifier: site.specifier.to_string(),
                        path: project.relative_display(&resolved.path),
                        line: site.location.line,
                        is_type_only: site.is_type_only,
                    }),
                    Resolution::External => {
                        if !external.iter().any(|e| e == site.specifier) {
                            external.push(site.specifier.to_string());
                        }
                    }
                    Resolution::Unresolved { .. } => unresolved.push(site.specifier.to_string()),
                }
            }
        }

        report.imports = Some(imports);
        report.external = Some(external);
        report.unresolved = Some(unresolved);
    }

    if direction.includes_importers() {
        let references = ReferenceScanner::new(&project).find_references(path, include_types);
        report.importers = Some(
            references
                .iter()
                .map(|r| ImporterEntry::from_reference(r, project.relative_display(&r.file)))
                .collect(),
        );
    }

    tracing::debug!(file = %path.display(), %direction, "Analyzed dependencies");
    Ok(report)
}

fn run_check_deletable(
    workspace: &Workspace,
    path: &Path,
    include_types: bool,
) -> RefactorResult<DeletableReport> {
    if !path.is_file() {
        return Err(RefactorError::not_found_path(path));
    }
    let mut project = workspace.snapshot()?;
    if SourceLanguage::from_path(path).is_some() {
        project.ensure_loaded(path)?;
    }

    let references = ReferenceScanner::new(&project).find_references(path, include_types);
    let entries: Vec<ImporterEntry> = references
        .iter()
        .map(|r| ImporterEntry::from_reference(r, project.relative_display(&r.file)))
        .collect();

    tracing::debug!(
        file = %path.display(),
        references = entries.len(),
        "Checked deletability"
    );
    Ok(DeletableReport {
        file: project.relative_display(path),
        is_deletable: entries.is_empty(),
        references: entries,
    })
}
