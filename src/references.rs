//! Cross-file reference discovery.
//!
//! The scanner walks every file of a [`ProjectSnapshot`] and reports the
//! import declarations, re-exports and dynamic imports whose specifier
//! reaches a given file (or any file inside a given directory).

use std::ops::Range;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::project::ProjectSnapshot;
use crate::resolve::{is_index_file, path_without_extension, Resolution};
use crate::syntax::{ImportKind, Position, SourceFile};

/// What kind of statement holds a reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceKind {
    Import,
    Export,
    DynamicImport,
}

/// One statement that references a target file.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Reference {
    /// File containing the statement.
    pub file: PathBuf,
    pub location: Position,
    /// The specifier as written.
    pub text: String,
    pub imported_names: Vec<String>,
    pub is_type_only: bool,
    #[serde(rename = "referenceKind")]
    pub kind: ReferenceKind,
    /// Byte span of the specifier inside `file`.
    #[serde(skip)]
    pub span: Range<usize>,
    /// The file the specifier resolves to.
    #[serde(skip)]
    pub target: PathBuf,
}

/// The spellings under which a file can be referenced.
///
/// The path itself, the path without its source extension and, for
/// `index.*` files, the containing directory.
pub fn path_variations(target: &Path) -> Vec<PathBuf> {
    let mut variations = vec![target.to_path_buf()];

    let stripped = path_without_extension(target);
    if stripped != target {
        variations.push(stripped);
    }

    if is_index_file(target) {
        if let Some(parent) = target.parent() {
            variations.push(parent.to_path_buf());
        }
    }

    variations
}

/// Finds references to files inside one project snapshot.
pub struct ReferenceScanner<'p> {
    project: &'p ProjectSnapshot,
}

impl<'p> ReferenceScanner<'p> {
    pub fn new(project: &'p ProjectSnapshot) -> Self {
        Self { project }
    }

    /// Every reference to `target` from other files.
    ///
    /// Results follow project enumeration order, then position in file.
    pub fn find_references(&self, target: &Path, include_type_only: bool) -> Vec<Reference> {
        let variations = path_variations(target);
        let canonical: Vec<PathBuf> = variations
            .iter()
            .filter_map(|v| v.canonicalize().ok())
            .collect();

        let references = self.scan(include_type_only, |file| file.path() != target, |candidate| {
            if variations.iter().any(|v| v == candidate) {
                return true;
            }
            if canonical.is_empty() {
                return false;
            }
            candidate
                .canonicalize()
                .is_ok_and(|c| canonical.contains(&c))
        });

        tracing::debug!(
            target = %target.display(),
            count = references.len(),
            "Scanned references"
        );
        references
    }

    /// Every reference to a file located inside `dir`, from any file.
    pub fn find_references_under(&self, dir: &Path, include_type_only: bool) -> Vec<Reference> {
        let canonical_dir = dir.canonicalize().ok();

        self.scan(include_type_only, |_| true, |candidate| {
            if candidate.starts_with(dir) {
                return true;
            }
            match &canonical_dir {
                Some(canonical_dir) => candidate
                    .canonicalize()
                    .is_ok_and(|c| c.starts_with(canonical_dir)),
                None => false,
            }
        })
    }

    fn scan(
        &self,
        include_type_only: bool,
        include_file: impl Fn(&SourceFile) -> bool,
        matches: impl Fn(&Path) -> bool,
    ) -> Vec<Reference> {
        let resolver = self.project.resolver();
        let mut references = Vec::new();

        for file in self.project.files().iter().filter(|f| include_file(f)) {
            let mut found = Vec::new();

            // Returns the matched target for a specifier, if any.
            let reaches = |specifier: &str| -> Option<PathBuf> {
                match resolver.resolve(file.path(), specifier) {
                    Resolution::External => None,
                    // Only the probed file counts; `./utils` reaching `utils.ts`
                    // is not a reference to `utils/index.ts`.
                    Resolution::Resolved(resolved) => {
                        matches(&resolved.path).then_some(resolved.path)
                    }
                    Resolution::Unresolved { target } => matches(&target).then_some(target),
                }
            };

            for import in file.imports() {
                if import.is_type_only && !include_type_only {
                    continue;
                }
                let Some(target) = reaches(&import.specifier) else {
                    continue;
                };
                let kind = match import.kind {
                    ImportKind::Dynamic => ReferenceKind::DynamicImport,
                    ImportKind::Default
                    | ImportKind::Named
                    | ImportKind::Namespace
                    | ImportKind::SideEffect => ReferenceKind::Import,
                };
                found.push(Reference {
                    file: file.path().to_path_buf(),
                    location: import.location,
                    text: import.specifier.clone(),
                    imported_names: import.imported_names(),
                    is_type_only: import.is_type_only,
                    kind,
                    span: import.span.clone(),
                    target,
                });
            }

            for export in file.exports() {
                let (Some(specifier), Some(span)) = (&export.specifier, &export.span) else {
                    continue;
                };
                if export.is_type_only && !include_type_only {
                    continue;
                }
                let Some(target) = reaches(specifier) else {
                    continue;
                };
                found.push(Reference {
                    file: file.path().to_path_buf(),
                    location: export.location,
                    text: specifier.clone(),
                    imported_names: export.forwarded_names(),
                    is_type_only: export.is_type_only,
                    kind: ReferenceKind::Export,
                    span: span.clone(),
                    target,
                });
            }

            found.sort_by_key(|r| r.span.start);
            references.extend(found);
        }

        references
    }
}

/// Every reference to `target` in `project`.
pub fn find_references(
    target: &Path,
    project: &ProjectSnapshot,
    include_type_only: bool,
) -> Vec<Reference> {
    ReferenceScanner::new(project).find_references(target, include_type_only)
}
