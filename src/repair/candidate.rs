//! Replacement candidates for a broken specifier and how they are scored.

use std::collections::BTreeSet;
use std::path::{Component, Path, PathBuf};

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use serde::Serialize;

use crate::resolve::{is_index_file, strip_source_extension};
use crate::syntax::{ImportKind, ImportRecord, SourceFile};

/// What the broken import needs from the module it names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "names", rename_all = "kebab-case")]
pub enum ImportRequirement {
    /// `import x from '...'`
    Default,
    /// `import { a, b } from '...'`
    Named(Vec<String>),
    /// `import x, { a } from '...'`
    DefaultAndNamed(Vec<String>),
    /// Namespace, side-effect and dynamic imports accept any module.
    Unconstrained,
}

impl ImportRequirement {
    /// Derive the requirement from a parsed import.
    pub fn from_import(import: &ImportRecord) -> Self {
        let names: Vec<String> = import
            .named_bindings
            .iter()
            .map(|b| b.name.clone())
            .filter(|n| n != "default")
            .collect();
        let wants_default = import.default_binding.is_some()
            || import.named_bindings.iter().any(|b| b.name == "default");

        match import.kind {
            ImportKind::Namespace | ImportKind::SideEffect | ImportKind::Dynamic => {
                ImportRequirement::Unconstrained
            }
            ImportKind::Default | ImportKind::Named => match (wants_default, names.is_empty()) {
                (true, true) => ImportRequirement::Default,
                (true, false) => ImportRequirement::DefaultAndNamed(names),
                (false, false) => ImportRequirement::Named(names),
                (false, true) => ImportRequirement::Unconstrained,
            },
        }
    }

    /// Returns true if a module with these exports satisfies the import.
    pub fn is_satisfied_by(&self, exported: &BTreeSet<String>, has_default: bool) -> bool {
        match self {
            ImportRequirement::Default => has_default,
            ImportRequirement::Named(names) => names.iter().all(|n| exported.contains(n)),
            ImportRequirement::DefaultAndNamed(names) => {
                has_default && names.iter().all(|n| exported.contains(n))
            }
            ImportRequirement::Unconstrained => true,
        }
    }

    /// Returns true if satisfaction can differ between candidates.
    pub fn constrains(&self) -> bool {
        !matches!(self, ImportRequirement::Unconstrained)
    }
}

/// A file that could replace a broken specifier's target.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub path: PathBuf,
    pub exported_names: BTreeSet<String>,
    pub has_default_export: bool,
    pub directory_distance: usize,
    pub name_similarity: f64,
    pub export_match: bool,
}

impl Candidate {
    /// Score `file` as a replacement reached from `from_dir`.
    pub fn score(
        file: &SourceFile,
        from_dir: &Path,
        probe_name: &str,
        requirement: &ImportRequirement,
    ) -> Self {
        let exported_names = file.exported_names();
        let has_default_export = file.has_default_export();
        let export_match = requirement.is_satisfied_by(&exported_names, has_default_export);
        let dir = file.path().parent().unwrap_or_else(|| Path::new("/"));

        Self {
            path: file.path().to_path_buf(),
            directory_distance: directory_distance(from_dir, dir),
            name_similarity: name_similarity(probe_name, &module_name(file.path())),
            exported_names,
            has_default_export,
            export_match,
        }
    }
}

/// The file name an unresolved specifier is looking for.
///
/// The last segment with its source extension stripped; an `index` segment
/// stands for its parent directory.
pub fn probe_name(specifier: &str) -> Option<String> {
    let trimmed = specifier.trim_end_matches('/');
    let mut segments = trimmed.rsplit('/');
    let last = strip_source_extension(segments.next()?);

    let name = if last == "index" {
        segments.next()?
    } else {
        last
    };

    match name {
        "" | "." | ".." => None,
        name => Some(name.to_string()),
    }
}

/// Name a module is imported by: its stem, or the directory for `index.*`.
pub fn module_name(path: &Path) -> String {
    if is_index_file(path) {
        if let Some(dir) = path.parent().and_then(|p| p.file_name()) {
            return dir.to_string_lossy().to_string();
        }
    }
    path.file_name()
        .map(|n| strip_source_extension(&n.to_string_lossy()).to_string())
        .unwrap_or_default()
}

/// Glob patterns matching `{name}.{ext}` and `{name}/index.{ext}` anywhere.
pub fn candidate_globs(name: &str) -> Result<GlobSet, globset::Error> {
    let escaped = globset::escape(name);
    let mut builder = GlobSetBuilder::new();
    for pattern in [
        format!("**/{}.{{ts,tsx,js,jsx}}", escaped),
        format!("**/{}.d.ts", escaped),
        format!("**/{}/index.{{ts,tsx,js,jsx}}", escaped),
        format!("**/{}/index.d.ts", escaped),
    ] {
        builder.add(GlobBuilder::new(&pattern).literal_separator(true).build()?);
    }
    builder.build()
}

/// Cost of walking from `from` to `to`: 2 per level up, 1 per level down.
pub fn directory_distance(from: &Path, to: &Path) -> usize {
    let from: Vec<Component> = from.components().collect();
    let to: Vec<Component> = to.components().collect();
    let common = from
        .iter()
        .zip(to.iter())
        .take_while(|(a, b)| a == b)
        .count();

    (from.len() - common) * 2 + (to.len() - common)
}

/// Matching characters over the longer length, ignoring case.
///
/// Each character of `b` can be matched once.
pub fn name_similarity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.to_lowercase().chars().collect();
    let b: Vec<char> = b.to_lowercase().chars().collect();
    let longest = a.len().max(b.len());
    if longest == 0 {
        return 1.0;
    }

    let mut used = vec![false; b.len()];
    let mut matches = 0;
    for ch in &a {
        if let Some(idx) = (0..b.len()).find(|&i| !used[i] && b[i] == *ch) {
            used[idx] = true;
            matches += 1;
        }
    }

    matches as f64 / longest as f64
}
