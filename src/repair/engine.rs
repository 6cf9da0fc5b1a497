//! Candidate search, ranking and selection for broken specifiers.

use std::cmp::Ordering;
use std::path::{Path, PathBuf};

use serde::Serialize;

use super::candidate::{candidate_globs, probe_name, Candidate, ImportRequirement};
use crate::error::{RefactorError, RefactorResult};
use crate::project::{is_test_file, ProjectSnapshot};
use crate::resolve::{ends_with_index, specifier_for, Resolution, SpecifierStyle};

/// One broken specifier to repair.
#[derive(Debug, Clone)]
pub struct RepairRequest<'a> {
    pub from_file: &'a Path,
    pub specifier: &'a str,
    pub requirement: ImportRequirement,
    /// Rank closer files first. When off, ties are reported instead of
    /// being broken by distance.
    pub prioritize_closer_paths: bool,
}

/// Result of repairing one specifier.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RepairOutcome {
    /// External, or already resolves.
    AlreadyValid,
    #[serde(rename_all = "camelCase")]
    Repaired {
        new_specifier: String,
        selected: PathBuf,
        candidates: Vec<Candidate>,
    },
    NotFound,
    MultipleMatches { candidates: Vec<Candidate> },
}

impl RepairOutcome {
    pub fn status(&self) -> &'static str {
        match self {
            RepairOutcome::AlreadyValid => "already_valid",
            RepairOutcome::Repaired { .. } => "repaired",
            RepairOutcome::NotFound => "not_found",
            RepairOutcome::MultipleMatches { .. } => "multiple_matches",
        }
    }
}

/// Searches a project snapshot for replacement targets.
pub struct RepairEngine<'p> {
    project: &'p ProjectSnapshot,
}

impl<'p> RepairEngine<'p> {
    pub fn new(project: &'p ProjectSnapshot) -> Self {
        Self { project }
    }

    /// Find the best replacement for a broken specifier.
    ///
    /// # Arguments
    ///
    /// * `request` - The importing file, the broken specifier and what the
    ///   import needs from its target
    ///
    /// # Returns
    ///
    /// `AlreadyValid` when nothing is broken, otherwise the ranked
    /// candidates and, when one stands out, the specifier that reaches it.
    pub fn repair(&self, request: &RepairRequest<'_>) -> RefactorResult<RepairOutcome> {
        match self.project.resolver().resolve(request.from_file, request.specifier) {
            Resolution::External | Resolution::Resolved(_) => {
                return Ok(RepairOutcome::AlreadyValid)
            }
            Resolution::Unresolved { .. } => {}
        }

        let Some(name) = probe_name(request.specifier) else {
            return Ok(RepairOutcome::NotFound);
        };

        let candidates = self.search(request, &name)?;
        if candidates.is_empty() {
            tracing::debug!(specifier = request.specifier, probe = %name, "No repair candidates");
            return Ok(RepairOutcome::NotFound);
        }

        let mut pool: Vec<Candidate> = candidates.iter().filter(|c| c.export_match).cloned().collect();
        if pool.is_empty() {
            pool = candidates;
        }

        let prioritize = request.prioritize_closer_paths;
        pool.sort_by(|a, b| rank(a, b, prioritize).then_with(|| a.path.cmp(&b.path)));

        if !prioritize && pool.len() > 1 && rank(&pool[0], &pool[1], false) == Ordering::Equal {
            tracing::debug!(
                specifier = request.specifier,
                tied = pool.len(),
                "Ambiguous repair candidates"
            );
            return Ok(RepairOutcome::MultipleMatches { candidates: pool });
        }

        let selected = pool[0].path.clone();
        let from_dir = request.from_file.parent().unwrap_or_else(|| Path::new("/"));
        let style = SpecifierStyle {
            keep_extension: false,
            keep_index: ends_with_index(request.specifier),
            absolute: false,
        };
        let new_specifier = specifier_for(from_dir, &selected, style);

        tracing::info!(
            from = %request.from_file.display(),
            old = request.specifier,
            new = %new_specifier,
            "Repaired specifier"
        );
        Ok(RepairOutcome::Repaired {
            new_specifier,
            selected,
            candidates: pool,
        })
    }

    fn search(&self, request: &RepairRequest<'_>, name: &str) -> RefactorResult<Vec<Candidate>> {
        let globs = candidate_globs(name).map_err(|_| RefactorError::Unresolvable {
            specifier: request.specifier.to_string(),
            from: request.from_file.to_path_buf(),
        })?;
        let include_tests = self.project.config().include_tests_in_repair;
        let from_dir = request.from_file.parent().unwrap_or_else(|| Path::new("/"));

        Ok(self
            .project
            .files()
            .iter()
            .filter(|f| f.path() != request.from_file)
            .filter(|f| include_tests || !is_test_file(f.path()))
            .filter(|f| {
                let relative = f.path().strip_prefix(self.project.root()).unwrap_or(f.path());
                globs.is_match(relative)
            })
            .map(|f| Candidate::score(f, from_dir, name, &request.requirement))
            .collect())
    }
}

/// Export match first, then distance (if enabled), then similarity.
fn rank(a: &Candidate, b: &Candidate, use_distance: bool) -> Ordering {
    b.export_match
        .cmp(&a.export_match)
        .then_with(|| {
            if use_distance {
                a.directory_distance.cmp(&b.directory_distance)
            } else {
                Ordering::Equal
            }
        })
        .then_with(|| {
            b.name_similarity
                .partial_cmp(&a.name_similarity)
                .unwrap_or(Ordering::Equal)
        })
}
