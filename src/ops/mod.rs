//! Refactoring operations.
//!
//! Each operation loads a fresh [`ProjectSnapshot`] from its [`Workspace`],
//! computes every edit in memory, validates, writes the edited files and
//! only then touches the moved path on disk. Every operation returns an
//! [`OperationResult`]; failures are carried in it rather than raised.

mod analyze;
mod move_path;
mod rename_symbol;
mod repair_imports;
mod visualize;

use std::ops::Range;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::config::Config;
use crate::error::{RefactorError, RefactorResult};
use crate::project::{absolutize, ProjectSnapshot};
use crate::syntax::{Position, SourceFile};

pub use analyze::{
    analyze_dependencies, check_deletable, DeletableReport, DependencyEntry, DependencyReport,
    Direction, ImporterEntry,
};
pub use move_path::{move_path, rename_path, MoveReport, UpdatedReference};
pub use rename_symbol::{rename_symbol, RenameSymbolReport};
pub use repair_imports::{repair_imports, RepairEntry, RepairOptions, RepairReport};
pub use visualize::{visualize_dependencies, VisualizeOptions, VisualizeReport};

/// A project root plus its configuration.
#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
    config: Config,
}

impl Workspace {
    /// Open `root`, reading `pathwright.json` if present.
    pub fn open(root: &Path) -> RefactorResult<Self> {
        if !root.is_dir() {
            return Err(RefactorError::not_found_path(root));
        }
        let config = Config::load(root).map_err(|e| RefactorError::InvalidConfig(e.to_string()))?;
        Ok(Self::with_config(root, config))
    }

    pub fn with_config(root: &Path, config: Config) -> Self {
        Self {
            root: absolutize(root),
            config,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Resolve a user-supplied path against the current directory.
    pub fn path(&self, path: &Path) -> PathBuf {
        absolutize(path)
    }

    fn snapshot(&self) -> RefactorResult<ProjectSnapshot> {
        ProjectSnapshot::load(&self.root, self.config.clone())
    }
}

/// Outcome of one operation: a success flag, an optional error and, on
/// success, the operation's report fields.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationResult<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(flatten)]
    pub report: Option<T>,
}

impl<T> OperationResult<T> {
    pub fn ok(report: T) -> Self {
        Self {
            success: true,
            error: None,
            report: Some(report),
        }
    }

    pub fn failed(error: &RefactorError) -> Self {
        Self {
            success: false,
            error: Some(error.to_string()),
            report: None,
        }
    }

    /// Convert an engine result, logging failures once.
    pub(crate) fn from_result(operation: &str, result: RefactorResult<T>) -> Self {
        match result {
            Ok(report) => Self::ok(report),
            Err(e) => {
                tracing::warn!(operation, error = %e, "Operation failed");
                Self::failed(&e)
            }
        }
    }
}

/// A string literal naming another module: an import, a dynamic import or
/// a re-export source.
#[derive(Debug, Clone)]
pub(crate) struct SpecifierSite<'a> {
    pub specifier: &'a str,
    pub span: Range<usize>,
    pub location: Position,
    pub is_type_only: bool,
}

/// Every specifier in a file, in document order.
pub(crate) fn specifier_sites(file: &SourceFile) -> Vec<SpecifierSite<'_>> {
    let imports = file.imports().iter().map(|i| SpecifierSite {
        specifier: &i.specifier,
        span: i.span.clone(),
        location: i.location,
        is_type_only: i.is_type_only,
    });
    let exports = file.exports().iter().filter_map(|e| {
        let specifier = e.specifier.as_deref()?;
        let span = e.span.clone()?;
        Some(SpecifierSite {
            specifier,
            span,
            location: e.location,
            is_type_only: e.is_type_only,
        })
    });

    let mut sites: Vec<SpecifierSite<'_>> = imports.chain(exports).collect();
    sites.sort_by_key(|s| s.span.start);
    sites
}
