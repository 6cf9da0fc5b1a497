//! Module specifier resolution.
//!
//! Maps a specifier written in one file to the file it names on disk,
//! probing in a fixed order: the literal path, the path with each source
//! extension appended, then `path/index` with each extension. The first
//! hit wins, so an exact file always beats an extension-appended one and
//! both beat a directory index.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use super::paths::{is_relative_specifier, normalize_path, SOURCE_EXTENSIONS};
use crate::config::Config;

/// How a specifier was matched to a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResolveMethod {
    /// The specifier named an existing file verbatim.
    Exact,
    /// A source extension was appended.
    WithExtension,
    /// The specifier named a directory with an `index.*` file.
    IndexFile,
    /// Matched only after ignoring letter case.
    CaseVariant,
}

/// An absolute file path plus the probe that found it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPath {
    pub path: PathBuf,
    pub method: ResolveMethod,
}

/// Outcome of resolving one specifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// A package import; never looked up on disk.
    External,
    Resolved(ResolvedPath),
    /// A path specifier with no matching file. `target` is the lexical
    /// path the specifier points at.
    Unresolved { target: PathBuf },
}

impl Resolution {
    pub fn resolved(&self) -> Option<&ResolvedPath> {
        match self {
            Resolution::Resolved(resolved) => Some(resolved),
            Resolution::External | Resolution::Unresolved { .. } => None,
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.resolved().map(|r| r.path.as_path())
    }

    pub fn is_external(&self) -> bool {
        matches!(self, Resolution::External)
    }
}

/// Resolves specifiers against the filesystem.
#[derive(Debug, Clone, Default)]
pub struct Resolver {
    case_insensitive: bool,
}

impl Resolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            case_insensitive: config.case_insensitive,
        }
    }

    /// Enables the case-insensitive fallback probe.
    pub fn with_case_insensitive(mut self, enabled: bool) -> Self {
        self.case_insensitive = enabled;
        self
    }

    /// The lexical path a relative specifier points at, before probing.
    pub fn target_path(from_file: &Path, specifier: &str) -> PathBuf {
        let dir = from_file.parent().unwrap_or_else(|| Path::new(""));
        normalize_path(&dir.join(specifier))
    }

    /// Resolve `specifier` as written in `from_file`.
    ///
    /// # Example
    ///
    /// ```ignore
    /// use std::path::Path;
    /// use pathwright::resolve::{Resolver, Resolution};
    ///
    /// let resolver = Resolver::new();
    /// let resolution = resolver.resolve(Path::new("/p/src/app.ts"), "./math");
    /// if let Resolution::Resolved(found) = resolution {
    ///     println!("{}", found.path.display());
    /// }
    /// ```
    pub fn resolve(&self, from_file: &Path, specifier: &str) -> Resolution {
        if !is_relative_specifier(specifier) {
            return Resolution::External;
        }

        let target = Self::target_path(from_file, specifier);
        match self.probe(&target) {
            Some(resolved) => Resolution::Resolved(resolved),
            None => Resolution::Unresolved { target },
        }
    }

    /// Probe an absolute, extension-less (or exact) target path.
    pub fn probe(&self, target: &Path) -> Option<ResolvedPath> {
        for (candidate, method) in probe_candidates(target) {
            if candidate.is_file() {
                return Some(ResolvedPath {
                    path: candidate,
                    method,
                });
            }
        }

        if self.case_insensitive {
            for (candidate, _) in probe_candidates(target) {
                if let Some(path) = find_case_variant(&candidate) {
                    tracing::debug!(
                        target = %target.display(),
                        found = %path.display(),
                        "Resolved through case-insensitive match"
                    );
                    return Some(ResolvedPath {
                        path,
                        method: ResolveMethod::CaseVariant,
                    });
                }
            }
        }

        None
    }
}

/// Paths to probe for `target`, in priority order.
fn probe_candidates(target: &Path) -> Vec<(PathBuf, ResolveMethod)> {
    let mut candidates = Vec::with_capacity(1 + SOURCE_EXTENSIONS.len() * 2);
    candidates.push((target.to_path_buf(), ResolveMethod::Exact));

    for ext in SOURCE_EXTENSIONS {
        candidates.push((append_extension(target, ext), ResolveMethod::WithExtension));
    }

    let index = target.join("index");
    for ext in SOURCE_EXTENSIONS {
        candidates.push((append_extension(&index, ext), ResolveMethod::IndexFile));
    }

    candidates
}

/// Appends `ext` textually; `with_extension` would eat dotted names.
fn append_extension(path: &Path, ext: &str) -> PathBuf {
    let mut text: OsString = path.as_os_str().to_owned();
    text.push(ext);
    PathBuf::from(text)
}

/// Look for a file whose last component matches `path`'s ignoring case.
fn find_case_variant(path: &Path) -> Option<PathBuf> {
    let parent = path.parent()?;
    let wanted = path.file_name()?.to_string_lossy().to_lowercase();
    let entries = fs::read_dir(parent).ok()?;

    entries
        .filter_map(|e| e.ok())
        .find(|entry| {
            entry.file_name().to_string_lossy().to_lowercase() == wanted
                && entry.file_type().is_ok_and(|t| t.is_file())
        })
        .map(|entry| entry.path())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup_project(files: &[&str]) -> TempDir {
        let dir = TempDir::new().unwrap();
        for path in files {
            let full = dir.path().join(path);
            if let Some(parent) = full.parent() {
                fs::create_dir_all(parent).unwrap();
            }
            fs::write(&full, "export {};\n").unwrap();
        }
        dir
    }

    #[test]
    fn test_external_specifier_short_circuits() {
        let resolver = Resolver::new();
        assert_eq!(
            resolver.resolve(Path::new("/nowhere/app.ts"), "react"),
            Resolution::External
        );
        assert_eq!(
            resolver.resolve(Path::new("/nowhere/app.ts"), "@scope/pkg/sub"),
            Resolution::External
        );
    }

    #[test]
    fn test_exact_match() {
        let dir = setup_project(&["src/app.ts", "src/data.json"]);
        let from = dir.path().join("src/app.ts");

        let resolved = Resolver::new().resolve(&from, "./data.json");
        let resolved = resolved.resolved().unwrap();
        assert_eq!(resolved.path, dir.path().join("src/data.json"));
        assert_eq!(resolved.method, ResolveMethod::Exact);
    }

    #[test]
    fn test_extension_probe_order() {
        let dir = setup_project(&["src/app.ts", "src/math.ts", "src/math.js"]);
        let from = dir.path().join("src/app.ts");

        let resolved = Resolver::new().resolve(&from, "./math");
        let resolved = resolved.resolved().unwrap();
        assert_eq!(resolved.path, dir.path().join("src/math.ts"));
        assert_eq!(resolved.method, ResolveMethod::WithExtension);
    }

    #[test]
    fn test_declaration_file() {
        let dir = setup_project(&["src/app.ts", "src/globals.d.ts"]);
        let from = dir.path().join("src/app.ts");

        let resolution = Resolver::new().resolve(&from, "./globals");
        assert_eq!(resolution.path(), Some(dir.path().join("src/globals.d.ts").as_path()));
    }

    #[test]
    fn test_extension_beats_index() {
        let dir = setup_project(&["src/app.ts", "src/utils.ts", "src/utils/index.ts"]);
        let from = dir.path().join("src/app.ts");

        let resolution = Resolver::new().resolve(&from, "./utils");
        assert_eq!(resolution.path(), Some(dir.path().join("src/utils.ts").as_path()));
    }

    #[test]
    fn test_index_file() {
        let dir = setup_project(&["src/app.ts", "src/utils/index.tsx"]);
        let from = dir.path().join("src/app.ts");

        let resolution = Resolver::new().resolve(&from, "./utils");
        let resolved = resolution.resolved().unwrap();
        assert_eq!(resolved.path, dir.path().join("src/utils/index.tsx"));
        assert_eq!(resolved.method, ResolveMethod::IndexFile);
    }

    #[test]
    fn test_parent_directory_specifier() {
        let dir = setup_project(&["src/app/main.ts", "src/lib/math.ts"]);
        let from = dir.path().join("src/app/main.ts");

        let resolution = Resolver::new().resolve(&from, "../lib/math");
        assert_eq!(resolution.path(), Some(dir.path().join("src/lib/math.ts").as_path()));
    }

    #[test]
    fn test_unresolved_reports_target() {
        let dir = setup_project(&["src/app.ts"]);
        let from = dir.path().join("src/app.ts");

        let resolution = Resolver::new().resolve(&from, "./missing/thing");
        assert_eq!(
            resolution,
            Resolution::Unresolved {
                target: dir.path().join("src/missing/thing")
            }
        );
    }

    #[test]
    fn test_case_variant_only_when_enabled() {
        let dir = setup_project(&["src/app.ts", "src/Button.tsx"]);
        let from = dir.path().join("src/app.ts");

        let strict = Resolver::new().resolve(&from, "./button");
        assert!(strict.resolved().is_none());

        let relaxed = Resolver::new()
            .with_case_insensitive(true)
            .resolve(&from, "./button");
        let resolved = relaxed.resolved().unwrap();
        assert_eq!(resolved.method, ResolveMethod::CaseVariant);
        assert_eq!(resolved.path, dir.path().join("src/Button.tsx"));
    }
}
