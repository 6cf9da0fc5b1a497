//! Per-operation project snapshot.
//!
//! A [`ProjectSnapshot`] is loaded at the start of every command, owns the
//! parsed [`SourceFile`]s for the duration of that command and is dropped
//! when the command returns. There is no process-wide cache.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use globset::GlobSet;
use walkdir::WalkDir;

use crate::config::Config;
use crate::error::{RefactorError, RefactorResult};
use crate::resolve::{normalize_path, paths::to_slash, Resolver};
use crate::syntax::{SourceFile, SourceLanguage, SourceParser, SyntaxError};

/// Parsed view of every source file under a root directory.
pub struct ProjectSnapshot {
    root: PathBuf,
    config: Config,
    resolver: Resolver,
    parser: SourceParser,
    files: Vec<SourceFile>,
    index: HashMap<PathBuf, usize>,
    skipped: Vec<PathBuf>,
}

impl std::fmt::Debug for ProjectSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProjectSnapshot")
            .field("root", &self.root)
            .field("files", &self.files.len())
            .field("skipped", &self.skipped.len())
            .finish()
    }
}

impl ProjectSnapshot {
    /// Load every source file under `root`.
    pub fn load(root: &Path, config: Config) -> RefactorResult<Self> {
        Self::load_with_depth(root, config, None)
    }

    /// Load source files no deeper than `max_depth` directories below `root`.
    pub fn load_with_depth(
        root: &Path,
        config: Config,
        max_depth: Option<usize>,
    ) -> RefactorResult<Self> {
        if !root.is_dir() {
            return Err(RefactorError::not_found_path(root));
        }
        let root = absolutize(root);
        let excludes = config
            .exclude_set()
            .map_err(|e| RefactorError::InvalidConfig(e.to_string()))?;
        let parser = SourceParser::new().map_err(|_| RefactorError::ParseFailure(root.clone()))?;

        let mut snapshot = Self {
            resolver: Resolver::from_config(&config),
            root,
            config,
            parser,
            files: Vec::new(),
            index: HashMap::new(),
            skipped: Vec::new(),
        };

        let paths = enumerate_source_files(&snapshot.root, &snapshot.config, &excludes, max_depth);
        for path in paths {
            snapshot.add_file(&path);
        }

        tracing::info!(
            root = %snapshot.root.display(),
            files = snapshot.files.len(),
            skipped = snapshot.skipped.len(),
            "Loaded project snapshot"
        );
        Ok(snapshot)
    }

    fn add_file(&mut self, path: &Path) -> Option<usize> {
        match self.parser.parse_file(path) {
            Ok(file) => {
                let idx = self.files.len();
                self.index.insert(path.to_path_buf(), idx);
                self.files.push(file);
                Some(idx)
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Skipping unparsable file");
                self.skipped.push(path.to_path_buf());
                None
            }
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    /// Files in enumeration order.
    pub fn files(&self) -> &[SourceFile] {
        &self.files
    }

    /// Files that failed to parse and were left out.
    pub fn skipped(&self) -> &[PathBuf] {
        &self.skipped
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.index.contains_key(path)
    }

    pub fn file(&self, path: &Path) -> Option<&SourceFile> {
        self.index.get(path).map(|&idx| &self.files[idx])
    }

    pub fn file_mut(&mut self, path: &Path) -> Option<&mut SourceFile> {
        match self.index.get(path) {
            Some(&idx) => self.files.get_mut(idx),
            None => None,
        }
    }

    /// Return the file, parsing it into the snapshot if enumeration skipped it
    /// (for example because an exclude pattern matched).
    pub fn ensure_loaded(&mut self, path: &Path) -> RefactorResult<&SourceFile> {
        if !self.index.contains_key(path) {
            if !path.is_file() {
                return Err(RefactorError::not_found_path(path));
            }
            match self.parser.parse_file(path) {
                Ok(file) => {
                    self.index.insert(path.to_path_buf(), self.files.len());
                    self.files.push(file);
                }
                Err(SyntaxError::FileRead(e)) => return Err(RefactorError::io(path, e)),
                Err(_) => return Err(RefactorError::ParseFailure(path.to_path_buf())),
            }
        }
        let idx = self.index[path];
        Ok(&self.files[idx])
    }

    /// Parse a file without adding it to the snapshot.
    pub fn parse_detached(&mut self, path: &Path) -> RefactorResult<SourceFile> {
        self.parser.parse_file(path).map_err(|e| match e {
            SyntaxError::FileRead(io) => RefactorError::io(path, io),
            _ => RefactorError::ParseFailure(path.to_path_buf()),
        })
    }

    /// Paths of files with queued edits, in enumeration order.
    pub fn dirty_paths(&self) -> Vec<PathBuf> {
        self.files
            .iter()
            .filter(|f| f.is_dirty())
            .map(|f| f.path().to_path_buf())
            .collect()
    }

    /// Write every file with queued edits. Returns the written paths.
    pub fn save_dirty(&self) -> RefactorResult<Vec<PathBuf>> {
        let mut written = Vec::new();
        for file in self.files.iter().filter(|f| f.is_dirty()) {
            file.save().map_err(|e| RefactorError::io(file.path(), e))?;
            tracing::debug!(path = %file.path().display(), edits = file.edits().len(), "Saved file");
            written.push(file.path().to_path_buf());
        }
        Ok(written)
    }

    /// Path relative to the project root with forward slashes.
    pub fn relative_display(&self, path: &Path) -> String {
        match path.strip_prefix(&self.root) {
            Ok(rest) => to_slash(rest),
            Err(_) => to_slash(path),
        }
    }
}

/// Make a path absolute, resolving symlinks in its directories.
///
/// A file keeps its own name even when it is a symlink. Paths that do not
/// exist yet (move destinations) are anchored on their nearest existing
/// ancestor.
pub fn absolutize(path: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    };
    let normalized = normalize_path(&joined);

    if normalized.is_dir() {
        if let Ok(canonical) = fs::canonicalize(&normalized) {
            return canonical;
        }
    }

    let mut missing = Vec::new();
    let mut current = normalized.as_path();
    while let Some(parent) = current.parent() {
        if let Some(name) = current.file_name() {
            missing.push(name.to_os_string());
        }
        if let Ok(canonical) = fs::canonicalize(parent) {
            let mut rebuilt = canonical;
            for name in missing.iter().rev() {
                rebuilt.push(name);
            }
            return rebuilt;
        }
        current = parent;
    }
    normalized
}

/// Returns true for `*.test.*`, `*.spec.*` and files under `__tests__`.
pub fn is_test_file(path: &Path) -> bool {
    let in_tests_dir = path
        .components()
        .any(|c| c.as_os_str() == "__tests__" || c.as_os_str() == "__mocks__");
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    in_tests_dir || name.contains(".test.") || name.contains(".spec.")
}

/// Enumerate parseable source files under `root` in a stable order.
pub fn enumerate_source_files(
    root: &Path,
    config: &Config,
    excludes: &GlobSet,
    max_depth: Option<usize>,
) -> Vec<PathBuf> {
    let mut walker = WalkDir::new(root).sort_by_file_name();
    if let Some(depth) = max_depth {
        // Depth 0 is the root itself; files in the root sit at depth 1.
        walker = walker.max_depth(depth + 1);
    }

    walker
        .into_iter()
        .filter_entry(|e| !is_ignored_dir(e, config))
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|path| SourceLanguage::from_path(path).is_some())
        .filter(|path| {
            let relative = path.strip_prefix(root).unwrap_or(path);
            !excludes.is_match(relative)
        })
        .collect()
}

/// Check if a directory should be ignored during traversal.
fn is_ignored_dir(entry: &walkdir::DirEntry, config: &Config) -> bool {
    if entry.depth() == 0 || !entry.file_type().is_dir() {
        return false;
    }

    let name = entry.file_name().to_string_lossy();
    config.is_ignored_dir(name.as_ref())
}
