//! Lexical path helpers shared by resolution, rewriting and repair.

use std::path::{Component, Path, PathBuf};

/// Extensions probed when a specifier omits one, in probe order.
pub const SOURCE_EXTENSIONS: &[&str] = &[".ts", ".tsx", ".js", ".jsx", ".d.ts"];

/// Returns true if the specifier looks like a relative or absolute path.
pub fn is_relative_specifier(specifier: &str) -> bool {
    specifier.starts_with('.') || specifier.starts_with('/')
}

/// Normalize a path by resolving `.` and `..` components without touching
/// the filesystem (no symlink resolution).
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut components: Vec<Component> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match components.last() {
                Some(Component::Normal(_)) => {
                    components.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => components.push(component),
            },
            other => components.push(other),
        }
    }
    components.iter().collect()
}

/// The source extension a specifier or file name ends with, if any.
///
/// `.d.ts` wins over `.ts`.
pub fn source_extension(name: &str) -> Option<&'static str> {
    if name.ends_with(".d.ts") {
        return Some(".d.ts");
    }
    SOURCE_EXTENSIONS
        .iter()
        .copied()
        .find(|ext| *ext != ".d.ts" && name.ends_with(ext))
}

pub fn has_source_extension(name: &str) -> bool {
    source_extension(name).is_some()
}

/// Strip a trailing source extension, if present.
pub fn strip_source_extension(name: &str) -> &str {
    match source_extension(name) {
        Some(ext) => &name[..name.len() - ext.len()],
        None => name,
    }
}

/// Returns true if the specifier explicitly names an index module.
pub fn ends_with_index(specifier: &str) -> bool {
    let stem = strip_source_extension(specifier);
    stem == "index" || stem.ends_with("/index")
}

/// Path with the source extension removed (`/a/b.d.ts` -> `/a/b`).
pub fn path_without_extension(path: &Path) -> PathBuf {
    let text = path.to_string_lossy();
    PathBuf::from(strip_source_extension(&text))
}

/// Returns true if the file is an `index.*` source module.
pub fn is_index_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| strip_source_extension(n) == "index" && has_source_extension(n))
}

/// Forward-slash rendering of a path.
pub fn to_slash(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// Options for turning an absolute target into a specifier.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpecifierStyle {
    /// Keep the target's source extension.
    pub keep_extension: bool,
    /// Keep a trailing `/index`.
    pub keep_index: bool,
    /// Emit an absolute specifier instead of a relative one.
    pub absolute: bool,
}

/// Build a specifier from `from_dir` to `target` in the requested style.
///
/// Relative output always starts with `.`; `./` is prefixed when needed.
pub fn specifier_for(from_dir: &Path, target: &Path, style: SpecifierStyle) -> String {
    let mut text = if style.absolute {
        to_slash(target)
    } else {
        let relative = pathdiff::diff_paths(target, from_dir).unwrap_or_else(|| target.to_path_buf());
        to_slash(&relative)
    };

    if !style.keep_extension {
        let stripped = strip_source_extension(&text).len();
        text.truncate(stripped);
    }

    if !style.keep_index && !style.keep_extension {
        if text == "index" {
            text = ".".to_string();
        } else if let Some(stripped) = text.strip_suffix("/index") {
            text = if stripped.is_empty() {
                "/".to_string()
            } else {
                stripped.to_string()
            };
        }
    }

    if !style.absolute && !text.starts_with('.') {
        text = format!("./{}", text);
    }

    text
}
