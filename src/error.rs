//! Error taxonomy shared by the refactoring engine.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors that can occur while resolving, scanning or rewriting a project.
#[derive(Error, Debug)]
pub enum RefactorError {
    /// A source path, target file or symbol does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The destination of a move or rename is already taken.
    #[error("Destination already exists: {}", .0.display())]
    AlreadyExists(PathBuf),

    /// A specifier could not be mapped to any file.
    #[error("Cannot resolve '{specifier}' from {}", from.display())]
    Unresolvable { specifier: String, from: PathBuf },

    /// A new symbol name is not a valid identifier.
    #[error("Invalid identifier: '{0}'")]
    InvalidName(String),

    /// A file could not be parsed.
    #[error("Failed to parse file: {}", .0.display())]
    ParseFailure(PathBuf),

    /// The project configuration is unusable.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A filesystem operation failed.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl RefactorError {
    /// Wraps an I/O error with the path it happened on.
    pub fn io(path: &Path, source: std::io::Error) -> Self {
        RefactorError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    pub fn not_found_path(path: &Path) -> Self {
        RefactorError::NotFound(path.display().to_string())
    }
}

/// Result type for engine operations.
pub type RefactorResult<T> = Result<T, RefactorError>;
