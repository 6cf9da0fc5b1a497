//! Project configuration.
//!
//! Settings are read from an optional `pathwright.json` at the project
//! root. Every field has a default, so an absent file or an empty object
//! yields the stock behavior.
//!
//! ```json
//! {
//!   "exclude": ["**/generated/**", "legacy/*.js"],
//!   "ignoredDirs": ["node_modules", "dist"],
//!   "caseInsensitive": false,
//!   "includeTestsInRepair": false
//! }
//! ```

use std::fs;
use std::path::Path;

use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};

/// Name of the configuration file looked up at the project root.
pub const CONFIG_FILE_NAME: &str = "pathwright.json";

/// Directory names skipped during project enumeration unless overridden.
pub const DEFAULT_IGNORED_DIRS: &[&str] = &[
    "node_modules",
    ".git",
    "dist",
    "build",
    "out",
    ".next",
    "coverage",
    ".turbo",
];

/// Errors that can occur while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the file from disk.
    #[error("Failed to read config: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to parse JSON content.
    #[error("Failed to parse config JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    /// An exclude entry is not a valid glob.
    #[error("Invalid exclude pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },
}

/// Result type alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Settings shared by every operation on a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    /// Glob patterns (relative to the project root) of files to leave out.
    pub exclude: Vec<String>,

    /// Directory names never descended into.
    pub ignored_dirs: Vec<String>,

    /// Retry failed resolutions with case-insensitive name matching.
    pub case_insensitive: bool,

    /// Let the repair search consider `*.test.*` / `*.spec.*` files.
    pub include_tests_in_repair: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            exclude: Vec::new(),
            ignored_dirs: DEFAULT_IGNORED_DIRS.iter().map(|d| d.to_string()).collect(),
            case_insensitive: false,
            include_tests_in_repair: false,
        }
    }
}

impl Config {
    /// Loads `pathwright.json` from `root`, falling back to defaults when absent.
    pub fn load(root: &Path) -> ConfigResult<Self> {
        let path = root.join(CONFIG_FILE_NAME);
        if !path.is_file() {
            return Ok(Self::default());
        }
        tracing::debug!(path = %path.display(), "Loading configuration");
        parse_file(&path)
    }

    /// Compiles the exclude patterns.
    pub fn exclude_set(&self) -> ConfigResult<GlobSet> {
        let mut builder = GlobSetBuilder::new();
        for pattern in &self.exclude {
            let glob = Glob::new(pattern).map_err(|e| ConfigError::InvalidPattern {
                pattern: pattern.clone(),
                message: e.to_string(),
            })?;
            builder.add(glob);
        }
        builder.build().map_err(|e| ConfigError::InvalidPattern {
            pattern: self.exclude.join(", "),
            message: e.to_string(),
        })
    }

    /// Returns true if a directory with this name is skipped.
    pub fn is_ignored_dir(&self, name: &str) -> bool {
        self.ignored_dirs.iter().any(|d| d == name)
    }
}

/// Parses a configuration file.
pub fn parse_file(path: &Path) -> ConfigResult<Config> {
    let content = fs::read_to_string(path)?;
    parse_str(&content)
}

/// Parses configuration from a JSON string.
///
/// # Example
///
/// ```
/// use pathwright::config::parse_str;
///
/// let config = parse_str(r#"{"caseInsensitive": true}"#).unwrap();
/// assert!(config.case_insensitive);
/// assert!(config.is_ignored_dir("node_modules"));
/// ```
pub fn parse_str(content: &str) -> ConfigResult<Config> {
    let config: Config = serde_json::from_str(content)?;
    Ok(config)
}
