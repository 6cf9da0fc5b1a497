use std::fs;
use std::path::Path;

use pathwright::config::Config;
use pathwright::ops::Workspace;
use tempfile::TempDir;

/// Write `files` under a fresh temporary directory and open it.
pub fn setup_project(files: &[(&str, &str)]) -> (TempDir, Workspace) {
    let dir = TempDir::new().unwrap();
    for (path, content) in files {
        let full = dir.path().join(path);
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&full, content).unwrap();
    }
    let workspace = Workspace::with_config(dir.path(), Config::default());
    (dir, workspace)
}

pub fn read(workspace: &Workspace, path: &str) -> String {
    fs::read_to_string(workspace.root().join(path)).unwrap()
}

#[allow(dead_code)]
pub fn exists(workspace: &Workspace, path: &str) -> bool {
    workspace.root().join(Path::new(path)).exists()
}
