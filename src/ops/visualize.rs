//! Rendering the project's import graph.

use std::path::Path;

use serde::Serialize;

use super::{OperationResult, Workspace};
use crate::error::{RefactorError, RefactorResult};
use crate::export::{export_to_string, ExportData, ExportFormat};
use crate::graph::{Cycle, GraphOptions, ImportGraph};
use crate::project::ProjectSnapshot;

#[derive(Debug, Clone, Copy)]
pub struct VisualizeOptions {
    pub format: ExportFormat,
    /// Show package imports as nodes.
    pub include_node_modules: bool,
    /// Draw `import type` edges.
    pub include_types: bool,
    /// Directory depth limit below the visualized root.
    pub max_depth: Option<usize>,
    pub detect_circular: bool,
}

impl Default for VisualizeOptions {
    fn default() -> Self {
        Self {
            format: ExportFormat::Dot,
            include_node_modules: false,
            include_types: true,
            max_depth: None,
            detect_circular: true,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VisualizeReport {
    pub format: String,
    /// The rendered graph.
    pub output: String,
    pub node_count: usize,
    pub edge_count: usize,
    pub circular_dependencies: Vec<Cycle>,
}

/// Render the import graph of `root`, or of the workspace root when `None`.
pub fn visualize_dependencies(
    workspace: &Workspace,
    root: Option<&Path>,
    options: VisualizeOptions,
) -> OperationResult<VisualizeReport> {
    let root = match root {
        Some(path) => workspace.path(path),
        None => workspace.root().to_path_buf(),
    };
    OperationResult::from_result(
        "visualize-dependencies",
        run_visualize(workspace, &root, options),
    )
}

fn run_visualize(
    workspace: &Workspace,
    root: &Path,
    options: VisualizeOptions,
) -> RefactorResult<VisualizeReport> {
    let project = ProjectSnapshot::load_with_depth(root, workspace.config().clone(), options.max_depth)?;
    let graph = ImportGraph::from_project(
        &project,
        GraphOptions {
            include_node_modules: options.include_node_modules,
            include_type_only: options.include_types,
        },
    );

    let data = ExportData::new(&graph, options.detect_circular);
    let output = export_to_string(options.format, &data).map_err(|e| RefactorError::io(root, e))?;

    if !data.cycles.is_empty() {
        tracing::warn!(
            root = %root.display(),
            cycles = data.cycles.len(),
            "Circular imports detected"
        );
    }
    tracing::info!(
        root = %root.display(),
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        format = %options.format,
        "Rendered import graph"
    );

    Ok(VisualizeReport {
        format: options.format.to_string(),
        output,
        node_count: graph.node_count(),
        edge_count: graph.edge_count(),
        circular_dependencies: data.cycles,
    })
}
